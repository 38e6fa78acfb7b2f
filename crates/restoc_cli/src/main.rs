//! RestOC CLI
//!
//! Compiles conditions, queries and DDL from a JSON structure file without
//! a live server.
//!
//! # Commands
//!
//! - `condition` - Print the WHERE predicate for one field
//! - `select` - Print the SELECT a read would send
//! - `ddl` - Print CREATE (or DROP) TABLE statements

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// RestOC record structure tools.
#[derive(Parser)]
#[command(name = "restoc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JSON structure file
    #[arg(global = true, short, long)]
    structure: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the predicate for a field and a JSON value
    Condition {
        /// Field name
        #[arg(short, long)]
        field: String,

        /// Value as JSON, e.g. `[1,2]` or `{"between":[1,5]}`
        #[arg(long)]
        value: String,
    },

    /// Print the SELECT for a read
    Select {
        /// Primary key value(s) as JSON
        #[arg(long)]
        ids: Option<String>,

        /// Filter as a JSON object of field to value
        #[arg(long)]
        filter: Option<String>,

        /// Comma separated fields, `!` prefix for descending
        #[arg(short, long)]
        order_by: Option<String>,

        /// Maximum rows
        #[arg(short, long, conflicts_with = "range")]
        limit: Option<u64>,

        /// Offset and count, e.g. `20,10`
        #[arg(short, long)]
        range: Option<String>,

        /// Only return distinct rows
        #[arg(short, long)]
        distinct: bool,

        /// Comma separated columns to return
        #[arg(long)]
        fields: Option<String>,
    },

    /// Print table DDL
    Ddl {
        /// Print DROP statements instead
        #[arg(long)]
        drop: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Condition { field, value } => {
            let path = cli.structure.ok_or("Structure file required for condition")?;
            println!("{}", commands::condition::run(&path, &field, &value)?);
        }
        Commands::Select {
            ids,
            filter,
            order_by,
            limit,
            range,
            distinct,
            fields,
        } => {
            let path = cli.structure.ok_or("Structure file required for select")?;
            let args = commands::select::SelectArgs {
                ids,
                filter,
                order_by,
                limit,
                range,
                distinct,
                fields,
            };
            println!("{}", commands::select::run(&path, &args)?);
        }
        Commands::Ddl { drop } => {
            let path = cli.structure.ok_or("Structure file required for ddl")?;
            for sql in commands::ddl::run(&path, drop)? {
                println!("{sql};");
            }
        }
        Commands::Version => {
            println!("RestOC CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("RestOC Core v{}", restoc_core::VERSION);
        }
    }

    Ok(())
}
