//! DDL command implementation.

use restoc_core::{create_statements, drop_statements};
use std::path::Path;

/// Runs the ddl command, returning the statements in execution order.
pub fn run(path: &Path, drop: bool) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let (_, table) = super::open(path)?;
    if drop {
        return Ok(drop_statements(table.structure()));
    }
    Ok(create_statements(table.structure(), &table.escaper())?)
}
