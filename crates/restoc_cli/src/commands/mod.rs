//! CLI command implementations.

pub mod condition;
pub mod ddl;
pub mod select;

use restoc_core::{Structure, Table};
use restoc_exec::RecordingExecutor;
use std::path::Path;
use std::sync::Arc;

/// Loads a structure and binds it to an executor that only records.
pub fn open(path: &Path) -> Result<(Arc<RecordingExecutor>, Table), Box<dyn std::error::Error>> {
    let structure = Structure::from_json_file(path)?;
    tracing::debug!(table = %structure.qualified(), "loaded structure");
    let exec = Arc::new(RecordingExecutor::new());
    let table = Table::new(structure, exec.clone());
    Ok((exec, table))
}
