//! Condition command implementation.

use restoc_codec::from_json;
use restoc_core::where_term;
use std::path::Path;

/// Runs the condition command, returning `` `field` <predicate> ``.
pub fn run(path: &Path, field: &str, value: &str) -> Result<String, Box<dyn std::error::Error>> {
    let (_, table) = super::open(path)?;
    let value = from_json(value)?;
    Ok(where_term(table.structure(), &table.escaper(), field, &value)?)
}
