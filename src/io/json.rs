use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{Result, ToolError};
use crate::model::FieldList;

/// Loads records from a JSON array, a single JSON object, or
/// newline-delimited JSON.
pub fn read_records(path: &Path) -> Result<Vec<Value>> {
    let source = fs::read_to_string(path)?;
    parse_records(&source)
}

pub fn parse_records(source: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Value>(source) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Ok(vec![other]),
        Err(_) => source
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(ToolError::from))
            .collect(),
    }
}

/// Writes records as a pretty-printed JSON array.
pub fn write_records(path: &Path, records: &[Value]) -> Result<()> {
    let json_string = serde_json::to_string_pretty(records)?;
    fs::write(path, json_string)?;
    Ok(())
}

/// Loads a header list stored as a JSON array of strings.
pub fn read_field_list(path: &Path) -> Result<FieldList> {
    let source = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&source)?)
}

pub fn write_field_list(path: &Path, fields: &FieldList) -> Result<()> {
    let json_string = serde_json::to_string_pretty(fields)?;
    fs::write(path, json_string)?;
    Ok(())
}
