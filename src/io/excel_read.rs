use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};

use crate::error::{Result, ToolError};

/// Reads every row of a worksheet as text. Without a sheet name the first
/// worksheet is used. Trailing empty rows are dropped.
pub fn read_rows(path: &Path, sheet: Option<&str>) -> Result<Vec<Vec<String>>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let range = match sheet {
        Some(name) => read_required_sheet(&mut workbook, name)?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ToolError::InvalidWorkbook("workbook has no sheets".into()))?
            .map_err(ToolError::from)?,
    };

    let mut rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    while rows
        .last()
        .is_some_and(|row: &Vec<String>| row.iter().all(String::is_empty))
    {
        rows.pop();
    }
    Ok(rows)
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<Range<DataType>> {
    workbook
        .worksheet_range(name)
        .ok_or_else(|| ToolError::InvalidWorkbook(format!("no sheet named '{name}'")))?
        .map_err(ToolError::from)
}

/// Cells are exported as strings, but hand-edited sheets may hold numbers.
fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::String(text) => text.clone(),
        DataType::Empty => String::new(),
        other => other.to_string(),
    }
}
