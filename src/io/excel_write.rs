use std::path::Path;

use rust_xlsxwriter::{Table, Workbook};

use crate::error::Result;

/// Default worksheet name for exported tables.
pub const DEFAULT_SHEET: &str = "Records";

/// Writes a header row and its data rows to a single worksheet.
///
/// Every cell is written as a string; values were already rendered to text
/// by the flattener.
pub fn write_table(
    path: &Path,
    sheet_name: &str,
    header: &[String],
    rows: &[Vec<String>],
) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col_idx, column) in header.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, column)?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            worksheet.write_string((row_idx + 1) as u32, col_idx as u16, cell)?;
        }
    }

    if !header.is_empty() && !rows.is_empty() {
        let mut excel_table = Table::new();
        excel_table.set_autofilter(true);
        let col_end = (header.len() as u16).saturating_sub(1);
        worksheet.add_table(0, 0, rows.len() as u32, col_end, &excel_table)?;
    }

    workbook.save(path)?;
    Ok(())
}
