//! Conversion between record collections and header/row tables.
//!
//! [`to_rows`] renders one row per record against a shared field list so
//! every row has the same width. [`from_rows`] goes the other way but is
//! lossy: every cell comes back as text and header paths are not
//! re-nested, so it is not an inverse of [`to_rows`] in general.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::config::TraversalConfig;
use crate::error::{Result, ToolError};
use crate::flatten::flatten_with_width;
use crate::model::path::index_width;
use crate::model::{Composite, Field, FieldList, Record};
use crate::reconcile::shape_union;

/// Type name given to records rebuilt from rows.
pub const ROW_TYPE_NAME: &str = "row";

/// Index width shared by every record of a collection: the width its
/// longest sequence needs.
pub fn collection_index_width(records: &[Record]) -> usize {
    index_width(
        records
            .iter()
            .map(Record::longest_sequence)
            .max()
            .unwrap_or(0),
    )
}

/// Header discovered across a heterogeneous collection.
///
/// Each record is flattened on its own and its paths are folded into the
/// running list with the shape-union policy, so sequence indices seen in any
/// record get their own column. All records use the collection's index
/// width.
pub fn discover_fields(records: &[Record], config: &TraversalConfig) -> Result<FieldList> {
    let width = collection_index_width(records);
    let mut fields = FieldList::new();
    for (idx, record) in records.iter().enumerate() {
        let discovered = flatten_with_width(record, None, width, config)?.field_list();
        trace!(record = idx, paths = discovered.len(), "folding record paths");
        fields = if fields.is_empty() {
            discovered
        } else {
            shape_union(&fields, &discovered)
        };
    }
    debug!(
        records = records.len(),
        fields = fields.len(),
        index_width = width,
        "discovered fields"
    );
    Ok(fields)
}

/// One row of text per record, ordered like `fields`. Paths a record does
/// not reach render as an empty cell. Index segments use
/// [`collection_index_width`].
pub fn to_rows(
    fields: &FieldList,
    records: &[Record],
    config: &TraversalConfig,
) -> Result<Vec<Vec<String>>> {
    let width = collection_index_width(records);
    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let flat = flatten_with_width(record, Some(fields), width, config)?;
        let row = fields
            .iter()
            .map(|path| flat.get(path.as_str()).unwrap_or_default().to_string())
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Rebuilds one text-only record per data row, treating `rows[0]` as the
/// header. Short rows are padded with empty cells.
pub fn from_rows(rows: &[Vec<String>]) -> Result<Vec<Record>> {
    let Some((header, body)) = rows.split_first() else {
        return Ok(Vec::new());
    };

    let mut seen = HashSet::new();
    for (idx, column) in header.iter().enumerate() {
        if column.is_empty() {
            return Err(ToolError::InvalidHeader(format!("column {} has no name", idx + 1)));
        }
        if !seen.insert(column.as_str()) {
            return Err(ToolError::InvalidHeader(format!("duplicate column '{column}'")));
        }
    }

    let records = body
        .iter()
        .map(|row| {
            let mut composite = Composite::new(ROW_TYPE_NAME);
            for (idx, column) in header.iter().enumerate() {
                let cell = row.get(idx).cloned().unwrap_or_default();
                composite.push(Field::verbatim(column.clone(), Record::text(cell)));
            }
            Record::Composite(composite)
        })
        .collect();
    Ok(records)
}

/// Header row followed by [`to_rows`].
pub fn to_table(
    fields: &FieldList,
    records: &[Record],
    config: &TraversalConfig,
) -> Result<Vec<Vec<String>>> {
    let mut table = Vec::with_capacity(records.len() + 1);
    table.push(fields.to_strings());
    table.extend(to_rows(fields, records, config)?);
    Ok(table)
}
