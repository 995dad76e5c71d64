use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::config::TraversalConfig;
use crate::error::Result;
use crate::flatten::flatten;
use crate::io::excel_write::DEFAULT_SHEET;
use crate::io::{excel_read, excel_write, json};
use crate::model::{FieldList, Record, Shaped};
use crate::reconcile::{MergePolicy, merge, merge_field_lists, shape_union};
use crate::shape::generate_shape;
use crate::table::{discover_fields, from_rows, to_rows};

/// Exports JSON records into an Excel table.
///
/// The header is discovered from the records. When `baseline` names a
/// previously published header file, the discovered header is merged into
/// it so existing columns keep their order. The header actually used is
/// returned and, with `headers_out`, persisted.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display())
)]
pub fn json_to_excel(
    input: &Path,
    output: &Path,
    baseline: Option<&Path>,
    headers_out: Option<&Path>,
    config: &TraversalConfig,
) -> Result<FieldList> {
    let records = load_records(input)?;
    info!(record_count = records.len(), "parsed records from JSON source");

    let mut fields = discover_fields(&records, config)?;
    if let Some(baseline) = baseline {
        let published = json::read_field_list(baseline)?;
        debug!(baseline = published.len(), discovered = fields.len(), "merging header");
        fields = merge_field_lists(&published, &fields);
    }

    let rows = to_rows(&fields, &records, config)?;
    debug!(column_count = fields.len(), row_count = rows.len(), "table constructed");
    excel_write::write_table(output, DEFAULT_SHEET, &fields.to_strings(), &rows)?;

    if let Some(headers_out) = headers_out {
        json::write_field_list(headers_out, &fields)?;
    }
    Ok(fields)
}

/// Reads an Excel table back into JSON objects keyed by column header.
/// Every value comes back as a string.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display())
)]
pub fn excel_to_json(
    input: &Path,
    output: &Path,
    sheet: Option<&str>,
    config: &TraversalConfig,
) -> Result<()> {
    let rows = excel_read::read_rows(input, sheet)?;
    let records = from_rows(&rows)?;
    info!(record_count = records.len(), "read records from workbook");

    let mut objects = Vec::with_capacity(records.len());
    for record in &records {
        let flat = flatten(record, None, config)?;
        let object: Map<String, Value> = flat
            .iter()
            .map(|(path, value)| (path.as_str().to_string(), Value::String(value.to_string())))
            .collect();
        objects.push(Value::Object(object));
    }
    json::write_records(output, &objects)
}

/// Merges two header files and writes the result.
#[instrument(
    level = "info",
    skip_all,
    fields(baseline = %baseline.display(), candidate = %candidate.display(), ?policy)
)]
pub fn merge_header_files(
    baseline: &Path,
    candidate: &Path,
    output: &Path,
    policy: MergePolicy,
) -> Result<FieldList> {
    let baseline_fields = json::read_field_list(baseline)?;
    let candidate_fields = json::read_field_list(candidate)?;
    let merged = merge(&baseline_fields, &candidate_fields, policy);
    info!(
        baseline = baseline_fields.len(),
        candidate = candidate_fields.len(),
        merged = merged.len(),
        "merged header lists"
    );
    json::write_field_list(output, &merged)?;
    Ok(merged)
}

/// Type-level shape shared by every record in the file, without sequence
/// indices.
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub fn describe_shape(input: &Path, config: &TraversalConfig) -> Result<FieldList> {
    let records = load_records(input)?;
    let mut fields = FieldList::new();
    for record in &records {
        let shape = generate_shape(record, config)?;
        fields = if fields.is_empty() {
            shape
        } else {
            shape_union(&fields, &shape)
        };
    }
    info!(record_count = records.len(), field_count = fields.len(), "described shape");
    Ok(fields)
}

fn load_records(input: &Path) -> Result<Vec<Record>> {
    let values = json::read_records(input)?;
    Ok(values.iter().map(Shaped::to_record).collect())
}
