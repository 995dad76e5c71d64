use std::collections::BTreeMap;

use crate::config::TraversalConfig;
use crate::error::{Result, ToolError};
use crate::model::annotation::OMIT_EMPTY_TOKEN;
use crate::model::{Path, Record};

/// One-level conversion of a composite into query parameters.
///
/// Leaf members render as text and leaf sequences as comma-separated lists.
/// Nested composites and mappings are skipped unless the member is inline,
/// in which case its own leaves are merged in. Zero values are dropped when
/// `omit_zero` is set or the member is annotated `omitempty`.
pub fn to_query_map(
    record: &Record,
    omit_zero: bool,
    config: &TraversalConfig,
) -> Result<BTreeMap<String, String>> {
    let mut params = BTreeMap::new();
    collect(record, omit_zero, config, &Path::root(), &mut params)?;
    Ok(params)
}

fn collect(
    record: &Record,
    omit_zero: bool,
    config: &TraversalConfig,
    path: &Path,
    params: &mut BTreeMap<String, String>,
) -> Result<()> {
    match record {
        Record::Optional(optional) => match &optional.value {
            Some(inner) => collect(inner, omit_zero, config, path, params),
            None => Ok(()),
        },
        Record::Composite(composite) => {
            for field in composite.visible_fields(&config.priority) {
                let omit = omit_zero || field.annotation.has_option(OMIT_EMPTY_TOKEN);
                match &field.segment {
                    None => collect(field.value, omit, config, path, params)?,
                    Some(name) => {
                        if let Some(value) = render(field.value, omit, &path.join(name))? {
                            params.entry(name.clone()).or_insert(value);
                        }
                    }
                }
            }
            Ok(())
        }
        Record::Mapping(mapping) => {
            for (key, value) in &mapping.entries {
                if let Some(text) = render(value, omit_zero, &path.join(key))? {
                    params.entry(key.clone()).or_insert(text);
                }
            }
            Ok(())
        }
        Record::Leaf(_) => Err(ToolError::LeafRoot),
        Record::Sequence(_) | Record::Opaque(_) => Ok(()),
    }
}

/// Text for one parameter, or `None` when it is skipped.
fn render(record: &Record, omit: bool, path: &Path) -> Result<Option<String>> {
    match record {
        Record::Leaf(scalar) => Ok((!(omit && scalar.is_zero())).then(|| scalar.to_text())),
        Record::Optional(optional) => match &optional.value {
            Some(inner) => render(inner, omit, path),
            None => Ok(None),
        },
        Record::Sequence(sequence) => {
            let mut items = Vec::with_capacity(sequence.items.len());
            for item in &sequence.items {
                match item {
                    Record::Leaf(scalar) => items.push(scalar.to_text()),
                    Record::Optional(_) if item.is_absent() => {}
                    Record::Optional(optional) => {
                        if let Some(Record::Leaf(scalar)) = optional.value.as_deref() {
                            items.push(scalar.to_text());
                        }
                    }
                    Record::Opaque(kind) => {
                        return Err(ToolError::UnsupportedKind {
                            path: path.clone(),
                            kind: kind.clone(),
                        });
                    }
                    _ => return Ok(None),
                }
            }
            if omit && items.is_empty() {
                return Ok(None);
            }
            Ok(Some(items.join(",")))
        }
        Record::Opaque(kind) => Err(ToolError::UnsupportedKind {
            path: path.clone(),
            kind: kind.clone(),
        }),
        Record::Composite(_) | Record::Mapping(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Composite, Field, Shaped};

    fn search() -> Record {
        let paging: Record = Composite::new("Paging")
            .field(Field::new("Page", 2u32.to_record()))
            .field(Field::new("PerPage", 0u32.to_record()).tag("url", "per_page,omitempty"))
            .into();
        Composite::new("Search")
            .field(Field::new("Query", "name:ana".to_string().to_record()).tag("url", "q"))
            .field(Field::new("Fields", vec!["id".to_string(), "email".to_string()].to_record()))
            .field(Field::new("Archived", false.to_record()))
            .field(Field::new("Cursor", Option::<String>::None.to_record()))
            .field(Field::new("Paging", paging).tag("url", ",inline"))
            .field(Field::new("Filter", Composite::new("Filter")))
            .into()
    }

    #[test]
    fn builds_one_level_parameters() {
        let params = to_query_map(&search(), false, &TraversalConfig::default()).expect("params");
        let pairs: Vec<(&str, &str)> =
            params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                ("archived", "false"),
                ("fields", "id,email"),
                ("page", "2"),
                ("q", "name:ana"),
            ]
        );
    }

    #[test]
    fn omit_zero_drops_zero_values() {
        let params = to_query_map(&search(), true, &TraversalConfig::default()).expect("params");
        assert!(!params.contains_key("archived"));
        assert_eq!(params.get("page").map(String::as_str), Some("2"));
    }

    #[test]
    fn scalar_root_is_rejected() {
        let error = to_query_map(&Record::text("x"), false, &TraversalConfig::default());
        assert!(matches!(error, Err(ToolError::LeafRoot)));
    }
}
