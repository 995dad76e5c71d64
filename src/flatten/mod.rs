use std::collections::HashMap;

use tracing::debug;

use crate::config::TraversalConfig;
use crate::error::{Result, ToolError};
use crate::model::path::index_width;
use crate::model::{FieldList, Path, Record};
use crate::shape::shape_with_width;

/// Path → text mapping produced from one record, in traversal order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedRecord {
    entries: Vec<(Path, String)>,
    index: HashMap<Path, usize>,
}

impl FlattenedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` unless the path was already written.
    pub fn insert(&mut self, path: Path, value: String) -> bool {
        if self.index.contains_key(&path) {
            return false;
        }
        self.index.insert(path.clone(), self.entries.len());
        self.entries.push((path, value));
        true
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.index
            .get(path)
            .map(|&idx| self.entries[idx].1.as_str())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.entries.iter().map(|(path, value)| (path, value.as_str()))
    }

    /// Paths in the order they were written.
    pub fn field_list(&self) -> FieldList {
        self.entries.iter().map(|(path, _)| path).collect()
    }
}

/// Flattens `record` into path/value pairs.
///
/// With a field list, only paths named by it (or descending from a named
/// path) are kept; paths the record cannot reach are left out. Without one,
/// the list is derived from the record's own shape.
pub fn flatten(
    record: &Record,
    fields: Option<&FieldList>,
    config: &TraversalConfig,
) -> Result<FlattenedRecord> {
    flatten_with_width(record, fields, index_width(record.longest_sequence()), config)
}

/// [`flatten`] with every index segment padded to `width` instead of the
/// width implied by the record itself. Records exported side by side share
/// one width so their index columns line up.
pub fn flatten_with_width(
    record: &Record,
    fields: Option<&FieldList>,
    width: usize,
    config: &TraversalConfig,
) -> Result<FlattenedRecord> {
    let derived;
    let fields = match fields {
        Some(fields) => fields,
        None => {
            derived = shape_with_width(record, width, config)?;
            &derived
        }
    };

    if record.is_leaf() {
        return Err(ToolError::LeafRoot);
    }

    let mut flattener = Flattener {
        config,
        fields,
        width,
        out: FlattenedRecord::new(),
    };
    let root = Path::root();
    flattener.walk(record, &root, &root, 0, false)?;
    debug!(
        entries = flattener.out.len(),
        index_width = flattener.width,
        "flattened record"
    );
    Ok(flattener.out)
}

struct Flattener<'a> {
    config: &'a TraversalConfig,
    fields: &'a FieldList,
    width: usize,
    out: FlattenedRecord,
}

impl Flattener<'_> {
    /// `shape` mirrors `path` without sequence index segments, matching the
    /// paths produced by the shape generator. `absent` marks a branch
    /// expanded from a declared template.
    fn walk(
        &mut self,
        record: &Record,
        path: &Path,
        shape: &Path,
        depth: usize,
        absent: bool,
    ) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(ToolError::RecursionLimit {
                path: path.clone(),
                limit: self.config.max_depth,
            });
        }

        match record {
            Record::Leaf(scalar) => {
                let value = if absent {
                    self.config.absent_marker.clone()
                } else {
                    scalar.to_text()
                };
                self.emit(path, shape, value);
            }
            Record::Opaque(kind) => {
                return Err(ToolError::UnsupportedKind {
                    path: path.clone(),
                    kind: kind.clone(),
                });
            }
            Record::Optional(optional) => match (&optional.value, optional.template) {
                (Some(inner), _) => self.walk(inner, path, shape, depth + 1, absent)?,
                (None, Some(template)) => {
                    let zero = template();
                    if zero.is_leaf() || !self.config.exclude_absent {
                        self.walk(&zero, path, shape, depth + 1, true)?;
                    }
                }
                (None, None) => {
                    let marker = self.config.absent_marker.clone();
                    self.emit(path, shape, marker);
                }
            },
            Record::Composite(composite) => {
                let config = self.config;
                for field in composite.visible_fields(&config.priority) {
                    match &field.segment {
                        Some(segment) => self.walk(
                            field.value,
                            &path.join(segment),
                            &shape.join(segment),
                            depth + 1,
                            absent,
                        )?,
                        None => self.walk(field.value, path, shape, depth + 1, absent)?,
                    }
                }
            }
            Record::Mapping(mapping) => {
                if mapping.entries.is_empty() {
                    self.emit_empty(path, shape, absent);
                }
                for (key, value) in &mapping.entries {
                    self.walk(value, &path.join(key), &shape.join(key), depth + 1, absent)?;
                }
            }
            Record::Sequence(sequence) => {
                if sequence.items.is_empty() {
                    self.emit_empty(path, shape, absent);
                }
                for (idx, item) in sequence.items.iter().enumerate() {
                    let indexed = path.join_index(idx, self.width);
                    self.walk(item, &indexed, shape, depth + 1, absent)?;
                }
            }
        }
        Ok(())
    }

    /// Empty collections still occupy their own column.
    fn emit_empty(&mut self, path: &Path, shape: &Path, absent: bool) {
        let value = if absent {
            self.config.absent_marker.clone()
        } else {
            String::new()
        };
        self.emit(path, shape, value);
    }

    fn emit(&mut self, path: &Path, shape: &Path, value: String) {
        if path.is_root() {
            return;
        }
        // Leaf elements of a top-level sequence are only addressed by index.
        let by_shape = !shape.is_root() && self.fields.selects(shape);
        if by_shape || self.fields.selects(path) {
            self.out.insert(path.clone(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Composite, Field, Optional, Sequence, Shaped};
    use serde_json::json;

    fn pairs(record: &FlattenedRecord) -> Vec<(&str, &str)> {
        record.iter().map(|(path, value)| (path.as_str(), value)).collect()
    }

    #[test]
    fn flattens_nested_json_in_declaration_order() {
        let record =
            json!({"name": "Ana", "tags": ["x", "y"], "address": {"city": "NY"}}).to_record();
        let flat = flatten(&record, None, &TraversalConfig::default()).expect("flattened");
        assert_eq!(
            pairs(&flat),
            vec![
                ("name", "Ana"),
                ("tags.00", "x"),
                ("tags.01", "y"),
                ("address.city", "NY"),
            ]
        );
    }

    #[test]
    fn index_width_follows_longest_sequence() {
        let short: Vec<u32> = (0..12).collect();
        let long: Vec<u32> = (0..150).collect();
        let record: Record = Composite::new("Series")
            .field(Field::new("Short", short.to_record()))
            .field(Field::new("Long", long.to_record()))
            .into();
        let flat = flatten(&record, None, &TraversalConfig::default()).expect("flattened");
        assert_eq!(flat.get("short.011"), Some("11"));
        assert_eq!(flat.get("long.149"), Some("149"));

        let only_short: Record = Composite::new("Series")
            .field(Field::new("Short", short.to_record()))
            .into();
        let flat = flatten(&only_short, None, &TraversalConfig::default()).expect("flattened");
        let paths: Vec<&str> = flat.iter().map(|(p, _)| p.as_str()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
        assert_eq!(paths.first(), Some(&"short.00"));
        assert_eq!(paths.last(), Some(&"short.11"));
    }

    #[test]
    fn absent_leaves_use_marker_and_empty_collections_keep_a_column() {
        let record = json!({"nick": null, "email": "", "roles": [], "labels": {}}).to_record();
        let flat = flatten(&record, None, &TraversalConfig::default()).expect("flattened");
        assert_eq!(
            pairs(&flat),
            vec![("nick", "<nil>"), ("email", ""), ("roles", ""), ("labels", "")]
        );
    }

    #[test]
    fn absent_composite_expands_template_with_markers() {
        fn address() -> Record {
            Composite::new("Address")
                .field(Field::new("City", String::template()))
                .into()
        }
        let record: Record = Composite::new("User")
            .field(Field::new("Name", "Ana".to_string().to_record()))
            .field(Field::new("Home", Record::Optional(Optional::absent(Some(address)))))
            .into();
        let flat = flatten(&record, None, &TraversalConfig::default()).expect("flattened");
        assert_eq!(pairs(&flat), vec![("name", "Ana"), ("home.city", "<nil>")]);

        let config = TraversalConfig::default().exclude_absent(true).absent_marker("NULL");
        let flat = flatten(&record, None, &config).expect("flattened");
        assert_eq!(pairs(&flat), vec![("name", "Ana")]);
    }

    #[test]
    fn field_list_filters_and_accepts_parent_prefixes() {
        let record = json!({
            "id": 1,
            "items": [{"sku": "a", "qty": 1}, {"sku": "b", "qty": 3}],
            "owner": {"name": "Ana", "email": "ana@example.com"}
        })
        .to_record();
        let fields: FieldList = ["items.sku", "owner", "missing.path"].into_iter().collect();
        let flat = flatten(&record, Some(&fields), &TraversalConfig::default()).expect("flattened");
        assert_eq!(
            pairs(&flat),
            vec![
                ("items.00.sku", "a"),
                ("items.01.sku", "b"),
                ("owner.name", "Ana"),
                ("owner.email", "ana@example.com"),
            ]
        );
    }

    #[test]
    fn mismatched_shape_omits_paths() {
        let record = json!({"tags": {"primary": "x"}}).to_record();
        let fields: FieldList = ["tags.00", "tags.primary"].into_iter().collect();
        let flat = flatten(&record, Some(&fields), &TraversalConfig::default()).expect("flattened");
        assert_eq!(pairs(&flat), vec![("tags.primary", "x")]);
    }

    #[test]
    fn unsupported_leaf_includes_path() {
        let record: Record = Composite::new("Job")
            .field(Field::new(
                "Hooks",
                Record::Sequence(Sequence::new(vec![Record::Opaque("channel".into())])),
            ))
            .into();
        let fields: FieldList = ["hooks"].into_iter().collect();
        let error = flatten(&record, Some(&fields), &TraversalConfig::default())
            .expect_err("unsupported");
        match error {
            ToolError::UnsupportedKind { path, .. } => assert_eq!(path.as_str(), "hooks.00"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn colliding_inline_members_keep_first_value() {
        let first: Record = Composite::new("A").field(Field::new("Id", Record::text("a"))).into();
        let second: Record = Composite::new("B").field(Field::new("Id", Record::text("b"))).into();
        let record: Record = Composite::new("Both")
            .field(Field::new("First", first).tag("json", ",inline"))
            .field(Field::new("Second", second).tag("json", ",inline"))
            .into();
        let flat = flatten(&record, None, &TraversalConfig::default()).expect("flattened");
        assert_eq!(pairs(&flat), vec![("id", "a")]);
    }

    #[test]
    fn top_level_sequence_honours_field_list() {
        let record = json!(["a", "b", "c"]).to_record();
        let fields: FieldList = ["01"].into_iter().collect();
        let flat = flatten(&record, Some(&fields), &TraversalConfig::default()).expect("flattened");
        assert_eq!(pairs(&flat), vec![("01", "b")]);

        let flat = flatten(&record, None, &TraversalConfig::default()).expect("flattened");
        assert_eq!(pairs(&flat), vec![("00", "a"), ("01", "b"), ("02", "c")]);
    }

    #[test]
    fn top_level_composite_sequence_uses_element_shape() {
        let record = json!([{"sku": "a"}, {"sku": "b", "qty": 2}]).to_record();
        let fields: FieldList = ["qty"].into_iter().collect();
        let flat = flatten(&record, Some(&fields), &TraversalConfig::default()).expect("flattened");
        assert_eq!(pairs(&flat), vec![("01.qty", "2")]);
    }

    #[test]
    fn empty_top_level_mapping_is_rejected() {
        let error = flatten(&json!({}).to_record(), None, &TraversalConfig::default())
            .expect_err("empty");
        assert!(matches!(error, ToolError::EmptyCollection { .. }));
    }

    #[test]
    fn explicit_width_overrides_record_width() {
        let record = json!({"tags": ["x", "y"]}).to_record();
        let flat = flatten_with_width(&record, None, 3, &TraversalConfig::default())
            .expect("flattened");
        assert_eq!(pairs(&flat), vec![("tags.000", "x"), ("tags.001", "y")]);
    }

    #[test]
    fn scalar_root_is_rejected() {
        let error =
            flatten(&Record::text("x"), None, &TraversalConfig::default()).expect_err("leaf");
        assert!(matches!(error, ToolError::LeafRoot));
    }
}
