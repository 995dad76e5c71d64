//! Field-list generation from the shape of a sample value.
//!
//! The generator never looks at leaf values; it records which paths a value
//! of this shape exposes. Nested sequences contribute the union of their
//! elements' shapes without index segments, so the resulting list describes
//! every element at once. Leaf elements of a top-level sequence have no
//! other name, so they are listed by index.

use tracing::debug;

use crate::config::TraversalConfig;
use crate::error::{Result, ToolError};
use crate::model::path::index_width;
use crate::model::{FieldList, Path, Record, Sequence, Shaped};
use crate::reconcile::shape_union_within;

/// Derives the ordered field list exposed by `sample`.
pub fn generate_shape(sample: &Record, config: &TraversalConfig) -> Result<FieldList> {
    shape_with_width(sample, index_width(sample.longest_sequence()), config)
}

/// Shape of any [`Shaped`] value.
pub fn shape_of<T: Shaped>(sample: &T, config: &TraversalConfig) -> Result<FieldList> {
    generate_shape(&sample.to_record(), config)
}

/// [`generate_shape`] with index segments padded to `width`.
pub(crate) fn shape_with_width(
    sample: &Record,
    width: usize,
    config: &TraversalConfig,
) -> Result<FieldList> {
    let root = Path::root();
    match sample {
        Record::Leaf(_) => return Err(ToolError::LeafRoot),
        Record::Optional(_) if sample.is_absent() => {
            if config.exclude_absent {
                return Ok(FieldList::new());
            }
            return Err(ToolError::AbsentValue { path: root });
        }
        _ => {}
    }

    let generator = ShapeGenerator { config, width };
    let mut fields = FieldList::new();
    generator.walk(sample, &root, 0, &mut fields)?;
    if fields.is_empty() && sample.is_collection() {
        return Err(ToolError::EmptyCollection { path: root });
    }
    debug!(field_count = fields.len(), "generated shape");
    Ok(fields)
}

struct ShapeGenerator<'a> {
    config: &'a TraversalConfig,
    width: usize,
}

impl ShapeGenerator<'_> {
    fn walk(
        &self,
        record: &Record,
        prefix: &Path,
        depth: usize,
        out: &mut FieldList,
    ) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(ToolError::RecursionLimit {
                path: prefix.clone(),
                limit: self.config.max_depth,
            });
        }

        match record {
            Record::Leaf(_) => {
                out.push(prefix.clone());
            }
            Record::Opaque(kind) => {
                return Err(ToolError::UnsupportedKind {
                    path: prefix.clone(),
                    kind: kind.clone(),
                });
            }
            Record::Optional(optional) => match (&optional.value, optional.template) {
                (Some(inner), _) => self.walk(inner, prefix, depth + 1, out)?,
                (None, Some(template)) => {
                    let zero = template();
                    if !(self.config.exclude_absent && !zero.is_leaf()) {
                        self.walk(&zero, prefix, depth + 1, out)?;
                    }
                }
                (None, None) => {
                    out.push(prefix.clone());
                }
            },
            Record::Composite(composite) => {
                for field in composite.visible_fields(&self.config.priority) {
                    let child = match &field.segment {
                        Some(segment) => prefix.join(segment),
                        None => prefix.clone(),
                    };
                    self.walk(field.value, &child, depth + 1, out)?;
                }
            }
            Record::Mapping(mapping) => {
                if mapping.entries.is_empty() {
                    out.push(prefix.clone());
                }
                for (key, value) in &mapping.entries {
                    self.walk(value, &prefix.join(key), depth + 1, out)?;
                }
            }
            Record::Sequence(sequence) => self.walk_sequence(sequence, prefix, depth, out)?,
        }
        Ok(())
    }

    /// Folds every present element's shape into the first one's.
    fn walk_sequence(
        &self,
        sequence: &Sequence,
        prefix: &Path,
        depth: usize,
        out: &mut FieldList,
    ) -> Result<()> {
        let mut merged: Option<FieldList> = None;
        for (idx, item) in sequence.items.iter().enumerate() {
            let mut candidate = FieldList::new();
            if prefix.is_root() && item.is_cell() {
                candidate.push(prefix.join_index(idx, self.width));
            } else if item.is_absent() {
                continue;
            } else {
                self.walk(item, prefix, depth + 1, &mut candidate)?;
            }
            merged = Some(match merged {
                Some(merged) => shape_union_within(prefix, &merged, &candidate),
                None => candidate,
            });
        }

        match (merged, sequence.element) {
            (Some(merged), _) => out.extend(merged),
            (None, Some(template)) => self.walk(&template(), prefix, depth + 1, out)?,
            (None, None) if prefix.is_root() => {
                return Err(ToolError::EmptyCollection {
                    path: prefix.clone(),
                });
            }
            (None, None) => {
                out.push(prefix.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Composite, Field, Optional};
    use serde_json::json;

    fn names(list: &FieldList) -> Vec<&str> {
        list.iter().map(Path::as_str).collect()
    }

    fn address() -> Record {
        Composite::new("Address")
            .field(Field::new("City", String::template()))
            .field(Field::new("Zip", String::template()).tag("json", "postal_code"))
            .into()
    }

    #[test]
    fn composite_members_follow_declaration_order() {
        let sample = json!({"name": "Ana", "tags": ["x", "y"], "address": {"city": "NY"}});
        let shape =
            generate_shape(&sample.to_record(), &TraversalConfig::default()).expect("shape");
        assert_eq!(names(&shape), vec!["name", "tags", "address.city"]);
    }

    #[test]
    fn inline_members_share_parent_prefix() {
        let user: Record = Composite::new("User")
            .field(Field::new("ID", 7i64.to_record()).tag("json", "id"))
            .field(Field::new("Address", address()).tag("json", ",inline"))
            .field(Field::new("Password", String::template()).tag("json", "-"))
            .into();
        let shape = generate_shape(&user, &TraversalConfig::default()).expect("shape");
        assert_eq!(names(&shape), vec!["id", "city", "postal_code"]);
    }

    #[test]
    fn mapping_keys_are_sorted() {
        let mut labels = std::collections::HashMap::new();
        labels.insert("zone".to_string(), "b".to_string());
        labels.insert("app".to_string(), "a".to_string());
        let record: Record = Composite::new("Pod")
            .field(Field::new("Labels", labels.to_record()))
            .into();
        let shape = generate_shape(&record, &TraversalConfig::default()).expect("shape");
        assert_eq!(names(&shape), vec!["labels.app", "labels.zone"]);
    }

    #[test]
    fn heterogeneous_elements_are_unioned() {
        let sample = json!({
            "items": [
                {"sku": "a"},
                null,
                {"sku": "b", "qty": 2},
                {"meta": {"color": "red"}, "sku": "c"}
            ]
        });
        let shape =
            generate_shape(&sample.to_record(), &TraversalConfig::default()).expect("shape");
        assert_eq!(
            names(&shape),
            vec!["items.sku", "items.qty", "items.meta.color"]
        );
    }

    #[test]
    fn empty_sequence_falls_back_to_element_template() {
        let record: Record = Composite::new("Order")
            .field(Field::new("Lines", Record::Sequence(Sequence::default().with_element(address))))
            .into();
        let shape = generate_shape(&record, &TraversalConfig::default()).expect("shape");
        assert_eq!(names(&shape), vec!["lines.city", "lines.postal_code"]);
    }

    #[test]
    fn empty_top_level_collection_fails() {
        let empty = Record::Sequence(Sequence::default());
        let error = generate_shape(&empty, &TraversalConfig::default()).expect_err("empty");
        assert!(matches!(error, ToolError::EmptyCollection { .. }));
    }

    #[test]
    fn top_level_collections_without_paths_fail() {
        let config = TraversalConfig::default();
        let error = generate_shape(&json!({}).to_record(), &config).expect_err("empty object");
        assert!(matches!(error, ToolError::EmptyCollection { .. }));

        let error = shape_of(&Vec::<String>::new(), &config).expect_err("empty strings");
        assert!(matches!(error, ToolError::EmptyCollection { .. }));

        let error = shape_of(&Vec::<Vec<String>>::new(), &config).expect_err("empty nested");
        assert!(matches!(error, ToolError::EmptyCollection { .. }));
    }

    #[test]
    fn top_level_leaf_sequence_lists_indices() {
        let sample = json!(["a", null, "c"]);
        let shape =
            generate_shape(&sample.to_record(), &TraversalConfig::default()).expect("shape");
        assert_eq!(names(&shape), vec!["00", "01", "02"]);

        let many: Vec<u8> = (0..120).collect();
        let shape = shape_of(&many, &TraversalConfig::default()).expect("shape");
        assert_eq!(shape.len(), 120);
        assert_eq!(names(&shape).first(), Some(&"000"));
    }

    #[test]
    fn top_level_composite_sequence_is_index_free() {
        let sample = json!([{"sku": "a"}, {"sku": "b", "qty": 2}]);
        let shape =
            generate_shape(&sample.to_record(), &TraversalConfig::default()).expect("shape");
        assert_eq!(names(&shape), vec!["sku", "qty"]);
    }

    #[test]
    fn nested_element_shapes_keep_dotted_entries() {
        let sample = json!({"items": [{"meta": null}, {"meta": {"color": "red"}}]});
        let shape =
            generate_shape(&sample.to_record(), &TraversalConfig::default()).expect("shape");
        assert_eq!(names(&shape), vec!["items.meta.color"]);
    }

    #[test]
    fn absent_root_errors_unless_excluded() {
        let absent = Record::Optional(Optional::absent(Some(address)));
        let error = generate_shape(&absent, &TraversalConfig::default()).expect_err("absent");
        assert!(matches!(error, ToolError::AbsentValue { .. }));

        let config = TraversalConfig::default().exclude_absent(true);
        assert!(generate_shape(&absent, &config).expect("excluded").is_empty());
    }

    #[test]
    fn absent_nested_composite_uses_template_or_is_skipped() {
        let record: Record = Composite::new("User")
            .field(Field::new("Name", String::template()))
            .field(Field::new("Home", Record::Optional(Optional::absent(Some(address)))))
            .into();
        let shape = generate_shape(&record, &TraversalConfig::default()).expect("shape");
        assert_eq!(names(&shape), vec!["name", "home.city", "home.postal_code"]);

        let config = TraversalConfig::default().exclude_absent(true);
        let shape = generate_shape(&record, &config).expect("shape");
        assert_eq!(names(&shape), vec!["name"]);
    }

    #[test]
    fn unsupported_kind_reports_path() {
        let record: Record = Composite::new("Job")
            .field(Field::new("Callback", Record::Opaque("callable".into())))
            .into();
        let error = generate_shape(&record, &TraversalConfig::default()).expect_err("unsupported");
        match error {
            ToolError::UnsupportedKind { path, kind } => {
                assert_eq!(path.as_str(), "callback");
                assert_eq!(kind, "callable");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn self_referential_template_hits_recursion_limit() {
        fn node() -> Record {
            Composite::new("Node")
                .field(Field::new(
                    "Children",
                    Record::Sequence(Sequence::default().with_element(node)),
                ))
                .into()
        }
        let config = TraversalConfig::default().max_depth(16);
        let error = generate_shape(&node(), &config).expect_err("recursion");
        assert!(matches!(error, ToolError::RecursionLimit { limit: 16, .. }));
    }

    #[test]
    fn instants_are_leaves() {
        let created = chrono::DateTime::<chrono::Utc>::default();
        let record: Record = Composite::new("Event")
            .field(Field::new("CreatedAt", created.to_record()).tag("json", "created_at"))
            .into();
        let shape = generate_shape(&record, &TraversalConfig::default()).expect("shape");
        assert_eq!(names(&shape), vec!["created_at"]);
    }
}
