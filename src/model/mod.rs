//! Value-shape model walked by the shape generator and the flattener.
//!
//! A [`Record`] is an owned tree, so it cannot contain reference cycles.
//! Declared element shapes are stored as lazily evaluated [`Template`]s and
//! are only expanded when no live element is available.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

pub mod annotation;
pub mod path;
pub mod shaped;

pub use annotation::{Annotation, AnnotationPriority, ExportName};
pub use path::{FieldList, Path};
pub use shaped::Shaped;

/// Produces the zero value of a declared element type.
pub type Template = fn() -> Record;

/// Terminal value rendered as one cell of text.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Boolean(bool),
    /// A date/time; always a leaf even though it has internal structure.
    Instant(DateTime<FixedOffset>),
}

impl Scalar {
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Text(value) => value.clone(),
            Scalar::Integer(value) => value.to_string(),
            Scalar::Unsigned(value) => value.to_string(),
            Scalar::Float(value) => value.to_string(),
            Scalar::Boolean(value) => value.to_string(),
            Scalar::Instant(value) => value.to_rfc3339(),
        }
    }

    /// Whether the value equals its type's zero value.
    pub fn is_zero(&self) -> bool {
        match self {
            Scalar::Text(value) => value.is_empty(),
            Scalar::Integer(value) => *value == 0,
            Scalar::Unsigned(value) => *value == 0,
            Scalar::Float(value) => *value == 0.0,
            Scalar::Boolean(value) => !value,
            Scalar::Instant(_) => false,
        }
    }
}

/// Any value the flattening engine can walk.
#[derive(Debug, Clone)]
pub enum Record {
    Leaf(Scalar),
    Composite(Composite),
    Sequence(Sequence),
    Mapping(Mapping),
    Optional(Optional),
    /// A value with no representation, e.g. a callable or a channel.
    Opaque(String),
}

impl Record {
    pub fn text(value: impl Into<String>) -> Self {
        Record::Leaf(Scalar::Text(value.into()))
    }

    /// An absent optional whose declared type is unknown.
    pub fn absent() -> Self {
        Record::Optional(Optional {
            value: None,
            template: None,
        })
    }

    /// Whether this is an optional with nothing behind it.
    pub fn is_absent(&self) -> bool {
        match self {
            Record::Optional(optional) => match &optional.value {
                Some(inner) => inner.is_absent(),
                None => true,
            },
            _ => false,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Record::Leaf(_))
    }

    /// Whether the value, looking through optionals, is a composite or a
    /// mapping and can therefore be inlined into its parent.
    pub fn is_inlinable(&self) -> bool {
        match self {
            Record::Composite(_) | Record::Mapping(_) => true,
            Record::Optional(optional) => match (&optional.value, optional.template) {
                (Some(inner), _) => inner.is_inlinable(),
                (None, Some(template)) => template().is_inlinable(),
                (None, None) => false,
            },
            _ => false,
        }
    }

    /// Whether the value renders as a single cell, looking through
    /// optionals. An absent value of unknown type counts as a cell.
    pub fn is_cell(&self) -> bool {
        match self {
            Record::Leaf(_) => true,
            Record::Optional(optional) => match (&optional.value, optional.template) {
                (Some(inner), _) => inner.is_cell(),
                (None, Some(template)) => template().is_leaf(),
                (None, None) => true,
            },
            _ => false,
        }
    }

    /// Whether the value, looking through present optionals, is a sequence
    /// or a mapping.
    pub fn is_collection(&self) -> bool {
        match self {
            Record::Sequence(_) | Record::Mapping(_) => true,
            Record::Optional(optional) => optional
                .value
                .as_deref()
                .is_some_and(Record::is_collection),
            _ => false,
        }
    }

    /// Length of the longest live sequence anywhere in the value.
    pub fn longest_sequence(&self) -> usize {
        match self {
            Record::Leaf(_) | Record::Opaque(_) => 0,
            Record::Composite(composite) => composite
                .fields
                .iter()
                .map(|field| field.value.longest_sequence())
                .max()
                .unwrap_or(0),
            Record::Sequence(sequence) => sequence
                .items
                .iter()
                .map(Record::longest_sequence)
                .fold(sequence.items.len(), usize::max),
            Record::Mapping(mapping) => mapping
                .entries
                .values()
                .map(Record::longest_sequence)
                .max()
                .unwrap_or(0),
            Record::Optional(optional) => optional
                .value
                .as_deref()
                .map(Record::longest_sequence)
                .unwrap_or(0),
        }
    }
}

impl From<Scalar> for Record {
    fn from(scalar: Scalar) -> Self {
        Record::Leaf(scalar)
    }
}

impl From<Composite> for Record {
    fn from(composite: Composite) -> Self {
        Record::Composite(composite)
    }
}

/// A composite with declared members in declaration order.
#[derive(Debug, Clone)]
pub struct Composite {
    pub type_name: String,
    pub fields: Vec<Field>,
}

impl Composite {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Members visible under `priority`, in declaration order.
    pub fn visible_fields<'a>(
        &'a self,
        priority: &'a AnnotationPriority,
    ) -> impl Iterator<Item = VisibleField<'a>> + 'a {
        self.fields.iter().filter_map(move |field| {
            let annotation = field.annotation(priority);
            let name = annotation.export_name(&field.ident)?;
            let segment = if annotation.inline && field.value.is_inlinable() {
                None
            } else {
                Some(name)
            };
            Some(VisibleField {
                segment,
                annotation,
                value: &field.value,
            })
        })
    }
}

/// One declared member of a composite.
#[derive(Debug, Clone)]
pub struct Field {
    pub ident: String,
    /// `(namespace, raw tag)` pairs.
    pub tags: Vec<(String, String)>,
    /// Export under `ident` exactly, ignoring tags.
    pub verbatim: bool,
    pub value: Record,
}

impl Field {
    pub fn new(ident: impl Into<String>, value: impl Into<Record>) -> Self {
        Self {
            ident: ident.into(),
            tags: Vec::new(),
            verbatim: false,
            value: value.into(),
        }
    }

    pub fn verbatim(name: impl Into<String>, value: impl Into<Record>) -> Self {
        Self {
            verbatim: true,
            ..Self::new(name, value)
        }
    }

    pub fn tag(mut self, namespace: impl Into<String>, raw: impl Into<String>) -> Self {
        self.tags.push((namespace.into(), raw.into()));
        self
    }

    pub fn annotation(&self, priority: &AnnotationPriority) -> Annotation {
        if self.verbatim {
            Annotation::named(self.ident.clone())
        } else {
            priority.resolve(&self.tags)
        }
    }
}

/// A member as seen by traversal: `segment` is `None` for inline members.
#[derive(Debug)]
pub struct VisibleField<'a> {
    pub segment: Option<String>,
    pub annotation: Annotation,
    pub value: &'a Record,
}

#[derive(Debug, Clone, Default)]
pub struct Sequence {
    pub items: Vec<Record>,
    pub element: Option<Template>,
}

impl Sequence {
    pub fn new(items: Vec<Record>) -> Self {
        Self {
            items,
            element: None,
        }
    }

    pub fn with_element(mut self, element: Template) -> Self {
        self.element = Some(element);
        self
    }
}

/// Associative mapping; keys iterate in sorted order.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    pub entries: BTreeMap<String, Record>,
    pub element: Option<Template>,
}

impl Mapping {
    pub fn new(entries: BTreeMap<String, Record>) -> Self {
        Self {
            entries,
            element: None,
        }
    }
}

/// Optional or reference wrapper.
#[derive(Debug, Clone, Default)]
pub struct Optional {
    pub value: Option<Box<Record>>,
    pub template: Option<Template>,
}

impl Optional {
    pub fn present(value: Record) -> Self {
        Self {
            value: Some(Box::new(value)),
            template: None,
        }
    }

    pub fn absent(template: Option<Template>) -> Self {
        Self {
            value: None,
            template,
        }
    }
}
