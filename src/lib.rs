//! Core library for the flatshape command line application.
//!
//! The library turns arbitrarily nested records into flat, column-aligned
//! tables and back. The record model and path types live in [`model`], the
//! field-list generator in [`shape`], value flattening in [`flatten`], and
//! header-list merging in [`reconcile`]. [`table`] assembles rows from
//! records, [`io`] holds the spreadsheet and JSON adapters, and [`sync`]
//! orchestrates them for the command-line interface.

pub mod config;
pub mod error;
pub mod flatten;
pub mod io;
pub mod model;
pub mod query;
pub mod reconcile;
pub mod shape;
pub mod sync;
pub mod table;

pub use config::TraversalConfig;
pub use error::{Result, ToolError};
pub use flatten::{FlattenedRecord, flatten, flatten_with_width};
pub use model::{FieldList, Path, Record, Shaped};
pub use reconcile::{MergePolicy, merge_field_lists, shape_union};
pub use shape::generate_shape;
pub use table::{discover_fields, from_rows, to_rows};
