use crate::model::AnnotationPriority;

/// Marker written for leaves that were never populated.
pub const ABSENT_MARKER: &str = "<nil>";

/// Default bound on nesting depth during traversal.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options shared by shape generation, flattening, and query building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalConfig {
    /// Annotation namespaces in the order they are consulted.
    pub priority: AnnotationPriority,
    /// Absent optional composites contribute no paths instead of their
    /// declared shape.
    pub exclude_absent: bool,
    /// Text written for absent leaves; distinct from an empty string.
    pub absent_marker: String,
    pub max_depth: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            priority: AnnotationPriority::default(),
            exclude_absent: false,
            absent_marker: ABSENT_MARKER.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl TraversalConfig {
    pub fn priority(mut self, priority: AnnotationPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn exclude_absent(mut self, exclude: bool) -> Self {
        self.exclude_absent = exclude;
        self
    }

    pub fn absent_marker(mut self, marker: impl Into<String>) -> Self {
        self.absent_marker = marker.into();
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}
