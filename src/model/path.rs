use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator placed between path segments.
pub const SEPARATOR: char = '.';

/// Minimum number of digits used for sequence index segments.
pub const MIN_INDEX_WIDTH: usize = 2;

/// Dot-delimited address of one leaf attribute inside a nested record.
///
/// Paths are compared and deduplicated as opaque strings. The empty path is
/// the root of a record and never appears in a [`FieldList`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(String);

impl Path {
    /// The empty path addressing the record itself.
    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends one segment.
    pub fn join(&self, segment: &str) -> Path {
        if self.is_root() {
            return Path(segment.to_string());
        }
        let mut joined = String::with_capacity(self.0.len() + segment.len() + 1);
        joined.push_str(&self.0);
        joined.push(SEPARATOR);
        joined.push_str(segment);
        Path(joined)
    }

    /// Appends a zero-padded sequence index.
    pub fn join_index(&self, index: usize, width: usize) -> Path {
        self.join(&format!("{index:0width$}"))
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|segment| !segment.is_empty())
    }

    /// Everything before the final separator, if there is one.
    pub fn parent(&self) -> Option<&str> {
        self.0.rfind(SEPARATOR).map(|idx| &self.0[..idx])
    }

    pub fn last_segment(&self) -> &str {
        match self.0.rfind(SEPARATOR) {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// The first segment.
    pub fn top_level(&self) -> &str {
        match self.0.find(SEPARATOR) {
            Some(idx) => &self.0[..idx],
            None => &self.0,
        }
    }

    /// A bare path has a single segment and no parent to anchor to.
    pub fn is_bare(&self) -> bool {
        !self.is_root() && !self.0.contains(SEPARATOR)
    }

    pub fn is_descendant_of(&self, ancestor: &str) -> bool {
        if ancestor.is_empty() {
            return !self.is_root();
        }
        self.0.len() > ancestor.len()
            && self.0.starts_with(ancestor)
            && self.0[ancestor.len()..].starts_with(SEPARATOR)
    }

    /// The part of the path below `prefix`: empty when the two are equal,
    /// `None` when the path lies outside `prefix`.
    pub fn relative_to(&self, prefix: &Path) -> Option<&str> {
        if prefix.is_root() {
            return Some(&self.0);
        }
        if self.0 == prefix.0 {
            return Some("");
        }
        self.0
            .strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
    }

    /// Proper prefixes at segment boundaries, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &str> {
        self.0
            .char_indices()
            .rev()
            .filter(|(_, ch)| *ch == SEPARATOR)
            .map(|(idx, _)| &self.0[..idx])
    }

    /// Numeric value of the final segment when it consists only of digits.
    pub fn numeric_suffix(&self) -> Option<u64> {
        numeric_segment(self.last_segment())
    }
}

/// Parses a segment made solely of ASCII digits.
pub fn numeric_segment(segment: &str) -> Option<u64> {
    if segment.is_empty() || !segment.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Width of index segments for a record whose longest sequence holds
/// `longest` elements, so lexical order of indices matches numeric order.
pub fn index_width(longest: usize) -> usize {
    let mut digits = 1;
    let mut rest = longest / 10;
    while rest > 0 {
        digits += 1;
        rest /= 10;
    }
    digits.max(MIN_INDEX_WIDTH)
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "<root>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for Path {
    fn from(raw: &str) -> Self {
        Path(raw.to_string())
    }
}

impl From<String> for Path {
    fn from(raw: String) -> Self {
        Path(raw)
    }
}

impl From<&Path> for Path {
    fn from(path: &Path) -> Self {
        path.clone()
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Path {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Ordered, duplicate-free list of paths forming a column schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Path>", into = "Vec<Path>")]
pub struct FieldList {
    paths: Vec<Path>,
    seen: HashSet<Path>,
}

impl FieldList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the path unless it is already present or is the root.
    pub fn push(&mut self, path: Path) -> bool {
        if path.is_root() || self.seen.contains(&path) {
            return false;
        }
        self.seen.insert(path.clone());
        self.paths.push(path);
        true
    }

    /// Inserts the path at `index`, shifting later entries.
    pub fn insert(&mut self, index: usize, path: Path) -> bool {
        if path.is_root() || self.seen.contains(&path) {
            return false;
        }
        self.seen.insert(path.clone());
        self.paths.insert(index.min(self.paths.len()), path);
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.seen.contains(path)
    }

    /// Whether the path equals an entry or descends from one.
    pub fn selects(&self, path: &Path) -> bool {
        self.contains(path.as_str()) || path.ancestors().any(|ancestor| self.contains(ancestor))
    }

    pub fn position(&self, path: &str) -> Option<usize> {
        self.paths.iter().position(|p| p.as_str() == path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Path> {
        self.paths.iter()
    }

    pub fn as_slice(&self) -> &[Path] {
        &self.paths
    }

    /// Header cells for this list.
    pub fn to_strings(&self) -> Vec<String> {
        self.paths.iter().map(|p| p.as_str().to_string()).collect()
    }

    pub fn extend<I: IntoIterator<Item = Path>>(&mut self, paths: I) {
        for path in paths {
            self.push(path);
        }
    }
}

impl From<Vec<Path>> for FieldList {
    fn from(paths: Vec<Path>) -> Self {
        paths.into_iter().collect()
    }
}

impl From<FieldList> for Vec<Path> {
    fn from(list: FieldList) -> Self {
        list.paths
    }
}

impl<P: Into<Path>> FromIterator<P> for FieldList {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut list = FieldList::new();
        for path in iter {
            list.push(path.into());
        }
        list
    }
}

impl IntoIterator for FieldList {
    type Item = Path;
    type IntoIter = std::vec::IntoIter<Path>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

impl<'a> IntoIterator for &'a FieldList {
    type Item = &'a Path;
    type IntoIter = std::slice::Iter<'a, Path>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_width_has_two_digit_floor() {
        assert_eq!(index_width(0), 2);
        assert_eq!(index_width(12), 2);
        assert_eq!(index_width(99), 2);
        assert_eq!(index_width(150), 3);
        assert_eq!(index_width(1000), 4);
    }

    #[test]
    fn join_index_pads_to_width() {
        let path = Path::from("tags");
        assert_eq!(path.join_index(3, 2).as_str(), "tags.03");
        assert_eq!(path.join_index(7, 3).as_str(), "tags.007");
        assert_eq!(Path::root().join_index(1, 2).as_str(), "01");
    }

    #[test]
    fn segment_accessors() {
        let path = Path::from("address.geo.lat");
        assert_eq!(path.parent(), Some("address.geo"));
        assert_eq!(path.last_segment(), "lat");
        assert_eq!(path.top_level(), "address");
        assert!(!path.is_bare());
        assert_eq!(path.ancestors().collect::<Vec<_>>(), vec!["address.geo", "address"]);
        assert!(Path::from("name").is_bare());
        assert_eq!(Path::from("name").parent(), None);
    }

    #[test]
    fn descendant_requires_segment_boundary() {
        let child = Path::from("tags.01");
        assert!(child.is_descendant_of("tags"));
        assert!(!Path::from("tagsets.01").is_descendant_of("tags"));
        assert!(!Path::from("tags").is_descendant_of("tags"));
    }

    #[test]
    fn relative_to_strips_prefix_at_boundary() {
        let items = Path::from("items");
        assert_eq!(Path::from("items.meta.color").relative_to(&items), Some("meta.color"));
        assert_eq!(Path::from("items").relative_to(&items), Some(""));
        assert_eq!(Path::from("itemset.a").relative_to(&items), None);
        assert_eq!(Path::from("a.b").relative_to(&Path::root()), Some("a.b"));
    }

    #[test]
    fn numeric_suffix_only_for_digit_segments() {
        assert_eq!(Path::from("tags.07").numeric_suffix(), Some(7));
        assert_eq!(Path::from("tags.x7").numeric_suffix(), None);
        assert_eq!(Path::from("12").numeric_suffix(), Some(12));
    }

    #[test]
    fn field_list_rejects_duplicates() {
        let mut list: FieldList = ["name", "age"].into_iter().collect();
        assert!(!list.push(Path::from("name")));
        assert!(list.insert(1, Path::from("email")));
        assert_eq!(list.to_strings(), vec!["name", "email", "age"]);
        assert!(list.selects(&Path::from("email")));
        assert!(list.selects(&Path::from("age.years")));
        assert!(!list.selects(&Path::from("ages")));
    }

    #[test]
    fn field_list_serializes_as_array() {
        let list: FieldList = ["a", "b.c"].into_iter().collect();
        let json = serde_json::to_string(&list).expect("serialized");
        assert_eq!(json, r#"["a","b.c"]"#);
        let restored: FieldList = serde_json::from_str(r#"["a","b.c","a"]"#).expect("parsed");
        assert_eq!(restored, list);
    }
}
