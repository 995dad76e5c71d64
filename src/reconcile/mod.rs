//! Merging of ordered field lists.
//!
//! Both policies keep every baseline entry in its baseline position, except
//! that a bare entry may be replaced in place by its own children. New
//! entries are inserted next to their nearest relative. Merging a list with
//! a candidate twice gives the same result as merging it once.

use std::collections::BTreeMap;

use tracing::trace;

use crate::model::path::{SEPARATOR, numeric_segment};
use crate::model::{FieldList, Path};

/// Which merge policy to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Reconciles per-element shapes of a heterogeneous collection.
    ShapeUnion,
    /// Reconciles a published header list against a regenerated one.
    #[default]
    External,
}

pub fn merge(baseline: &FieldList, candidate: &FieldList, policy: MergePolicy) -> FieldList {
    match policy {
        MergePolicy::ShapeUnion => shape_union(baseline, candidate),
        MergePolicy::External => merge_field_lists(baseline, candidate),
    }
}

/// Shape-union policy.
///
/// A bare baseline entry (a single segment) that the candidate no longer
/// lists but has descendants for is replaced in place by them: index
/// children first in numeric order, then the others in candidate order.
/// Remaining candidate entries go after the last entry sharing their
/// top-level segment, or at the end.
pub fn shape_union(baseline: &FieldList, candidate: &FieldList) -> FieldList {
    shape_union_within(&Path::root(), baseline, candidate)
}

/// [`shape_union`] for lists whose entries all sit under `prefix`, such as
/// the element shapes of a nested sequence. Bareness and top-level segments
/// are judged below `prefix`.
pub(crate) fn shape_union_within(
    prefix: &Path,
    baseline: &FieldList,
    candidate: &FieldList,
) -> FieldList {
    let mut merged = FieldList::new();

    for entry in baseline {
        if is_bare_within(prefix, entry) && !candidate.contains(entry.as_str()) {
            let mut children: Vec<&Path> = candidate
                .iter()
                .filter(|c| c.is_descendant_of(entry.as_str()) && !baseline.contains(c.as_str()))
                .collect();
            if !children.is_empty() {
                order_children(entry, &mut children);
                trace!(
                    %entry,
                    count = children.len(),
                    "replacing bare entry with candidate children"
                );
                merged.extend(children.into_iter().cloned());
                continue;
            }
        }
        merged.push(entry.clone());
    }

    for entry in candidate {
        if !merged.contains(entry.as_str()) {
            insert_near_top_level(prefix, &mut merged, entry.clone());
        }
    }

    merged
}

/// External field-list merge.
///
/// New candidate entries are bucketed by the shape of their final segment:
/// numeric (sequence indices), named children of a dotted parent, and bare
/// entries. A bare baseline entry that the candidate no longer lists but has
/// children for is replaced in place, numeric children first. Leftover
/// groups are anchored after their parent's subtree when the parent is
/// present, otherwise after the last entry sharing their top-level segment.
/// Leftover bare entries are appended.
///
/// Named children keep the order the candidate gives them rather than being
/// sorted, so `["name", "age"]` merged with `["name", "age.years",
/// "age.months"]` gives `["name", "age.years", "age.months"]`.
pub fn merge_field_lists(baseline: &FieldList, candidate: &FieldList) -> FieldList {
    let mut numeric: BTreeMap<&str, Vec<(u64, &Path)>> = BTreeMap::new();
    let mut named: BTreeMap<&str, Vec<&Path>> = BTreeMap::new();
    let mut bare: Vec<&Path> = Vec::new();

    for entry in candidate.iter().filter(|c| !baseline.contains(c.as_str())) {
        match (entry.parent(), entry.numeric_suffix()) {
            (Some(parent), Some(index)) => numeric.entry(parent).or_default().push((index, entry)),
            (Some(parent), None) => named.entry(parent).or_default().push(entry),
            (None, _) => bare.push(entry),
        }
    }
    for group in numeric.values_mut() {
        group.sort_by_key(|(index, _)| *index);
    }

    let mut merged = FieldList::new();
    for entry in baseline {
        if entry.is_bare() && !candidate.contains(entry.as_str()) {
            let numeric_children = numeric.remove(entry.as_str()).unwrap_or_default();
            let named_children = named.remove(entry.as_str()).unwrap_or_default();
            if !numeric_children.is_empty() || !named_children.is_empty() {
                trace!(
                    %entry,
                    numeric = numeric_children.len(),
                    named = named_children.len(),
                    "replacing bare entry with candidate children"
                );
                merged.extend(numeric_children.into_iter().map(|(_, path)| path.clone()));
                merged.extend(named_children.into_iter().cloned());
                continue;
            }
        }
        merged.push(entry.clone());
    }

    for (parent, group) in numeric {
        insert_group(&mut merged, parent, group.into_iter().map(|(_, path)| path));
    }
    for (parent, group) in named {
        insert_group(&mut merged, parent, group.into_iter());
    }

    merged.extend(bare.into_iter().cloned());
    merged
}

/// Numeric-indexed children in index order, then named children in the
/// order the candidate listed them.
fn order_children(anchor: &Path, children: &mut [&Path]) {
    children.sort_by_key(|child| {
        let first = child
            .relative_to(anchor)
            .and_then(|rest| rest.split(SEPARATOR).next())
            .unwrap_or_default();
        match numeric_segment(first) {
            Some(index) => (0, index),
            None => (1, 0),
        }
    });
}

fn insert_group<'a>(merged: &mut FieldList, parent: &str, group: impl Iterator<Item = &'a Path>) {
    let mut anchor = if merged.contains(parent) {
        last_position(merged, |entry| {
            entry.as_str() == parent || entry.is_descendant_of(parent)
        })
    } else {
        None
    };
    if anchor.is_none() {
        let top_level = Path::from(parent).top_level().to_string();
        anchor = last_position(merged, |entry| entry.top_level() == top_level);
    }

    let mut at = anchor.map(|idx| idx + 1).unwrap_or(merged.len());
    for entry in group {
        if merged.insert(at, entry.clone()) {
            at += 1;
        }
    }
}

fn insert_near_top_level(prefix: &Path, merged: &mut FieldList, entry: Path) {
    let top_level = top_level_within(prefix, &entry);
    let anchor = last_position(merged, |existing| top_level_within(prefix, existing) == top_level);
    match anchor {
        Some(idx) => merged.insert(idx + 1, entry),
        None => merged.push(entry),
    };
}

fn is_bare_within(prefix: &Path, entry: &Path) -> bool {
    entry
        .relative_to(prefix)
        .is_some_and(|rest| !rest.contains(SEPARATOR))
}

fn top_level_within<'a>(prefix: &Path, entry: &'a Path) -> &'a str {
    match entry.relative_to(prefix) {
        Some(rest) => rest.split(SEPARATOR).next().unwrap_or_default(),
        None => entry.top_level(),
    }
}

fn last_position(list: &FieldList, predicate: impl Fn(&Path) -> bool) -> Option<usize> {
    list.iter().rposition(|entry| predicate(entry))
}
