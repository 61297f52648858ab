//! Property propagation
//!
//! Two mechanisms keep requirements consistent across the expanded graph:
//!
//! - ordinary usage requirements flow along dependency edges and are
//!   computed on demand by [`usage_requirements`];
//! - the final target of a device library is not a symbol-linking dependent
//!   of its static shadow, so compile and link requirements declared on the
//!   static shadow are copied onto it explicitly by [`catch_up_final`].

use crate::graph::{PropertyKind, ShadowRefs, TargetGraph, TargetId, Visibility};
use crate::resolve::canonical;
use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use tracing::trace;

/// Copy `source`'s own and interface values of `kind` into `dependent`'s own
/// scope. Returns the values that were not already present.
pub fn copy_property(
    graph: &mut TargetGraph,
    source: TargetId,
    dependent: TargetId,
    kind: PropertyKind,
) -> Vec<String> {
    let values = graph[source].properties.get(kind).all();
    let added = graph[dependent]
        .properties
        .get_mut(kind)
        .merge_own(values.iter());
    if !added.is_empty() {
        trace!(
            "copied {} {kind} value(s) from `{}` to `{}`",
            added.len(),
            graph.name(source),
            graph.name(dependent)
        );
    }
    added
}

/// Bring a device library's final target up to date with its static shadow.
/// Returns the newly copied values per property kind.
pub fn catch_up_final(
    graph: &mut TargetGraph,
    refs: &ShadowRefs,
) -> Vec<(PropertyKind, Vec<String>)> {
    PropertyKind::FINAL_CATCH_UP
        .iter()
        .map(|&kind| (kind, copy_property(graph, refs.static_lib, refs.final_lib, kind)))
        .filter(|(_, added)| !added.is_empty())
        .collect()
}

/// Add values to a target in the scopes selected by `visibility`
pub fn add_values(
    graph: &mut TargetGraph,
    target: TargetId,
    kind: PropertyKind,
    visibility: Visibility,
    values: &[String],
) {
    graph[target]
        .properties
        .get_mut(kind)
        .add(visibility, values.iter().cloned());
}

/// Effective values of `kind` for building `target`: its own values followed
/// by the interface values of its dependencies, transitively through edges
/// that re-export.
pub fn usage_requirements(
    graph: &TargetGraph,
    target: TargetId,
    kind: PropertyKind,
) -> Vec<String> {
    let target = canonical(graph, target);
    let mut out: IndexSet<String> = graph[target].properties.get(kind).own.clone();
    let mut visited = FxHashSet::default();
    visited.insert(target);

    for (dep, _) in graph.dependencies(target) {
        collect_interface(graph, dep, kind, &mut visited, &mut out);
    }
    out.into_iter().collect()
}

fn collect_interface(
    graph: &TargetGraph,
    id: TargetId,
    kind: PropertyKind,
    visited: &mut FxHashSet<TargetId>,
    out: &mut IndexSet<String>,
) {
    if !visited.insert(id) {
        return;
    }
    out.extend(graph[id].properties.get(kind).interface.iter().cloned());
    for (dep, visibility) in graph.dependencies(id) {
        if visibility.exported() {
            collect_interface(graph, dep, kind, visited, out);
        }
    }
}
