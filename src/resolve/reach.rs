//! Dependency reachability
//!
//! Depth-first walks over link edges. Interface (header-only) targets are
//! valid nodes but contribute no edges of their own. Every walk keeps a
//! visited set; acyclic input is still a precondition, a cyclic graph only
//! yields an unspecified (but finite) answer.

use super::alias::canonical;
use crate::graph::{TargetGraph, TargetId, TargetKind};
use indexmap::IndexSet;
use rustc_hash::FxHashSet;

fn link_edges(graph: &TargetGraph, id: TargetId) -> Vec<TargetId> {
    if graph[id].kind == TargetKind::Interface {
        return Vec::new();
    }
    graph.dependencies(id).into_iter().map(|(t, _)| t).collect()
}

/// Is `b` a direct or transitive link dependency of `a`?
pub fn depends_on(graph: &TargetGraph, a: TargetId, b: TargetId) -> bool {
    let a = canonical(graph, a);
    let b = canonical(graph, b);
    let mut visited = FxHashSet::default();
    let mut stack = link_edges(graph, a);

    while let Some(next) = stack.pop() {
        if next == b {
            return true;
        }
        if visited.insert(next) {
            stack.extend(link_edges(graph, next));
        }
    }
    false
}

/// All targets reachable from `root` through link edges, depth-first
/// pre-order, excluding `root`.
pub fn reachable(graph: &TargetGraph, root: TargetId) -> IndexSet<TargetId> {
    let root = canonical(graph, root);
    let mut out = IndexSet::new();
    let mut visited = FxHashSet::default();
    visited.insert(root);
    visit(graph, root, &mut visited, &mut out);
    out
}

fn visit(
    graph: &TargetGraph,
    id: TargetId,
    visited: &mut FxHashSet<TargetId>,
    out: &mut IndexSet<TargetId>,
) {
    for dep in link_edges(graph, id) {
        if visited.insert(dep) {
            out.insert(dep);
            visit(graph, dep, visited, out);
        }
    }
}

/// Flat, deduplicated list of device libraries reachable from `consumer`,
/// as canonical middle targets.
///
/// The consumer's own library is never part of the result.
pub fn gather_device_libraries(graph: &TargetGraph, consumer: TargetId) -> Vec<TargetId> {
    let consumer = canonical(graph, consumer);
    let own = graph[consumer].shadows.map(|r| r.middle);
    let root = own.unwrap_or(consumer);

    reachable(graph, root)
        .into_iter()
        .filter_map(|id| graph[id].shadows.map(|r| r.middle))
        .filter(|middle| Some(*middle) != own)
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}
