//! Alias canonicalization
//!
//! Every other component works on canonical targets. A reference is
//! canonicalized by following `alias_of` until a non-alias target is reached;
//! a *link target* is additionally redirected to the canonical middle target
//! when it belongs to an expanded device library.

use crate::graph::{TargetGraph, TargetId};
use rustc_hash::FxHashSet;

/// Follow alias chains to the canonical target.
///
/// A malformed alias cycle stops at the first repeated target.
pub fn canonical(graph: &TargetGraph, id: TargetId) -> TargetId {
    let mut current = id;
    let mut seen = FxHashSet::default();
    while let Some(next) = graph[current].alias_of {
        if !seen.insert(current) {
            break;
        }
        current = next;
    }
    current
}

/// Look a name up and canonicalize it
pub fn lookup_canonical(graph: &TargetGraph, name: &str) -> Option<TargetId> {
    graph.lookup(name).map(|id| canonical(graph, id))
}

/// Target an edge that nominally points at `id` must point at.
///
/// Any shadow of a device library (including its final target) is
/// redirected to the canonical middle, so final targets never become
/// dependency edge targets.
pub fn link_target(graph: &TargetGraph, id: TargetId) -> TargetId {
    let id = canonical(graph, id);
    match graph[id].shadows {
        Some(refs) => refs.middle,
        None => id,
    }
}

/// Does this target need the shadow-aware code paths?
///
/// This is the single capability check every façade operation consults.
pub fn is_device_aware(graph: &TargetGraph, id: TargetId) -> bool {
    let id = canonical(graph, id);
    graph[id].shadows.is_some() || graph[id].contains_device_code()
}
