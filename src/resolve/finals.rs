//! Minimal final-library resolution
//!
//! A consumer needs one device-link step per *maximal* device library it
//! reaches: a library that another reached library depends on is already
//! device-linked into that library's final target.

use super::reach::{depends_on, gather_device_libraries};
use crate::graph::{TargetGraph, TargetId};
use tracing::trace;

/// Reduce device libraries to the maximal antichain under `depends_on`.
///
/// Folds left to right; when two candidates are related, the one that depends
/// on the other survives. Unrelated candidates are both kept.
pub fn maximal_antichain(graph: &TargetGraph, candidates: &[TargetId]) -> Vec<TargetId> {
    let mut kept: Vec<TargetId> = Vec::new();

    for &candidate in candidates {
        let subsumed = kept
            .iter()
            .any(|&k| k == candidate || depends_on(graph, k, candidate));
        if subsumed {
            trace!(
                "`{}` is subsumed by a kept device library",
                graph.display_name(candidate)
            );
            continue;
        }
        kept.retain(|&k| !depends_on(graph, candidate, k));
        kept.push(candidate);
    }

    kept
}

/// Final targets `consumer` must perform or link against, in discovery order
pub fn resolve_final_libraries(graph: &TargetGraph, consumer: TargetId) -> Vec<TargetId> {
    let gathered = gather_device_libraries(graph, consumer);
    maximal_antichain(graph, &gathered)
        .into_iter()
        .filter_map(|middle| graph[middle].shadows.map(|r| r.final_lib))
        .collect()
}
