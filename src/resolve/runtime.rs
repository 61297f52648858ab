//! Device-runtime uniformity
//!
//! A target without a declared runtime mode inherits the mode of the first
//! dependency that has one. A declared mode that disagrees with a dependency,
//! or two dependencies that disagree with each other, is a fatal error.

use crate::diagnostics::BuildError;
use crate::graph::{RuntimeMode, TargetGraph, TargetId};
use rustc_hash::FxHashSet;
use tracing::debug;

/// Effective mode of a target together with the target that declared it
pub fn binding(graph: &TargetGraph, id: TargetId) -> Option<(RuntimeMode, TargetId)> {
    let target = &graph[id];
    target
        .runtime
        .is_set()
        .then(|| (target.runtime, target.runtime_origin.unwrap_or(id)))
}

/// Do both targets belong to the same logical library?
fn same_library(graph: &TargetGraph, a: TargetId, b: TargetId) -> bool {
    if a == b {
        return true;
    }
    match (graph[a].shadows, graph[b].shadows) {
        (Some(ra), Some(rb)) => ra.logical == rb.logical,
        _ => false,
    }
}

/// Declare a runtime mode on `id`, attributing it to `origin`
pub fn declare(graph: &mut TargetGraph, id: TargetId, mode: RuntimeMode, origin: TargetId) {
    let target = &mut graph[id];
    target.runtime = mode;
    target.runtime_origin = mode.is_set().then_some(origin);
}

/// Reconcile `consumer`'s mode with a dependency's, inheriting when unset
pub fn inherit(
    graph: &mut TargetGraph,
    consumer: TargetId,
    dependency: TargetId,
) -> Result<(), BuildError> {
    let Some((dep_mode, dep_origin)) = binding(graph, dependency) else {
        return Ok(());
    };

    match binding(graph, consumer) {
        None => {
            debug!(
                "`{}` inherits the {} device runtime from `{}`",
                graph.name(consumer),
                dep_mode,
                graph.display_name(dep_origin)
            );
            declare(graph, consumer, dep_mode, dep_origin);
            Ok(())
        }
        Some((mode, _)) if mode == dep_mode => Ok(()),
        Some((mode, origin)) if same_library(graph, origin, consumer) => {
            Err(BuildError::RuntimeModeMismatch {
                target: graph.display_name(consumer).to_string(),
                target_mode: mode,
                dependency: graph.display_name(dependency).to_string(),
                dependency_mode: dep_mode,
            })
        }
        Some((mode, origin)) => Err(BuildError::ConflictingRuntimeModes {
            consumer: graph.display_name(consumer).to_string(),
            first: graph.display_name(origin).to_string(),
            first_mode: mode,
            second: graph.display_name(dep_origin).to_string(),
            second_mode: dep_mode,
        }),
    }
}

/// Recompute every inherited mode from scratch and check the whole graph
pub fn validate(graph: &mut TargetGraph) -> Result<(), BuildError> {
    for id in graph.ids() {
        if let Some(origin) = graph[id].runtime_origin {
            if !same_library(graph, origin, id) {
                declare(graph, id, RuntimeMode::Unset, id);
            }
        }
    }

    let mut settled = FxHashSet::default();
    for id in graph.ids() {
        settle(graph, id, &mut settled)?;
    }
    Ok(())
}

fn settle(
    graph: &mut TargetGraph,
    id: TargetId,
    settled: &mut FxHashSet<TargetId>,
) -> Result<(), BuildError> {
    if !settled.insert(id) {
        return Ok(());
    }
    for (dep, _) in graph.dependencies(id) {
        settle(graph, dep, settled)?;
        inherit(graph, id, dep)?;
    }
    Ok(())
}
