//! Target graph storage
//!
//! Targets are petgraph nodes, dependency edges carry their [`Visibility`].
//! Nothing is ever removed during a construction pass, so node and edge
//! indices are stable and edge indices reflect declaration order.

use super::target::{Target, TargetId, Visibility};
use crate::diagnostics::BuildError;
use indexmap::IndexMap;
use petgraph::Direction;
use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;
use std::ops::{Index, IndexMut};

/// The build graph of one construction pass
#[derive(Debug, Default, Clone)]
pub struct TargetGraph {
    graph: DiGraph<Target, Visibility>,
    /// Name -> target, in declaration order
    names: IndexMap<String, TargetId>,
}

impl TargetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new target
    pub fn insert(&mut self, target: Target) -> Result<TargetId, BuildError> {
        if self.names.contains_key(&target.name) {
            return Err(BuildError::DuplicateTarget { name: target.name });
        }
        let name = target.name.clone();
        let id = TargetId(self.graph.add_node(target));
        self.names.insert(name, id);
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Option<TargetId> {
        self.names.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.graph.node_weight(id.0)
    }

    pub fn name(&self, id: TargetId) -> &str {
        &self[id].name
    }

    /// User-visible name: the logical library for shadow targets
    pub fn display_name(&self, id: TargetId) -> &str {
        match self[id].shadows {
            Some(refs) => self.name(refs.logical),
            None => self.name(id),
        }
    }

    /// Add (or widen) a dependency edge. Returns `true` if the edge is new.
    pub fn link(
        &mut self,
        consumer: TargetId,
        dependency: TargetId,
        visibility: Visibility,
    ) -> bool {
        if let Some(edge) = self.graph.find_edge(consumer.0, dependency.0) {
            let current = self.graph[edge];
            self.graph[edge] = current.merge(visibility);
            false
        } else {
            self.graph.add_edge(consumer.0, dependency.0, visibility);
            true
        }
    }

    /// Direct dependencies in declaration order
    pub fn dependencies(&self, id: TargetId) -> Vec<(TargetId, Visibility)> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(id.0, Direction::Outgoing)
            .map(|e| (e.id(), TargetId(e.target()), *e.weight()))
            .collect();
        edges.sort_by_key(|(edge, _, _)| *edge);
        edges.into_iter().map(|(_, t, v)| (t, v)).collect()
    }

    pub fn has_edge(&self, consumer: TargetId, dependency: TargetId) -> bool {
        self.graph.find_edge(consumer.0, dependency.0).is_some()
    }

    /// All target IDs in declaration order
    pub fn ids(&self) -> Vec<TargetId> {
        self.names.values().copied().collect()
    }

    /// All targets in declaration order
    pub fn targets(&self) -> impl Iterator<Item = (TargetId, &Target)> {
        self.names.values().map(|&id| (id, &self[id]))
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Index<TargetId> for TargetGraph {
    type Output = Target;

    fn index(&self, id: TargetId) -> &Target {
        &self.graph[id.0]
    }
}

impl IndexMut<TargetId> for TargetGraph {
    fn index_mut(&mut self, id: TargetId) -> &mut Target {
        &mut self.graph[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{OutputKind, TargetKind};

    fn plain(name: &str) -> Target {
        Target::new(name, TargetKind::Plain, Some(OutputKind::SharedLibrary))
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut g = TargetGraph::new();
        g.insert(plain("a")).unwrap();
        let err = g.insert(plain("a")).unwrap_err();
        assert_eq!(err, BuildError::DuplicateTarget { name: "a".into() });
    }

    #[test]
    fn test_dependencies_keep_declaration_order() {
        let mut g = TargetGraph::new();
        let a = g.insert(plain("a")).unwrap();
        let b = g.insert(plain("b")).unwrap();
        let c = g.insert(plain("c")).unwrap();
        let d = g.insert(plain("d")).unwrap();

        g.link(a, c, Visibility::Private);
        g.link(a, b, Visibility::Public);
        g.link(a, d, Visibility::Interface);

        let deps: Vec<_> = g.dependencies(a).into_iter().map(|(t, _)| t).collect();
        assert_eq!(deps, vec![c, b, d]);
    }

    #[test]
    fn test_relink_widens_visibility() {
        let mut g = TargetGraph::new();
        let a = g.insert(plain("a")).unwrap();
        let b = g.insert(plain("b")).unwrap();

        assert!(g.link(a, b, Visibility::Private));
        assert!(!g.link(a, b, Visibility::Interface));
        assert_eq!(g.dependencies(a), vec![(b, Visibility::Public)]);
        assert_eq!(g.edge_count(), 1);
    }
}
