//! Include graph for features
//!
//! Holds the `<includes>` edges among a set of features with cycle
//! detection and install ordering. Uses petgraph for graph operations.

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use thiserror::Error;

use super::feature::Feature;
use super::version::VersionedIdentifier;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Including would create a cycle: {0} -> {1}")]
    CycleDetected(VersionedIdentifier, VersionedIdentifier),

    #[error("Feature not in graph: {0}")]
    FeatureNotFound(VersionedIdentifier),

    #[error("Feature includes itself: {0}")]
    SelfInclude(VersionedIdentifier),
}

/// Marks whether an include edge is optional
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IncludeEdge {
    pub optional: bool,
}

/// A directed graph of features, edges point from parent to included child
#[derive(Debug, Default)]
pub struct IncludeGraph {
    graph: DiGraph<VersionedIdentifier, IncludeEdge>,

    node_map: HashMap<VersionedIdentifier, NodeIndex>,

    /// Includes whose target is not part of the graph
    dangling: Vec<(VersionedIdentifier, VersionedIdentifier)>,
}

impl IncludeGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
            dangling: Vec::new(),
        }
    }

    /// Builds a graph from a set of features.
    ///
    /// Includes pointing outside the set are recorded as dangling
    /// instead of failing, so a partial closure can still be inspected.
    pub fn from_features<'a>(
        features: impl IntoIterator<Item = &'a Feature>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new();

        let features: Vec<_> = features.into_iter().collect();
        for feature in &features {
            graph.add_feature(feature.id.clone());
        }

        for feature in &features {
            for include in &feature.includes {
                let child = include.identifier();
                if graph.contains(child) {
                    graph.add_include(&feature.id, child, include.optional)?;
                } else {
                    graph.dangling.push((feature.id.clone(), child.clone()));
                }
            }
        }

        Ok(graph)
    }

    pub fn add_feature(&mut self, id: VersionedIdentifier) {
        if !self.node_map.contains_key(&id) {
            let idx = self.graph.add_node(id.clone());
            self.node_map.insert(id, idx);
        }
    }

    /// Adds an include edge: `parent` includes `child`
    pub fn add_include(
        &mut self,
        parent: &VersionedIdentifier,
        child: &VersionedIdentifier,
        optional: bool,
    ) -> Result<(), GraphError> {
        if parent == child {
            return Err(GraphError::SelfInclude(parent.clone()));
        }

        let parent_idx = *self
            .node_map
            .get(parent)
            .ok_or_else(|| GraphError::FeatureNotFound(parent.clone()))?;
        let child_idx = *self
            .node_map
            .get(child)
            .ok_or_else(|| GraphError::FeatureNotFound(child.clone()))?;

        let edge = self
            .graph
            .add_edge(parent_idx, child_idx, IncludeEdge { optional });

        if is_cyclic_directed(&self.graph) {
            self.graph.remove_edge(edge);
            return Err(GraphError::CycleDetected(parent.clone(), child.clone()));
        }

        Ok(())
    }

    /// Direct children of a feature
    pub fn children(&self, id: &VersionedIdentifier) -> Vec<VersionedIdentifier> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Features that directly include the given one
    pub fn parents(&self, id: &VersionedIdentifier) -> Vec<VersionedIdentifier> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &VersionedIdentifier, direction: Direction) -> Vec<VersionedIdentifier> {
        let idx = match self.node_map.get(id) {
            Some(idx) => *idx,
            None => return vec![],
        };

        let mut ids: Vec<_> = self
            .graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect();
        ids.sort();
        ids
    }

    /// Returns true if the include from `parent` to `child` is optional
    pub fn is_optional(&self, parent: &VersionedIdentifier, child: &VersionedIdentifier) -> bool {
        match (self.node_map.get(parent), self.node_map.get(child)) {
            (Some(p), Some(c)) => self
                .graph
                .find_edge(*p, *c)
                .and_then(|e| self.graph.edge_weight(e))
                .map(|edge| edge.optional)
                .unwrap_or(false),
            _ => false,
        }
    }

    /// All features with included children ordered before their parents
    pub fn install_order(&self) -> Result<Vec<VersionedIdentifier>, GraphError> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .rev()
                .filter_map(|idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => {
                // Unreachable while add_include keeps the graph acyclic
                let id = self.graph[cycle.node_id()].clone();
                Err(GraphError::CycleDetected(id.clone(), id))
            }
        }
    }

    pub fn is_cyclic(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Includes that point to features outside the graph, as `(parent, child)`
    pub fn dangling(&self) -> &[(VersionedIdentifier, VersionedIdentifier)] {
        &self.dangling
    }

    pub fn contains(&self, id: &VersionedIdentifier) -> bool {
        self.node_map.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &VersionedIdentifier> {
        self.node_map.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IncludedFeature;

    fn vid(s: &str) -> VersionedIdentifier {
        s.parse().unwrap()
    }

    #[test]
    fn empty_graph() {
        let graph = IncludeGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
    }

    #[test]
    fn add_include() {
        let mut graph = IncludeGraph::new();
        graph.add_feature(vid("p@1.0.0"));
        graph.add_feature(vid("c@1.0.0"));

        graph.add_include(&vid("p@1.0.0"), &vid("c@1.0.0"), true).unwrap();

        assert_eq!(graph.children(&vid("p@1.0.0")), vec![vid("c@1.0.0")]);
        assert_eq!(graph.parents(&vid("c@1.0.0")), vec![vid("p@1.0.0")]);
        assert!(graph.is_optional(&vid("p@1.0.0"), &vid("c@1.0.0")));
    }

    #[test]
    fn cycle_rejected_and_edge_removed() {
        let mut graph = IncludeGraph::new();
        for id in ["a@1.0.0", "b@1.0.0", "c@1.0.0"] {
            graph.add_feature(vid(id));
        }

        graph.add_include(&vid("a@1.0.0"), &vid("b@1.0.0"), false).unwrap();
        graph.add_include(&vid("b@1.0.0"), &vid("c@1.0.0"), false).unwrap();
        let result = graph.add_include(&vid("c@1.0.0"), &vid("a@1.0.0"), false);

        assert!(matches!(result, Err(GraphError::CycleDetected(_, _))));
        assert!(!graph.is_cyclic());
        assert!(graph.children(&vid("c@1.0.0")).is_empty());
    }

    #[test]
    fn self_include_rejected() {
        let mut graph = IncludeGraph::new();
        graph.add_feature(vid("a@1.0.0"));
        let result = graph.add_include(&vid("a@1.0.0"), &vid("a@1.0.0"), false);
        assert!(matches!(result, Err(GraphError::SelfInclude(_))));
    }

    #[test]
    fn unknown_feature_returns_error() {
        let mut graph = IncludeGraph::new();
        graph.add_feature(vid("a@1.0.0"));
        let result = graph.add_include(&vid("a@1.0.0"), &vid("b@1.0.0"), false);
        assert!(matches!(result, Err(GraphError::FeatureNotFound(_))));
    }

    #[test]
    fn install_order_puts_children_first() {
        let features = [
            Feature::new(vid("top@1.0.0"))
                .with_include(IncludedFeature::new(vid("mid@1.0.0"))),
            Feature::new(vid("mid@1.0.0"))
                .with_include(IncludedFeature::new(vid("leaf@1.0.0"))),
            Feature::new(vid("leaf@1.0.0")),
        ];
        let graph = IncludeGraph::from_features(features.iter()).unwrap();
        let order = graph.install_order().unwrap();

        let pos = |s: &str| order.iter().position(|id| id == &vid(s)).unwrap();
        assert!(pos("leaf@1.0.0") < pos("mid@1.0.0"));
        assert!(pos("mid@1.0.0") < pos("top@1.0.0"));
    }

    #[test]
    fn includes_outside_set_are_dangling() {
        let features = [Feature::new(vid("top@1.0.0"))
            .with_include(IncludedFeature::new(vid("gone@1.0.0")))];
        let graph = IncludeGraph::from_features(features.iter()).unwrap();

        assert_eq!(graph.len(), 1);
        assert_eq!(
            graph.dangling(),
            &[(vid("top@1.0.0"), vid("gone@1.0.0"))]
        );
    }
}
