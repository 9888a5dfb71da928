// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Read-only view over a [`ResourceGraph`].
//!
//! Neighborhood queries and candidate scoring observe the graph through
//! [`GraphView`]; only the expander and the orchestrator mutate it.
use crate::constraint::EdgeData;
use crate::graph::ResourceGraph;
use crate::ident::ResourceId;
use crate::record::{ConcreteEdge, Resource};

/// Read-only view over a [`ResourceGraph`].
///
/// Do not add `Deref<Target = ResourceGraph>` or any method returning a
/// mutable reference to the graph.
#[derive(Debug, Clone, Copy)]
pub struct GraphView<'a> {
    graph: &'a ResourceGraph,
}

impl<'a> GraphView<'a> {
    /// Creates a new read-only view over the given graph.
    #[must_use]
    pub fn new(graph: &'a ResourceGraph) -> Self {
        Self { graph }
    }

    /// Returns a shared reference to a resource when it exists.
    #[must_use]
    pub fn resource(&self, id: &ResourceId) -> Option<&'a Resource> {
        self.graph.resource(id)
    }

    /// Returns `true` if a resource with `id` exists.
    #[must_use]
    pub fn contains(&self, id: &ResourceId) -> bool {
        self.graph.contains(id)
    }

    /// Returns `true` if the edge `source -> target` exists.
    #[must_use]
    pub fn has_edge(&self, source: &ResourceId, target: &ResourceId) -> bool {
        self.graph.has_edge(source, target)
    }

    /// Annotations attached to an edge, if any.
    #[must_use]
    pub fn edge_data(&self, source: &ResourceId, target: &ResourceId) -> Option<&'a EdgeData> {
        self.graph.edge_data(source, target)
    }

    /// Iterate over all resources in id order.
    pub fn resources(&self) -> impl Iterator<Item = &'a Resource> {
        self.graph.resources()
    }

    /// Iterate over all edges in `(source, target)` order.
    pub fn edges(&self) -> impl Iterator<Item = ConcreteEdge> + 'a {
        self.graph.edges()
    }

    /// Direct dependencies of `id`.
    pub fn targets_of(&self, id: &ResourceId) -> impl Iterator<Item = &'a ResourceId> {
        self.graph.targets_of(id)
    }

    /// Direct dependents of `id`.
    pub fn sources_of(&self, id: &ResourceId) -> impl Iterator<Item = &'a ResourceId> {
        self.graph.sources_of(id)
    }
}
