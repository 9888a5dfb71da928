// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Minimal in-memory concrete resource graph used by the resolver and tests.
use std::collections::{BTreeMap, BTreeSet};

use crate::constraint::EdgeData;
use crate::error::{ResolveError, ResolveResult};
use crate::ident::ResourceId;
use crate::record::{ConcreteEdge, Resource};

/// In-memory resource graph.
///
/// Adjacency is kept in both directions so upstream and downstream walks
/// cost the same. All maps are ordered, so every iteration is deterministic.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    resources: BTreeMap<ResourceId, Resource>,
    edges_from: BTreeMap<ResourceId, BTreeSet<ResourceId>>,
    edges_to: BTreeMap<ResourceId, BTreeSet<ResourceId>>,
    edge_data: BTreeMap<ConcreteEdge, EdgeData>,
}

impl ResourceGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// True when the graph holds no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges_from.values().map(BTreeSet::len).sum()
    }

    /// Iterate over all resources in id order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Iterate over all edges in `(source, target)` order.
    pub fn edges(&self) -> impl Iterator<Item = ConcreteEdge> + '_ {
        self.edges_from.iter().flat_map(|(source, targets)| {
            targets
                .iter()
                .map(move |target| ConcreteEdge::new(source.clone(), target.clone()))
        })
    }

    /// Returns a shared reference to a resource when it exists.
    #[must_use]
    pub fn resource(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.get(id)
    }

    /// Returns a mutable reference to a resource when it exists.
    pub fn resource_mut(&mut self, id: &ResourceId) -> Option<&mut Resource> {
        self.resources.get_mut(id)
    }

    /// Returns `true` if a resource with `id` exists.
    #[must_use]
    pub fn contains(&self, id: &ResourceId) -> bool {
        self.resources.contains_key(id)
    }

    /// Inserts a resource unless one with the same id exists. Returns whether
    /// the resource was inserted; an existing resource is left untouched.
    pub fn add_resource(&mut self, resource: Resource) -> bool {
        if self.resources.contains_key(&resource.id) {
            return false;
        }
        self.resources.insert(resource.id.clone(), resource);
        true
    }

    /// Inserts or replaces a resource.
    pub fn upsert_resource(&mut self, resource: Resource) {
        self.resources.insert(resource.id.clone(), resource);
    }

    /// Inserts the edge `source -> target`. Both endpoints must exist.
    /// Inserting an existing edge is a no-op that keeps its data.
    pub fn add_edge(&mut self, source: &ResourceId, target: &ResourceId) -> ResolveResult<()> {
        for end in [source, target] {
            if !self.resources.contains_key(end) {
                return Err(ResolveError::MissingResource(end.clone()));
            }
        }
        self.edges_from
            .entry(source.clone())
            .or_default()
            .insert(target.clone());
        self.edges_to
            .entry(target.clone())
            .or_default()
            .insert(source.clone());
        Ok(())
    }

    /// Inserts the edge and attaches caller annotations to it.
    pub fn add_edge_with_data(
        &mut self,
        source: &ResourceId,
        target: &ResourceId,
        data: EdgeData,
    ) -> ResolveResult<()> {
        self.add_edge(source, target)?;
        self.edge_data
            .insert(ConcreteEdge::new(source.clone(), target.clone()), data);
        Ok(())
    }

    /// Returns `true` if the edge `source -> target` exists.
    #[must_use]
    pub fn has_edge(&self, source: &ResourceId, target: &ResourceId) -> bool {
        self.edges_from
            .get(source)
            .is_some_and(|targets| targets.contains(target))
    }

    /// Annotations attached to an edge, if any.
    #[must_use]
    pub fn edge_data(&self, source: &ResourceId, target: &ResourceId) -> Option<&EdgeData> {
        self.edge_data
            .get(&ConcreteEdge::new(source.clone(), target.clone()))
    }

    /// Removes an edge and its annotations. Returns whether it existed.
    pub fn remove_edge(&mut self, source: &ResourceId, target: &ResourceId) -> bool {
        let removed = self
            .edges_from
            .get_mut(source)
            .is_some_and(|targets| targets.remove(target));
        if removed {
            if let Some(sources) = self.edges_to.get_mut(target) {
                sources.remove(source);
            }
            self.edge_data
                .remove(&ConcreteEdge::new(source.clone(), target.clone()));
        }
        removed
    }

    /// Direct dependencies of `id` (targets of its outgoing edges).
    pub fn targets_of(&self, id: &ResourceId) -> impl Iterator<Item = &ResourceId> {
        self.edges_from.get(id).into_iter().flatten()
    }

    /// Direct dependents of `id` (sources of its incoming edges).
    pub fn sources_of(&self, id: &ResourceId) -> impl Iterator<Item = &ResourceId> {
        self.edges_to.get(id).into_iter().flatten()
    }
}
