// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Knowledge base port and the in-memory template store.
//!
//! The resolver only reads from a [`KnowledgeBase`]. Callers construct one
//! explicitly (usually a [`TemplateKb`]) and pass it by reference for the
//! lifetime of a run.
use std::collections::BTreeMap;

use petgraph::algo::all_simple_paths;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::{ResolveError, ResolveResult};
use crate::ident::ResourceId;
use crate::template::{EdgeTemplate, Functionality, ResourceTemplate};

/// Read-only queries over the template graph.
pub trait KnowledgeBase {
    /// True when an edge template connects the two types directly.
    fn has_direct_path(&self, from: &ResourceId, to: &ResourceId) -> bool;

    /// Every simple template path from `from`'s type to `to`'s type with at
    /// most `max_nodes` nodes, in a stable order. Paths hold type patterns.
    fn all_paths(
        &self,
        from: &ResourceId,
        to: &ResourceId,
        max_nodes: usize,
    ) -> ResolveResult<Vec<Vec<ResourceId>>>;

    /// Edge template between two types, if declared.
    fn edge_template(&self, from: &ResourceId, to: &ResourceId) -> Option<&EdgeTemplate>;

    /// Resource template for `id`'s type.
    fn resource_template(&self, id: &ResourceId) -> ResolveResult<&ResourceTemplate>;

    /// Every resource template, ordered by type.
    fn list_resources(&self) -> Vec<&ResourceTemplate>;

    /// Functionality of `id`'s type; `Unknown` when no template exists.
    fn functionality(&self, id: &ResourceId) -> Functionality {
        self.resource_template(id)
            .map(ResourceTemplate::functionality)
            .unwrap_or_default()
    }
}

/// In-memory knowledge base keyed by `provider:type` patterns.
#[derive(Clone, Debug, Default)]
pub struct TemplateKb {
    resources: BTreeMap<ResourceId, ResourceTemplate>,
    edges: BTreeMap<(ResourceId, ResourceId), EdgeTemplate>,
}

impl TemplateKb {
    /// Empty knowledge base.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a resource template after validating it.
    pub fn add_resource(&mut self, template: ResourceTemplate) -> ResolveResult<()> {
        template.validate()?;
        self.resources.insert(template.id.type_pattern(), template);
        Ok(())
    }

    /// Adds or replaces an edge template. Both endpoint types must already
    /// have resource templates.
    pub fn add_edge(&mut self, template: EdgeTemplate) -> ResolveResult<()> {
        for end in [&template.source, &template.target] {
            if !self.resources.contains_key(&end.type_pattern()) {
                return Err(ResolveError::MissingResourceTemplate(end.type_pattern()));
            }
        }
        self.edges.insert(
            (template.source.type_pattern(), template.target.type_pattern()),
            template,
        );
        Ok(())
    }

    /// Absorbs `other`. Every template is taken, the incoming definition
    /// winning on conflict; each conflict is reported in the joined error.
    pub fn merge(&mut self, other: Self) -> ResolveResult<()> {
        let mut duplicates = Vec::new();
        for (key, template) in other.resources {
            if self.resources.insert(key.clone(), template).is_some() {
                duplicates.push(ResolveError::DuplicateTemplate(key.to_string()));
            }
        }
        for ((from, to), template) in other.edges {
            let label = format!("{from} -> {to}");
            if self.edges.insert((from, to), template).is_some() {
                duplicates.push(ResolveError::DuplicateTemplate(label));
            }
        }
        ResolveError::join(duplicates).map_or(Ok(()), Err)
    }

    /// Number of edge templates.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn type_graph(&self) -> (DiGraph<&ResourceId, ()>, BTreeMap<&ResourceId, NodeIndex>) {
        let mut graph = DiGraph::new();
        let mut index = BTreeMap::new();
        for key in self.resources.keys() {
            index.insert(key, graph.add_node(key));
        }
        for (from, to) in self.edges.keys() {
            if let (Some(&a), Some(&b)) = (index.get(from), index.get(to)) {
                graph.add_edge(a, b, ());
            }
        }
        (graph, index)
    }
}

impl KnowledgeBase for TemplateKb {
    fn has_direct_path(&self, from: &ResourceId, to: &ResourceId) -> bool {
        self.edges
            .contains_key(&(from.type_pattern(), to.type_pattern()))
    }

    fn all_paths(
        &self,
        from: &ResourceId,
        to: &ResourceId,
        max_nodes: usize,
    ) -> ResolveResult<Vec<Vec<ResourceId>>> {
        let from = from.type_pattern();
        let to = to.type_pattern();
        for end in [&from, &to] {
            if !self.resources.contains_key(end) {
                return Err(ResolveError::MissingResourceTemplate(end.clone()));
            }
        }
        if from == to || max_nodes < 2 {
            return Ok(Vec::new());
        }
        let (graph, index) = self.type_graph();
        let (Some(&a), Some(&b)) = (index.get(&from), index.get(&to)) else {
            return Ok(Vec::new());
        };
        let mut paths: Vec<Vec<ResourceId>> =
            all_simple_paths::<Vec<_>, _>(&graph, a, b, 0, Some(max_nodes - 2))
                .map(|nodes| nodes.into_iter().map(|n| graph[n].clone()).collect())
                .collect();
        paths.sort();
        Ok(paths)
    }

    fn edge_template(&self, from: &ResourceId, to: &ResourceId) -> Option<&EdgeTemplate> {
        self.edges.get(&(from.type_pattern(), to.type_pattern()))
    }

    fn resource_template(&self, id: &ResourceId) -> ResolveResult<&ResourceTemplate> {
        let key = id.type_pattern();
        self.resources
            .get(&key)
            .ok_or(ResolveError::MissingResourceTemplate(key))
    }

    fn list_resources(&self) -> Vec<&ResourceTemplate> {
        self.resources.values().collect()
    }
}
