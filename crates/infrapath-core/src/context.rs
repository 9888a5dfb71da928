// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Solution context: the knowledge base, the live resource graph, and the
//! property evaluator, bundled for the resolver.
use std::collections::BTreeSet;

use crate::config::ResolverConfig;
use crate::error::{ResolveError, ResolveResult};
use crate::graph::ResourceGraph;
use crate::graph_view::GraphView;
use crate::ident::ResourceId;
use crate::kb::KnowledgeBase;
use crate::layer::{self, DependencyLayer};
use crate::value::{PropertyError, PropertyValue};

/// Delimiter separating hops of a property reference.
pub const REFERENCE_DELIMITER: char = '#';

/// Everything the resolver needs from its surroundings.
pub trait SolutionContext {
    /// Read-only knowledge base.
    fn kb(&self) -> &dyn KnowledgeBase;

    /// Read-only view of the live resource graph.
    fn raw_view(&self) -> GraphView<'_>;

    /// Mutable access to the live resource graph.
    fn graph_mut(&mut self) -> &mut ResourceGraph;

    /// Resolver tunables.
    fn config(&self) -> &ResolverConfig;

    /// Downstream dependencies of `id` within `layer`.
    fn downstream(&self, id: &ResourceId, layer: DependencyLayer) -> ResolveResult<Vec<ResourceId>> {
        layer::downstream(self.kb(), self.raw_view(), id, layer)
    }

    /// Upstream dependents of `id` within `layer`.
    fn upstream(&self, id: &ResourceId, layer: DependencyLayer) -> ResolveResult<Vec<ResourceId>> {
        layer::upstream(self.kb(), self.raw_view(), id, layer)
    }

    /// Property evaluator bound to the live graph.
    fn dynamic_ctx(&self) -> PropertyEvaluator<'_> {
        PropertyEvaluator::new(self.raw_view())
    }
}

/// Default [`SolutionContext`]: a borrowed knowledge base plus an owned
/// resource graph.
pub struct Solution<'kb> {
    kb: &'kb dyn KnowledgeBase,
    graph: ResourceGraph,
    config: ResolverConfig,
}

impl<'kb> Solution<'kb> {
    /// Empty solution over `kb`.
    pub fn new(kb: &'kb dyn KnowledgeBase, config: ResolverConfig) -> Self {
        Self::with_graph(kb, ResourceGraph::new(), config)
    }

    /// Solution over an existing graph.
    pub fn with_graph(kb: &'kb dyn KnowledgeBase, graph: ResourceGraph, config: ResolverConfig) -> Self {
        Self { kb, graph, config }
    }

    /// The live graph.
    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    /// Consumes the solution, returning the graph.
    pub fn into_graph(self) -> ResourceGraph {
        self.graph
    }
}

impl std::fmt::Debug for Solution<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solution")
            .field("graph", &self.graph)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SolutionContext for Solution<'_> {
    fn kb(&self) -> &dyn KnowledgeBase {
        self.kb
    }

    fn raw_view(&self) -> GraphView<'_> {
        GraphView::new(&self.graph)
    }

    fn graph_mut(&mut self) -> &mut ResourceGraph {
        &mut self.graph
    }

    fn config(&self) -> &ResolverConfig {
        &self.config
    }
}

/// Resolves property paths and references against the live graph.
#[derive(Debug, Clone, Copy)]
pub struct PropertyEvaluator<'a> {
    view: GraphView<'a>,
}

impl<'a> PropertyEvaluator<'a> {
    /// Evaluator over `view`.
    pub fn new(view: GraphView<'a>) -> Self {
        Self { view }
    }

    /// Value at dotted `path` on resource `id`; `Ok(None)` when unset.
    pub fn field_value(&self, id: &ResourceId, path: &str) -> ResolveResult<Option<&'a PropertyValue>> {
        let resource = self
            .view
            .resource(id)
            .ok_or_else(|| ResolveError::MissingResource(id.clone()))?;
        resource
            .properties
            .get(path)
            .map_err(|e| ResolveError::property(id, e))
    }

    /// Follows a `#`-delimited reference starting at `start`. Every hop but
    /// the last must hold resource ids; the final hop's ids are returned.
    /// An unset hop ends that branch, so an empty result means unresolved.
    pub fn resolve_reference(&self, start: &ResourceId, reference: &str) -> ResolveResult<Vec<ResourceId>> {
        let mut current = vec![start.clone()];
        for part in reference.split(REFERENCE_DELIMITER) {
            let mut next = BTreeSet::new();
            for id in &current {
                let Some(value) = self.field_value(id, part)? else {
                    continue;
                };
                match value {
                    PropertyValue::Id(_) | PropertyValue::IdList(_) => {
                        next.extend(value.referenced_ids().into_iter().cloned());
                    }
                    other => {
                        return Err(ResolveError::property(
                            id,
                            PropertyError::TypeMismatch {
                                path: part.to_string(),
                                expected: "id",
                                found: other.kind_name(),
                            },
                        ))
                    }
                }
            }
            current = next.into_iter().collect();
        }
        Ok(current)
    }
}
