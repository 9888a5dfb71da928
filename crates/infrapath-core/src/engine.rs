// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resolver orchestration: select, expand, validate, apply.
use tracing::{debug, info, instrument, warn};

use crate::constraint::EdgeData;
use crate::context::SolutionContext;
use crate::error::{ResolveError, ResolveResult};
use crate::expand::{EdgeExpander, ExpansionResult};
use crate::graph::ResourceGraph;
use crate::ident::ResourceId;
use crate::record::{ConcreteEdge, Resource};
use crate::resolver::PathResolver;
use crate::validity::check_uniqueness_validity;

/// Drives path selection and expansion against a solution context.
#[derive(Debug)]
pub struct Resolver<C> {
    ctx: C,
}

impl<C: SolutionContext> Resolver<C> {
    /// Resolver owning `ctx`.
    pub fn new(ctx: C) -> Self {
        Self { ctx }
    }

    /// The solution context.
    pub fn context(&self) -> &C {
        &self.ctx
    }

    /// Mutable access to the solution context.
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    /// Resolves and applies `source -> target`.
    ///
    /// Both resources must be in the graph. Emitted edges that are not yet
    /// present are checked for uniqueness when `validate_expansions` is set;
    /// a failing edge aborts the request before the graph is touched. A
    /// multi-hop expansion replaces the direct edge, which is removed.
    #[instrument(level = "debug", skip_all, fields(source = %source, target = %target))]
    pub fn resolve_edge(
        &mut self,
        source: &ResourceId,
        target: &ResourceId,
        data: &EdgeData,
    ) -> ResolveResult<ExpansionResult> {
        let (source_res, target_res) = {
            let view = self.ctx.raw_view();
            let lookup = |id: &ResourceId| {
                view.resource(id)
                    .cloned()
                    .ok_or_else(|| ResolveError::MissingResource(id.clone()))
            };
            (lookup(source)?, lookup(target)?)
        };
        let path = PathResolver::new(self.ctx.kb(), self.ctx.config().max_path_nodes)
            .select_path(source, target, data)?;
        let result = EdgeExpander::new(&self.ctx).expand_edge(&source_res, &target_res, &path, data)?;

        if self.ctx.config().validate_expansions {
            self.validate(source, target, &result.edges)?;
        }
        let request = ConcreteEdge::new(source.clone(), target.clone());
        apply(self.ctx.graph_mut(), &result, &request, data)?;
        if path.len() > 2 && self.ctx.graph_mut().remove_edge(source, target) {
            debug!("removed replaced direct edge");
        }
        Ok(result)
    }

    fn validate(&self, source: &ResourceId, target: &ResourceId, edges: &[ConcreteEdge]) -> ResolveResult<()> {
        let view = self.ctx.raw_view();
        for edge in edges {
            if view.has_edge(&edge.source, &edge.target) {
                continue;
            }
            if !check_uniqueness_validity(&self.ctx, &edge.source, &edge.target)? {
                return Err(ResolveError::InvalidExpansion {
                    from: source.clone(),
                    to: target.clone(),
                    edge: edge.clone(),
                });
            }
        }
        Ok(())
    }

    /// Resolves every edge currently in the graph, using each edge's stored
    /// annotations. Failures do not stop the batch: each is logged and all
    /// are returned joined.
    pub fn expand_edges(&mut self) -> ResolveResult<()> {
        let pending: Vec<ConcreteEdge> = self.ctx.raw_view().edges().collect();
        info!(edges = pending.len(), "expanding edges");
        let mut errors = Vec::new();
        for edge in pending {
            let view = self.ctx.raw_view();
            if !view.has_edge(&edge.source, &edge.target) {
                continue;
            }
            let data = view
                .edge_data(&edge.source, &edge.target)
                .cloned()
                .unwrap_or_default();
            if let Err(err) = self.resolve_edge(&edge.source, &edge.target, &data) {
                warn!(edge = %edge, error = %err, "edge expansion failed");
                errors.push(err);
            }
        }
        ResolveError::join(errors).map_or(Ok(()), Err)
    }
}

/// Inserts the resources and edges of an expansion. Existing resources are
/// left untouched. Only the edge matching the `request` endpoints carries
/// `data`; hop edges are stored without constraints so that expanding the
/// graph again treats them as already satisfied.
pub fn apply(
    graph: &mut ResourceGraph,
    result: &ExpansionResult,
    request: &ConcreteEdge,
    data: &EdgeData,
) -> ResolveResult<()> {
    for resource in &result.resources {
        if graph.add_resource(resource.clone()) {
            debug!(resource = %resource.id, "added resource");
        }
    }
    for edge in &result.edges {
        if graph.has_edge(&edge.source, &edge.target) {
            continue;
        }
        if edge == request {
            graph.add_edge_with_data(&edge.source, &edge.target, data.clone())?;
        } else {
            graph.add_edge(&edge.source, &edge.target)?;
        }
    }
    Ok(())
}

/// Convenience for callers that hold bare resources: inserts both into the
/// graph (keeping existing ones) and resolves the edge between them.
pub fn connect<C: SolutionContext>(
    resolver: &mut Resolver<C>,
    source: Resource,
    target: Resource,
    data: &EdgeData,
) -> ResolveResult<ExpansionResult> {
    let (source_id, target_id) = (source.id.clone(), target.id.clone());
    let graph = resolver.context_mut().graph_mut();
    graph.add_resource(source);
    graph.add_resource(target);
    resolver.resolve_edge(&source_id, &target_id, data)
}
