// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Edge Expander: turns a selected template path into concrete edges.
//!
//! Intermediate resources get deterministic names derived from the request,
//! so expanding the same request twice lands on the same resources. Reuse
//! policies on edge templates can redirect the expansion to a resource
//! already near the source or target.
use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::constraint::EdgeData;
use crate::context::SolutionContext;
use crate::error::{ResolveError, ResolveResult};
use crate::ident::{synthetic_name, ResourceId};
use crate::layer::neighborhood;
use crate::record::{ConcreteEdge, Resource};
use crate::template::{Direction, Reuse};
use crate::validity::check_uniqueness_validity;
use crate::weight::CandidateScorer;

/// Edges and new resources realizing one requested edge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpansionResult {
    /// Edges in path order.
    pub edges: Vec<ConcreteEdge>,
    /// Resources not yet present in the graph, in id order.
    pub resources: Vec<Resource>,
}

/// Expands template paths against a read-only solution context.
pub struct EdgeExpander<'c> {
    ctx: &'c dyn SolutionContext,
}

impl std::fmt::Debug for EdgeExpander<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeExpander").finish_non_exhaustive()
    }
}

/// Outcome of the reuse search at one hop.
enum Redirect {
    /// Existing resource downstream of the source takes over the rest.
    FromUpstream(ResourceId),
    /// Existing resource upstream of the target ends the path.
    ToDownstream(ResourceId),
}

impl<'c> EdgeExpander<'c> {
    /// Expander over `ctx`.
    pub fn new(ctx: &'c dyn SolutionContext) -> Self {
        Self { ctx }
    }

    /// Materializes `path` between `source` and `target`.
    ///
    /// The first and last path nodes must match the types of `source` and
    /// `target`; the last edge always ends at `target` itself.
    #[instrument(level = "debug", skip_all, fields(source = %source.id, target = %target.id, hops = path.len()))]
    pub fn expand_edge(
        &self,
        source: &Resource,
        target: &Resource,
        path: &[ResourceId],
        data: &EdgeData,
    ) -> ResolveResult<ExpansionResult> {
        check_endpoints(source, target, path)?;
        let kb = self.ctx.kb();
        let view = self.ctx.raw_view();
        let last = path.len() - 1;

        let mut edges = Vec::with_capacity(last);
        let mut created: BTreeMap<ResourceId, Resource> = BTreeMap::new();
        let mut prev = source.id.clone();
        for i in 1..=last {
            let template = kb.edge_template(&path[i - 1], &path[i]).ok_or_else(|| {
                ResolveError::MissingEdgeTemplate {
                    from: path[i - 1].clone(),
                    to: path[i].clone(),
                }
            })?;
            if i == last {
                edges.push(ConcreteEdge::new(prev.clone(), target.id.clone()));
                break;
            }

            let candidate = self.materialize(&path[i], source, target, data);
            match self.reuse_redirect(template.reuse, source, target, &prev, &candidate.id)? {
                Some(Redirect::FromUpstream(existing)) => {
                    debug!(reused = %existing, "redirected from upstream resource");
                    edges = vec![ConcreteEdge::new(existing, target.id.clone())];
                    created.clear();
                    break;
                }
                Some(Redirect::ToDownstream(existing)) => {
                    debug!(reused = %existing, "redirected to downstream resource");
                    edges.push(ConcreteEdge::new(prev.clone(), existing));
                    break;
                }
                None => {}
            }

            edges.push(ConcreteEdge::new(prev.clone(), candidate.id.clone()));
            prev = candidate.id.clone();
            if !view.contains(&candidate.id) {
                created.insert(candidate.id.clone(), candidate);
            }
        }

        Ok(ExpansionResult {
            edges,
            resources: created.into_values().collect(),
        })
    }

    /// Resource filling an intermediate hop: the must-exist resource of the
    /// same qualified type if one is declared, else a deterministically
    /// named one. A resource already in the graph under that id wins.
    fn materialize(
        &self,
        node: &ResourceId,
        source: &Resource,
        target: &Resource,
        data: &EdgeData,
    ) -> Resource {
        let synthetic = node.with_name(synthetic_name(&node.ty, &source.id, &target.id));
        let candidate = data
            .constraint
            .must_exist_for(&synthetic)
            .cloned()
            .unwrap_or_else(|| Resource::new(synthetic));
        self.ctx
            .raw_view()
            .resource(&candidate.id)
            .cloned()
            .unwrap_or(candidate)
    }

    fn reuse_redirect(
        &self,
        reuse: Reuse,
        source: &Resource,
        target: &Resource,
        prev: &ResourceId,
        candidate: &ResourceId,
    ) -> ResolveResult<Option<Redirect>> {
        let depth = self.ctx.config().reuse_search_depth;
        let view = self.ctx.raw_view();
        let (anchor, direction) = match reuse {
            Reuse::None => return Ok(None),
            Reuse::Upstream => (&source.id, Direction::Downstream),
            Reuse::Downstream => (&target.id, Direction::Upstream),
        };
        let hits: Vec<ResourceId> = neighborhood(view, anchor, direction, depth)
            .into_iter()
            .filter(|r| r.same_qualified_type(candidate))
            .collect();
        if hits.is_empty() {
            return Ok(None);
        }
        let ranked = if hits.len() == 1 {
            hits
        } else {
            CandidateScorer::new(self.ctx.kb(), view)
                .rank_candidates(&source.id, &target.id, &hits, view)?
                .into_iter()
                .map(|(id, _)| id)
                .collect()
        };
        for existing in ranked {
            let (from, to) = match reuse {
                Reuse::Upstream => (&existing, &target.id),
                _ => (prev, &existing),
            };
            if check_uniqueness_validity(self.ctx, from, to)? {
                return Ok(Some(match reuse {
                    Reuse::Upstream => Redirect::FromUpstream(existing),
                    _ => Redirect::ToDownstream(existing),
                }));
            }
            debug!(rejected = %existing, "reuse candidate fails uniqueness");
        }
        Ok(None)
    }
}

fn check_endpoints(source: &Resource, target: &Resource, path: &[ResourceId]) -> ResolveResult<()> {
    let (Some(first), Some(last)) = (path.first(), path.last()) else {
        return Err(ResolveError::PathMismatch("path is empty".to_string()));
    };
    if path.len() < 2 {
        return Err(ResolveError::PathMismatch(format!(
            "path {first} has fewer than two nodes"
        )));
    }
    if !first.type_pattern().matches(&source.id) {
        return Err(ResolveError::PathMismatch(format!(
            "path starts at {first}, source is {}",
            source.id
        )));
    }
    if !last.type_pattern().matches(&target.id) {
        return Err(ResolveError::PathMismatch(format!(
            "path ends at {last}, target is {}",
            target.id
        )));
    }
    Ok(())
}
