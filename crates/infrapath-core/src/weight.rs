// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Candidate Scorer: ranks existing resources that could fill a role in a
//! path, trading reuse against topological distance.
use std::collections::BTreeMap;

use petgraph::algo::astar;
use petgraph::graph::{NodeIndex, UnGraph};
use tracing::debug;

use crate::error::{ResolveError, ResolveResult};
use crate::graph_view::GraphView;
use crate::ident::ResourceId;
use crate::kb::KnowledgeBase;
use crate::layer::{self, DependencyLayer};

/// Cost of an undirected edge touching a functional resource.
const FUNCTIONAL_EDGE_COST: u32 = 1000;
/// Starting distance budget.
const DISTANCE_BUDGET: i32 = 10;
/// Budget when an endpoint is unreachable from the candidate.
const UNREACHABLE_BUDGET: i32 = -5;
/// Floor applied to the distance budget.
const MIN_BUDGET: i32 = 2;

/// Undirected copy of the resource graph. Edges touching a functional
/// resource are expensive so shortest paths prefer glue.
#[derive(Debug, Clone, Default)]
pub struct UndirectedTopology {
    graph: UnGraph<ResourceId, u32>,
    index: BTreeMap<ResourceId, NodeIndex>,
}

impl UndirectedTopology {
    /// Builds the topology from every resource and edge in `view`.
    pub fn build(kb: &dyn KnowledgeBase, view: GraphView<'_>) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut index = BTreeMap::new();
        for resource in view.resources() {
            index.insert(resource.id.clone(), graph.add_node(resource.id.clone()));
        }
        for edge in view.edges() {
            let (Some(&a), Some(&b)) = (index.get(&edge.source), index.get(&edge.target)) else {
                continue;
            };
            let functional =
                kb.functionality(&edge.source).is_known() || kb.functionality(&edge.target).is_known();
            let cost = if functional { FUNCTIONAL_EDGE_COST } else { 1 };
            graph.add_edge(a, b, cost);
        }
        Self { graph, index }
    }

    /// Cheapest path from `from` to `to`, both ends included.
    pub fn shortest_path(&self, from: &ResourceId, to: &ResourceId) -> Option<Vec<ResourceId>> {
        let start = *self.index.get(from)?;
        let goal = *self.index.get(to)?;
        let (_, nodes) = astar(&self.graph, start, |n| n == goal, |e| *e.weight(), |_| 0)?;
        Some(nodes.into_iter().map(|n| self.graph[n].clone()).collect())
    }
}

/// Scores candidates against one snapshot of the resource graph.
pub struct CandidateScorer<'a> {
    kb: &'a dyn KnowledgeBase,
    view: GraphView<'a>,
    topology: UndirectedTopology,
}

impl std::fmt::Debug for CandidateScorer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateScorer")
            .field("topology", &self.topology)
            .finish_non_exhaustive()
    }
}

impl<'a> CandidateScorer<'a> {
    /// Scorer over `view`; builds the undirected topology once.
    pub fn new(kb: &'a dyn KnowledgeBase, view: GraphView<'a>) -> Self {
        Self {
            kb,
            view,
            topology: UndirectedTopology::build(kb, view),
        }
    }

    /// Weight of `candidate` as a substitute on the edge `source -> target`.
    ///
    /// Adjacency to the source or target earns 10 (direct) or 5 (glue) per
    /// side, presence in `result` earns 9, and closeness adds a distance
    /// budget of at least 2.
    pub fn weight(
        &self,
        source: &ResourceId,
        target: &ResourceId,
        candidate: &ResourceId,
        result: GraphView<'_>,
    ) -> ResolveResult<i32> {
        let mut weight = 0;
        weight += self.adjacency(source, candidate, layer::downstream)?;
        weight += self.adjacency(target, candidate, layer::upstream)?;
        if result.contains(candidate) {
            weight += 9;
        }
        weight += self.distance_budget(source, target, candidate);
        Ok(weight)
    }

    fn adjacency(
        &self,
        anchor: &ResourceId,
        candidate: &ResourceId,
        walk: fn(&dyn KnowledgeBase, GraphView<'_>, &ResourceId, DependencyLayer) -> ResolveResult<Vec<ResourceId>>,
    ) -> ResolveResult<i32> {
        if walk(self.kb, self.view, anchor, DependencyLayer::Direct)?.contains(candidate) {
            return Ok(10);
        }
        if walk(self.kb, self.view, anchor, DependencyLayer::Glue)?.contains(candidate) {
            return Ok(5);
        }
        Ok(0)
    }

    fn distance_budget(&self, source: &ResourceId, target: &ResourceId, candidate: &ResourceId) -> i32 {
        let to_source = self.topology.shortest_path(candidate, source);
        let to_target = self.topology.shortest_path(candidate, target);
        let (Some(to_source), Some(to_target)) = (to_source, to_target) else {
            return MIN_BUDGET.max(UNREACHABLE_BUDGET);
        };
        let mut budget = DISTANCE_BUDGET;
        for id in &to_source {
            budget -= if self.kb.functionality(id).is_known() { 2 } else { 1 };
        }
        for id in &to_target {
            if self.kb.functionality(id).is_known() {
                budget -= 1;
            }
        }
        budget.max(MIN_BUDGET)
    }

    /// Orders `candidates` by descending weight, ties broken by id. Failures
    /// do not stop the ranking; they are joined and returned once every
    /// candidate has been scored.
    pub fn rank_candidates(
        &self,
        source: &ResourceId,
        target: &ResourceId,
        candidates: &[ResourceId],
        result: GraphView<'_>,
    ) -> ResolveResult<Vec<(ResourceId, i32)>> {
        let mut scored = Vec::with_capacity(candidates.len());
        let mut errors = Vec::new();
        for candidate in candidates {
            match self.weight(source, target, candidate, result) {
                Ok(w) => scored.push((candidate.clone(), w)),
                Err(err) => errors.push(ResolveError::for_resource(candidate, err)),
            }
        }
        if let Some(err) = ResolveError::join(errors) {
            return Err(err);
        }
        scored.sort_by(|(a, wa), (b, wb)| wb.cmp(wa).then_with(|| a.cmp(b)));
        debug!(?scored, "ranked candidates");
        Ok(scored)
    }
}
