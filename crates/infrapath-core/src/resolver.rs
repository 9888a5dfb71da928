// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Path Resolver: picks the template path that realizes a requested edge.
//!
//! Candidate paths come from [`KnowledgeBase::all_paths`] and survive four
//! filters in order: direct-edge-only edges, node constraints, required
//! attributes, and unnecessary hops. The survivor with the lowest weight,
//! then the fewest nodes, then the smallest rendering wins.
use std::collections::BTreeSet;

use tracing::{debug, instrument};

use crate::constraint::EdgeData;
use crate::error::{ResolveError, ResolveResult};
use crate::ident::ResourceId;
use crate::kb::KnowledgeBase;
use crate::path::Path;
use crate::template::Functionality;

/// Selects template paths against a knowledge base.
#[derive(Clone, Copy)]
pub struct PathResolver<'a> {
    kb: &'a dyn KnowledgeBase,
    max_path_nodes: usize,
}

impl std::fmt::Debug for PathResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathResolver")
            .field("max_path_nodes", &self.max_path_nodes)
            .finish_non_exhaustive()
    }
}

impl<'a> PathResolver<'a> {
    /// Resolver over `kb` enumerating paths of at most `max_path_nodes`.
    pub fn new(kb: &'a dyn KnowledgeBase, max_path_nodes: usize) -> Self {
        Self { kb, max_path_nodes }
    }

    /// Chooses the path realizing `source -> target`.
    ///
    /// A direct template edge wins outright unless a must-exist node is
    /// requested; `all_paths` is not consulted in that case.
    #[instrument(level = "debug", skip_all, fields(source = %source, target = %target))]
    pub fn select_path(
        &self,
        source: &ResourceId,
        target: &ResourceId,
        data: &EdgeData,
    ) -> ResolveResult<Vec<ResourceId>> {
        if self.kb.has_direct_path(source, target) && data.constraint.node_must_exist.is_empty() {
            return Ok(vec![source.type_pattern(), target.type_pattern()]);
        }
        let candidates = self.candidate_paths(source, target, data)?;
        let Some(best) = optimal_path(&candidates) else {
            return Err(ResolveError::NoPath {
                from: source.clone(),
                to: target.clone(),
                attributes: data.attributes.clone(),
            });
        };
        if best.is_empty() {
            return Err(ResolveError::EmptyPath {
                from: source.clone(),
                to: target.clone(),
            });
        }
        debug!(path = %best, weight = best.weight, "selected path");
        Ok(best.nodes.clone())
    }

    /// Every weighted path surviving the filters, in enumeration order.
    pub fn candidate_paths(
        &self,
        source: &ResourceId,
        target: &ResourceId,
        data: &EdgeData,
    ) -> ResolveResult<Vec<Path>> {
        let paths = self.kb.all_paths(source, target, self.max_path_nodes)?;
        let total = paths.len();
        let mut out = Vec::new();
        for nodes in paths {
            if nodes.len() < 2 {
                continue;
            }
            if nodes.len() > 2 && self.uses_direct_only_edge(&nodes)? {
                continue;
            }
            if !satisfies_constraints(&nodes, data) {
                continue;
            }
            if !self.satisfies_attributes(&nodes, &data.attributes)? {
                continue;
            }
            let path = Path {
                weight: self.weight(&nodes),
                nodes,
            };
            if self.has_unnecessary_hop(&path, data) {
                continue;
            }
            out.push(path);
        }
        debug!(total, surviving = out.len(), "filtered candidate paths");
        Ok(out)
    }

    fn uses_direct_only_edge(&self, nodes: &[ResourceId]) -> ResolveResult<bool> {
        for pair in nodes.windows(2) {
            let template = self.kb.edge_template(&pair[0], &pair[1]).ok_or_else(|| {
                ResolveError::MissingEdgeTemplate {
                    from: pair[0].clone(),
                    to: pair[1].clone(),
                }
            })?;
            if template.direct_edge_only {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn satisfies_attributes(&self, nodes: &[ResourceId], attributes: &BTreeSet<String>) -> ResolveResult<bool> {
        if attributes.is_empty() {
            return Ok(true);
        }
        for node in nodes {
            let template = self.kb.resource_template(node)?;
            let denied = &template.path_satisfaction.deny_classifications;
            if let Some(attribute) = attributes.iter().find(|a| denied.contains(a)) {
                debug!(node = %node, attribute = %attribute, "classification denied");
                return Ok(false);
            }
        }
        let checked = if nodes.len() == 2 {
            nodes
        } else {
            &nodes[1..nodes.len() - 1]
        };
        for node in checked {
            let template = self.kb.resource_template(node)?;
            if !attributes.iter().all(|a| template.is(a)) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn weight(&self, nodes: &[ResourceId]) -> u32 {
        let known = nodes
            .iter()
            .filter(|n| self.kb.functionality(n).is_known())
            .count();
        u32::try_from(known).unwrap_or(u32::MAX)
    }

    /// An interior hop is unnecessary when it repeats an endpoint's
    /// functionality, or repeats the functionality of an earlier interior hop
    /// that is not a must-exist node. Only the second rule honors must-exist.
    fn has_unnecessary_hop(&self, path: &Path, data: &EdgeData) -> bool {
        let (Some(first), Some(last)) = (path.nodes.first(), path.nodes.last()) else {
            return false;
        };
        let ends = [self.kb.functionality(first), self.kb.functionality(last)];
        let mut seen: BTreeSet<Functionality> = BTreeSet::new();
        for node in path.interior() {
            let f = self.kb.functionality(node);
            if !f.is_known() {
                continue;
            }
            if ends.contains(&f) {
                return true;
            }
            if data.constraint.requires_type(node) {
                continue;
            }
            if !seen.insert(f) {
                return true;
            }
        }
        false
    }
}

fn satisfies_constraints(nodes: &[ResourceId], data: &EdgeData) -> bool {
    let constraint = &data.constraint;
    let has_required = constraint
        .node_must_exist
        .iter()
        .all(|r| nodes.iter().any(|n| n.same_type(&r.id)));
    has_required && !nodes.iter().any(|n| constraint.forbids_type(n))
}

/// The optimum of `paths`: lowest weight, then fewest nodes, then the
/// lexicographically smallest rendering.
pub fn optimal_path(paths: &[Path]) -> Option<&Path> {
    paths.iter().min_by(|a, b| {
        a.weight
            .cmp(&b.weight)
            .then_with(|| a.len().cmp(&b.len()))
            .then_with(|| a.to_string().cmp(&b.to_string()))
    })
}
