// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Neighborhood queries over the resource graph.
//!
//! A [`DependencyLayer`] controls how far an upstream or downstream walk
//! travels and which resources it reports. Functionality comes from the
//! knowledge base: glue resources (`Unknown` functionality) are traversed
//! through, functional resources stop the walk.
use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, ResolveResult};
use crate::graph_view::GraphView;
use crate::ident::ResourceId;
use crate::kb::KnowledgeBase;
use crate::template::Direction;

/// Granularity of a neighborhood query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyLayer {
    /// Immediate neighbors only.
    Direct,
    /// Glue resources reachable through other glue resources.
    Glue,
    /// Glue resources plus the first functional resource on each branch.
    FirstFunctional,
    /// Everything transitively reachable.
    All,
}

/// Resources reachable from `id` in `direction` within `layer`, in id order.
/// `id` itself is never reported.
pub fn dependencies(
    kb: &dyn KnowledgeBase,
    view: GraphView<'_>,
    id: &ResourceId,
    direction: Direction,
    layer: DependencyLayer,
) -> ResolveResult<Vec<ResourceId>> {
    if !view.contains(id) {
        return Err(ResolveError::MissingResource(id.clone()));
    }
    let mut found = BTreeSet::new();
    let mut visited = BTreeSet::from([id.clone()]);
    let mut queue = VecDeque::from([id.clone()]);
    while let Some(current) = queue.pop_front() {
        for next in step(view, &current, direction) {
            if !visited.insert(next.clone()) {
                continue;
            }
            let glue = !kb.functionality(next).is_known();
            let (report, descend) = match layer {
                DependencyLayer::Direct => (true, false),
                DependencyLayer::Glue => (glue, glue),
                DependencyLayer::FirstFunctional => (true, glue),
                DependencyLayer::All => (true, true),
            };
            if report {
                found.insert(next.clone());
            }
            if descend {
                queue.push_back(next.clone());
            }
        }
    }
    Ok(found.into_iter().collect())
}

/// Downstream dependencies of `id` within `layer`.
pub fn downstream(
    kb: &dyn KnowledgeBase,
    view: GraphView<'_>,
    id: &ResourceId,
    layer: DependencyLayer,
) -> ResolveResult<Vec<ResourceId>> {
    dependencies(kb, view, id, Direction::Downstream, layer)
}

/// Upstream dependents of `id` within `layer`.
pub fn upstream(
    kb: &dyn KnowledgeBase,
    view: GraphView<'_>,
    id: &ResourceId,
    layer: DependencyLayer,
) -> ResolveResult<Vec<ResourceId>> {
    dependencies(kb, view, id, Direction::Upstream, layer)
}

/// Resources at most `depth` hops from `id` in `direction`, ordered by hop
/// distance and then by id. Functionality is ignored.
pub fn neighborhood(
    view: GraphView<'_>,
    id: &ResourceId,
    direction: Direction,
    depth: usize,
) -> Vec<ResourceId> {
    let mut out = Vec::new();
    let mut visited = BTreeSet::from([id.clone()]);
    let mut frontier = vec![id.clone()];
    for _ in 0..depth {
        let mut next_frontier = BTreeSet::new();
        for current in &frontier {
            for next in step(view, current, direction) {
                if visited.insert(next.clone()) {
                    next_frontier.insert(next.clone());
                }
            }
        }
        if next_frontier.is_empty() {
            break;
        }
        out.extend(next_frontier.iter().cloned());
        frontier = next_frontier.into_iter().collect();
    }
    out
}

fn step<'a>(
    view: GraphView<'a>,
    id: &ResourceId,
    direction: Direction,
) -> Box<dyn Iterator<Item = &'a ResourceId> + 'a> {
    match direction {
        Direction::Downstream => Box::new(view.targets_of(id)),
        Direction::Upstream => Box::new(view.sources_of(id)),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::graph::ResourceGraph;
    use crate::kb::TemplateKb;
    use crate::record::Resource;
    use crate::template::ResourceTemplate;

    fn id(ty: &str, name: &str) -> ResourceId {
        ResourceId::new("aws", ty, name)
    }

    // lambda -> sg -> subnet -> vpc, lambda -> role, rds -> subnet
    fn fixture() -> (TemplateKb, ResourceGraph) {
        let mut kb = TemplateKb::new();
        for (ty, tag) in [
            ("lambda", Some("compute")),
            ("sg", None),
            ("subnet", Some("network")),
            ("vpc", Some("network")),
            ("role", None),
            ("rds", Some("storage")),
        ] {
            let mut t = ResourceTemplate::new(&ResourceId::of_type("aws", ty));
            t.classification.extend(tag.map(String::from));
            kb.add_resource(t).unwrap();
        }
        let mut g = ResourceGraph::new();
        for (ty, name) in [
            ("lambda", "fn"),
            ("sg", "sg"),
            ("subnet", "a"),
            ("vpc", "main"),
            ("role", "r"),
            ("rds", "db"),
        ] {
            g.add_resource(Resource::new(id(ty, name)));
        }
        for (a, b) in [
            (id("lambda", "fn"), id("sg", "sg")),
            (id("sg", "sg"), id("subnet", "a")),
            (id("subnet", "a"), id("vpc", "main")),
            (id("lambda", "fn"), id("role", "r")),
            (id("rds", "db"), id("subnet", "a")),
        ] {
            g.add_edge(&a, &b).unwrap();
        }
        (kb, g)
    }

    #[test]
    fn layers_differ_in_how_far_they_walk() {
        let (kb, g) = fixture();
        let view = GraphView::new(&g);
        let start = id("lambda", "fn");
        let walk = |layer| downstream(&kb, view, &start, layer).unwrap();

        assert_eq!(walk(DependencyLayer::Direct), vec![id("role", "r"), id("sg", "sg")]);
        assert_eq!(walk(DependencyLayer::Glue), vec![id("role", "r"), id("sg", "sg")]);
        assert_eq!(
            walk(DependencyLayer::FirstFunctional),
            vec![id("role", "r"), id("sg", "sg"), id("subnet", "a")]
        );
        assert_eq!(walk(DependencyLayer::All).len(), 4);
    }

    #[test]
    fn upstream_walks_incoming_edges() {
        let (kb, g) = fixture();
        let view = GraphView::new(&g);
        let ups = upstream(&kb, view, &id("subnet", "a"), DependencyLayer::All).unwrap();
        assert_eq!(ups, vec![id("lambda", "fn"), id("rds", "db"), id("sg", "sg")]);
    }

    #[test]
    fn neighborhood_is_depth_bounded() {
        let (_, g) = fixture();
        let view = GraphView::new(&g);
        let start = id("lambda", "fn");
        assert_eq!(neighborhood(view, &start, Direction::Downstream, 1).len(), 2);
        assert_eq!(
            neighborhood(view, &start, Direction::Downstream, 2),
            vec![id("role", "r"), id("sg", "sg"), id("subnet", "a")]
        );
        assert_eq!(neighborhood(view, &start, Direction::Downstream, 9).len(), 4);
    }

    #[test]
    fn unknown_resource_is_an_error() {
        let (kb, g) = fixture();
        let err = downstream(&kb, GraphView::new(&g), &id("lambda", "nope"), DependencyLayer::All)
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingResource(_)));
    }
}
