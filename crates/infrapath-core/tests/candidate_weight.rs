// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Candidate scoring over branching topologies.

#![allow(missing_docs)]
use proptest::prelude::*;

use infrapath_core::{CandidateScorer, GraphView, ResourceGraph, ResourceId, TemplateKb};
use infrapath_dry_tests::{rid, GraphBuilder, KbBuilder};

fn kb() -> TemplateKb {
    KbBuilder::new()
        .typed("lambda_function", &["compute"])
        .typed("rds_instance", &["storage"])
        .typed("link", &[])
        .typed("rds_proxy", &[])
        .build()
        .expect("kb")
}

/// Chain `source -> .. -> candidate -> .. -> target` with `hops` edges on
/// each side of the candidate.
fn branch(builder: GraphBuilder, tag: &str, hops: usize) -> (GraphBuilder, ResourceId) {
    let (source, target) = (rid("lambda_function", "api"), rid("rds_instance", "db"));
    let candidate = rid("rds_proxy", tag);
    let mut builder = builder.resource(candidate.clone());
    for (side, from, to) in [("up", &source, &candidate), ("down", &candidate, &target)] {
        let mut prev = from.clone();
        for i in 1..hops {
            let link = rid("link", &format!("{tag}_{side}_{i}"));
            builder = builder.resource(link.clone()).edge(&prev, &link);
            prev = link;
        }
        builder = builder.edge(&prev, to);
    }
    (builder, candidate)
}

fn two_branches(near_hops: usize, far_hops: usize) -> (ResourceGraph, ResourceId, ResourceId) {
    let base = GraphBuilder::new()
        .resource(rid("lambda_function", "api"))
        .resource(rid("rds_instance", "db"));
    let (base, near) = branch(base, "near", near_hops);
    let (base, far) = branch(base, "far", far_hops);
    (base.build().expect("graph"), near, far)
}

#[test]
fn closer_candidate_ranks_first() {
    let kb = kb();
    let (graph, near, far) = two_branches(2, 3);
    let empty = ResourceGraph::new();
    let scorer = CandidateScorer::new(&kb, GraphView::new(&graph));
    let (source, target) = (rid("lambda_function", "api"), rid("rds_instance", "db"));

    let ranked = scorer
        .rank_candidates(&source, &target, &[far.clone(), near.clone()], GraphView::new(&empty))
        .expect("ranking");
    assert_eq!(ranked[0].0, near);
    assert_eq!(ranked[1].0, far);
    assert!(ranked[0].1 > ranked[1].1);
}

#[test]
fn adjacent_candidate_earns_direct_bonus() {
    let kb = kb();
    let (graph, near, far) = two_branches(1, 2);
    let empty = ResourceGraph::new();
    let scorer = CandidateScorer::new(&kb, GraphView::new(&graph));
    let (source, target) = (rid("lambda_function", "api"), rid("rds_instance", "db"));
    let result = GraphView::new(&empty);

    let near_weight = scorer
        .weight(&source, &target, &near, result)
        .expect("weight");
    let far_weight = scorer.weight(&source, &target, &far, result).expect("weight");
    // 10 + 10 adjacency, budget 10 - 1 - 2 - 1.
    assert_eq!(near_weight, 26);
    // 5 + 5 glue adjacency, budget 10 - 2 - 2 - 1.
    assert_eq!(far_weight, 15);
}

#[test]
fn candidate_already_in_result_gets_bonus() {
    let kb = kb();
    let (graph, near, _) = two_branches(2, 3);
    let scorer = CandidateScorer::new(&kb, GraphView::new(&graph));
    let (source, target) = (rid("lambda_function", "api"), rid("rds_instance", "db"));
    let empty = ResourceGraph::new();
    let with_near = GraphBuilder::new()
        .resource(near.clone())
        .build()
        .expect("result graph");

    let base = scorer
        .weight(&source, &target, &near, GraphView::new(&empty))
        .expect("weight");
    let boosted = scorer
        .weight(&source, &target, &near, GraphView::new(&with_near))
        .expect("weight");
    assert_eq!(boosted, base + 9);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn weight_never_favors_the_farther_branch(near_hops in 1usize..5, extra in 1usize..4) {
        let kb = kb();
        let (graph, near, far) = two_branches(near_hops, near_hops + extra);
        let empty = ResourceGraph::new();
        let scorer = CandidateScorer::new(&kb, GraphView::new(&graph));
        let (source, target) = (rid("lambda_function", "api"), rid("rds_instance", "db"));
        let result = GraphView::new(&empty);

        let near_weight = scorer.weight(&source, &target, &near, result).expect("near");
        let far_weight = scorer.weight(&source, &target, &far, result).expect("far");
        prop_assert!(near_weight >= far_weight, "near {near_weight} < far {far_weight}");
    }
}
