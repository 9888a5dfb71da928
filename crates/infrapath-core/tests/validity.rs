// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Uniqueness and path-position validity checks.

#![allow(missing_docs)]
use infrapath_core::{
    check_candidate_validity, check_uniqueness_validity, PropertyValue, ResourceGraph,
    ResolverConfig, Solution, TemplateKb,
};
use infrapath_dry_tests::{aws_kb, rid, ty, GraphBuilder, KbBuilder, ResourceTemplateBuilder};

fn solution(kb: &TemplateKb, graph: ResourceGraph) -> Solution<'_> {
    Solution::with_graph(kb, graph, ResolverConfig::default())
}

#[test]
fn set_unique_property_must_reference_the_other_end() {
    let kb = aws_kb().expect("aws kb");
    let f = rid("lambda_function", "f");
    let (r1, r2) = (rid("iam_role", "r1"), rid("iam_role", "r2"));
    let graph = GraphBuilder::new()
        .resource_with(f.clone(), "role", r1.clone().into())
        .resource(r1.clone())
        .resource(r2.clone())
        .build()
        .expect("graph");
    let ctx = solution(&kb, graph);

    assert!(check_uniqueness_validity(&ctx, &f, &r1).expect("check"));
    assert!(!check_uniqueness_validity(&ctx, &f, &r2).expect("check"));
}

#[test]
fn resource_created_for_another_owner_is_rejected() {
    let kb = aws_kb().expect("aws kb");
    let (f, g) = (rid("lambda_function", "f"), rid("lambda_function", "g"));
    let r1 = rid("iam_role", "r1");
    let graph = GraphBuilder::new()
        .resource_with(f.clone(), "role", r1.clone().into())
        .resource(g.clone())
        .resource(r1.clone())
        .edge(&f, &r1)
        .build()
        .expect("graph");
    let ctx = solution(&kb, graph);

    assert!(!check_uniqueness_validity(&ctx, &g, &r1).expect("check"));
    assert!(check_uniqueness_validity(&ctx, &f, &r1).expect("check"));
}

#[test]
fn unset_unique_property_allows_only_a_lone_dependency() {
    let kb = aws_kb().expect("aws kb");
    let h = rid("lambda_function", "h");
    let (r3, r4) = (rid("iam_role", "r3"), rid("iam_role", "r4"));
    let graph = GraphBuilder::new()
        .resource(h.clone())
        .resource(r3.clone())
        .resource(r4.clone())
        .edge(&h, &r3)
        .build()
        .expect("graph");
    let ctx = solution(&kb, graph);

    assert!(check_uniqueness_validity(&ctx, &h, &r3).expect("check"));
    assert!(!check_uniqueness_validity(&ctx, &h, &r4).expect("check"));
}

#[test]
fn absent_endpoints_are_checked_as_bare_resources() {
    let kb = aws_kb().expect("aws kb");
    let k = rid("lambda_function", "k");
    let graph = GraphBuilder::new()
        .resource(k.clone())
        .build()
        .expect("graph");
    let ctx = solution(&kb, graph);

    assert!(check_uniqueness_validity(&ctx, &k, &rid("iam_role", "fresh")).expect("check"));
    assert!(check_uniqueness_validity(
        &ctx,
        &rid("lambda_function", "ghost"),
        &rid("iam_role", "fresh")
    )
    .expect("check"));
}

#[test]
fn resources_without_rules_are_unconstrained() {
    let kb = aws_kb().expect("aws kb");
    let (api, db) = (rid("lambda_function", "api"), rid("rds_instance", "db"));
    let graph = GraphBuilder::new()
        .resource(api.clone())
        .resource(db.clone())
        .build()
        .expect("graph");
    let ctx = solution(&kb, graph);
    assert!(check_uniqueness_validity(&ctx, &api, &db).expect("check"));
}

fn routed_kb() -> TemplateKb {
    KbBuilder::new()
        .typed("app", &["compute"])
        .typed("db", &["storage"])
        .typed("vpc", &["network"])
        .resource(ResourceTemplateBuilder::new("gateway").as_source("network", None))
        .resource(ResourceTemplateBuilder::new("attachment").as_target("network", None))
        .resource(
            ResourceTemplateBuilder::new("task")
                .reference("vpc", "vpc")
                .as_source("network", Some("vpc")),
        )
        .resource(
            ResourceTemplateBuilder::new("attach")
                .reference("vpc", "vpc")
                .as_target("network", Some("vpc")),
        )
        .build()
        .expect("routed kb")
}

#[test]
fn short_paths_and_foreign_candidates() {
    let kb = routed_kb();
    let (a, d, g) = (rid("app", "a"), rid("db", "d"), rid("gateway", "g"));
    let graph = GraphBuilder::new()
        .resource(a.clone())
        .resource(d.clone())
        .resource(g.clone())
        .build()
        .expect("graph");
    let mut ctx = solution(&kb, graph);

    assert!(check_candidate_validity(&mut ctx, &g, &[a.clone(), d.clone()], "network")
        .expect("two-node path"));
    assert!(!check_candidate_validity(
        &mut ctx,
        &rid("db", "other"),
        &[a, ty("gateway"), d],
        "network"
    )
    .expect("candidate off the path"));
}

#[test]
fn as_source_route_requires_downstream_reach() {
    let kb = routed_kb();
    let (a, d, g) = (rid("app", "a"), rid("db", "d"), rid("gateway", "g"));
    let path = [a.clone(), ty("gateway"), d.clone()];
    let base = || {
        GraphBuilder::new()
            .resource(a.clone())
            .resource(d.clone())
            .resource(g.clone())
    };

    let mut connected = solution(&kb, base().edge(&g, &d).build().expect("graph"));
    assert!(check_candidate_validity(&mut connected, &g, &path, "network").expect("check"));

    let mut isolated = solution(&kb, base().build().expect("graph"));
    assert!(!check_candidate_validity(&mut isolated, &g, &path, "network").expect("check"));
    assert!(check_candidate_validity(&mut isolated, &g, &path, "storage").expect("no routes"));
}

#[test]
fn as_target_route_requires_reach_from_source() {
    let kb = routed_kb();
    let (a, d, t) = (rid("app", "a"), rid("db", "d"), rid("attachment", "t"));
    let path = [a.clone(), ty("attachment"), d.clone()];
    let base = || {
        GraphBuilder::new()
            .resource(a.clone())
            .resource(d.clone())
            .resource(t.clone())
    };

    let mut reached = solution(&kb, base().edge(&a, &t).build().expect("graph"));
    assert!(check_candidate_validity(&mut reached, &t, &path, "network").expect("check"));

    let mut unreached = solution(&kb, base().build().expect("graph"));
    assert!(!check_candidate_validity(&mut unreached, &t, &path, "network").expect("check"));
}

#[test]
fn unresolved_reference_is_assigned_from_target_downstream() {
    let kb = routed_kb();
    let (a, d, t, v) = (
        rid("app", "a"),
        rid("db", "d"),
        rid("task", "t"),
        rid("vpc", "v"),
    );
    let graph = GraphBuilder::new()
        .resource(a.clone())
        .resource(d.clone())
        .resource(t.clone())
        .resource(v.clone())
        .edge(&d, &v)
        .build()
        .expect("graph");
    let mut ctx = solution(&kb, graph);

    let valid = check_candidate_validity(&mut ctx, &t, &[a, ty("task"), d], "network")
        .expect("check");
    assert!(valid);
    let task = ctx.graph().resource(&t).expect("task");
    assert_eq!(
        task.properties.get("vpc").expect("vpc path"),
        Some(&PropertyValue::Id(v))
    );
}

#[test]
fn unresolved_reference_is_assigned_from_source_downstream() {
    let kb = routed_kb();
    let (a, d, t, v) = (
        rid("app", "a"),
        rid("db", "d"),
        rid("attach", "t"),
        rid("vpc", "v"),
    );
    let graph = GraphBuilder::new()
        .resource(a.clone())
        .resource(d.clone())
        .resource(t.clone())
        .resource(v.clone())
        .edge(&a, &v)
        .build()
        .expect("graph");
    let mut ctx = solution(&kb, graph);

    let valid = check_candidate_validity(&mut ctx, &t, &[a, ty("attach"), d], "network")
        .expect("check");
    assert!(valid);
    let attach = ctx.graph().resource(&t).expect("attach");
    assert_eq!(
        attach.properties.get("vpc").expect("vpc path"),
        Some(&PropertyValue::Id(v))
    );
}

#[test]
fn resolved_reference_must_reach_target() {
    let kb = routed_kb();
    let (a, d, t, v) = (
        rid("app", "a"),
        rid("db", "d"),
        rid("task", "t"),
        rid("vpc", "elsewhere"),
    );
    let graph = GraphBuilder::new()
        .resource(a.clone())
        .resource(d.clone())
        .resource_with(t.clone(), "vpc", v.clone().into())
        .resource(v)
        .build()
        .expect("graph");
    let mut ctx = solution(&kb, graph);
    assert!(!check_candidate_validity(&mut ctx, &t, &[a, ty("task"), d], "network")
        .expect("check"));
}

#[test]
fn candidate_missing_from_graph_is_an_error() {
    let kb = routed_kb();
    let (a, d) = (rid("app", "a"), rid("db", "d"));
    let graph = GraphBuilder::new()
        .resource(a.clone())
        .resource(d.clone())
        .build()
        .expect("graph");
    let mut ctx = solution(&kb, graph);
    assert!(check_candidate_validity(
        &mut ctx,
        &rid("gateway", "ghost"),
        &[a, ty("gateway"), d],
        "network"
    )
    .is_err());
}
