// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Validity Checker: may a resource occupy a position in a path, and may it
//! serve as an endpoint of a proposed edge?
//!
//! Both checks report violations as `Ok(false)`. Errors are reserved for
//! knowledge base and property failures, wrapped with the resource id.
use tracing::debug;

use crate::context::{SolutionContext, REFERENCE_DELIMITER};
use crate::error::{ResolveError, ResolveResult};
use crate::ident::ResourceId;
use crate::layer::DependencyLayer;
use crate::record::Resource;
use crate::template::{Direction, PathSatisfactionRoute, ResourceSelector, ValidityOperation};

/// Checks the path-satisfaction routes of `candidate` for `classification`.
///
/// `path` runs from the concrete source to the concrete target; interior
/// entries may be type patterns. Two-node paths are always valid. The
/// candidate must match an interior node; the prefix ending at it is checked
/// with the as-target routes and the suffix starting at it with the
/// as-source routes. A route whose property reference does not resolve gets
/// the reference assigned from the downstream resources of the path's far
/// end: the source for as-target routes, the target for as-source routes.
pub fn check_candidate_validity(
    ctx: &mut dyn SolutionContext,
    candidate: &ResourceId,
    path: &[ResourceId],
    classification: &str,
) -> ResolveResult<bool> {
    if path.len() <= 2 {
        return Ok(true);
    }
    let last = path.len() - 1;
    if !path[1..last]
        .iter()
        .any(|node| node.with_name("").matches(candidate))
    {
        return Ok(false);
    }
    let template = ctx
        .kb()
        .resource_template(candidate)
        .map_err(|e| ResolveError::for_resource(candidate, e))?;
    let as_target = routes_for(&template.path_satisfaction.as_target, classification);
    let as_source = routes_for(&template.path_satisfaction.as_source, classification);

    let mut errors = Vec::new();
    let prefix_source = &path[0];
    for route in &as_target {
        let resources = match route.property_reference.as_deref() {
            Some(reference) => {
                let ids = match ctx.dynamic_ctx().resolve_reference(candidate, reference) {
                    Ok(ids) => ids,
                    Err(err) => {
                        errors.push(err);
                        continue;
                    }
                };
                if ids.is_empty() {
                    if let Err(err) = assign_for_validity(ctx, candidate, prefix_source, reference) {
                        errors.push(err);
                    }
                }
                ids
            }
            None => vec![candidate.clone()],
        };
        for res in &resources {
            if !validity_holds(&*ctx, route, prefix_source, res)? {
                debug!(candidate = %candidate, source = %prefix_source, "as-target route unsatisfied");
                return Ok(false);
            }
        }
    }

    let suffix_target = &path[last];
    for route in &as_source {
        let resources = match route.property_reference.as_deref() {
            Some(reference) => {
                let ids = match ctx.dynamic_ctx().resolve_reference(candidate, reference) {
                    Ok(ids) => ids,
                    Err(err) => {
                        errors.push(err);
                        continue;
                    }
                };
                if ids.is_empty() {
                    if let Err(err) = assign_for_validity(ctx, candidate, suffix_target, reference) {
                        errors.push(err);
                    }
                }
                ids
            }
            None => vec![candidate.clone()],
        };
        for res in &resources {
            if !validity_holds(&*ctx, route, res, suffix_target)? {
                debug!(candidate = %candidate, target = %suffix_target, "as-source route unsatisfied");
                return Ok(false);
            }
        }
    }

    match ResolveError::join(errors) {
        Some(err) => Err(ResolveError::for_resource(candidate, err)),
        None => Ok(true),
    }
}

fn routes_for(routes: &[PathSatisfactionRoute], classification: &str) -> Vec<PathSatisfactionRoute> {
    routes
        .iter()
        .filter(|r| r.classification == classification && r.validity.is_some())
        .cloned()
        .collect()
}

fn validity_holds(
    ctx: &dyn SolutionContext,
    route: &PathSatisfactionRoute,
    upstream: &ResourceId,
    downstream: &ResourceId,
) -> ResolveResult<bool> {
    match route.validity {
        Some(ValidityOperation::DownstreamOperation) => Ok(ctx
            .downstream(upstream, DependencyLayer::FirstFunctional)
            .map_err(|e| ResolveError::for_resource(upstream, e))?
            .contains(downstream)),
        None => Ok(true),
    }
}

/// Walks `reference` from `resource`, filling each unset hop with the first
/// resource downstream of `operation` its property template accepts.
fn assign_for_validity(
    ctx: &mut dyn SolutionContext,
    resource: &ResourceId,
    operation: &ResourceId,
    reference: &str,
) -> ResolveResult<()> {
    let downstreams = ctx.downstream(operation, DependencyLayer::FirstFunctional)?;
    let mut current = vec![resource.clone()];
    for part in reference.split(REFERENCE_DELIMITER) {
        let mut next = Vec::new();
        for id in &current {
            let held: Option<Vec<ResourceId>> = ctx
                .dynamic_ctx()
                .field_value(id, part)?
                .map(|value| value.referenced_ids().into_iter().cloned().collect());
            match held {
                Some(ids) => next.extend(ids),
                None => {
                    assign_first_accepted(ctx, id, part, &downstreams)?;
                }
            }
        }
        current = next;
    }
    Ok(())
}

fn assign_first_accepted(
    ctx: &mut dyn SolutionContext,
    id: &ResourceId,
    property: &str,
    choices: &[ResourceId],
) -> ResolveResult<bool> {
    let template = ctx.kb().resource_template(id)?;
    let Some(prop) = template.properties.get(property).cloned() else {
        return Ok(false);
    };
    let Some(choice) = choices.iter().find(|c| prop.accepts(c)) else {
        return Ok(false);
    };
    let resource = ctx
        .graph_mut()
        .resource_mut(id)
        .ok_or_else(|| ResolveError::MissingResource(id.clone()))?;
    prop.assign(&mut resource.properties, choice.clone())
        .map_err(|e| ResolveError::property(id, e))?;
    debug!(resource = %id, property, value = %choice, "assigned for validity");
    Ok(true)
}

/// May `source -> target` be added without breaking a uniqueness rule?
///
/// The target's upstream rules are checked first, then the source's
/// downstream rules. A definitive violation on either side returns
/// `Ok(false)` at once; errors from both sides are joined otherwise.
/// Endpoints absent from the graph are treated as bare resources.
pub fn check_uniqueness_validity(
    ctx: &dyn SolutionContext,
    source: &ResourceId,
    target: &ResourceId,
) -> ResolveResult<bool> {
    let view = ctx.raw_view();
    let source = view
        .resource(source)
        .cloned()
        .unwrap_or_else(|| Resource::new(source.clone()));
    let target = view
        .resource(target)
        .cloned()
        .unwrap_or_else(|| Resource::new(target.clone()));

    let mut errors = Vec::new();
    for (resource, other, direction) in [
        (&target, &source, Direction::Upstream),
        (&source, &target, Direction::Downstream),
    ] {
        match check_properties(ctx, resource, other, direction) {
            Ok(true) => {}
            Ok(false) => {
                debug!(resource = %resource.id, other = %other.id, ?direction, "uniqueness violated");
                return Ok(false);
            }
            Err(err) => errors.push(ResolveError::for_resource(&resource.id, err)),
        }
    }
    ResolveError::join(errors).map_or(Ok(true), Err)
}

fn check_properties(
    ctx: &dyn SolutionContext,
    resource: &Resource,
    other: &Resource,
    direction: Direction,
) -> ResolveResult<bool> {
    let kb = ctx.kb();
    let template = kb.resource_template(&resource.id)?;
    for (prop, step) in template.operational_properties() {
        if !step.unique || step.direction != direction {
            continue;
        }
        for selector in &step.resources {
            if !selector.can_use(kb, other)? {
                continue;
            }
            let value = resource
                .properties
                .get(&prop.path)
                .map_err(|e| ResolveError::property(&resource.id, e))?;
            let valid = match value {
                Some(value) => value.references(&other.id),
                None => is_lone_dependency(ctx, &resource.id, &other.id, direction, selector)?,
            };
            return Ok(valid);
        }
    }
    created_as_unique_validity(ctx, resource, other, direction)
}

fn direct_dependencies(
    ctx: &dyn SolutionContext,
    id: &ResourceId,
    direction: Direction,
) -> ResolveResult<Vec<ResourceId>> {
    if !ctx.raw_view().contains(id) {
        return Ok(Vec::new());
    }
    match direction {
        Direction::Upstream => ctx.upstream(id, DependencyLayer::Direct),
        Direction::Downstream => ctx.downstream(id, DependencyLayer::Direct),
    }
}

/// True when `other` would be the only dependency of `resource` in
/// `direction` that `selector` accepts.
fn is_lone_dependency(
    ctx: &dyn SolutionContext,
    resource: &ResourceId,
    other: &ResourceId,
    direction: Direction,
    selector: &ResourceSelector,
) -> ResolveResult<bool> {
    let deps = direct_dependencies(ctx, resource, direction)?;
    match deps.as_slice() {
        [] => return Ok(true),
        [only] if only.matches(other) => return Ok(true),
        _ => {}
    }
    let view = ctx.raw_view();
    for dep in &deps {
        if dep == other {
            continue;
        }
        let dep = view
            .resource(dep)
            .ok_or_else(|| ResolveError::MissingResource(dep.clone()))?;
        if selector.can_use(ctx.kb(), dep)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Rejects `resource` when one of its direct dependencies in `direction`,
/// other than `other`, declares a unique rule in the opposite direction that
/// selects `resource`: it was created for that dependency alone.
fn created_as_unique_validity(
    ctx: &dyn SolutionContext,
    resource: &Resource,
    other: &Resource,
    direction: Direction,
) -> ResolveResult<bool> {
    let deps = direct_dependencies(ctx, &resource.id, direction)?;
    if deps.contains(&other.id) {
        return Ok(true);
    }
    let kb = ctx.kb();
    for dep in &deps {
        let template = kb.resource_template(dep)?;
        for (_, step) in template.operational_properties() {
            if !step.unique || step.direction == direction {
                continue;
            }
            for selector in &step.resources {
                if selector.can_use(kb, resource)? {
                    debug!(resource = %resource.id, owner = %dep, "created as unique");
                    return Ok(false);
                }
            }
        }
    }
    Ok(true)
}
