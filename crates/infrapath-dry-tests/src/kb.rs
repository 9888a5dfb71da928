// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Template builders and a canned cloud-style knowledge base.
//!
//! Every builder collects failures instead of panicking; `build()` returns
//! the first error so tests can `unwrap()` at the call site.
use std::cell::Cell;

use infrapath_core::{
    Direction, EdgeTemplate, KnowledgeBase, OperationalStep, PathSatisfactionRoute, PropertyKind,
    PropertyTemplate, ResolveError, ResolveResult, ResourceId, ResourceSelector, ResourceTemplate,
    Reuse, TemplateKb, ValidityOperation,
};

/// Provider used by every fixture type.
pub const PROVIDER: &str = "aws";

/// Type pattern `aws:<ty>`.
pub fn ty(ty: &str) -> ResourceId {
    ResourceId::of_type(PROVIDER, ty)
}

/// Concrete id `aws:<ty>:<name>`.
pub fn rid(ty: &str, name: &str) -> ResourceId {
    ResourceId::new(PROVIDER, ty, name)
}

/// Reference property at `path` pointing at `target_ty`, populated by a
/// unique rule in `direction`.
pub fn unique_rule(path: &str, direction: Direction, target_ty: &str) -> PropertyTemplate {
    PropertyTemplate {
        path: path.to_string(),
        kind: PropertyKind::Resource,
        allowed_types: vec![ty(target_ty)],
        operational_rule: Some(OperationalStep {
            direction,
            resources: vec![ResourceSelector::of_type(ty(target_ty))],
            unique: true,
        }),
    }
}

/// Fluent [`ResourceTemplate`] construction.
#[derive(Debug, Clone)]
pub struct ResourceTemplateBuilder {
    template: ResourceTemplate,
}

impl ResourceTemplateBuilder {
    /// Template for `aws:<name>` with no classifications.
    pub fn new(name: &str) -> Self {
        Self {
            template: ResourceTemplate::new(&ty(name)),
        }
    }

    /// Adds classification tags.
    #[must_use]
    pub fn classified(mut self, tags: &[&str]) -> Self {
        self.template
            .classification
            .extend(tags.iter().map(|t| (*t).to_string()));
        self
    }

    /// Declares a property.
    #[must_use]
    pub fn property(mut self, property: PropertyTemplate) -> Self {
        self.template
            .properties
            .insert(property.path.clone(), property);
        self
    }

    /// Plain reference property without a rule.
    #[must_use]
    pub fn reference(self, path: &str, target_ty: &str) -> Self {
        self.property(PropertyTemplate {
            path: path.to_string(),
            kind: PropertyKind::Resource,
            allowed_types: vec![ty(target_ty)],
            operational_rule: None,
        })
    }

    /// As-source route checked with a downstream operation.
    #[must_use]
    pub fn as_source(mut self, classification: &str, property_reference: Option<&str>) -> Self {
        self.template
            .path_satisfaction
            .as_source
            .push(route(classification, property_reference));
        self
    }

    /// As-target route checked with a downstream operation.
    #[must_use]
    pub fn as_target(mut self, classification: &str, property_reference: Option<&str>) -> Self {
        self.template
            .path_satisfaction
            .as_target
            .push(route(classification, property_reference));
        self
    }

    /// Classifications no path through this type may be selected for.
    #[must_use]
    pub fn denies(mut self, classifications: &[&str]) -> Self {
        self.template
            .path_satisfaction
            .deny_classifications
            .extend(classifications.iter().map(|c| (*c).to_string()));
        self
    }

    /// Finished template.
    pub fn build(self) -> ResourceTemplate {
        self.template
    }
}

fn route(classification: &str, property_reference: Option<&str>) -> PathSatisfactionRoute {
    PathSatisfactionRoute {
        classification: classification.to_string(),
        property_reference: property_reference.map(str::to_string),
        validity: Some(ValidityOperation::DownstreamOperation),
    }
}

/// Fluent [`TemplateKb`] construction.
#[derive(Debug, Default)]
pub struct KbBuilder {
    kb: TemplateKb,
    errors: Vec<ResolveError>,
}

impl KbBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource template.
    #[must_use]
    pub fn resource(mut self, template: impl Into<ResourceTemplate>) -> Self {
        if let Err(err) = self.kb.add_resource(template.into()) {
            self.errors.push(err);
        }
        self
    }

    /// Adds a bare resource template classified with `tags`.
    #[must_use]
    pub fn typed(self, name: &str, tags: &[&str]) -> Self {
        self.resource(ResourceTemplateBuilder::new(name).classified(tags))
    }

    /// Adds a plain edge template between two fixture types.
    #[must_use]
    pub fn edge(self, from: &str, to: &str) -> Self {
        self.edge_template(EdgeTemplate::new(&ty(from), &ty(to)))
    }

    /// Adds an edge template with a reuse policy.
    #[must_use]
    pub fn reuse_edge(self, from: &str, to: &str, reuse: Reuse) -> Self {
        self.edge_template(EdgeTemplate {
            reuse,
            ..EdgeTemplate::new(&ty(from), &ty(to))
        })
    }

    /// Adds an edge template usable only as a direct edge.
    #[must_use]
    pub fn direct_only_edge(self, from: &str, to: &str) -> Self {
        self.edge_template(EdgeTemplate {
            direct_edge_only: true,
            ..EdgeTemplate::new(&ty(from), &ty(to))
        })
    }

    /// Adds a fully specified edge template.
    #[must_use]
    pub fn edge_template(mut self, template: EdgeTemplate) -> Self {
        if let Err(err) = self.kb.add_edge(template) {
            self.errors.push(err);
        }
        self
    }

    /// The knowledge base, or the first recorded failure.
    pub fn build(self) -> ResolveResult<TemplateKb> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.kb),
        }
    }
}

impl From<ResourceTemplateBuilder> for ResourceTemplate {
    fn from(builder: ResourceTemplateBuilder) -> Self {
        builder.build()
    }
}

/// Small serverless-plus-database knowledge base.
///
/// Functional types: `lambda_function` (compute), `ecs_service` (compute),
/// `rds_instance` (storage), `s3_bucket` (storage), `vpc` and `subnet`
/// (network). Glue types: `security_group`, `rds_proxy`, `iam_role`.
/// A lambda owns its `role` exclusively.
pub fn aws_kb() -> ResolveResult<TemplateKb> {
    KbBuilder::new()
        .resource(
            ResourceTemplateBuilder::new("lambda_function")
                .classified(&["compute", "serverless"])
                .property(unique_rule("role", Direction::Downstream, "iam_role")),
        )
        .typed("ecs_service", &["compute", "container"])
        .typed("rds_instance", &["storage", "relational", "encrypted"])
        .typed("s3_bucket", &["storage", "object"])
        .typed("vpc", &["network"])
        .typed("subnet", &["network", "private"])
        .typed("security_group", &["firewall"])
        .typed("rds_proxy", &["proxy", "encrypted"])
        .typed("iam_role", &["permissions"])
        .edge("lambda_function", "rds_instance")
        .edge("lambda_function", "security_group")
        .edge("security_group", "rds_instance")
        .edge("lambda_function", "rds_proxy")
        .edge("rds_proxy", "rds_instance")
        .edge("lambda_function", "iam_role")
        .edge("lambda_function", "s3_bucket")
        .edge("ecs_service", "rds_instance")
        .edge("ecs_service", "security_group")
        .edge("rds_instance", "subnet")
        .edge("subnet", "vpc")
        .build()
}

/// Knowledge base wrapper counting `all_paths` calls.
#[derive(Debug)]
pub struct CountingKb<K> {
    inner: K,
    all_paths_calls: Cell<usize>,
}

impl<K: KnowledgeBase> CountingKb<K> {
    /// Wraps `inner`.
    pub fn new(inner: K) -> Self {
        Self {
            inner,
            all_paths_calls: Cell::new(0),
        }
    }

    /// Number of `all_paths` calls so far.
    pub fn all_paths_calls(&self) -> usize {
        self.all_paths_calls.get()
    }
}

impl<K: KnowledgeBase> KnowledgeBase for CountingKb<K> {
    fn has_direct_path(&self, from: &ResourceId, to: &ResourceId) -> bool {
        self.inner.has_direct_path(from, to)
    }

    fn all_paths(
        &self,
        from: &ResourceId,
        to: &ResourceId,
        max_nodes: usize,
    ) -> ResolveResult<Vec<Vec<ResourceId>>> {
        self.all_paths_calls.set(self.all_paths_calls.get() + 1);
        self.inner.all_paths(from, to, max_nodes)
    }

    fn edge_template(&self, from: &ResourceId, to: &ResourceId) -> Option<&EdgeTemplate> {
        self.inner.edge_template(from, to)
    }

    fn resource_template(&self, id: &ResourceId) -> ResolveResult<&ResourceTemplate> {
        self.inner.resource_template(id)
    }

    fn list_resources(&self) -> Vec<&ResourceTemplate> {
        self.inner.list_resources()
    }
}
