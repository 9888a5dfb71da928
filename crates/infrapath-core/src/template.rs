// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resource and edge templates: the knowledge-base metadata path resolution
//! reasons about.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::ident::ResourceId;
use crate::kb::KnowledgeBase;
use crate::record::Resource;
use crate::value::{PropertyError, PropertyValue, Properties};

/// Coarse functional role of a resource type.
///
/// Derived from classification tags by [`ResourceTemplate::functionality`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Functionality {
    /// Runs code.
    Compute,
    /// Hosts other compute.
    Cluster,
    /// Persists data.
    Storage,
    /// Routes traffic.
    Network,
    /// Exposes an API surface.
    Api,
    /// Glue: no functional role of its own.
    #[default]
    Unknown,
}

impl Functionality {
    /// Maps a classification tag to its functionality, if it names one.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "compute" => Some(Self::Compute),
            "cluster" => Some(Self::Cluster),
            "storage" => Some(Self::Storage),
            "network" => Some(Self::Network),
            "api" => Some(Self::Api),
            _ => None,
        }
    }

    /// True for every category but [`Functionality::Unknown`].
    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl fmt::Display for Functionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Compute => "compute",
            Self::Cluster => "cluster",
            Self::Storage => "storage",
            Self::Network => "network",
            Self::Api => "api",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Which side of a relationship an operational rule applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The rule concerns resources that depend on the owner.
    Upstream,
    /// The rule concerns resources the owner depends on.
    Downstream,
}

/// Predicate over resources used by operational steps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSelector {
    /// Type pattern; only provider and type are compared.
    pub selector: ResourceId,
    /// Property values the resource must carry (unset counts as a match).
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    /// Classification tags the resource's template must carry.
    #[serde(default)]
    pub classifications: Vec<String>,
}

impl ResourceSelector {
    /// Selector over a single type pattern.
    pub fn of_type(selector: ResourceId) -> Self {
        Self {
            selector,
            ..Self::default()
        }
    }

    /// Whether `resource` satisfies this selector.
    ///
    /// Only provider and type of the selector are compared so renamed
    /// resources keep matching. Selector properties must equal the
    /// resource's value when the resource has one set.
    pub fn can_use(&self, kb: &dyn KnowledgeBase, resource: &Resource) -> Result<bool, ResolveError> {
        if !self.selector.type_pattern().matches(&resource.id) {
            return Ok(false);
        }
        let template = kb.resource_template(&resource.id)?;
        if !template.has_classifications(&self.classifications) {
            return Ok(false);
        }
        for (path, expected) in &self.properties {
            let actual = resource
                .properties
                .get(path)
                .map_err(|e| ResolveError::property(&resource.id, e))?;
            if let Some(actual) = actual {
                if actual != expected {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

/// Declarative rule describing how a property is populated automatically.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationalStep {
    /// Side of the relationship the step populates.
    pub direction: Direction,
    /// Selectors describing which resources satisfy the step.
    #[serde(default)]
    pub resources: Vec<ResourceSelector>,
    /// The satisfying resource is owned exclusively by the rule owner.
    #[serde(default)]
    pub unique: bool,
}

/// Statically declared value shape of a template property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    /// Scalar value.
    Scalar,
    /// Single resource reference.
    Resource,
    /// List of resource references.
    ResourceList,
    /// Nested map.
    Map,
}

impl PropertyKind {
    fn holds_references(self) -> bool {
        matches!(self, Self::Resource | Self::ResourceList)
    }
}

/// Declaration of a single named property on a resource template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTemplate {
    /// Dotted path of the property on the resource.
    pub path: String,
    /// Value shape.
    pub kind: PropertyKind,
    /// Type patterns a reference property may point at; empty allows any.
    #[serde(default)]
    pub allowed_types: Vec<ResourceId>,
    /// Optional operational rule that populates the property.
    #[serde(default)]
    pub operational_rule: Option<OperationalStep>,
}

impl PropertyTemplate {
    /// Whether `id` may be stored in this property.
    pub fn accepts(&self, id: &ResourceId) -> bool {
        self.kind.holds_references()
            && (self.allowed_types.is_empty()
                || self
                    .allowed_types
                    .iter()
                    .any(|pattern| pattern.type_pattern().matches(id)))
    }

    /// Stores `id` into `properties` according to the declared kind: single
    /// references are overwritten, lists are appended to.
    pub fn assign(&self, properties: &mut Properties, id: ResourceId) -> Result<(), PropertyError> {
        match self.kind {
            PropertyKind::Resource => properties.set(&self.path, PropertyValue::Id(id)),
            PropertyKind::ResourceList => properties.push_id(&self.path, id),
            PropertyKind::Scalar | PropertyKind::Map => Err(PropertyError::TypeMismatch {
                path: self.path.clone(),
                expected: "id",
                found: if self.kind == PropertyKind::Scalar { "scalar" } else { "map" },
            }),
        }
    }
}

/// Extra validity check required when a type occupies a non-terminal hop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityOperation {
    /// The opposite path endpoint must be reachable downstream of the hop.
    DownstreamOperation,
}

/// One path-satisfaction route on a resource template.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSatisfactionRoute {
    /// Classification the route applies to.
    pub classification: String,
    /// Optional `#`-delimited property reference naming the resources the
    /// validity check runs against instead of the hop itself.
    #[serde(default)]
    pub property_reference: Option<String>,
    /// Validity rule; `None` is always satisfied.
    #[serde(default)]
    pub validity: Option<ValidityOperation>,
}

/// Routes keyed by the role the type plays in the path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSatisfaction {
    /// Checks applied to the prefix ending at the hop.
    #[serde(default)]
    pub as_target: Vec<PathSatisfactionRoute>,
    /// Checks applied to the suffix starting at the hop.
    #[serde(default)]
    pub as_source: Vec<PathSatisfactionRoute>,
    /// Classifications a path through this type may not be selected for.
    #[serde(default)]
    pub deny_classifications: Vec<String>,
}

/// Per-type metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTemplate {
    /// Type pattern (`provider:type`) this template describes.
    pub id: ResourceId,
    /// Classification tags.
    #[serde(default)]
    pub classification: Vec<String>,
    /// Path-satisfaction routes.
    #[serde(default)]
    pub path_satisfaction: PathSatisfaction,
    /// Declared properties keyed by path.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyTemplate>,
}

impl ResourceTemplate {
    /// Empty template for `id`'s type.
    pub fn new(id: &ResourceId) -> Self {
        Self {
            id: id.type_pattern(),
            ..Self::default()
        }
    }

    /// Functionality derived from classification tags: exactly one
    /// functional tag yields that category, none or several yield `Unknown`.
    pub fn functionality(&self) -> Functionality {
        let mut found = None;
        for tag in &self.classification {
            if let Some(f) = Functionality::from_tag(tag) {
                if found.is_some() {
                    return Functionality::Unknown;
                }
                found = Some(f);
            }
        }
        found.unwrap_or_default()
    }

    /// True when the template carries `tag`.
    pub fn is(&self, tag: &str) -> bool {
        self.classification.iter().any(|c| c == tag)
    }

    /// True when the template carries every tag in `tags`.
    pub fn has_classifications<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().all(|t| self.is(t.as_ref()))
    }

    /// Properties carrying an operational rule, in path order.
    pub fn operational_properties(&self) -> impl Iterator<Item = (&PropertyTemplate, &OperationalStep)> {
        self.properties
            .values()
            .filter_map(|p| p.operational_rule.as_ref().map(|step| (p, step)))
    }

    /// Checks the declaration is self-consistent: map keys equal property
    /// paths and operational rules only sit on reference properties.
    pub fn validate(&self) -> Result<(), ResolveError> {
        if !self.id.is_type_pattern() {
            return Err(ResolveError::InvalidTemplate {
                id: self.id.clone(),
                reason: "template id must be a type pattern".to_string(),
            });
        }
        for (key, prop) in &self.properties {
            if key != &prop.path {
                return Err(ResolveError::InvalidTemplate {
                    id: self.id.clone(),
                    reason: format!("property key '{key}' does not match path '{}'", prop.path),
                });
            }
            if prop.operational_rule.is_some() && !prop.kind.holds_references() {
                return Err(ResolveError::InvalidTemplate {
                    id: self.id.clone(),
                    reason: format!("operational rule on non-reference property '{key}'"),
                });
            }
        }
        Ok(())
    }
}

/// Reuse policy of an edge template.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reuse {
    /// Always materialize the hop.
    #[default]
    None,
    /// Prefer an existing resource already downstream of the edge source.
    Upstream,
    /// Prefer an existing resource already upstream of the edge target.
    Downstream,
}

/// Per-type-pair metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeTemplate {
    /// Source type pattern.
    pub source: ResourceId,
    /// Target type pattern.
    pub target: ResourceId,
    /// Reuse policy applied during expansion.
    #[serde(default)]
    pub reuse: Reuse,
    /// Usable only as a direct two-node connection.
    #[serde(default)]
    pub direct_edge_only: bool,
}

impl EdgeTemplate {
    /// Plain edge template between two types.
    pub fn new(source: &ResourceId, target: &ResourceId) -> Self {
        Self {
            source: source.type_pattern(),
            target: target.type_pattern(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn template(tags: &[&str]) -> ResourceTemplate {
        ResourceTemplate {
            classification: tags.iter().map(ToString::to_string).collect(),
            ..ResourceTemplate::new(&ResourceId::of_type("aws", "thing"))
        }
    }

    #[test]
    fn functionality_requires_exactly_one_functional_tag() {
        assert_eq!(template(&["compute", "serverless"]).functionality(), Functionality::Compute);
        assert_eq!(template(&["storage", "relational"]).functionality(), Functionality::Storage);
        assert_eq!(template(&["compute", "storage"]).functionality(), Functionality::Unknown);
        assert_eq!(template(&["permissions"]).functionality(), Functionality::Unknown);
        assert_eq!(template(&[]).functionality(), Functionality::Unknown);
    }

    #[test]
    fn reference_properties_respect_allowed_types() {
        let prop = PropertyTemplate {
            path: "subnets".to_string(),
            kind: PropertyKind::ResourceList,
            allowed_types: vec![ResourceId::of_type("aws", "subnet")],
            operational_rule: None,
        };
        assert!(prop.accepts(&ResourceId::new("aws", "subnet", "a")));
        assert!(!prop.accepts(&ResourceId::new("aws", "vpc", "a")));

        let mut props = Properties::new();
        prop.assign(&mut props, ResourceId::new("aws", "subnet", "a"))
            .unwrap();
        assert_eq!(
            props.require("subnets").unwrap().referenced_ids().len(),
            1
        );
    }

    #[test]
    fn validate_rejects_rule_on_scalar() {
        let mut t = template(&[]);
        t.properties.insert(
            "name".to_string(),
            PropertyTemplate {
                path: "name".to_string(),
                kind: PropertyKind::Scalar,
                allowed_types: Vec::new(),
                operational_rule: Some(OperationalStep {
                    direction: Direction::Downstream,
                    resources: Vec::new(),
                    unique: true,
                }),
            },
        );
        assert!(matches!(
            t.validate(),
            Err(ResolveError::InvalidTemplate { .. })
        ));
    }
}
