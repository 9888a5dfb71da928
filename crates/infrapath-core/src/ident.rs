// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resource identifiers and type patterns.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Qualified identifier for a resource or a resource type.
///
/// A `ResourceId` with an empty `name` is a *type pattern*: it denotes a
/// template rather than a concrete instance. Pattern matching via
/// [`ResourceId::matches`] ignores every empty field of the pattern, so
/// `aws:rds_instance` matches `aws:rds_instance:db-1`.
///
/// Ordering is lexicographic over `(provider, type, namespace, name)`, which
/// keeps every collection keyed by id deterministic.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    /// Provider namespace of the type (for example `aws`).
    pub provider: String,
    /// Resource type within the provider (for example `lambda_function`).
    #[serde(rename = "type")]
    pub ty: String,
    /// Optional namespace the resource lives in.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    /// Instance name; empty for type patterns.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// Error returned when parsing a [`ResourceId`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    /// The text did not contain at least `provider:type`.
    #[error("invalid resource id '{0}': expected provider:type[:namespace]:name")]
    Malformed(String),
}

impl ResourceId {
    /// Builds a type pattern (`provider:type`).
    pub fn of_type(provider: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ty: ty.into(),
            ..Self::default()
        }
    }

    /// Builds a concrete id (`provider:type:name`) without namespace.
    pub fn new(provider: impl Into<String>, ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ty: ty.into(),
            namespace: String::new(),
            name: name.into(),
        }
    }

    /// Returns a copy of this id with `name` replaced.
    #[must_use]
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Returns the `provider:type` pattern of this id.
    #[must_use]
    pub fn type_pattern(&self) -> Self {
        Self::of_type(self.provider.clone(), self.ty.clone())
    }

    /// True when both ids share provider and type.
    pub fn same_type(&self, other: &Self) -> bool {
        self.provider == other.provider && self.ty == other.ty
    }

    /// True when provider, type, and namespace all agree.
    pub fn same_qualified_type(&self, other: &Self) -> bool {
        self.same_type(other) && self.namespace == other.namespace
    }

    /// True for ids with no instance name (type patterns).
    pub fn is_type_pattern(&self) -> bool {
        self.name.is_empty()
    }

    /// True when every field is empty.
    pub fn is_zero(&self) -> bool {
        self.provider.is_empty()
            && self.ty.is_empty()
            && self.namespace.is_empty()
            && self.name.is_empty()
    }

    /// Uses `self` as a filter over `other`: every non-empty field of `self`
    /// must equal the corresponding field of `other`.
    pub fn matches(&self, other: &Self) -> bool {
        fn field(pattern: &str, value: &str) -> bool {
            pattern.is_empty() || pattern == value
        }
        field(&self.provider, &other.provider)
            && field(&self.ty, &other.ty)
            && field(&self.namespace, &other.namespace)
            && field(&self.name, &other.name)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return Ok(());
        }
        write!(f, "{}:{}", self.provider, self.ty)?;
        if !self.namespace.is_empty() || self.name.contains(':') {
            write!(f, ":{}", self.namespace)?;
        }
        if !self.name.is_empty() {
            write!(f, ":{}", self.name)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({self})")
    }
}

impl FromStr for ResourceId {
    type Err = IdParseError;

    /// Parses `provider:type`, `provider:type:name`, or
    /// `provider:type:namespace:name`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.splitn(4, ':').collect();
        match parts.as_slice() {
            [provider, ty] if !provider.is_empty() && !ty.is_empty() => {
                Ok(Self::of_type(*provider, *ty))
            }
            [provider, ty, name] if !provider.is_empty() && !ty.is_empty() => {
                Ok(Self::new(*provider, *ty, *name))
            }
            [provider, ty, namespace, name] if !provider.is_empty() && !ty.is_empty() => {
                Ok(Self {
                    provider: (*provider).to_string(),
                    ty: (*ty).to_string(),
                    namespace: (*namespace).to_string(),
                    name: (*name).to_string(),
                })
            }
            _ => Err(IdParseError::Malformed(s.to_string())),
        }
    }
}

/// Deterministic name for an intermediate resource synthesized while
/// expanding the logical edge `source -> target`.
///
/// Repeated expansions of the same logical edge yield the same name, which
/// is what makes expansion idempotent against an already-expanded graph.
pub fn synthetic_name(ty: &str, source: &ResourceId, target: &ResourceId) -> String {
    format!("{ty}_{}_{}", source.name, target.name)
}
