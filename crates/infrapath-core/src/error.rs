// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for path resolution and expansion.
use std::collections::BTreeSet;

use thiserror::Error;

use crate::ident::ResourceId;
use crate::record::ConcreteEdge;
use crate::value::PropertyError;

/// Errors raised while resolving and expanding edges.
///
/// Validity violations are not errors: checks report them as `Ok(false)` so
/// the caller can move on to the next candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No template path survives filtering.
    #[error("no path found from {from} to {to} satisfying attributes {attributes:?}")]
    NoPath {
        /// Requested source.
        from: ResourceId,
        /// Requested target.
        to: ResourceId,
        /// Required attributes that could not be satisfied.
        attributes: BTreeSet<String>,
    },
    /// Path selection produced an empty winner.
    #[error("empty path selected for {from} -> {to}")]
    EmptyPath {
        /// Requested source.
        from: ResourceId,
        /// Requested target.
        to: ResourceId,
    },
    /// The knowledge base has no template for the type.
    #[error("no resource template for {0}")]
    MissingResourceTemplate(ResourceId),
    /// The knowledge base has no edge template for the type pair.
    #[error("no edge template for {from} -> {to}")]
    MissingEdgeTemplate {
        /// Source type.
        from: ResourceId,
        /// Target type.
        to: ResourceId,
    },
    /// A resource referenced by id is not in the graph.
    #[error("resource {0} not found in graph")]
    MissingResource(ResourceId),
    /// A path does not line up with the resources it is applied to.
    #[error("path mismatch: {0}")]
    PathMismatch(String),
    /// A template declaration is inconsistent.
    #[error("invalid template {id}: {reason}")]
    InvalidTemplate {
        /// Offending template.
        id: ResourceId,
        /// What is wrong with it.
        reason: String,
    },
    /// Two knowledge bases define the same template.
    #[error("duplicate template {0}")]
    DuplicateTemplate(String),
    /// Typed property access failed.
    #[error("property error on {id}: {source}")]
    Property {
        /// Resource whose property was accessed.
        id: ResourceId,
        /// Underlying failure.
        source: PropertyError,
    },
    /// Wraps an error with the resource it concerns.
    #[error("{id}: {source}")]
    Resource {
        /// Resource under evaluation.
        id: ResourceId,
        /// Underlying failure.
        source: Box<ResolveError>,
    },
    /// An emitted edge fails uniqueness validation.
    #[error("expansion of {from} -> {to} emitted invalid edge {edge}")]
    InvalidExpansion {
        /// Requested source.
        from: ResourceId,
        /// Requested target.
        to: ResourceId,
        /// Edge that failed validation.
        edge: ConcreteEdge,
    },
    /// Several independent failures.
    #[error("{}", render_all(.0))]
    Multiple(Vec<ResolveError>),
}

fn render_all(errors: &[ResolveError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ResolveError {
    /// Wraps `source` with the resource id it concerns.
    #[must_use]
    pub fn for_resource(id: &ResourceId, source: Self) -> Self {
        Self::Resource {
            id: id.clone(),
            source: Box::new(source),
        }
    }

    /// Wraps a property failure with the resource id it concerns.
    #[must_use]
    pub fn property(id: &ResourceId, source: PropertyError) -> Self {
        Self::Property {
            id: id.clone(),
            source,
        }
    }

    /// Joins collected errors. Nested joins are flattened; an empty list
    /// yields `None` and a single error is returned unwrapped.
    #[must_use]
    pub fn join(errors: Vec<Self>) -> Option<Self> {
        let mut flat = Vec::with_capacity(errors.len());
        for err in errors {
            match err {
                Self::Multiple(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Self::Multiple(flat)),
        }
    }

    /// Number of leaf errors carried.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Multiple(inner) => inner.iter().map(Self::leaf_count).sum(),
            _ => 1,
        }
    }
}

/// Shorthand for results in this crate.
pub type ResolveResult<T> = Result<T, ResolveError>;
