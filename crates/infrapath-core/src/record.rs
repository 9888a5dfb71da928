// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph record types: concrete resources and the edges between them.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ident::ResourceId;
use crate::value::Properties;

/// Concrete resource stored in the resource graph.
///
/// Invariants
/// - `id` is unique within a [`crate::ResourceGraph`].
/// - `id` is never a type pattern once the resource is stored.
/// - `properties` are mutable: expansion and validity enforcement assign
///   references into them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique identifier.
    pub id: ResourceId,
    /// Open property bag.
    #[serde(default)]
    pub properties: Properties,
}

impl Resource {
    /// Resource with no properties.
    #[must_use]
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            properties: Properties::new(),
        }
    }

    /// Builder-style property setter for fixtures and constraints.
    #[must_use]
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }
}

/// Directed dependency `source -> target` between two concrete resources.
///
/// The source depends on the target: the target is *downstream* of the
/// source.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConcreteEdge {
    /// Dependent resource.
    pub source: ResourceId,
    /// Dependency.
    pub target: ResourceId,
}

impl ConcreteEdge {
    /// Creates an edge from `source` to `target`.
    #[must_use]
    pub fn new(source: ResourceId, target: ResourceId) -> Self {
        Self { source, target }
    }
}

impl fmt::Display for ConcreteEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}
