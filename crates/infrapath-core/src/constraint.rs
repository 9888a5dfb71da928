// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Caller-supplied annotations on a requested edge.
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ident::ResourceId;
use crate::record::Resource;

/// Nodes a resolved path must, or must not, pass through.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeConstraint {
    /// Resources whose types the path must contain. Their properties are
    /// carried onto the node that fills the slot during expansion.
    #[serde(default)]
    pub node_must_exist: Vec<Resource>,
    /// Resources whose types the path must avoid.
    #[serde(default)]
    pub node_must_not_exist: Vec<Resource>,
}

impl EdgeConstraint {
    /// True when no constraint is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node_must_exist.is_empty() && self.node_must_not_exist.is_empty()
    }

    /// The declared must-exist resource sharing `id`'s qualified type.
    #[must_use]
    pub fn must_exist_for(&self, id: &ResourceId) -> Option<&Resource> {
        self.node_must_exist
            .iter()
            .find(|r| r.id.same_qualified_type(id))
    }

    /// True when `id`'s `provider:type` is declared as must-exist.
    #[must_use]
    pub fn requires_type(&self, id: &ResourceId) -> bool {
        self.node_must_exist.iter().any(|r| r.id.same_type(id))
    }

    /// True when `id`'s `provider:type` is declared as must-not-exist.
    #[must_use]
    pub fn forbids_type(&self, id: &ResourceId) -> bool {
        self.node_must_not_exist.iter().any(|r| r.id.same_type(id))
    }
}

/// Annotations attached to a requested edge.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    /// Path constraints.
    #[serde(default)]
    pub constraint: EdgeConstraint,
    /// Classification tags every non-terminal hop must carry.
    #[serde(default)]
    pub attributes: BTreeSet<String>,
}

impl EdgeData {
    /// Edge data carrying only required attributes.
    #[must_use]
    pub fn with_attributes<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            constraint: EdgeConstraint::default(),
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }
}
