// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tunables for the resolver.
use serde::{Deserialize, Serialize};

/// Resolver configuration. Every field falls back to its default when
/// absent from a persisted document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Hop bound for the reuse neighborhood search.
    pub reuse_search_depth: usize,
    /// Check uniqueness of every edge an expansion emits.
    pub validate_expansions: bool,
    /// Longest template path (in nodes) enumerated by the knowledge base.
    pub max_path_nodes: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            reuse_search_depth: 3,
            validate_expansions: true,
            max_path_nodes: 8,
        }
    }
}
