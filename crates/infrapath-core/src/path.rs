// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Weighted template paths.
use std::fmt;

use crate::ident::ResourceId;

/// Template-level path: type patterns from source to target plus the
/// accumulated cost. Lower weight is better.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    /// Type patterns in traversal order; at least two.
    pub nodes: Vec<ResourceId>,
    /// One per node with a known functionality.
    pub weight: u32,
}

impl Path {
    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the path has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes strictly between the endpoints.
    #[must_use]
    pub fn interior(&self) -> &[ResourceId] {
        if self.nodes.len() <= 2 {
            return &[];
        }
        &self.nodes[1..self.nodes.len() - 1]
    }
}

impl fmt::Display for Path {
    /// Node ids joined by ` -> `; the tie-break key of path selection.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{node}")?;
        }
        Ok(())
    }
}
