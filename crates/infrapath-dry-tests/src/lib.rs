// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for infrapath crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`kb`] - Template builders, a cloud-style fixture knowledge base, and a
//!   call-counting knowledge base wrapper
//! - [`solution`] - Resource graph builder

pub mod kb;
pub mod solution;

pub use kb::{
    aws_kb, rid, ty, unique_rule, CountingKb, KbBuilder, ResourceTemplateBuilder, PROVIDER,
};
pub use solution::GraphBuilder;
