// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! infrapath-core: infrastructure graph resolution engine.
//!
//! Given a requested dependency between two concrete resources, the engine
//! chooses the chain of intermediate resource types that legally connects
//! them ([`PathResolver`]), materializes that chain as concrete resources and
//! edges ([`EdgeExpander`]), scores existing resources that could be reused
//! ([`CandidateScorer`]), and enforces ownership rules declared on resource
//! templates ([`check_uniqueness_validity`], [`check_candidate_validity`]).
//! [`Resolver`] ties the pieces together against a [`SolutionContext`].
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::missing_errors_doc,
    clippy::option_if_let_else,
    clippy::multiple_crate_versions
)]

mod config;
mod constraint;
mod context;
mod engine;
mod error;
mod expand;
mod graph;
mod graph_view;
mod ident;
mod kb;
mod layer;
mod path;
mod record;
mod resolver;
mod template;
mod validity;
mod value;
mod weight;

/// Resolver tunables.
pub use config::ResolverConfig;
/// Caller annotations on requested edges.
pub use constraint::{EdgeConstraint, EdgeData};
/// Solution context port, its default implementation, and property evaluation.
pub use context::{PropertyEvaluator, Solution, SolutionContext, REFERENCE_DELIMITER};
/// Orchestration.
pub use engine::{apply, connect, Resolver};
/// Error taxonomy.
pub use error::{ResolveError, ResolveResult};
/// Edge expansion.
pub use expand::{EdgeExpander, ExpansionResult};
/// Concrete resource graph.
pub use graph::ResourceGraph;
/// Read-only graph view.
pub use graph_view::GraphView;
/// Identifiers and deterministic naming.
pub use ident::{synthetic_name, IdParseError, ResourceId};
/// Knowledge base port and in-memory store.
pub use kb::{KnowledgeBase, TemplateKb};
/// Neighborhood queries.
pub use layer::{dependencies, downstream, neighborhood, upstream, DependencyLayer};
/// Weighted template paths.
pub use path::Path;
/// Graph records.
pub use record::{ConcreteEdge, Resource};
/// Path selection.
pub use resolver::{optimal_path, PathResolver};
/// Templates.
pub use template::{
    Direction, EdgeTemplate, Functionality, OperationalStep, PathSatisfaction,
    PathSatisfactionRoute, PropertyKind, PropertyTemplate, ResourceSelector, ResourceTemplate,
    Reuse, ValidityOperation,
};
/// Validity checks.
pub use validity::{check_candidate_validity, check_uniqueness_validity};
/// Property values.
pub use value::{Properties, PropertyError, PropertyValue, Scalar};
/// Candidate scoring.
pub use weight::{CandidateScorer, UndirectedTopology};
