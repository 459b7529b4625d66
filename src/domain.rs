//! Domain models for requirement graphs.
//!
//! This module contains the filesystem agnostic core: requirement IDs,
//! documents and their schemas, requirements and tagged code, and the
//! algorithms that lint, link, validate, compare and tabulate them.

/// Repository configuration.
pub mod config;
pub use config::Config;

/// Source code symbols.
pub mod code;
pub use code::{Code, CodeFile, CodeRef, CodeType};

/// Change reports between two graphs.
pub mod diff;

/// Documents, schemas and link rules.
pub mod document;
pub use document::{Document, LinkSpec, RepoName, ReqSpec};

/// Requirement filters.
pub mod filter;
pub use filter::ReqFilter;

/// The requirement graph.
pub mod graph;
pub use graph::{NextId, ReqGraph};

/// Validation findings.
pub mod issue;
pub use issue::{Issue, IssueType};

mod lint;

/// Trace matrices.
pub mod matrix;

/// Requirement ID grammar.
pub mod req_id;
pub use req_id::{ReqId, Variant};

/// The requirement model.
pub mod requirement;
pub use requirement::Req;

mod resolve;
