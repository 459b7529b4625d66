//! Certification requirements, cross-linked and validated.
//!
//! Requirements live in markdown documents spread over a tree of linked
//! repositories, and are implemented by functions annotated with `@llr`
//! comments. This crate parses both into a [`ReqGraph`], checks every link
//! and attribute, and compares or tabulates the result.

pub mod domain;
pub use domain::{Config, Issue, IssueType, Req, ReqGraph, ReqId};

/// Filesystem storage, parsing and tagging.
pub mod storage;
pub use storage::{build_graph, BuildError, LoadError};
