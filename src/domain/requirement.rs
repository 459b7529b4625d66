//! The requirement domain model.

use std::{collections::BTreeMap, sync::Arc};

use crate::{
    domain::{
        code::CodeRef,
        document::{Document, RepoName},
        req_id::{ReqId, Variant},
    },
    storage::MarkdownRequirement,
};

/// A requirement or assumption, as it sits in a [`ReqGraph`](crate::ReqGraph).
///
/// `parents`, `children` and `tags` are empty until the graph is resolved.
#[derive(Debug, Clone)]
pub struct Req {
    /// The requirement's ID.
    pub id: ReqId,
    /// Parent IDs, as written in the `Parents` attribute.
    pub parent_ids: Vec<String>,
    /// Resolved parents, ordered by position.
    pub parents: Vec<String>,
    /// Resolved children, ordered by position.
    pub children: Vec<String>,
    /// Title text, without the ID.
    pub title: String,
    /// Body text, without the title or the attributes section.
    pub body: String,
    /// Attributes keyed by upper-cased name.
    pub attributes: BTreeMap<String, String>,
    /// Line of the requirement (or its table row) in the document.
    pub position: usize,
    /// Symbols implementing or testing this requirement, ordered by file and line.
    pub tags: Vec<CodeRef>,
    /// Whether the requirement is a `DELETED` tombstone.
    pub deleted: bool,
    /// The document defining the requirement.
    pub document: Arc<Document>,
    /// The repository holding the document.
    pub repo: RepoName,
}

impl Req {
    /// Places a parsed requirement in its document and repository.
    #[must_use]
    pub fn from_markdown(parsed: MarkdownRequirement, repo: RepoName, document: Arc<Document>) -> Self {
        let MarkdownRequirement {
            id,
            title,
            body,
            attributes,
            parent_ids,
            position,
            deleted,
        } = parsed;

        Self {
            id,
            parent_ids,
            parents: Vec::new(),
            children: Vec::new(),
            title,
            body,
            attributes,
            position,
            tags: Vec::new(),
            deleted,
            document,
            repo,
        }
    }

    /// The ID as a string, which is also the requirement's key in the graph.
    #[must_use]
    pub fn key(&self) -> String {
        self.id.to_string()
    }

    /// Requirement or assumption.
    #[must_use]
    pub const fn variant(&self) -> Variant {
        self.id.variant()
    }

    /// The number segment of the ID.
    #[must_use]
    pub const fn id_number(&self) -> u64 {
        self.id.number()
    }

    /// Whether the requirement is a `DELETED` tombstone.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted
    }
}
