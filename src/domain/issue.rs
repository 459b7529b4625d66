//! Validation findings.
//!
//! Issues are soft: the linter and resolver record them and carry on, so a
//! single run reports every problem in a repository.

use std::{fmt, path::PathBuf};

use serde::Serialize;

use crate::domain::document::RepoName;

/// The category of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum IssueType {
    /// A requirement ID breaks the naming or sequencing rules.
    InvalidRequirementId,
    /// A parent link points at a missing, deleted or disallowed requirement.
    InvalidParent,
    /// Requirement text references a missing or deleted requirement.
    InvalidRequirementReference,
    /// An `@llr` comment references a missing, deleted or foreign requirement.
    InvalidRequirementInCode,
    /// A symbol has no `@llr` comment.
    MissingRequirementInCode,
    /// A required attribute is absent.
    MissingAttribute,
    /// An attribute is not part of the schema.
    UnknownAttribute,
    /// An attribute value doesn't match the schema.
    InvalidAttributeValue,
    /// A requirement has tests but no implementation.
    ReqTestedButNotImplemented,
}

impl IssueType {
    /// A short human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::InvalidRequirementId => "Invalid requirement ID",
            Self::InvalidParent => "Invalid parent requirement",
            Self::InvalidRequirementReference => "Invalid requirement reference",
            Self::InvalidRequirementInCode => "Invalid requirement in code",
            Self::MissingRequirementInCode => "Code without requirements",
            Self::MissingAttribute => "Missing attribute",
            Self::UnknownAttribute => "Unknown attribute",
            Self::InvalidAttributeValue => "Invalid attribute",
            Self::ReqTestedButNotImplemented => "Requirement tested but not implemented",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validation finding, located in a repository file.
///
/// Issues order by location first, so a sorted list reads top to bottom
/// through each file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Issue {
    /// The repository holding the offending file.
    pub repo: RepoName,
    /// The offending file, relative to the repository root.
    pub path: PathBuf,
    /// Line in the file (1-based).
    pub line: usize,
    /// Category.
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    /// Human-readable description.
    pub error: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.repo,
            self.path.display(),
            self.line,
            self.error
        )
    }
}
