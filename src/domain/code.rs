//! Source code symbols and the requirements they implement.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Serialize;

use crate::domain::document::{Document, RepoName};

/// Extensions of the source files that are scanned for functions.
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "h", "hh", "hpp", "go", "rs", "py"];

/// Whether `path` names a source file that is scanned for functions.
#[must_use]
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| SOURCE_EXTENSIONS.contains(&extension))
}

/// Whether a source file implements requirements or tests them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeType {
    /// Production code.
    Implementation,
    /// Test code.
    Tests,
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Implementation => f.write_str("code"),
            Self::Tests => f.write_str("tests"),
        }
    }
}

/// A source file within a repository.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CodeFile {
    /// The repository holding the file.
    pub repo: RepoName,
    /// Path relative to the repository root.
    pub path: PathBuf,
    /// Implementation or tests.
    pub code_type: CodeType,
}

impl CodeFile {
    /// Creates a code file.
    #[must_use]
    pub fn new(repo: RepoName, path: impl Into<PathBuf>, code_type: CodeType) -> Self {
        Self {
            repo,
            path: path.into(),
            code_type,
        }
    }
}

impl fmt::Display for CodeFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repo, self.path.display())
    }
}

/// A lightweight handle to a tagged symbol, as stored on the requirements it
/// implements.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CodeRef {
    /// The file holding the symbol.
    pub file: CodeFile,
    /// Line of the symbol (1-based).
    pub line: usize,
    /// Symbol name.
    pub tag: String,
}

impl fmt::Display for CodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.tag, self.file.path.display(), self.line)
    }
}

/// A tagged symbol in a source file.
#[derive(Debug, Clone)]
pub struct Code {
    /// The file holding the symbol.
    pub file: CodeFile,
    /// Symbol name, as reported by the tagger.
    pub tag: String,
    /// Line of the symbol (1-based).
    pub line: usize,
    /// Requirement IDs from the `@llr` comment above the symbol.
    pub parent_ids: Vec<String>,
    /// Requirement IDs this symbol was linked to during resolution.
    pub parents: Vec<String>,
    /// Whether a missing `@llr` comment is acceptable (test code).
    pub optional: bool,
    /// The document whose requirements the symbol implements.
    pub document: Arc<Document>,
}

impl Code {
    /// Creates an untagged symbol with no parents.
    #[must_use]
    pub fn new(file: CodeFile, tag: impl Into<String>, line: usize, document: Arc<Document>) -> Self {
        let optional = file.code_type == CodeType::Tests;
        Self {
            file,
            tag: tag.into(),
            line,
            parent_ids: Vec::new(),
            parents: Vec::new(),
            optional,
            document,
        }
    }

    /// A handle to this symbol.
    #[must_use]
    pub fn to_ref(&self) -> CodeRef {
        CodeRef {
            file: self.file.clone(),
            line: self.line,
            tag: self.tag.clone(),
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.tag, self.file.path.display(), self.line)
    }
}
