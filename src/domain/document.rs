//! Certification documents and the rules their requirements must follow.
//!
//! A [`Document`] is built by the configuration layer and handed to the
//! parser, linter and resolver ready-made. It names the requirements it holds
//! (through its [`ReqSpec`]), the levels they may link to (its [`LinkSpec`]s),
//! the attributes they must carry (its [`Schema`]) and the source files that
//! implement and test them.

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::req_id::{ReqId, Variant};

/// The name a repository is registered under.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoName(String);

impl RepoName {
    /// Creates a repository name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RepoName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// How strictly an attribute is demanded by a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    /// The attribute must be present.
    Required,
    /// The attribute may be omitted.
    Optional,
    /// At least one of the schema's `Any` attributes must be present.
    Any,
}

/// A schema rule for one attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    /// How strictly the attribute is demanded.
    pub kind: AttributeType,
    /// Pattern the attribute's text must match.
    pub value: Regex,
}

impl Attribute {
    /// Creates an attribute rule.
    #[must_use]
    pub const fn new(kind: AttributeType, value: Regex) -> Self {
        Self { kind, value }
    }
}

/// An optional attribute constraint on one end of a link.
#[derive(Debug, Clone)]
pub struct AttributeFilter {
    /// Upper-cased attribute name.
    pub key: String,
    /// Pattern the attribute's value must match.
    pub value: Regex,
}

/// Identifies a family of requirements: those with a given prefix and level.
#[derive(Debug, Clone)]
pub struct ReqSpec {
    /// The project prefix, e.g. `TEST`.
    pub prefix: String,
    /// The level, e.g. `SYS` or `SWL`.
    pub level: String,
    /// Optional attribute a requirement must carry to be part of the family.
    pub attribute: Option<AttributeFilter>,
}

impl ReqSpec {
    /// Creates a spec matching every requirement with the given prefix and level.
    #[must_use]
    pub fn new(prefix: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            level: level.into(),
            attribute: None,
        }
    }

    /// Restricts the spec to requirements whose `key` attribute matches `value`.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: Regex) -> Self {
        self.attribute = Some(AttributeFilter {
            key: key.into().to_uppercase(),
            value,
        });
        self
    }

    /// Whether `id` is a `REQ-` ID of this prefix and level.
    ///
    /// The attribute filter is not considered.
    #[must_use]
    pub fn matches_id(&self, id: &ReqId) -> bool {
        id.variant() == Variant::Requirement && id.prefix() == self.prefix && id.level() == self.level
    }
}

impl fmt::Display for ReqSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "REQ-{}-{}", self.prefix, self.level)
    }
}

/// A permitted parent link: requirements matching `child` may have parents
/// matching `parent`.
#[derive(Debug, Clone)]
pub struct LinkSpec {
    /// The child end.
    pub child: ReqSpec,
    /// The parent end.
    pub parent: ReqSpec,
}

/// Attribute rules for the requirements of one document.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Pattern every requirement ID in the document must match.
    pub requirements: Regex,
    /// Rules for `REQ-` requirements, keyed by upper-cased name.
    pub attributes: BTreeMap<String, Attribute>,
    /// Rules for `ASM-` assumptions, keyed by upper-cased name.
    pub asm_attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    /// The attribute rules that apply to the given variant.
    #[must_use]
    pub const fn attributes_for(&self, variant: Variant) -> &BTreeMap<String, Attribute> {
        match variant {
            Variant::Requirement => &self.attributes,
            Variant::Assumption => &self.asm_attributes,
        }
    }
}

/// The source files implementing and testing a document's requirements.
#[derive(Debug, Clone, Default)]
pub struct Implementation {
    /// Implementation source files, relative to the repository root.
    pub code_files: Vec<PathBuf>,
    /// Test source files, relative to the repository root.
    pub test_files: Vec<PathBuf>,
    /// Name of the symbol tagger used for these files.
    pub code_parser: String,
}

/// A certification document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path of the document, relative to its repository root.
    pub path: PathBuf,
    /// The requirements the document defines.
    pub req_spec: ReqSpec,
    /// The parent links its requirements may form.
    pub link_specs: Vec<LinkSpec>,
    /// Attribute rules.
    pub schema: Schema,
    /// Where the requirements are implemented.
    pub implementation: Implementation,
}

impl Document {
    /// Creates a document for the given prefix and level, with an empty
    /// schema and no implementation.
    ///
    /// # Errors
    ///
    /// Returns an error if the ID pattern derived from the prefix and level
    /// is too large to compile.
    pub fn new(
        path: impl Into<PathBuf>,
        prefix: &str,
        level: &str,
    ) -> Result<Self, regex::Error> {
        let requirements = Regex::new(&format!(
            r"(REQ|ASM)-{}-{}-(\d+)",
            regex::escape(prefix),
            regex::escape(level)
        ))?;

        Ok(Self {
            path: path.into(),
            req_spec: ReqSpec::new(prefix, level),
            link_specs: Vec::new(),
            schema: Schema {
                requirements,
                attributes: BTreeMap::new(),
                asm_attributes: BTreeMap::new(),
            },
            implementation: Implementation::default(),
        })
    }

    /// The document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether any code or test files are associated with the document.
    #[must_use]
    pub fn has_implementation(&self) -> bool {
        !self.implementation.code_files.is_empty() || !self.implementation.test_files.is_empty()
    }

    /// Whether the document holds the requirements named by `spec`.
    #[must_use]
    pub fn matches_spec(&self, spec: &ReqSpec) -> bool {
        self.req_spec.prefix == spec.prefix && self.req_spec.level == spec.level
    }
}
