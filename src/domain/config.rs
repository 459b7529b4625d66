//! Repository configuration.
//!
//! Every repository carries a `reqgraph.toml` at its root, naming the
//! repository, the documents it holds, and the repositories it is linked to.
//! [`ConfigFile`] is that file as written. [`Config`] is the composed
//! configuration of a whole tree of repositories, ready to build a graph
//! from.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use regex::Regex;
use serde::Deserialize;

use crate::domain::document::{
    Attribute, AttributeType, Document, Implementation, LinkSpec, RepoName, ReqSpec,
};

/// Name of the configuration file at the root of every repository.
pub const CONFIG_FILE: &str = "reqgraph.toml";

/// The tagger used when a document doesn't name one.
pub const DEFAULT_CODE_PARSER: &str = "ctags";

/// The taggers a document may name.
pub const CODE_PARSERS: &[&str] = &["ctags", "heuristic"];

/// The configuration file of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Versions")]
pub struct ConfigFile {
    /// The name the repository is known by.
    pub repo_name: RepoName,

    /// Attributes added to the schema of every document, in every linked
    /// repository.
    pub common_attributes: Vec<AttributeConfig>,

    /// The repository holding the requirements this one refines.
    pub parent_repository: Option<RepoLink>,

    /// Repositories refining the requirements of this one.
    pub child_repositories: Vec<RepoLink>,

    /// The documents in this repository.
    pub documents: Vec<DocumentConfig>,
}

/// A link to another repository, checked out locally.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoLink {
    /// The name the linked repository must declare.
    pub name: RepoName,
    /// Its root, relative to the root of the declaring repository.
    pub path: PathBuf,
}

/// An attribute rule as written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeConfig {
    /// Attribute name. Case-insensitive.
    pub name: String,
    /// `"true"` (or empty), `"false"` or `"any"`.
    #[serde(default)]
    pub required: String,
    /// Pattern the value must match. Empty matches anything.
    #[serde(default)]
    pub value: String,
}

/// A permitted parent level of a document, as written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParentConfig {
    /// Prefix of the parent requirements.
    pub prefix: String,
    /// Level of the parent requirements.
    pub level: String,
    /// Attribute the parent must carry for the link to be valid.
    pub parent_attribute: Option<AttributeConfig>,
    /// Attribute the child must carry for this link rule to apply.
    pub child_attribute: Option<AttributeConfig>,
}

/// A set of source files, as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileQuery {
    /// Files or directories to walk, relative to the repository root.
    #[serde(default)]
    pub paths: Vec<PathBuf>,
    /// Pattern every selected path must match.
    pub matching_pattern: Option<String>,
    /// Paths matching any of these patterns are skipped.
    #[serde(default)]
    pub ignored_patterns: Vec<String>,
}

/// The source code of a document, as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImplementationConfig {
    /// Implementation files.
    #[serde(default)]
    pub code: FileQuery,
    /// Test files.
    #[serde(default)]
    pub tests: FileQuery,
    /// Name of the tagger used to find functions.
    pub code_parser: Option<String>,
}

/// A document, as written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentConfig {
    /// Path relative to the repository root.
    pub path: PathBuf,
    /// Requirement prefix.
    pub prefix: String,
    /// Requirement level.
    pub level: String,
    /// Permitted parent levels.
    #[serde(default)]
    pub parents: Vec<ParentConfig>,
    /// Attribute rules for requirements.
    #[serde(default)]
    pub attributes: Vec<AttributeConfig>,
    /// Attribute rules for assumptions.
    #[serde(default)]
    pub asm_attributes: Vec<AttributeConfig>,
    /// Source code implementing and testing the requirements.
    #[serde(default)]
    pub implementation: ImplementationConfig,
}

/// Errors in a configuration file, or in the way configuration files fit
/// together.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file couldn't be read.
    #[error("failed to read config file {}", path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The file isn't valid.
    #[error("failed to parse config file {}", path.display())]
    Parse {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        source: toml::de::Error,
    },

    /// An attribute's `required` field is not one of the accepted values.
    #[error("unable to parse `required` field of attribute `{name}`: `{value}`")]
    Required {
        /// The attribute.
        name: String,
        /// The offending value.
        value: String,
    },

    /// A pattern doesn't compile.
    #[error("invalid regular expression `{pattern}`")]
    Regex {
        /// The offending pattern.
        pattern: String,
        /// The underlying error.
        source: regex::Error,
    },

    /// A document declares the implicit `Parents` attribute.
    #[error(
        "document `{}` declares a `Parents` attribute, which is implied by its parent declarations",
        path.display()
    )]
    ParentsAttribute {
        /// The document.
        path: PathBuf,
    },

    /// A document redefines a common attribute.
    #[error(
        "document `{}` redefines attribute `{name}`, but it is listed as a common attribute",
        path.display()
    )]
    CommonAttributeRedefined {
        /// The document.
        path: PathBuf,
        /// The attribute.
        name: String,
    },

    /// A common attribute is declared twice.
    #[error("common attribute `{name}` in repo `{repo}` is already defined elsewhere")]
    DuplicateCommonAttribute {
        /// The repository declaring it the second time.
        repo: RepoName,
        /// The attribute.
        name: String,
    },

    /// A document names a tagger that doesn't exist.
    #[error("document `{}` names unknown code parser `{name}`", path.display())]
    UnknownCodeParser {
        /// The document.
        path: PathBuf,
        /// The offending name.
        name: String,
    },
}

pub(crate) fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::Regex {
        pattern: pattern.to_string(),
        source,
    })
}

impl ConfigFile {
    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The common attributes declared by this file, by upper-cased name.
    ///
    /// # Errors
    ///
    /// Returns an error if an attribute is malformed or declared twice.
    pub fn common_attributes(&self) -> Result<BTreeMap<String, Attribute>, ConfigError> {
        let mut attributes = BTreeMap::new();
        for raw in &self.common_attributes {
            let (name, attribute) = raw.parse()?;
            if attributes.insert(name.clone(), attribute).is_some() {
                return Err(ConfigError::DuplicateCommonAttribute {
                    repo: self.repo_name.clone(),
                    name,
                });
            }
        }
        Ok(attributes)
    }
}

impl AttributeConfig {
    /// Parses the rule, returning it with its upper-cased name.
    ///
    /// # Errors
    ///
    /// Returns an error if `required` is not one of the accepted values, or
    /// if the value pattern doesn't compile.
    pub fn parse(&self) -> Result<(String, Attribute), ConfigError> {
        let kind = match self.required.as_str() {
            "true" | "" => AttributeType::Required,
            "false" => AttributeType::Optional,
            "any" => AttributeType::Any,
            other => {
                return Err(ConfigError::Required {
                    name: self.name.clone(),
                    value: other.to_string(),
                });
            }
        };
        let value = if self.value.is_empty() { ".*" } else { &self.value };
        Ok((self.name.to_uppercase(), Attribute::new(kind, compile(value)?)))
    }
}

impl ParentConfig {
    fn link_spec(&self, prefix: &str, level: &str) -> Result<LinkSpec, ConfigError> {
        let mut child = ReqSpec::new(prefix, level);
        if let Some(raw) = &self.child_attribute {
            let (name, attribute) = raw.parse()?;
            child = child.with_attribute(name, attribute.value);
        }

        let mut parent = ReqSpec::new(&self.prefix, &self.level);
        if let Some(raw) = &self.parent_attribute {
            let (name, attribute) = raw.parse()?;
            parent = parent.with_attribute(name, attribute.value);
        }

        Ok(LinkSpec { child, parent })
    }
}

fn parse_attributes(
    path: &Path,
    raw: &[AttributeConfig],
) -> Result<BTreeMap<String, Attribute>, ConfigError> {
    let mut attributes = BTreeMap::new();
    for raw in raw {
        let (name, attribute) = raw.parse()?;
        if name == "PARENTS" {
            return Err(ConfigError::ParentsAttribute {
                path: path.to_path_buf(),
            });
        }
        attributes.insert(name, attribute);
    }
    Ok(attributes)
}

impl DocumentConfig {
    /// Builds the document, given the source files its queries selected.
    ///
    /// The schema gains an implicit `PARENTS` attribute: any value, pooled
    /// with the other `any` attributes, if the document declares parents;
    /// and, for assumptions, a required link to a requirement of the same
    /// document.
    ///
    /// # Errors
    ///
    /// Returns an error if an attribute or link rule is malformed, if
    /// `Parents` is declared explicitly, or if the code parser is unknown.
    pub fn to_document(
        &self,
        code_files: Vec<PathBuf>,
        test_files: Vec<PathBuf>,
    ) -> Result<Document, ConfigError> {
        let mut document =
            Document::new(&self.path, &self.prefix, &self.level).map_err(|source| {
                ConfigError::Regex {
                    pattern: format!("(REQ|ASM)-{}-{}-(\\d+)", self.prefix, self.level),
                    source,
                }
            })?;

        document.link_specs = self
            .parents
            .iter()
            .map(|parent| parent.link_spec(&self.prefix, &self.level))
            .collect::<Result<_, _>>()?;

        document.schema.attributes = parse_attributes(&self.path, &self.attributes)?;
        if !document.link_specs.is_empty() {
            document.schema.attributes.insert(
                "PARENTS".to_string(),
                Attribute::new(AttributeType::Any, compile(".*")?),
            );
        }

        document.schema.asm_attributes = parse_attributes(&self.path, &self.asm_attributes)?;
        document.schema.asm_attributes.insert(
            "PARENTS".to_string(),
            Attribute::new(
                AttributeType::Required,
                compile(&format!(
                    r"REQ-{}-{}-(\d+)",
                    regex::escape(&self.prefix),
                    regex::escape(&self.level)
                ))?,
            ),
        );

        let code_parser = self
            .implementation
            .code_parser
            .clone()
            .unwrap_or_else(|| DEFAULT_CODE_PARSER.to_string());
        if !CODE_PARSERS.contains(&code_parser.as_str()) {
            return Err(ConfigError::UnknownCodeParser {
                path: self.path.clone(),
                name: code_parser,
            });
        }

        document.implementation = Implementation {
            code_files,
            test_files,
            code_parser,
        };

        Ok(document)
    }
}

/// Adds the common attributes to a document's schema.
///
/// # Errors
///
/// Returns an error if the document already defines one of them.
pub fn merge_common_attributes(
    document: &mut Document,
    common: &BTreeMap<String, Attribute>,
) -> Result<(), ConfigError> {
    for (name, attribute) in common {
        if document.schema.attributes.contains_key(name) {
            return Err(ConfigError::CommonAttributeRedefined {
                path: document.path.clone(),
                name: name.clone(),
            });
        }
        document
            .schema
            .attributes
            .insert(name.clone(), attribute.clone());
    }
    Ok(())
}

/// Where each repository is checked out.
///
/// Every lookup of a repository goes through this value, which is built
/// while the configuration is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositorySet {
    roots: BTreeMap<RepoName, PathBuf>,
}

/// A repository is not part of the [`RepositorySet`].
#[derive(Debug, thiserror::Error)]
#[error("unknown repository `{0}`")]
pub struct UnknownRepository(pub RepoName);

impl RepositorySet {
    /// Registers a repository root. Returns `false` if the name was already
    /// registered, in which case the existing root is kept.
    pub fn insert(&mut self, name: RepoName, root: PathBuf) -> bool {
        if self.roots.contains_key(&name) {
            return false;
        }
        self.roots.insert(name, root);
        true
    }

    /// Whether a repository is registered.
    #[must_use]
    pub fn contains(&self, name: &RepoName) -> bool {
        self.roots.contains_key(name)
    }

    /// The root of a repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository is unknown.
    pub fn root(&self, name: &RepoName) -> Result<&Path, UnknownRepository> {
        self.roots
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| UnknownRepository(name.clone()))
    }

    /// The location of `relative` within a repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository is unknown.
    pub fn path_in_repo(&self, name: &RepoName, relative: &Path) -> Result<PathBuf, UnknownRepository> {
        Ok(self.root(name)?.join(relative))
    }

    /// Iterates over the registered repositories.
    pub fn iter(&self) -> impl Iterator<Item = (&RepoName, &Path)> {
        self.roots.iter().map(|(name, root)| (name, root.as_path()))
    }
}

/// The composed configuration of a tree of repositories.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// The repository the configuration was loaded from.
    pub base: Option<RepoName>,
    /// Where each repository is.
    pub repositories: RepositorySet,
    /// The documents of each repository.
    pub documents: BTreeMap<RepoName, Vec<Arc<Document>>>,
}

impl Config {
    /// Every document of every repository.
    pub fn all_documents(&self) -> impl Iterator<Item = (&RepoName, &Arc<Document>)> {
        self.documents
            .iter()
            .flat_map(|(repo, documents)| documents.iter().map(move |document| (repo, document)))
    }

    /// Finds the document at `path` and the repository holding it.
    ///
    /// The path is compared to each document's path relative to its
    /// repository and, failing that, by file name alone.
    #[must_use]
    pub fn find_document(&self, path: &Path) -> Option<(&RepoName, &Arc<Document>)> {
        self.all_documents()
            .find(|(_, document)| document.path == path)
            .or_else(|| {
                let name = path.file_name()?;
                self.all_documents()
                    .find(|(_, document)| document.path.file_name() == Some(name))
            })
    }
}

/// The serialized versions of the configuration file.
///
/// This allows for future changes to the file format without breaking
/// existing repositories.
#[derive(Debug, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        repo_name: RepoName,

        #[serde(default)]
        common_attributes: Vec<AttributeConfig>,

        #[serde(default)]
        parent_repository: Option<RepoLink>,

        #[serde(default)]
        child_repositories: Vec<RepoLink>,

        #[serde(default)]
        documents: Vec<DocumentConfig>,
    },
}

impl From<Versions> for ConfigFile {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                repo_name,
                common_attributes,
                parent_repository,
                child_repositories,
                documents,
            } => Self {
                repo_name,
                common_attributes,
                parent_repository,
                child_repositories,
                documents,
            },
        }
    }
}
