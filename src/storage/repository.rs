//! Loading the configuration of a tree of linked repositories.
//!
//! [`load`] starts from one repository and follows its parent and child links
//! recursively, producing a single [`Config`] with every document of every
//! repository and the source files each one is implemented in.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use petgraph::{
    algo::{is_cyclic_directed, tarjan_scc},
    graphmap::DiGraphMap,
};
use regex::Regex;
use tracing::instrument;
use walkdir::WalkDir;

use crate::domain::{
    code::is_source_file,
    config::{
        self, merge_common_attributes, Config, ConfigError, ConfigFile, FileQuery,
        RepositorySet, CONFIG_FILE,
    },
    document::{Attribute, RepoName},
};

/// Errors that can occur while loading a tree of repositories.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A configuration file is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A linked repository declares a different name than the link expects.
    #[error("repository at {} is named `{found}`, expected `{expected}`", root.display())]
    NameMismatch {
        /// The root of the linked repository.
        root: PathBuf,
        /// The name in the link.
        expected: RepoName,
        /// The name in the repository's configuration file.
        found: RepoName,
    },

    /// Repositories are each other's parents.
    #[error("parent repository links form a cycle: {}", display_names(.0))]
    ParentCycle(Vec<RepoName>),

    /// A source path couldn't be walked.
    #[error("failed to list files under {}", path.display())]
    Walk {
        /// The path being walked.
        path: PathBuf,
        /// The underlying error.
        source: walkdir::Error,
    },

    /// A configured document doesn't exist.
    #[error("document `{}` of repository `{repo}` does not exist", path.display())]
    MissingDocument {
        /// The repository.
        repo: RepoName,
        /// The document path, relative to the repository root.
        path: PathBuf,
    },
}

fn display_names(names: &[RepoName]) -> String {
    names
        .iter()
        .map(RepoName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Loads the configuration of the repository at `root` and of every
/// repository linked to it.
///
/// # Errors
///
/// Returns an error if any configuration file is missing or invalid, if a
/// link names the wrong repository, if parent links form a cycle, or if the
/// source files of a document can't be listed.
#[instrument]
pub fn load(root: &Path) -> Result<Config, LoadError> {
    let mut loader = Loader::default();
    let base = loader.visit(None, root.to_path_buf())?;
    loader.check_parent_cycles()?;

    let common = loader.common_attributes()?;

    let mut documents = BTreeMap::new();
    for (name, (root, file)) in &loader.files {
        let mut repo_documents = Vec::with_capacity(file.documents.len());
        for raw in &file.documents {
            if !root.join(&raw.path).is_file() {
                return Err(LoadError::MissingDocument {
                    repo: name.clone(),
                    path: raw.path.clone(),
                });
            }
            let code_files = find_files(root, &raw.implementation.code)?;
            let test_files = find_files(root, &raw.implementation.tests)?;
            tracing::debug!(
                repo = %name,
                document = %raw.path.display(),
                code_files = code_files.len(),
                test_files = test_files.len(),
                "configured document"
            );

            let mut document = raw.to_document(code_files, test_files)?;
            merge_common_attributes(&mut document, &common)?;
            repo_documents.push(Arc::new(document));
        }
        documents.insert(name.clone(), repo_documents);
    }

    Ok(Config {
        base: Some(base),
        repositories: loader.repositories,
        documents,
    })
}

#[derive(Debug, Default)]
struct Loader {
    repositories: RepositorySet,
    files: BTreeMap<RepoName, (PathBuf, ConfigFile)>,
    /// Child to parent.
    parent_links: Vec<(RepoName, RepoName)>,
}

impl Loader {
    /// Loads the repository at `root`, then its children, then its parent.
    fn visit(&mut self, expected: Option<&RepoName>, root: PathBuf) -> Result<RepoName, LoadError> {
        if let Some(expected) = expected.filter(|name| self.repositories.contains(name)) {
            return Ok(expected.clone());
        }

        let file = ConfigFile::load(&root.join(CONFIG_FILE))?;
        let name = file.repo_name.clone();
        if let Some(expected) = expected.filter(|expected| **expected != name) {
            return Err(LoadError::NameMismatch {
                root,
                expected: expected.clone(),
                found: name,
            });
        }
        if !self.repositories.insert(name.clone(), root.clone()) {
            return Ok(name);
        }
        tracing::debug!(repo = %name, root = %root.display(), "loaded repository config");

        let children = file.child_repositories.clone();
        let parent = file.parent_repository.clone();
        self.files.insert(name.clone(), (root.clone(), file));

        for child in children {
            self.parent_links.push((child.name.clone(), name.clone()));
            self.visit(Some(&child.name), root.join(&child.path))?;
        }
        if let Some(parent) = parent {
            self.parent_links.push((name.clone(), parent.name.clone()));
            self.visit(Some(&parent.name), root.join(&parent.path))?;
        }

        Ok(name)
    }

    fn check_parent_cycles(&self) -> Result<(), LoadError> {
        let mut graph = DiGraphMap::<&RepoName, ()>::new();
        for (child, parent) in &self.parent_links {
            graph.add_edge(child, parent, ());
        }
        if !is_cyclic_directed(&graph) {
            return Ok(());
        }

        for component in tarjan_scc(&graph) {
            let cyclic = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&node| graph.contains_edge(node, node));
            if cyclic {
                let mut names: Vec<RepoName> = component.into_iter().cloned().collect();
                names.sort();
                return Err(LoadError::ParentCycle(names));
            }
        }
        Ok(())
    }

    fn common_attributes(&self) -> Result<BTreeMap<String, Attribute>, LoadError> {
        let mut common = BTreeMap::new();
        for (name, (_, file)) in &self.files {
            for (key, attribute) in file.common_attributes()? {
                if common.insert(key.clone(), attribute).is_some() {
                    return Err(ConfigError::DuplicateCommonAttribute {
                        repo: name.clone(),
                        name: key,
                    }
                    .into());
                }
            }
        }
        Ok(common)
    }
}

/// Lists the source files selected by `query`, relative to `root`, sorted.
///
/// # Errors
///
/// Returns an error if a pattern doesn't compile or a path can't be walked.
pub fn find_files(root: &Path, query: &FileQuery) -> Result<Vec<PathBuf>, LoadError> {
    let matching = query
        .matching_pattern
        .as_deref()
        .map(config::compile)
        .transpose()?;
    let ignored = query
        .ignored_patterns
        .iter()
        .map(|pattern| config::compile(pattern))
        .collect::<Result<Vec<Regex>, _>>()?;

    let mut files = Vec::new();
    for path in &query.paths {
        let start = root.join(path);
        for entry in WalkDir::new(&start).sort_by_file_name() {
            let entry = entry.map_err(|source| LoadError::Walk {
                path: start.clone(),
                source,
            })?;
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap_or_else(|_| entry.path())
                .to_path_buf();
            let text = relative.to_string_lossy();

            if ignored.iter().any(|pattern| pattern.is_match(&text)) {
                continue;
            }
            if !entry.file_type().is_file() || !is_source_file(&relative) {
                continue;
            }
            if matching.as_ref().is_some_and(|pattern| !pattern.is_match(&text)) {
                continue;
            }
            files.push(relative);
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}
