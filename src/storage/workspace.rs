//! Building a requirement graph from the files of a tree of repositories.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::instrument;

use crate::{
    domain::{
        code::{Code, CodeFile, CodeType},
        config::{Config, UnknownRepository},
        document::{Document, RepoName},
        graph::ReqGraph,
        requirement::Req,
    },
    storage::{
        annotations::annotate,
        markdown::{self, ParseError},
        tagger::{tagger_for, TagError, TagLocation},
    },
};

/// Errors that abort building a graph.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A document's repository isn't part of the configuration.
    #[error(transparent)]
    UnknownRepository(#[from] UnknownRepository),

    /// A document or source file couldn't be read.
    #[error("failed to read {}", path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// A document is structurally malformed.
    #[error("failed to parse {}", path.display())]
    Parse {
        /// The document.
        path: PathBuf,
        /// The underlying error.
        source: ParseError,
    },

    /// The source files of a document couldn't be tagged.
    #[error("failed to tag the source code of {}", path.display())]
    Tag {
        /// The document.
        path: PathBuf,
        /// The underlying error.
        source: TagError,
    },
}

/// Reads and parses every document and source file in `config`, then links
/// and validates the result.
///
/// Documents are loaded in parallel. The first failure aborts the build.
///
/// # Errors
///
/// Returns an error if a file can't be read, a document can't be parsed or
/// source code can't be tagged. Validation findings are not errors: they are
/// the graph's [`issues`](ReqGraph::issues).
#[instrument(skip(config), fields(documents = config.all_documents().count()))]
pub fn build_graph(config: &Config) -> Result<ReqGraph, BuildError> {
    let documents: Vec<_> = config.all_documents().collect();

    let (loaded, failures): (Vec<_>, Vec<_>) = documents
        .par_iter()
        .map(|(repo, document)| load_document(config, repo, document))
        .partition(Result::is_ok);

    if let Some(error) = failures.into_iter().find_map(Result::err) {
        return Err(error);
    }

    let mut graph = ReqGraph::new();
    for loaded in loaded.into_iter().flatten() {
        graph.add_document(&loaded.document, loaded.reqs);
        for (file, codes) in loaded.code {
            graph.add_code(file, codes);
        }
    }
    graph.resolve();

    tracing::info!(
        requirements = graph.reqs().len(),
        files = graph.code_tags().len(),
        issues = graph.issues().len(),
        "built requirement graph"
    );
    Ok(graph)
}

struct LoadedDocument {
    document: Arc<Document>,
    reqs: Vec<Req>,
    code: Vec<(CodeFile, Vec<Code>)>,
}

fn load_document(
    config: &Config,
    repo: &RepoName,
    document: &Arc<Document>,
) -> Result<LoadedDocument, BuildError> {
    let reqs = read_requirements(config, repo, document)?;

    let root = config.repositories.root(repo)?;
    let implementation = &document.implementation;
    let mut code = tag_files(root, repo, document, CodeType::Implementation, &implementation.code_files)?;
    code.extend(tag_files(root, repo, document, CodeType::Tests, &implementation.test_files)?);

    Ok(LoadedDocument {
        document: Arc::clone(document),
        reqs,
        code,
    })
}

/// Reads and parses the requirements of one document.
///
/// # Errors
///
/// Returns an error if the document can't be read or parsed.
pub fn read_requirements(
    config: &Config,
    repo: &RepoName,
    document: &Arc<Document>,
) -> Result<Vec<Req>, BuildError> {
    let path = config.repositories.path_in_repo(repo, &document.path)?;
    let text = std::fs::read_to_string(&path).map_err(|source| BuildError::Read {
        path: path.clone(),
        source,
    })?;
    let parsed = markdown::parse(&text).map_err(|source| BuildError::Parse { path, source })?;
    tracing::debug!(
        repo = %repo,
        document = %document.path.display(),
        requirements = parsed.len(),
        "parsed document"
    );

    Ok(parsed
        .into_iter()
        .map(|parsed| Req::from_markdown(parsed, repo.clone(), Arc::clone(document)))
        .collect())
}

fn tag_files(
    root: &Path,
    repo: &RepoName,
    document: &Arc<Document>,
    code_type: CodeType,
    files: &[PathBuf],
) -> Result<Vec<(CodeFile, Vec<Code>)>, BuildError> {
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let tag_error = |source| BuildError::Tag {
        path: document.path.clone(),
        source,
    };
    let tagger = tagger_for(&document.implementation.code_parser).map_err(tag_error)?;
    let locations = tagger.tag(root, files).map_err(tag_error)?;

    let mut by_file: BTreeMap<PathBuf, Vec<TagLocation>> = BTreeMap::new();
    for location in locations {
        by_file.entry(location.path.clone()).or_default().push(location);
    }

    let mut tagged = Vec::with_capacity(by_file.len());
    for (path, locations) in by_file {
        let full_path = root.join(&path);
        let source = std::fs::read_to_string(&full_path).map_err(|source| BuildError::Read {
            path: full_path,
            source,
        })?;

        let file = CodeFile::new(repo.clone(), path, code_type);
        let mut codes: Vec<Code> = locations
            .into_iter()
            .map(|location| {
                Code::new(file.clone(), location.symbol, location.line, Arc::clone(document))
            })
            .collect();
        annotate(&source, &mut codes);
        tracing::debug!(file = %file, symbols = codes.len(), "tagged source file");

        tagged.push((file, codes));
    }
    Ok(tagged)
}
