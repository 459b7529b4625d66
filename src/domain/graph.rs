//! The requirement graph.
//!
//! A [`ReqGraph`] is built in two stages. First every document and every
//! source file is merged in, with each document's IDs linted on the way.
//! Then [`ReqGraph::resolve`] links parents to children and symbols to
//! requirements, and validates the whole graph in one pass.

use std::{collections::BTreeMap, fmt, path::Path};

use tracing::{debug, info, instrument};

use crate::domain::{
    code::{Code, CodeFile},
    document::{Document, ReqSpec},
    issue::{Issue, IssueType},
    lint,
    req_id::{ReqId, Variant},
    requirement::Req,
    resolve,
};

/// Requirements and tagged source code, cross-linked and validated.
#[derive(Debug, Default)]
pub struct ReqGraph {
    reqs: BTreeMap<String, Req>,
    code_tags: BTreeMap<CodeFile, Vec<Code>>,
    issues: Vec<Issue>,
}

impl ReqGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges the requirements of one document into the graph.
    ///
    /// The requirements are linted against the document's spec first.
    /// Requirements failing the lint, or whose ID is already defined by
    /// another document, are reported as issues and left out.
    pub fn add_document(&mut self, document: &Document, reqs: Vec<Req>) {
        let (accepted, issues) = lint::lint(&document.req_spec, reqs);
        debug!(
            document = %document.path.display(),
            accepted = accepted.len(),
            rejected = issues.len(),
            "merging document"
        );
        self.issues.extend(issues);

        for req in accepted {
            let key = req.key();
            if let Some(existing) = self.reqs.get(&key) {
                self.issues.push(Issue {
                    repo: req.repo.clone(),
                    path: req.document.path.clone(),
                    line: req.position,
                    issue_type: IssueType::InvalidRequirementId,
                    error: format!(
                        "Requirement {key} in {} is already defined in {}.",
                        req.document.path.display(),
                        existing.document.path.display()
                    ),
                });
                continue;
            }
            self.reqs.insert(key, req);
        }
    }

    /// Merges the tagged symbols of one source file into the graph.
    ///
    /// A symbol already recorded at the same line is skipped.
    pub fn add_code(&mut self, file: CodeFile, tags: Vec<Code>) {
        let entry = self.code_tags.entry(file).or_default();
        for code in tags {
            if entry
                .iter()
                .any(|existing| existing.line == code.line && existing.tag == code.tag)
            {
                continue;
            }
            entry.push(code);
        }
    }

    /// Links and validates the graph.
    ///
    /// Parents are linked to children, symbols to the requirements named in
    /// their `@llr` comments, and every finding is appended to the graph's
    /// issues, which are then sorted by location.
    #[instrument(skip(self), fields(reqs = self.reqs.len(), files = self.code_tags.len()))]
    pub fn resolve(&mut self) {
        let resolution = resolve::resolve(&self.reqs, &self.code_tags);

        for (child, parent) in resolution.req_links {
            if let Some(req) = self.reqs.get_mut(&child) {
                req.parents.push(parent.clone());
            }
            if let Some(req) = self.reqs.get_mut(&parent) {
                req.children.push(child);
            }
        }

        for (file, index, parent) in resolution.code_links {
            let Some(code) = self
                .code_tags
                .get_mut(&file)
                .and_then(|tags| tags.get_mut(index))
            else {
                continue;
            };
            code.parents.push(parent.clone());
            let code_ref = code.to_ref();
            if let Some(req) = self.reqs.get_mut(&parent) {
                req.tags.push(code_ref);
            }
        }

        let positions: BTreeMap<String, usize> = self
            .reqs
            .iter()
            .map(|(key, req)| (key.clone(), req.position))
            .collect();
        let by_position = |key: &String| (positions.get(key).copied(), key.clone());
        for req in self.reqs.values_mut() {
            req.parents.sort_by_key(by_position);
            req.children.sort_by_key(by_position);
            req.tags.sort();
            req.tags.dedup();
        }

        self.issues.extend(resolution.issues);
        self.issues.sort();

        info!(issues = self.issues.len(), "resolved requirement graph");
    }

    /// Every requirement, keyed by ID.
    #[must_use]
    pub const fn reqs(&self) -> &BTreeMap<String, Req> {
        &self.reqs
    }

    /// Looks up a requirement by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Req> {
        self.reqs.get(id)
    }

    /// Every tagged symbol, grouped by file.
    #[must_use]
    pub const fn code_tags(&self) -> &BTreeMap<CodeFile, Vec<Code>> {
        &self.code_tags
    }

    /// Every finding of the linter and the resolver.
    ///
    /// Sorted by location once the graph is resolved.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Requirements that sit at the top of the hierarchy: those without
    /// parents, in documents that declare no parent links.
    ///
    /// Ordered by document, then position.
    #[must_use]
    pub fn top_level_requirements(&self) -> Vec<&Req> {
        let mut reqs: Vec<&Req> = self
            .reqs
            .values()
            .filter(|req| req.document.link_specs.is_empty() && req.parent_ids.is_empty())
            .collect();
        reqs.sort_by(|a, b| {
            (&a.document.path, a.position, a.key()).cmp(&(&b.document.path, b.position, b.key()))
        });
        reqs
    }

    /// Requirements defined by the document at `path`, ordered by position.
    #[must_use]
    pub fn requirements_of(&self, path: &Path) -> Vec<&Req> {
        let mut reqs: Vec<&Req> = self
            .reqs
            .values()
            .filter(|req| req.document.path == path)
            .collect();
        reqs.sort_by_key(|req| req.position);
        reqs
    }
}

/// The next free IDs of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextId {
    /// The next `REQ-` ID.
    pub requirement: String,
    /// The next `ASM-` ID, if the document holds assumptions at all.
    pub assumption: Option<String>,
}

impl fmt::Display for NextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.requirement)?;
        if let Some(assumption) = &self.assumption {
            writeln!(f, "{assumption}")?;
        }
        Ok(())
    }
}

/// Works out the next free IDs for a document with the given spec, given
/// the IDs it already holds.
#[must_use]
pub fn next_id<'a>(ids: impl IntoIterator<Item = &'a ReqId>, spec: &ReqSpec) -> NextId {
    let mut greatest_req = 0;
    let mut greatest_asm = 0;
    for id in ids {
        let greatest = match id.variant() {
            Variant::Requirement => &mut greatest_req,
            Variant::Assumption => &mut greatest_asm,
        };
        *greatest = (*greatest).max(id.number());
    }

    // Widened so the successor of `u64::MAX` is still written out correctly.
    NextId {
        requirement: format!("REQ-{}-{}-{}", spec.prefix, spec.level, u128::from(greatest_req) + 1),
        assumption: (greatest_asm > 0).then(|| {
            format!("ASM-{}-{}-{}", spec.prefix, spec.level, u128::from(greatest_asm) + 1)
        }),
    }
}
