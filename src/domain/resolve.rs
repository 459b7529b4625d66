//! Graph resolution.
//!
//! Resolution runs in two phases. [`resolve`] walks the merged graph
//! read-only and works out every link and every issue; the graph then applies
//! the links to itself. No requirement or symbol is changed while it is still
//! being inspected.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::PathBuf,
};

use crate::domain::{
    code::{Code, CodeFile, CodeType},
    document::AttributeType,
    issue::{Issue, IssueType},
    req_id::{ReqId, Variant},
    requirement::Req,
};

/// The outcome of one resolution pass.
#[derive(Debug, Default)]
pub(crate) struct Resolution {
    /// `(child, parent)` pairs of requirement IDs.
    pub(crate) req_links: Vec<(String, String)>,
    /// `(file, index within the file's tags, requirement ID)` triples.
    pub(crate) code_links: Vec<(CodeFile, usize, String)>,
    pub(crate) issues: Vec<Issue>,
}

/// Works out the links and issues of a merged graph.
pub(crate) fn resolve(
    reqs: &BTreeMap<String, Req>,
    code_tags: &BTreeMap<CodeFile, Vec<Code>>,
) -> Resolution {
    let mut resolution = Resolution::default();

    for (key, req) in reqs.iter().filter(|(_, req)| !req.is_deleted()) {
        let mut linked = BTreeSet::new();
        for parent_id in &req.parent_ids {
            if reqs.contains_key(parent_id) && linked.insert(parent_id) {
                resolution.req_links.push((key.clone(), parent_id.clone()));
            }
        }

        resolution.issues.extend(check_requirement(req, reqs));
    }

    let symbols = SymbolLinks::collect(code_tags);
    resolution.issues.extend(symbols.issues);

    for (file, tags) in code_tags {
        for (index, code) in tags.iter().enumerate() {
            let parent_ids = if code.tag.is_empty() {
                &code.parent_ids
            } else {
                symbols
                    .links
                    .get(&SymbolKey::of(code))
                    .map_or(&code.parent_ids, |(links, _)| links)
            };

            if parent_ids.is_empty() && !code.optional {
                resolution.issues.push(code_issue(
                    code,
                    IssueType::MissingRequirementInCode,
                    format!("Function {code} has no parents."),
                ));
            }

            for parent_id in parent_ids {
                let (issues, linked) = check_code_parent(code, parent_id, reqs);
                resolution.issues.extend(issues);
                if linked {
                    resolution
                        .code_links
                        .push((file.clone(), index, parent_id.clone()));
                }
            }
        }
    }

    resolution
        .issues
        .extend(tested_but_not_implemented(reqs, &resolution.code_links));

    resolution
}

fn req_issue(req: &Req, issue_type: IssueType, error: String) -> Issue {
    Issue {
        repo: req.repo.clone(),
        path: req.document.path.clone(),
        line: req.position,
        issue_type,
        error,
    }
}

fn code_issue(code: &Code, issue_type: IssueType, error: String) -> Issue {
    Issue {
        repo: code.file.repo.clone(),
        path: code.file.path.clone(),
        line: code.line,
        issue_type,
        error,
    }
}

fn check_requirement(req: &Req, reqs: &BTreeMap<String, Req>) -> Vec<Issue> {
    let mut issues = Vec::new();
    let id = &req.id;
    let schema = &req.document.schema;

    if !schema.requirements.is_match(&id.to_string()) {
        issues.push(req_issue(
            req,
            IssueType::InvalidRequirementId,
            format!(
                "Requirement `{id}` in document `{}` does not match required regexp `{}`",
                req.document.path.display(),
                schema.requirements
            ),
        ));
    }

    issues.extend(check_attributes(req));

    for parent_id in &req.parent_ids {
        let Some(parent) = reqs.get(parent_id) else {
            issues.push(req_issue(
                req,
                IssueType::InvalidParent,
                format!("Invalid parent of requirement {id}: {parent_id} does not exist."),
            ));
            continue;
        };

        if parent.is_deleted() {
            issues.push(req_issue(
                req,
                IssueType::InvalidParent,
                format!("Invalid parent of requirement {id}: {parent_id} is deleted."),
            ));
        }

        if req.variant() == Variant::Requirement {
            if let Some(error) = validate_link(req, parent) {
                issues.push(req_issue(req, IssueType::InvalidParent, error));
            }
        }
    }

    for reference in ReqId::find_all(&req.body) {
        let reference = reference.to_string();
        let problem = match reqs.get(&reference) {
            None => "does not exist",
            Some(target) if target.is_deleted() => "is deleted",
            Some(_) => continue,
        };
        issues.push(req_issue(
            req,
            IssueType::InvalidRequirementReference,
            format!("Invalid reference in body of {id}: {reference} {problem}."),
        ));
    }

    issues
}

/// Checks a requirement's attributes against the schema for its variant.
///
/// An attribute with an empty value counts as absent.
fn check_attributes(req: &Req) -> Vec<Issue> {
    let id = &req.id;
    let schema = req.document.schema.attributes_for(req.variant());
    let mut issues = Vec::new();
    let mut any_keys = Vec::new();
    let mut any_present = false;

    for (name, attribute) in schema {
        let is_any = attribute.kind == AttributeType::Any;
        if is_any {
            any_keys.push(name.as_str());
        }

        match req.attributes.get(name).filter(|value| !value.is_empty()) {
            None if attribute.kind == AttributeType::Required => {
                issues.push(req_issue(
                    req,
                    IssueType::MissingAttribute,
                    format!("Requirement '{id}' is missing attribute '{name}'."),
                ));
            }
            None => {}
            Some(value) => {
                any_present |= is_any;
                if !attribute.value.is_match(value) {
                    issues.push(req_issue(
                        req,
                        IssueType::InvalidAttributeValue,
                        format!(
                            "Requirement '{id}' has invalid value '{value}' in attribute '{name}'."
                        ),
                    ));
                }
            }
        }
    }

    if !any_keys.is_empty() && !any_present {
        issues.push(req_issue(
            req,
            IssueType::MissingAttribute,
            format!(
                "Requirement '{id}' is missing at least one of the attributes '{}'.",
                any_keys.join(",")
            ),
        ));
    }

    for name in req.attributes.keys() {
        if !schema.contains_key(name) {
            issues.push(req_issue(
                req,
                IssueType::UnknownAttribute,
                format!("Requirement '{id}' has unknown attribute '{name}'."),
            ));
        }
    }

    issues
}

/// Checks a parent link against the document's permitted links.
///
/// Returns a description of the problem, if there is one.
fn validate_link(req: &Req, parent: &Req) -> Option<String> {
    for link in &req.document.link_specs {
        if !link.child.matches_id(&req.id) {
            continue;
        }
        if let Some(filter) = &link.child.attribute {
            match req.attributes.get(&filter.key) {
                Some(value) if filter.value.is_match(value) => {}
                _ => continue,
            }
        }
        if !link.parent.matches_id(&parent.id) {
            continue;
        }
        if let Some(filter) = &link.parent.attribute {
            let value = parent.attributes.get(&filter.key);
            if !value.is_some_and(|value| filter.value.is_match(value)) {
                return Some(format!(
                    "Requirement '{}' has invalid parent link ID '{}' with attribute value '{}'=='{}'.",
                    req.id,
                    parent.id,
                    filter.key,
                    value.map_or("", String::as_str)
                ));
            }
        }
        return None;
    }

    Some(format!(
        "Requirement '{}' has invalid parent link ID '{}'.",
        req.id, parent.id
    ))
}

/// Identifies a symbol across its declarations and definitions.
///
/// Symbols are merged per document and separately for implementation and
/// tests, since a declaration and a test of the same name may legitimately
/// name different requirements.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SymbolKey {
    document: PathBuf,
    code_type: CodeType,
    tag: String,
}

impl SymbolKey {
    fn of(code: &Code) -> Self {
        Self {
            document: code.document.path.clone(),
            code_type: code.file.code_type,
            tag: code.tag.clone(),
        }
    }
}

/// The requirement IDs of every named symbol, taken from the first
/// location that declares any.
struct SymbolLinks<'a> {
    links: BTreeMap<SymbolKey, (Vec<String>, &'a Code)>,
    issues: Vec<Issue>,
}

impl<'a> SymbolLinks<'a> {
    fn collect(code_tags: &'a BTreeMap<CodeFile, Vec<Code>>) -> Self {
        let mut links: BTreeMap<SymbolKey, (Vec<String>, &'a Code)> = BTreeMap::new();
        let mut issues = Vec::new();

        for code in code_tags.values().flatten() {
            if code.parent_ids.is_empty() || code.tag.is_empty() {
                continue;
            }

            let key = SymbolKey::of(code);
            let Some((known, first)) = links.get(&key) else {
                links.insert(key, (code.parent_ids.clone(), code));
                continue;
            };

            if !same_ids(known, &code.parent_ids) {
                // The later location by (path, line) is named first.
                let (later, earlier) =
                    if (&first.file.path, first.line) >= (&code.file.path, code.line) {
                        (*first, code)
                    } else {
                        (code, *first)
                    };
                issues.push(code_issue(
                    code,
                    IssueType::InvalidRequirementInCode,
                    format!("LLR declarations differ in {later} and {earlier}."),
                ));
            }
        }

        Self { links, issues }
    }
}

/// Whether two ID lists hold the same IDs, in any order.
fn same_ids(a: &[String], b: &[String]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}

/// Checks one `@llr` reference of a symbol.
///
/// Returns the issues found, and whether the symbol should be linked to the
/// requirement.
fn check_code_parent(code: &Code, parent_id: &str, reqs: &BTreeMap<String, Req>) -> (Vec<Issue>, bool) {
    let mut issues = Vec::new();
    let repo = &code.file.repo;

    if !code.document.schema.requirements.is_match(parent_id) {
        issues.push(code_issue(
            code,
            IssueType::InvalidRequirementInCode,
            format!(
                "Invalid reference in function {code} in repo `{repo}`, `{parent_id}` does not match requirement format in document `{}`.",
                code.document.path.display()
            ),
        ));
    }

    let linked = match reqs.get(parent_id) {
        Some(parent) if parent.is_deleted() => {
            issues.push(code_issue(
                code,
                IssueType::InvalidRequirementInCode,
                format!("Invalid reference in function {code} in repo `{repo}`, {parent_id} is deleted."),
            ));
            false
        }
        Some(_) => true,
        None => {
            issues.push(code_issue(
                code,
                IssueType::InvalidRequirementInCode,
                format!("Invalid reference in function {code} in repo `{repo}`, {parent_id} does not exist."),
            ));
            false
        }
    };

    (issues, linked)
}

fn tested_but_not_implemented(
    reqs: &BTreeMap<String, Req>,
    code_links: &[(CodeFile, usize, String)],
) -> Vec<Issue> {
    let mut implemented = BTreeSet::new();
    let mut tested = BTreeSet::new();
    for (file, _, parent_id) in code_links {
        match file.code_type {
            CodeType::Implementation => implemented.insert(parent_id.as_str()),
            CodeType::Tests => tested.insert(parent_id.as_str()),
        };
    }

    tested
        .difference(&implemented)
        .filter_map(|id| reqs.get(*id))
        .filter(|req| req.document.has_implementation() && !req.is_deleted())
        .map(|req| {
            req_issue(
                req,
                IssueType::ReqTestedButNotImplemented,
                format!("Requirement {} is tested, but it is not implemented.", req.id),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use regex::Regex;
    use test_case::test_case;

    use crate::{
        ReqGraph,
        domain::{
            code::{Code, CodeFile, CodeType},
            document::{Attribute, AttributeType, Document, LinkSpec, RepoName, ReqSpec},
            issue::IssueType,
            requirement::Req,
        },
        storage::markdown,
    };

    fn reqs(document: &Arc<Document>, text: &str) -> Vec<Req> {
        markdown::parse(text)
            .unwrap()
            .into_iter()
            .map(|parsed| Req::from_markdown(parsed, RepoName::new("repo"), Arc::clone(document)))
            .collect()
    }

    fn attribute(kind: AttributeType, value: &str) -> Attribute {
        Attribute::new(kind, Regex::new(value).unwrap())
    }

    fn sys() -> Arc<Document> {
        Arc::new(Document::new("TEST-100-ORD.md", "TEST", "SYS").unwrap())
    }

    fn swl() -> Document {
        let mut document = Document::new("TEST-138-SDD.md", "TEST", "SWL").unwrap();
        document.link_specs.push(LinkSpec {
            child: ReqSpec::new("TEST", "SWL"),
            parent: ReqSpec::new("TEST", "SYS"),
        });
        document
            .schema
            .attributes
            .insert("PARENTS".into(), attribute(AttributeType::Any, ".*"));
        document.implementation.code_files.push("src/a.rs".into());
        document.implementation.test_files.push("tests/a.rs".into());
        document
    }

    const SYS: &str = "\
## REQ-TEST-SYS-1 First
Body.

## REQ-TEST-SYS-2 DELETED
";

    fn errors(graph: &ReqGraph) -> Vec<String> {
        graph.issues().iter().map(|issue| issue.error.clone()).collect()
    }

    fn single(graph: &ReqGraph) -> (IssueType, String) {
        assert_eq!(graph.issues().len(), 1, "{:?}", graph.issues());
        let issue = &graph.issues()[0];
        (issue.issue_type, issue.error.clone())
    }

    fn resolve_attributes(text: &str, schema: &[(&str, AttributeType, &str)]) -> ReqGraph {
        let mut document = Document::new("TEST-100-ORD.md", "TEST", "SYS").unwrap();
        for (name, kind, value) in schema {
            document
                .schema
                .attributes
                .insert((*name).to_string(), attribute(*kind, value));
        }
        let document = Arc::new(document);
        let mut graph = ReqGraph::new();
        graph.add_document(&document, reqs(&document, text));
        graph.resolve();
        graph
    }

    #[test]
    fn any_attributes_are_pooled() {
        let graph = resolve_attributes(
            "## REQ-TEST-SYS-1 Title\nBody.\n",
            &[
                ("VERIFICATION", AttributeType::Any, ".*"),
                ("RATIONALE", AttributeType::Any, ".*"),
            ],
        );
        assert_eq!(
            single(&graph),
            (
                IssueType::MissingAttribute,
                "Requirement 'REQ-TEST-SYS-1' is missing at least one of the attributes 'RATIONALE,VERIFICATION'.".to_string()
            )
        );
    }

    #[test]
    fn one_any_attribute_is_enough() {
        let graph = resolve_attributes(
            "## REQ-TEST-SYS-1 Title\nBody.\n\n### Attributes:\n- Rationale: because\n",
            &[
                ("VERIFICATION", AttributeType::Any, ".*"),
                ("RATIONALE", AttributeType::Any, ".*"),
            ],
        );
        assert!(graph.issues().is_empty(), "{:?}", graph.issues());
    }

    #[test_case(
        "### Attributes:\n- Rationale: \n",
        IssueType::MissingAttribute,
        "Requirement 'REQ-TEST-SYS-1' is missing attribute 'VERIFICATION'.";
        "missing"
    )]
    #[test_case(
        "### Attributes:\n- Verification: Inspection\n",
        IssueType::InvalidAttributeValue,
        "Requirement 'REQ-TEST-SYS-1' has invalid value 'Inspection' in attribute 'VERIFICATION'.";
        "invalid value"
    )]
    #[test_case(
        "### Attributes:\n- Verification: Test\n- Colour: red\n",
        IssueType::UnknownAttribute,
        "Requirement 'REQ-TEST-SYS-1' has unknown attribute 'COLOUR'.";
        "unknown"
    )]
    fn attribute_rules(attributes: &str, issue_type: IssueType, error: &str) {
        let graph = resolve_attributes(
            &format!("## REQ-TEST-SYS-1 Title\nBody.\n\n{attributes}"),
            &[
                ("VERIFICATION", AttributeType::Required, "^(Test|Demonstration)$"),
                ("RATIONALE", AttributeType::Optional, ".*"),
            ],
        );
        assert_eq!(single(&graph), (issue_type, error.to_string()));
    }

    #[test]
    fn assumptions_use_their_own_schema() {
        let mut document = Document::new("TEST-100-ORD.md", "TEST", "SYS").unwrap();
        document
            .schema
            .attributes
            .insert("VERIFICATION".into(), attribute(AttributeType::Required, ".*"));
        let document = Arc::new(document);
        let mut graph = ReqGraph::new();
        graph.add_document(&document, reqs(&document, "## ASM-TEST-SYS-1 Assumed\nBody.\n"));
        graph.resolve();
        assert!(graph.issues().is_empty(), "{:?}", graph.issues());
    }

    #[test]
    fn body_references_are_checked() {
        let sys = sys();
        let mut graph = ReqGraph::new();
        graph.add_document(
            &sys,
            reqs(
                &sys,
                &format!("{SYS}\n## REQ-TEST-SYS-3 Third\nSee REQ-TEST-SYS-2 and REQ-TEST-SYS-9, and REQ-TEST-SYS-1.\n"),
            ),
        );
        graph.resolve();
        assert_eq!(
            errors(&graph),
            [
                "Invalid reference in body of REQ-TEST-SYS-3: REQ-TEST-SYS-2 is deleted.",
                "Invalid reference in body of REQ-TEST-SYS-3: REQ-TEST-SYS-9 does not exist.",
            ]
        );
        assert!(
            graph
                .issues()
                .iter()
                .all(|issue| issue.issue_type == IssueType::InvalidRequirementReference)
        );
    }

    fn resolve_swl(text: &str) -> ReqGraph {
        let sys = sys();
        let swl = Arc::new(swl());
        let mut graph = ReqGraph::new();
        graph.add_document(&sys, reqs(&sys, SYS));
        graph.add_document(&swl, reqs(&swl, text));
        graph.resolve();
        graph
    }

    #[test_case(
        "REQ-TEST-SYS-2",
        "Invalid parent of requirement REQ-TEST-SWL-1: REQ-TEST-SYS-2 is deleted.";
        "deleted"
    )]
    #[test_case(
        "REQ-TEST-SYS-7",
        "Invalid parent of requirement REQ-TEST-SWL-1: REQ-TEST-SYS-7 does not exist.";
        "missing"
    )]
    fn invalid_parents(parent: &str, error: &str) {
        let graph = resolve_swl(&format!(
            "## REQ-TEST-SWL-1 Low\nBody.\n\n### Attributes:\n- Parents: {parent}\n"
        ));
        assert_eq!(single(&graph), (IssueType::InvalidParent, error.to_string()));
    }

    #[test]
    fn parent_outside_link_specs_is_invalid() {
        let sys = sys();
        let swl = Arc::new(swl());
        let other = Arc::new(Document::new("TEST-137-SRD.md", "TEST", "SWH").unwrap());
        let mut graph = ReqGraph::new();
        graph.add_document(&sys, reqs(&sys, SYS));
        graph.add_document(&other, reqs(&other, "## REQ-TEST-SWH-1 High\nBody.\n"));
        graph.add_document(
            &swl,
            reqs(&swl, "## REQ-TEST-SWL-1 Low\nBody.\n\n### Attributes:\n- Parents: REQ-TEST-SWH-1\n"),
        );
        graph.resolve();
        assert_eq!(
            single(&graph),
            (
                IssueType::InvalidParent,
                "Requirement 'REQ-TEST-SWL-1' has invalid parent link ID 'REQ-TEST-SWH-1'.".to_string()
            )
        );
    }

    #[test]
    fn parent_attribute_filter_is_enforced() {
        let mut sys = Document::new("TEST-100-ORD.md", "TEST", "SYS").unwrap();
        sys.schema
            .attributes
            .insert("SAFETY".into(), attribute(AttributeType::Optional, ".*"));
        let sys = Arc::new(sys);
        let mut swl = swl();
        swl.link_specs[0].parent = ReqSpec::new("TEST", "SYS").with_attribute("Safety", Regex::new("^yes$").unwrap());
        let swl = Arc::new(swl);

        let mut graph = ReqGraph::new();
        graph.add_document(
            &sys,
            reqs(&sys, "## REQ-TEST-SYS-1 First\nBody.\n\n### Attributes:\n- Safety: no\n"),
        );
        graph.add_document(
            &swl,
            reqs(&swl, "## REQ-TEST-SWL-1 Low\nBody.\n\n### Attributes:\n- Parents: REQ-TEST-SYS-1\n"),
        );
        graph.resolve();
        assert_eq!(
            single(&graph).1,
            "Requirement 'REQ-TEST-SWL-1' has invalid parent link ID 'REQ-TEST-SYS-1' with attribute value 'SAFETY'=='no'."
        );
    }

    #[test]
    fn deleted_requirements_are_not_validated() {
        let graph = resolve_attributes(
            "## REQ-TEST-SYS-1 DELETED\n",
            &[("VERIFICATION", AttributeType::Required, ".*")],
        );
        assert!(graph.issues().is_empty());
    }

    fn code(file: &CodeFile, tag: &str, line: usize, parents: &[&str], document: &Arc<Document>) -> Code {
        let mut code = Code::new(file.clone(), tag, line, Arc::clone(document));
        code.parent_ids = parents.iter().map(ToString::to_string).collect();
        code
    }

    fn low_level() -> (ReqGraph, Arc<Document>) {
        let sys = sys();
        let swl = Arc::new(swl());
        let mut graph = ReqGraph::new();
        graph.add_document(&sys, reqs(&sys, SYS));
        graph.add_document(
            &swl,
            reqs(
                &swl,
                "## REQ-TEST-SWL-1 Low\nBody.\n\n### Attributes:\n- Parents: REQ-TEST-SYS-1\n\n\
                 ## REQ-TEST-SWL-2 DELETED\n",
            ),
        );
        (graph, swl)
    }

    fn implementation() -> CodeFile {
        CodeFile::new(RepoName::new("repo"), "src/a.rs", CodeType::Implementation)
    }

    fn tests() -> CodeFile {
        CodeFile::new(RepoName::new("repo"), "tests/a.rs", CodeType::Tests)
    }

    #[test]
    fn symbols_are_linked_to_requirements() {
        let (mut graph, swl) = low_level();
        let file = implementation();
        graph.add_code(file.clone(), vec![code(&file, "run", 4, &["REQ-TEST-SWL-1"], &swl)]);
        let test_file = tests();
        graph.add_code(test_file.clone(), vec![code(&test_file, "run_works", 9, &["REQ-TEST-SWL-1"], &swl)]);
        graph.resolve();

        assert!(graph.issues().is_empty(), "{:?}", graph.issues());
        let req = graph.get("REQ-TEST-SWL-1").unwrap();
        let tags: Vec<String> = req.tags.iter().map(ToString::to_string).collect();
        assert_eq!(tags, ["run@src/a.rs:4", "run_works@tests/a.rs:9"]);
        assert_eq!(graph.code_tags()[&file][0].parents, ["REQ-TEST-SWL-1"]);
    }

    #[test]
    fn unannotated_function_has_no_parents() {
        let (mut graph, swl) = low_level();
        let file = implementation();
        graph.add_code(
            file.clone(),
            vec![code(&file, "run", 4, &["REQ-TEST-SWL-1"], &swl), code(&file, "helper", 12, &[], &swl)],
        );
        let test_file = tests();
        graph.add_code(test_file.clone(), vec![code(&test_file, "unrelated_test", 3, &[], &swl)]);
        graph.resolve();

        assert_eq!(
            single(&graph),
            (
                IssueType::MissingRequirementInCode,
                "Function helper@src/a.rs:12 has no parents.".to_string()
            )
        );
    }

    #[test_case(
        "REQ-TEST-SWL-12",
        &["Invalid reference in function run@src/a.rs:4 in repo `repo`, REQ-TEST-SWL-12 does not exist."];
        "missing"
    )]
    #[test_case(
        "REQ-TEST-SWL-2",
        &["Invalid reference in function run@src/a.rs:4 in repo `repo`, REQ-TEST-SWL-2 is deleted."];
        "deleted"
    )]
    #[test_case(
        "REQ-TEST-SYS-1",
        &["Invalid reference in function run@src/a.rs:4 in repo `repo`, `REQ-TEST-SYS-1` does not match requirement format in document `TEST-138-SDD.md`."];
        "foreign document"
    )]
    fn invalid_code_references(parent: &str, expected: &[&str]) {
        let (mut graph, swl) = low_level();
        let file = implementation();
        graph.add_code(
            file.clone(),
            vec![
                code(&file, "run", 4, &[parent], &swl),
                code(&file, "covered", 8, &["REQ-TEST-SWL-1"], &swl),
            ],
        );
        graph.resolve();
        assert_eq!(errors(&graph), expected);
        assert!(
            graph
                .issues()
                .iter()
                .all(|issue| issue.issue_type == IssueType::InvalidRequirementInCode)
        );
    }

    #[test]
    fn declarations_share_links() {
        let (mut graph, swl) = low_level();
        let header = CodeFile::new(RepoName::new("repo"), "src/a.h", CodeType::Implementation);
        let source = implementation();
        graph.add_code(header.clone(), vec![code(&header, "run", 2, &["REQ-TEST-SWL-1"], &swl)]);
        graph.add_code(source.clone(), vec![code(&source, "run", 10, &[], &swl)]);
        graph.resolve();

        assert!(graph.issues().is_empty(), "{:?}", graph.issues());
        assert_eq!(graph.code_tags()[&source][0].parents, ["REQ-TEST-SWL-1"]);
    }

    #[test]
    fn conflicting_declarations_are_reported() {
        let (mut graph, swl) = low_level();
        let header = CodeFile::new(RepoName::new("repo"), "src/a.h", CodeType::Implementation);
        let source = implementation();
        graph.add_code(header.clone(), vec![code(&header, "run", 2, &["REQ-TEST-SWL-1"], &swl)]);
        graph.add_code(
            source.clone(),
            vec![code(&source, "run", 10, &["REQ-TEST-SWL-1", "REQ-TEST-SWL-1"], &swl)],
        );
        graph.resolve();

        assert_eq!(
            single(&graph),
            (
                IssueType::InvalidRequirementInCode,
                "LLR declarations differ in run@src/a.rs:10 and run@src/a.h:2.".to_string()
            )
        );
    }

    #[test]
    fn conflicting_declarations_name_the_later_location_first() {
        let (mut graph, swl) = low_level();
        let later = CodeFile::new(RepoName::new("a"), "src/z.rs", CodeType::Implementation);
        let earlier = CodeFile::new(RepoName::new("b"), "src/a.rs", CodeType::Implementation);
        graph.add_code(later.clone(), vec![code(&later, "run", 3, &["REQ-TEST-SWL-1"], &swl)]);
        graph.add_code(
            earlier.clone(),
            vec![code(&earlier, "run", 40, &["REQ-TEST-SWL-1", "REQ-TEST-SWL-1"], &swl)],
        );
        graph.resolve();

        assert_eq!(
            single(&graph),
            (
                IssueType::InvalidRequirementInCode,
                "LLR declarations differ in run@src/z.rs:3 and run@src/a.rs:40.".to_string()
            )
        );
    }

    #[test]
    fn deleted_requirements_are_not_linked() {
        let sys = sys();
        let swl = Arc::new(swl());
        let mut graph = ReqGraph::new();
        graph.add_document(&sys, reqs(&sys, SYS));
        graph.add_document(
            &swl,
            reqs(
                &swl,
                "## REQ-TEST-SWL-1 Low\nBody.\n\n### Attributes:\n- Parents: REQ-TEST-SYS-1\n\n\
                 ## REQ-TEST-SWL-2 DELETED Old\nBody.\n\n### Attributes:\n- Parents: REQ-TEST-SYS-1\n",
            ),
        );
        graph.resolve();

        assert!(graph.get("REQ-TEST-SWL-2").unwrap().parents.is_empty());
        assert_eq!(graph.get("REQ-TEST-SYS-1").unwrap().children, ["REQ-TEST-SWL-1"]);
    }

    #[test]
    fn tested_but_not_implemented() {
        let (mut graph, swl) = low_level();
        let test_file = tests();
        graph.add_code(test_file.clone(), vec![code(&test_file, "run_works", 9, &["REQ-TEST-SWL-1"], &swl)]);
        graph.resolve();

        assert_eq!(
            single(&graph),
            (
                IssueType::ReqTestedButNotImplemented,
                "Requirement REQ-TEST-SWL-1 is tested, but it is not implemented.".to_string()
            )
        );
    }

    #[test]
    fn issues_are_sorted_by_location() {
        let (mut graph, swl) = low_level();
        let file = implementation();
        graph.add_code(
            file.clone(),
            vec![code(&file, "b", 20, &[], &swl), code(&file, "a", 5, &[], &swl)],
        );
        graph.resolve();
        let lines: Vec<usize> = graph.issues().iter().map(|issue| issue.line).collect();
        assert_eq!(lines, [5, 20]);
    }
}
