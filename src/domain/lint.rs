//! ID naming and sequencing rules for the requirements of one document.
//!
//! Within a document, every ID must carry the document's prefix and level,
//! and the numbers of each variant must run `1, 2, 3, ...` without gaps or
//! repeats. Requirements breaking a rule are reported and left out of the
//! graph, so they cannot trigger follow-on findings during resolution.

use std::collections::BTreeSet;

use crate::domain::{
    document::ReqSpec,
    issue::{Issue, IssueType},
    req_id::Variant,
    requirement::Req,
};

/// The running sequence state of one variant.
#[derive(Debug)]
struct Sequence {
    expected: u64,
    seen: BTreeSet<u64>,
}

impl Default for Sequence {
    fn default() -> Self {
        Self {
            expected: 1,
            seen: BTreeSet::new(),
        }
    }
}

/// Checks the IDs of a document's requirements against its spec.
///
/// Requirements are checked in ascending number order, separately for
/// requirements and assumptions. Returns the requirements that passed every
/// check, and an issue for every failed check.
#[must_use]
pub fn lint(spec: &ReqSpec, mut reqs: Vec<Req>) -> (Vec<Req>, Vec<Issue>) {
    reqs.sort_by_key(Req::id_number);

    let mut requirements = Sequence::default();
    let mut assumptions = Sequence::default();
    let mut accepted = Vec::with_capacity(reqs.len());
    let mut issues = Vec::new();

    for req in reqs {
        let sequence = match req.variant() {
            Variant::Requirement => &mut requirements,
            Variant::Assumption => &mut assumptions,
        };

        let errors = check_id(spec, &req, sequence);
        sequence.expected = req.id_number().saturating_add(1);

        if errors.is_empty() {
            accepted.push(req);
            continue;
        }

        issues.extend(errors.into_iter().map(|error| Issue {
            repo: req.repo.clone(),
            path: req.document.path.clone(),
            line: req.position,
            issue_type: IssueType::InvalidRequirementId,
            error,
        }));
    }

    (accepted, issues)
}

fn check_id(spec: &ReqSpec, req: &Req, sequence: &mut Sequence) -> Vec<String> {
    let id = &req.id;
    let mut errors = Vec::new();

    if id.prefix() != spec.prefix {
        errors.push(format!(
            "Incorrect project abbreviation for requirement {id}. Expected {}, got {}.",
            spec.prefix,
            id.prefix()
        ));
    }
    if id.level() != spec.level {
        errors.push(format!(
            "Incorrect requirement type for requirement {id}. Expected {}, got {}.",
            spec.level,
            id.level()
        ));
    }
    if id.digits().starts_with('0') {
        errors.push(format!(
            "Requirement number cannot begin with a 0: {id}. Got {}.",
            id.digits()
        ));
    }

    let number = id.number();
    if number == u64::MAX {
        errors.push(format!(
            "Invalid requirement sequence number for {id}: number is too large."
        ));
    } else if number < 1 {
        errors.push(format!(
            "Invalid requirement sequence number for {id}: first requirement has to start with 001."
        ));
    } else if !sequence.seen.insert(number) {
        errors.push(format!(
            "Invalid requirement sequence number for {id}, is duplicate."
        ));
    } else if number != sequence.expected {
        errors.push(format!(
            "Invalid requirement sequence number for {id}: missing requirements in between. Expected ID Number {}.",
            sequence.expected
        ));
    }

    errors
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use test_case::test_case;

    use super::*;
    use crate::{
        domain::document::{Document, RepoName},
        storage::markdown,
    };

    fn reqs(ids: &[&str]) -> Vec<Req> {
        let document = Arc::new(Document::new("TEST-100-ORD.md", "TEST", "SYS").unwrap());
        let text: String = ids
            .iter()
            .map(|id| format!("## {id} Title\nBody of {id}.\n\n"))
            .collect();
        markdown::parse(&text)
            .unwrap()
            .into_iter()
            .map(|parsed| Req::from_markdown(parsed, RepoName::new("repo"), Arc::clone(&document)))
            .collect()
    }

    fn lint_ids(ids: &[&str]) -> (Vec<String>, Vec<String>) {
        let (accepted, issues) = lint(&ReqSpec::new("TEST", "SYS"), reqs(ids));
        (
            accepted.iter().map(Req::key).collect(),
            issues.into_iter().map(|issue| issue.error).collect(),
        )
    }

    #[test]
    fn contiguous_sequence_is_clean() {
        let (accepted, errors) = lint_ids(&["REQ-TEST-SYS-2", "REQ-TEST-SYS-1", "REQ-TEST-SYS-3"]);
        assert_eq!(accepted, ["REQ-TEST-SYS-1", "REQ-TEST-SYS-2", "REQ-TEST-SYS-3"]);
        assert!(errors.is_empty());
    }

    #[test]
    fn gap_names_expected_number() {
        let (accepted, errors) = lint_ids(&[
            "REQ-TEST-SYS-1",
            "REQ-TEST-SYS-2",
            "REQ-TEST-SYS-3",
            "REQ-TEST-SYS-5",
            "REQ-TEST-SYS-6",
        ]);
        assert_eq!(
            errors,
            ["Invalid requirement sequence number for REQ-TEST-SYS-5: missing requirements in between. Expected ID Number 4."]
        );
        assert_eq!(accepted.len(), 4);
        assert!(!accepted.contains(&"REQ-TEST-SYS-5".to_string()));
    }

    #[test]
    fn repeat_is_duplicate() {
        let (accepted, errors) = lint_ids(&["REQ-TEST-SYS-1", "REQ-TEST-SYS-1", "REQ-TEST-SYS-2"]);
        assert_eq!(
            errors,
            ["Invalid requirement sequence number for REQ-TEST-SYS-1, is duplicate."]
        );
        assert_eq!(accepted, ["REQ-TEST-SYS-1", "REQ-TEST-SYS-2"]);
    }

    #[test]
    fn variants_are_sequenced_independently() {
        let (accepted, errors) = lint_ids(&[
            "REQ-TEST-SYS-1",
            "ASM-TEST-SYS-1",
            "REQ-TEST-SYS-2",
            "ASM-TEST-SYS-2",
        ]);
        assert!(errors.is_empty());
        assert_eq!(accepted.len(), 4);
    }

    #[test_case("REQ-OTHER-SYS-1", "Incorrect project abbreviation for requirement REQ-OTHER-SYS-1. Expected TEST, got OTHER."; "prefix")]
    #[test_case("REQ-TEST-SWH-1", "Incorrect requirement type for requirement REQ-TEST-SWH-1. Expected SYS, got SWH."; "level")]
    #[test_case("REQ-TEST-SYS-01", "Requirement number cannot begin with a 0: REQ-TEST-SYS-01. Got 01."; "leading zero")]
    fn naming_rules(id: &str, expected: &str) {
        let (accepted, errors) = lint_ids(&[id]);
        assert!(accepted.is_empty());
        assert_eq!(errors, [expected]);
    }

    #[test]
    fn largest_number_is_rejected() {
        let (accepted, errors) = lint_ids(&["REQ-TEST-SYS-1", "REQ-TEST-SYS-18446744073709551615"]);
        assert_eq!(accepted, ["REQ-TEST-SYS-1"]);
        assert_eq!(
            errors,
            ["Invalid requirement sequence number for REQ-TEST-SYS-18446744073709551615: number is too large."]
        );
    }

    #[test]
    fn issues_point_at_requirement_line() {
        let (_, issues) = lint(
            &ReqSpec::new("TEST", "SYS"),
            reqs(&["REQ-TEST-SYS-1", "REQ-TEST-SYS-3"]),
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 4);
        assert_eq!(issues[0].issue_type, IssueType::InvalidRequirementId);
        assert_eq!(issues[0].path, std::path::Path::new("TEST-100-ORD.md"));
    }
}
