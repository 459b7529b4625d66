//! Change reports between two snapshots of a requirement graph.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{graph::ReqGraph, requirement::Req};

/// Describes how every requirement changed between `previous` and `current`.
///
/// The result maps requirement IDs to human-readable change descriptions.
/// Requirements with no changes are left out, and `None` is returned if no
/// requirement changed at all.
///
/// Titles, bodies and attribute values are compared on their letters only,
/// ignoring case, whitespace and punctuation.
#[must_use]
pub fn changed_since(
    current: &ReqGraph,
    previous: &ReqGraph,
) -> Option<BTreeMap<String, Vec<String>>> {
    let ids: BTreeSet<&String> = current.reqs().keys().chain(previous.reqs().keys()).collect();

    let diffs: BTreeMap<String, Vec<String>> = ids
        .into_iter()
        .filter_map(|id| {
            let changes = changes(current.get(id), previous.get(id));
            (!changes.is_empty()).then(|| (id.clone(), changes))
        })
        .collect();

    (!diffs.is_empty()).then_some(diffs)
}

fn changes(current: Option<&Req>, previous: Option<&Req>) -> Vec<String> {
    let (current, previous) = match (current, previous) {
        (None, None) => return Vec::new(),
        (None, Some(_)) => return vec!["MISSING".to_string()],
        (Some(_), None) => return vec!["ADDED".to_string()],
        (Some(current), Some(previous)) => (current, previous),
    };

    match (current.is_deleted(), previous.is_deleted()) {
        (true, true) => return Vec::new(),
        (true, false) => return vec!["DELETED".to_string()],
        (false, true) => return vec!["UNDELETED".to_string()],
        (false, false) => {}
    }

    let mut diffs = Vec::new();

    let (level, previous_level) = (&current.document.req_spec.level, &previous.document.req_spec.level);
    if level != previous_level {
        diffs.push(format!(
            "Level changed from {previous_level:?} to {level:?} (should not happen!)"
        ));
    }

    if only_letters(&current.title) == only_letters(&previous.title) {
        if only_letters(&current.body) != only_letters(&previous.body) {
            diffs.push("Body changed".to_string());
        }
    } else {
        diffs.push(format!(
            "Title changed from {:?} to {:?}",
            previous.title, current.title
        ));
    }

    if current.repo != previous.repo || current.document.path != previous.document.path {
        diffs.push(format!(
            "Document changed from ({:?} - {:?}) to ({:?} - {:?})",
            previous.repo.as_str(),
            previous.document.path.display().to_string(),
            current.repo.as_str(),
            current.document.path.display().to_string(),
        ));
    }

    let keys: BTreeSet<&String> = current
        .attributes
        .keys()
        .chain(previous.attributes.keys())
        .filter(|key| *key != "PARENTS")
        .collect();
    for key in keys {
        match (current.attributes.get(key), previous.attributes.get(key)) {
            (Some(value), None) => diffs.push(format!("Added {key:?}: {value:?}")),
            (None, Some(_)) => diffs.push(format!("Removed {key:?}")),
            (Some(value), Some(previous_value))
                if only_letters(value) != only_letters(previous_value) =>
            {
                diffs.push(format!(
                    "Changed {key:?} from {previous_value:?} to {value:?}"
                ));
            }
            _ => {}
        }
    }

    for parent in &previous.parent_ids {
        if !current.parent_ids.contains(parent) {
            diffs.push(format!("Removed parent {parent:?}"));
        }
    }
    for parent in &current.parent_ids {
        if !previous.parent_ids.contains(parent) {
            diffs.push(format!("Added parent {parent:?}"));
        }
    }

    diffs
}

/// Keeps only the letters of `text`, lower-cased.
fn only_letters(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect()
}
