//! `@llr` comments linking functions to the requirements they implement.
//!
//! A function is linked to requirements by a comment line directly above it
//! consisting only of an `@llr` marker (or the legacy `\llr`) and a list of
//! requirement IDs:
//!
//! ```text
//! // @llr REQ-TEST-SWL-12, REQ-TEST-SWL-13
//! fn log_flight_data() {}
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::code::Code;

static LLR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t*/!#]*(?:@|\\)llr +(?:REQ-\w+-\w+-\d+[, ]*)+$")
        .expect("llr line pattern is a valid regex")
});

static LLR_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"REQ-\w+-\w+-\d+").expect("llr id pattern is a valid regex"));

/// Fills in the `parent_ids` of every symbol in `codes` from the `@llr`
/// comments in `source`.
///
/// `codes` must all be tagged in the same file, whose text is `source`. They
/// are sorted by line. For each symbol, the lines above it are scanned
/// upwards, stopping at a blank line, at the line of the previous symbol, or
/// at the first `@llr` line, whose IDs become the symbol's parents. Symbols
/// sharing a line (overloads) share their parents.
pub fn annotate(source: &str, codes: &mut [Code]) {
    let lines: Vec<&str> = source.lines().collect();
    codes.sort_by_key(|code| code.line);

    // Lines are 1-based, so no symbol sits on the initial floor.
    let mut floor = 0;
    let mut inherited = Vec::new();
    for code in codes.iter_mut() {
        if code.line == floor {
            code.parent_ids.clone_from(&inherited);
            continue;
        }

        code.parent_ids = scan_above(&lines, code.line, floor);
        inherited.clone_from(&code.parent_ids);
        floor = code.line;
    }
}

/// Scans upwards from the line above `line` (both 1-based) to just above
/// `floor`.
fn scan_above(lines: &[&str], line: usize, floor: usize) -> Vec<String> {
    for number in (floor + 1..line).rev() {
        let Some(text) = lines.get(number - 1) else {
            continue;
        };
        if LLR_LINE.is_match(text) {
            return LLR_ID
                .find_iter(text)
                .map(|id| id.as_str().to_string())
                .collect();
        }
        if text.trim().is_empty() {
            break;
        }
    }
    Vec::new()
}
