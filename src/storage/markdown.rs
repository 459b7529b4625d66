use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;

use crate::domain::req_id::{self, ID_REGEX, ReqId};

static ATX_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(#{1,6})(?: +(.*?)(?: #* *)?)?$").expect("heading pattern is a valid regex")
});

static TABLE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\| *ID *\|(?:[^|]*\|)+$").expect("table header pattern is a valid regex")
});

static TABLE_DELIMITER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\|(?: *:?-+:? *\|)+$").expect("table delimiter pattern is a valid regex")
});

static ATTRIBUTES_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)\n#{2,6} Attributes:$").expect("attributes pattern is a valid regex")
});

static ATTRIBUTE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^- (.+?):").expect("attribute key pattern is a valid regex"));

/// A requirement as read from a document, before it is placed in a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownRequirement {
    /// The requirement's ID.
    pub id: ReqId,
    /// Title text, without the ID.
    pub title: String,
    /// Body text with surrounding blank lines removed.
    pub body: String,
    /// Attributes keyed by upper-cased name. `PARENT` is stored as `PARENTS`.
    pub attributes: BTreeMap<String, String>,
    /// IDs listed in the `PARENTS` attribute, in the order written.
    pub parent_ids: Vec<String>,
    /// Line the requirement heading (or table row) is on.
    pub position: usize,
    /// Whether the title marks the requirement as a `DELETED` tombstone.
    pub deleted: bool,
}

impl MarkdownRequirement {
    fn new(
        id: ReqId,
        title: &str,
        body: &str,
        attributes: BTreeMap<String, String>,
        position: usize,
    ) -> Result<Self, ParseError> {
        let parent_ids = parse_parents(&id, attributes.get("PARENTS").map(String::as_str))?;

        Ok(Self {
            deleted: title.starts_with("DELETED"),
            id,
            title: title.to_string(),
            body: body.to_string(),
            attributes,
            parent_ids,
            position,
        })
    }
}

/// Parses every requirement out of a markdown document, in document order.
///
/// Two notations are recognised, and may be mixed within one document:
///
/// - an ATX heading whose title starts with a requirement ID opens a
///   requirement, which runs until the next heading at the same or a
///   shallower level. An `Attributes:` sub-heading introduces `- Key: value`
///   lines.
/// - a table whose first column is headed `ID` holds one requirement per row.
///   The `Title` and `Body` columns fill the matching fields, every other
///   non-empty cell becomes an attribute.
///
/// # Errors
///
/// Returns an error on the first structural problem found: badly nested
/// requirement headings, a heading with several IDs, malformed IDs, empty
/// requirements, malformed attributes or parent lists, and malformed tables.
pub fn parse(text: &str) -> Result<Vec<MarkdownRequirement>, ParseError> {
    let mut parser = Parser::default();
    for (index, line) in text.lines().enumerate() {
        parser.line(index + 1, line)?;
    }
    parser.finish()
}

#[derive(Debug, Default, Clone, Copy)]
enum Block {
    #[default]
    None,
    Heading {
        level: usize,
        line: usize,
    },
    Table {
        line: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct LastHeading {
    level: usize,
    line: usize,
    is_requirement: bool,
}

#[derive(Debug, Default)]
struct Parser<'a> {
    requirements: Vec<MarkdownRequirement>,
    block: Block,
    buffer: Vec<&'a str>,
    last_heading: Option<LastHeading>,
}

impl<'a> Parser<'a> {
    fn line(&mut self, number: usize, line: &'a str) -> Result<(), ParseError> {
        if matches!(self.block, Block::Table { .. }) && !line.starts_with('|') {
            self.close()?;
        }

        if let Some(captures) = ATX_HEADING.captures(line) {
            let level = captures[1].len();
            let title = captures.get(2).map_or("", |m| m.as_str());
            return self.heading(number, line, level, title);
        }

        if TABLE_HEADER.is_match(line) {
            self.close()?;
            self.block = Block::Table { line: number };
        }

        if !matches!(self.block, Block::None) {
            self.buffer.push(line);
        }
        Ok(())
    }

    fn heading(
        &mut self,
        number: usize,
        line: &'a str,
        level: usize,
        title: &'a str,
    ) -> Result<(), ParseError> {
        let ids = ID_REGEX.find_iter(title).count();
        if ids > 1 {
            return Err(ParseError::TooManyIds {
                line: number,
                text: line.to_string(),
            });
        }
        let has_id = ids == 1;

        if let Block::Heading {
            level: req_level,
            line: req_line,
        } = self.block
        {
            if has_id && level != req_level {
                return Err(ParseError::LevelMismatch {
                    line: number,
                    req_line,
                    level,
                    req_level,
                    text: line.to_string(),
                });
            }
            if !has_id && level == req_level {
                return Err(ParseError::SiblingHeading {
                    line: number,
                    req_line,
                    level,
                    text: line.to_string(),
                });
            }
            if has_id || level < req_level {
                self.close()?;
            }
        } else if has_id {
            if let Some(previous) = self.last_heading {
                if !previous.is_requirement && previous.level == level {
                    return Err(ParseError::SameLevelAsPrevious {
                        line: number,
                        previous_line: previous.line,
                        level,
                        text: line.to_string(),
                    });
                }
            }
        }

        self.last_heading = Some(LastHeading {
            level,
            line: number,
            is_requirement: has_id,
        });

        if has_id {
            self.block = Block::Heading {
                level,
                line: number,
            };
            self.buffer.clear();
            self.buffer.push(title.trim());
        } else if !matches!(self.block, Block::None) {
            self.buffer.push(line);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), ParseError> {
        let lines = std::mem::take(&mut self.buffer);
        match std::mem::take(&mut self.block) {
            Block::None => {}
            Block::Heading { line, .. } => {
                let requirement = parse_heading_requirement(&lines.join("\n"), line)?;
                self.requirements.push(requirement);
            }
            Block::Table { line } => {
                let requirements = parse_table(&lines, line)?;
                self.requirements.extend(requirements);
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<MarkdownRequirement>, ParseError> {
        self.close()?;
        Ok(self.requirements)
    }
}

fn is_punct_or_space(c: char) -> bool {
    c.is_whitespace() || c.is_ascii_punctuation()
}

/// Strips leading blank lines and trailing whitespace, keeping the
/// indentation of the first non-blank line.
fn trim_blank_lines(text: &str) -> &str {
    let text = text.trim_end();
    let content = text.trim_start();
    let leading = &text[..text.len() - content.len()];
    leading
        .rfind('\n')
        .map_or(content, |newline| &text[newline + 1..])
}

fn parse_heading_requirement(text: &str, position: usize) -> Result<MarkdownRequirement, ParseError> {
    let id = ReqId::extract_leading(text).map_err(|source| ParseError::Id {
        line: position,
        source,
    })?;
    let key = id.to_string();

    let rest = text[key.len()..]
        .trim_start_matches(is_punct_or_space)
        .trim_end();

    let Some(newline) = rest.find('\n') else {
        let title = rest.trim();
        if title.starts_with("DELETED") {
            return MarkdownRequirement::new(id, title, "", BTreeMap::new(), position);
        }
        return Err(ParseError::Empty { id: key });
    };

    let title = rest[..newline].trim();
    let after_title = &rest[newline..];

    let (body, attributes) = match ATTRIBUTES_SECTION.find(after_title) {
        Some(section) => (
            &after_title[..section.start()],
            parse_attributes(&key, &after_title[section.start()..])?,
        ),
        None => (after_title, BTreeMap::new()),
    };
    let body = trim_blank_lines(body);

    if body.is_empty() && !title.starts_with("DELETED") {
        return Err(ParseError::EmptyBody { id: key });
    }

    MarkdownRequirement::new(id, title, body, attributes, position)
}

fn normalise_key(key: &str) -> String {
    let key = key.trim().to_uppercase();
    if key == "PARENT" {
        "PARENTS".to_string()
    } else {
        key
    }
}

fn parse_attributes(id: &str, section: &str) -> Result<BTreeMap<String, String>, ParseError> {
    let keys: Vec<(usize, usize, &str)> = ATTRIBUTE_KEY
        .captures_iter(section)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let name = captures.get(1)?;
            Some((whole.start(), whole.end(), name.as_str()))
        })
        .collect();

    if keys.is_empty() {
        return Err(ParseError::NoAttributes { id: id.to_string() });
    }

    let mut attributes = BTreeMap::new();
    for (index, &(_, value_start, name)) in keys.iter().enumerate() {
        let value_end = keys
            .get(index + 1)
            .map_or(section.len(), |&(next_start, _, _)| next_start);
        let key = normalise_key(name);
        let value = section[value_start..value_end].trim().to_string();

        if attributes.insert(key.clone(), value).is_some() {
            return Err(ParseError::DuplicateAttribute {
                id: id.to_string(),
                key,
            });
        }
    }
    Ok(attributes)
}

fn parse_parents(id: &ReqId, value: Option<&str>) -> Result<Vec<String>, ParseError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };

    let unparseable = |separator: &str| ParseError::Parents {
        id: id.to_string(),
        separator: separator.to_string(),
        value: value.to_string(),
    };

    // Text before the first ID is ignored. IDs are separated by punctuation
    // and spaces only, and nothing but whitespace may follow the last one.
    let mut parents = Vec::new();
    let mut cursor = None;
    for found in ID_REGEX.find_iter(value) {
        if let Some(previous) = cursor {
            let separator = &value[previous..found.start()];
            if !separator.chars().all(is_punct_or_space) {
                return Err(unparseable(separator));
            }
        }
        parents.push(found.as_str().to_string());
        cursor = Some(found.end());
    }

    let trailing = &value[cursor.unwrap_or(0)..];
    if !trailing.trim().is_empty() {
        return Err(unparseable(trailing));
    }

    Ok(parents)
}

fn split_table_line(line: &str) -> Vec<&str> {
    let Some(inner) = line.strip_prefix('|') else {
        return Vec::new();
    };
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(str::trim).collect()
}

fn parse_table(lines: &[&str], start: usize) -> Result<Vec<MarkdownRequirement>, ParseError> {
    let Some(header) = lines.first().filter(|header| TABLE_HEADER.is_match(header)) else {
        return Err(ParseError::TableHeader);
    };
    let columns: Vec<String> = split_table_line(header).into_iter().map(normalise_key).collect();

    let mut requirements = Vec::new();
    for (index, row) in lines.iter().enumerate().skip(1) {
        if TABLE_DELIMITER.is_match(row) {
            continue;
        }

        let cells = split_table_line(row);
        if cells.is_empty() {
            break;
        }
        if cells.len() < columns.len() {
            return Err(ParseError::TooFewCells { row: index + 1 });
        }

        let position = start + index;
        let mut id = None;
        let mut title = "";
        let mut body = "";
        let mut attributes = BTreeMap::new();

        for (column, cell) in columns.iter().zip(cells) {
            match column.as_str() {
                "ID" => {
                    id = Some(ReqId::extract_leading(cell).map_err(|source| ParseError::Id {
                        line: position,
                        source,
                    })?);
                }
                "TITLE" => title = cell,
                "BODY" => body = cell,
                _ if !cell.is_empty() => {
                    attributes.insert(column.clone(), cell.to_string());
                }
                _ => {}
            }
        }

        let id = id.ok_or(ParseError::TableHeader)?;
        requirements.push(MarkdownRequirement::new(id, title, body, attributes, position)?);
    }

    Ok(requirements)
}

/// Structural errors that abort parsing of a document.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    /// A heading title holds more than one requirement ID.
    #[error("malformed requirement title: too many IDs on line {line}: {text:?}")]
    TooManyIds {
        /// Line of the heading.
        line: usize,
        /// The heading line.
        text: String,
    },

    /// Two requirement headings of one section are at different levels.
    #[error(
        "requirement heading on line {line} must be at same level as requirement heading on line {req_line} ({level} != {req_level}): {text:?}"
    )]
    LevelMismatch {
        /// Line of the offending heading.
        line: usize,
        /// Line of the open requirement.
        req_line: usize,
        /// Level of the offending heading.
        level: usize,
        /// Level of the open requirement.
        req_level: usize,
        /// The offending heading line.
        text: String,
    },

    /// A plain heading sits at the same level as an open requirement.
    #[error(
        "non-requirement heading on line {line} at same level as requirement heading on line {req_line} ({level}): {text:?}"
    )]
    SiblingHeading {
        /// Line of the offending heading.
        line: usize,
        /// Line of the open requirement.
        req_line: usize,
        /// Level shared by both headings.
        level: usize,
        /// The offending heading line.
        text: String,
    },

    /// A requirement heading sits at the same level as the section heading
    /// just before it.
    #[error(
        "requirement heading on line {line} at same level as previous heading on line {previous_line} ({level}): {text:?}"
    )]
    SameLevelAsPrevious {
        /// Line of the requirement heading.
        line: usize,
        /// Line of the previous heading.
        previous_line: usize,
        /// Level shared by both headings.
        level: usize,
        /// The requirement heading line.
        text: String,
    },

    /// The requirement at the given line has a malformed ID.
    #[error("line {line}: {source}")]
    Id {
        /// Line of the requirement heading or table row.
        line: usize,
        /// What's wrong with the ID.
        source: req_id::Error,
    },

    /// A requirement consists of a title only.
    #[error("requirement {id} must not be empty")]
    Empty {
        /// The requirement ID.
        id: String,
    },

    /// A requirement has attributes, but no body.
    #[error("requirement {id} body must not be empty")]
    EmptyBody {
        /// The requirement ID.
        id: String,
    },

    /// An attributes section holds no `- Key: value` lines.
    #[error("requirement {id} contains an attribute section but no attributes")]
    NoAttributes {
        /// The requirement ID.
        id: String,
    },

    /// An attribute is given twice.
    #[error("requirement {id} contains duplicate attribute: {key:?}")]
    DuplicateAttribute {
        /// The requirement ID.
        id: String,
        /// The upper-cased attribute name.
        key: String,
    },

    /// The `Parents` attribute is not a list of IDs.
    #[error("requirement {id} parents: unparseable as list of requirement ids: {separator:?} in {value:?}")]
    Parents {
        /// The requirement ID.
        id: String,
        /// The text that is neither an ID nor a separator.
        separator: String,
        /// The whole attribute value.
        value: String,
    },

    /// The table header doesn't start with an `ID` column.
    #[error("requirement table must have at least 2 columns, first column head must be \"ID\"")]
    TableHeader,

    /// A table row is shorter than the header.
    #[error("too few cells on row {row} of requirement table")]
    TooFewCells {
        /// 1-based line of the row within the table.
        row: usize,
    },
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::req_id::Variant;

    fn requirement(id: &str, title: &str, body: &str, position: usize) -> MarkdownRequirement {
        MarkdownRequirement {
            id: id.parse().unwrap(),
            title: title.to_string(),
            body: body.to_string(),
            attributes: BTreeMap::new(),
            parent_ids: Vec::new(),
            position,
            deleted: false,
        }
    }

    #[test]
    fn parses_heading_requirements() {
        let text = "
# Title
#### REQ-TEST-SYS-5 My First Requirement
##### Heading part of a req
#### REQ-TEST-SYS-6
Content mentioning REQ-TEST-SYS-1
REQ-TEST-SYS-2
### Title2
#### REQ-TEST-SYS-7 My Last Requirement
Some more content
#### ASM-TEST-SYS-1 An assumption, not a requirement
Assumption body
";
        let parsed = parse(text).unwrap();

        assert_eq!(
            parsed,
            vec![
                requirement("REQ-TEST-SYS-5", "My First Requirement", "##### Heading part of a req", 3),
                requirement("REQ-TEST-SYS-6", "Content mentioning REQ-TEST-SYS-1", "REQ-TEST-SYS-2", 5),
                requirement("REQ-TEST-SYS-7", "My Last Requirement", "Some more content", 9),
                requirement("ASM-TEST-SYS-1", "An assumption, not a requirement", "Assumption body", 11),
            ]
        );
        assert_eq!(parsed[3].id.variant(), Variant::Assumption);
    }

    #[test]
    fn body_framing_is_normalised() {
        let text = "# Section\n## REQ-TEST-SYS-1 Title\n\n  indented body\n\nsecond paragraph\n\n\n";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed[0].body, "  indented body\n\nsecond paragraph");
    }

    #[test]
    fn parses_table_requirements() {
        let text = "
| ID | Title | Body |
| --- | --- | --- |
| REQ-TEST-SYS-5 | My First Requirement | Heading part of a req |
| REQ-TEST-SYS-6 | Content mentioning REQ-TEST-SYS-1 | REQ-TEST-SYS-2 |
| ASM-TEST-SYS-1 | An assumption, not a requirement | Assumption body |
";
        let parsed = parse(text).unwrap();

        assert_eq!(
            parsed,
            vec![
                requirement("REQ-TEST-SYS-5", "My First Requirement", "Heading part of a req", 4),
                requirement("REQ-TEST-SYS-6", "Content mentioning REQ-TEST-SYS-1", "REQ-TEST-SYS-2", 5),
                requirement("ASM-TEST-SYS-1", "An assumption, not a requirement", "Assumption body", 6),
            ]
        );
    }

    #[test]
    fn parses_mixed_notations() {
        let text = "
# Title
#### REQ-TEST-SYS-5 My First Requirement
##### Heading part of a req
| ID | Title | Body |
| REQ-TEST-SYS-6 | Content mentioning REQ-TEST-SYS-1 | REQ-TEST-SYS-2 |
| REQ-TEST-SYS-7 | My Last Requirement | Some more content |
";
        let ids: Vec<_> = parse(text)
            .unwrap()
            .into_iter()
            .map(|req| (req.id.to_string(), req.position))
            .collect();
        assert_eq!(
            ids,
            [
                ("REQ-TEST-SYS-5".to_string(), 3),
                ("REQ-TEST-SYS-6".to_string(), 6),
                ("REQ-TEST-SYS-7".to_string(), 7),
            ]
        );
    }

    #[test]
    fn table_ends_at_first_non_table_line() {
        let text = "
| ID | Title | Body |
| REQ-TEST-SYS-1 | One | Body one |

Some prose.

| Name | Value |
| a | b |
";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn table_attributes_and_parents() {
        let text = "
| ID | Title | Body | Parent | Verification | Notes |
| --- | --- | --- | --- | --- | --- |
| REQ-TEST-SWH-1 | One | Body | REQ-TEST-SYS-1, REQ-TEST-SYS-2 | Test | |
";
        let parsed = parse(text).unwrap();
        let req = &parsed[0];
        assert_eq!(req.parent_ids, ["REQ-TEST-SYS-1", "REQ-TEST-SYS-2"]);
        assert_eq!(req.attributes.get("VERIFICATION").map(String::as_str), Some("Test"));
        assert!(req.attributes.contains_key("PARENTS"));
        assert!(!req.attributes.contains_key("NOTES"));
    }

    #[test]
    fn parses_attributes_section() {
        let text = "
# Section
## REQ-TEST-SWH-3 Title
The body.

More body.

### Attributes:
- Rationale: Because
  it spans lines.
- Parent: REQ-TEST-SYS-1, REQ-TEST-SYS-2
- Verification: Test
";
        let parsed = parse(text).unwrap();
        let req = &parsed[0];
        assert_eq!(req.body, "The body.\n\nMore body.");
        assert_eq!(
            req.attributes.get("RATIONALE").map(String::as_str),
            Some("Because\n  it spans lines.")
        );
        assert_eq!(req.parent_ids, ["REQ-TEST-SYS-1", "REQ-TEST-SYS-2"]);
        assert_eq!(req.attributes.len(), 3);
    }

    #[test]
    fn attribute_key_stops_at_first_colon() {
        let text = "# S\n## REQ-TEST-SWH-1 T\nBody\n### Attributes:\n- Link: https://example.com\n";
        let parsed = parse(text).unwrap();
        assert_eq!(
            parsed[0].attributes.get("LINK").map(String::as_str),
            Some("https://example.com")
        );
    }

    #[test]
    fn deleted_requirement_may_be_empty() {
        let text = "# S\n## REQ-TEST-SWH-1 DELETED\n## REQ-TEST-SWH-2 Live\nBody\n";
        let parsed = parse(text).unwrap();
        assert!(parsed[0].deleted);
        assert!(parsed[0].body.is_empty());
        assert!(!parsed[1].deleted);
    }

    #[test]
    fn deleted_table_row() {
        let text = "| ID | Title |\n| REQ-TEST-SWH-1 | DELETED old |\n";
        let parsed = parse(text).unwrap();
        assert!(parsed[0].deleted);
    }

    #[test_case("# REQ-TEST-SYS-5 REQ-TEST-SYS-6", "malformed requirement title: too many IDs on line 1:"; "too many ids")]
    #[test_case("\n# REQ-TEST-SYS-5\n## REQ-TEST-SYS-6", "requirement heading on line 3 must be at same level as requirement heading on line 2 (2 != 1):"; "deeper id heading")]
    #[test_case("\n## REQ-TEST-SYS-5\n# REQ-TEST-SYS-6", "requirement heading on line 3 must be at same level as requirement heading on line 2 (1 != 2):"; "shallower id heading")]
    #[test_case("\n# REQ-TEST-SYS-5\n# Title", "non-requirement heading on line 3 at same level as requirement heading on line 2 (1):"; "sibling heading")]
    #[test_case("\n# Title\n# REQ-TEST-SYS-5", "requirement heading on line 3 at same level as previous heading on line 2 (1):"; "same level as section")]
    fn heading_structure_errors(text: &str, expected: &str) {
        let error = parse(text).unwrap_err().to_string();
        assert!(error.starts_with(expected), "unexpected error: {error}");
    }

    #[test_case("# S\n## REQ-TEST-SYS-1 Title only" => matches Err(ParseError::Empty { .. }); "empty")]
    #[test_case("# S\n## REQ-TEST-SYS-1 Title\n### Attributes:\n- Verification: Test" => matches Err(ParseError::EmptyBody { .. }); "empty body")]
    #[test_case("# S\n## REQ-TEST-SYS-1 Title\nBody\n### Attributes:\nnothing here" => matches Err(ParseError::NoAttributes { .. }); "no attributes")]
    #[test_case("# S\n## REQ-TEST-SYS-1 Title\nBody\n### Attributes:\n- Parent: REQ-A-B-1\n- Parents: REQ-A-B-2" => matches Err(ParseError::DuplicateAttribute { .. }); "duplicate parents")]
    #[test_case("# S\n## REQ-TEST-SYS-1 Title\nBody\n### Attributes:\n- Parents: REQ-A-B-1 and REQ-A-B-2" => matches Err(ParseError::Parents { .. }); "word between parents")]
    #[test_case("# S\n## REQ-TEST-SYS-1 Title\nBody\n### Attributes:\n- Parents: REQ-A-B-1, junk" => matches Err(ParseError::Parents { .. }); "trailing garbage")]
    #[test_case("# S\n## REQ-TEST-SYS-1 Title\nBody\n### Attributes:\n- Parents: none" => matches Err(ParseError::Parents { .. }); "no parent ids")]
    #[test_case("| ID | Title |\n| REQ-TEST-SYS-1 |" => matches Err(ParseError::TooFewCells { row: 2 }); "short row")]
    #[test_case("| ID | Title |\n| --- | --- |\n| REQ-TEST-SYS-1 | A |\n| REQ-TEST-SYS-2 |" => matches Err(ParseError::TooFewCells { row: 4 }); "short row after delimiter")]
    #[test_case("| ID | Title |\n| Title REQ-TEST-SYS-1 | A |" => matches Err(ParseError::Id { line: 2, .. }); "id not at start of cell")]
    fn requirement_errors(text: &str) -> Result<Vec<MarkdownRequirement>, ParseError> {
        parse(text)
    }

    #[test]
    fn table_without_id_column_is_rejected() {
        assert_eq!(parse_table(&["| Title | ID |"], 1), Err(ParseError::TableHeader));
    }

    #[test]
    fn parent_list_tolerates_punctuation() {
        let id: ReqId = "REQ-TEST-SWL-1".parse().unwrap();
        let parents = parse_parents(&id, Some(" REQ-TEST-SWH-1; REQ-TEST-SWH-2 ,REQ-TEST-SWH-3 ")).unwrap();
        assert_eq!(parents, ["REQ-TEST-SWH-1", "REQ-TEST-SWH-2", "REQ-TEST-SWH-3"]);
    }

    #[test]
    fn parent_list_ignores_leading_text() {
        let id: ReqId = "REQ-TEST-SWL-1".parse().unwrap();
        let parents = parse_parents(&id, Some("see REQ-TEST-SWH-1, REQ-TEST-SWH-2")).unwrap();
        assert_eq!(parents, ["REQ-TEST-SWH-1", "REQ-TEST-SWH-2"]);
    }

    #[test]
    fn parent_list_rejects_trailing_punctuation() {
        let id: ReqId = "REQ-TEST-SWL-1".parse().unwrap();
        let error = parse_parents(&id, Some("REQ-TEST-SWH-1, REQ-TEST-SWH-2.")).unwrap_err();
        assert!(matches!(error, ParseError::Parents { ref separator, .. } if separator == "."));
    }

    #[test]
    fn parent_error_names_the_separator() {
        let error = parse("# S\n## REQ-TEST-SYS-1 Title\nBody\n### Attributes:\n- Parents: REQ-A-B-1 and REQ-A-B-2")
            .unwrap_err()
            .to_string();
        assert_eq!(
            error,
            "requirement REQ-TEST-SYS-1 parents: unparseable as list of requirement ids: \" and \" in \"REQ-A-B-1 and REQ-A-B-2\""
        );
    }

    #[test]
    fn malformed_heading_id_reports_block_line() {
        let error = parse("# S\n\n## REQ-TEST-SYS-1 Title\nBody\n### Attributes:\n- Parents: REQ-5").unwrap_err();
        assert!(matches!(error, ParseError::Parents { .. }));

        let error = parse("| ID | Title |\n| --- | --- |\n| REQ-5 | A |").unwrap_err();
        assert!(matches!(
            error,
            ParseError::Id {
                line: 3,
                source: req_id::Error::Malformed(_)
            }
        ));
    }

    #[test]
    fn title_may_follow_on_next_line() {
        let parsed = parse("# S\n## REQ-TEST-SYS-1\nThe title\nThe body").unwrap();
        assert_eq!(parsed[0].title, "The title");
        assert_eq!(parsed[0].body, "The body");
    }

    #[test]
    fn closing_hashes_are_not_part_of_the_title() {
        let parsed = parse("# S\n## REQ-TEST-SYS-1 Title ##\nBody").unwrap();
        assert_eq!(parsed[0].title, "Title");
    }
}
