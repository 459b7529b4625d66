//! Requirement identifiers.
//!
//! Every requirement is named by a token of the form
//! `(REQ|ASM)-<prefix>-<level>-<number>`, for example `REQ-TEST-SYS-5`. The
//! prefix names the project, the level names the document the requirement
//! belongs to (system, high-level, low-level, ...), and the number is its
//! sequence number within that document.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

/// The regular expression matching a single requirement ID token.
pub const ID_PATTERN: &str = r"(REQ|ASM)-(\w+)-(\w+)-(\d+)";

/// Unanchored matcher for requirement ID tokens.
pub(crate) static ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ID_PATTERN).expect("ID pattern is a valid regex"));

static WHOLE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{ID_PATTERN}$")).expect("ID pattern is a valid regex"));

/// Something that looks like an ID to a human, but doesn't parse as one.
static MALFORMED_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(REQ|ASM)-((\d+)|((\w+)-(\d+)))").expect("malformed ID pattern is a valid regex")
});

/// Number of characters of context quoted in malformed-ID errors.
const CONTEXT_CHARS: usize = 40;

/// Whether a requirement states a requirement or an assumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Variant {
    /// A `REQ-` requirement.
    Requirement,
    /// An `ASM-` assumption.
    Assumption,
}

impl Variant {
    /// The literal ID tag for this variant.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Requirement => "REQ",
            Self::Assumption => "ASM",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A parsed requirement ID.
///
/// The number is kept both as written and as an integer, since a leading
/// zero is legal to parse but rejected later by the sequence linter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReqId {
    variant: Variant,
    prefix: String,
    level: String,
    digits: String,
    number: u64,
}

impl ReqId {
    /// The variant encoded by the `REQ`/`ASM` tag.
    #[must_use]
    pub const fn variant(&self) -> Variant {
        self.variant
    }

    /// The project prefix segment.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The level segment.
    #[must_use]
    pub fn level(&self) -> &str {
        &self.level
    }

    /// The number segment exactly as written.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// The numeric value of the number segment.
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }

    fn from_captures(captures: &regex::Captures<'_>) -> Result<Self, Error> {
        let variant = match &captures[1] {
            "REQ" => Variant::Requirement,
            _ => Variant::Assumption,
        };
        let digits = captures[4].to_string();
        let number = digits
            .parse()
            .map_err(|_| Error::Number(captures[0].to_string()))?;

        Ok(Self {
            variant,
            prefix: captures[2].to_string(),
            level: captures[3].to_string(),
            digits,
            number,
        })
    }

    /// Extracts the ID that opens `text`.
    ///
    /// The ID must be the very first thing in the text. Errors quote up to
    /// the first 40 characters of the text for context.
    ///
    /// # Errors
    ///
    /// Returns an error if the text contains no ID, contains only something
    /// resembling an ID, or if the first ID is not at the start of the text.
    pub fn extract_leading(text: &str) -> Result<Self, Error> {
        let head: String = text.chars().take(CONTEXT_CHARS).collect();

        let Some(captures) = ID_REGEX.captures(text) else {
            if MALFORMED_ID_REGEX.is_match(text) {
                return Err(Error::Malformed(head));
            }
            return Err(Error::Missing(head));
        };

        if captures.get(0).is_some_and(|m| m.start() > 0) {
            return Err(Error::NotAtStart(head));
        }

        Self::from_captures(&captures)
    }

    /// Finds every ID token in `text`, in order of appearance.
    ///
    /// Tokens whose number does not fit in a `u64` are skipped.
    pub fn find_all(text: &str) -> impl Iterator<Item = Self> + '_ {
        ID_REGEX
            .captures_iter(text)
            .filter_map(|captures| Self::from_captures(&captures).ok())
    }
}

impl fmt::Display for ReqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.variant, self.prefix, self.level, self.digits
        )
    }
}

impl FromStr for ReqId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = WHOLE_ID_REGEX
            .captures(s)
            .ok_or_else(|| Error::Syntax(s.to_string()))?;
        Self::from_captures(&captures)
    }
}

/// Errors that can occur while reading a requirement ID.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Something resembling an ID was found, but it doesn't follow the grammar.
    #[error("malformed requirement: found only malformed ID: {0:?} (doesn't match {pattern:?})", pattern = ID_PATTERN)]
    Malformed(String),

    /// No ID at all.
    #[error("malformed requirement: missing ID in first 40 characters: {0:?}")]
    Missing(String),

    /// An ID was found, but something precedes it.
    #[error("malformed requirement: ID must be at the start of the title: {0:?}")]
    NotAtStart(String),

    /// The string is not exactly one ID.
    #[error("invalid requirement ID: {0:?}")]
    Syntax(String),

    /// The number segment is too large.
    #[error("requirement number out of range in {0}")]
    Number(String),
}
