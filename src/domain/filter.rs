//! Requirement filters.

use std::collections::BTreeMap;

use regex::Regex;

use crate::domain::requirement::Req;

/// Selects requirements by regular expressions over their fields.
///
/// Every pattern that is set must match for a requirement to be selected.
#[derive(Debug, Clone, Default)]
pub struct ReqFilter {
    id: Option<Regex>,
    title: Option<Regex>,
    body: Option<Regex>,
    any_attribute: Option<Regex>,
    attributes: BTreeMap<String, Regex>,
}

/// Errors that can occur when building a [`ReqFilter`].
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// A pattern failed to compile.
    #[error("invalid {field} filter {pattern:?}")]
    Regex {
        /// The field the pattern applies to.
        field: String,
        /// The offending pattern.
        pattern: String,
        /// The underlying error.
        source: regex::Error,
    },

    /// More than one pattern without a `KEY=` prefix was given.
    #[error("cannot specify more than one any attribute filter")]
    MultipleAnyAttribute,
}

fn compile(field: &str, pattern: Option<&str>) -> Result<Option<Regex>, FilterError> {
    pattern
        .filter(|pattern| !pattern.is_empty())
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| FilterError::Regex {
                field: field.to_string(),
                pattern: pattern.to_string(),
                source,
            })
        })
        .transpose()
}

impl ReqFilter {
    /// Builds a filter.
    ///
    /// Each attribute filter is either `KEY=REGEX`, matching the attribute
    /// `KEY` (case-insensitively), or a bare `REGEX` matching any attribute.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern doesn't compile, or if more than one bare
    /// attribute pattern is given.
    pub fn new<S: AsRef<str>>(
        id: Option<&str>,
        title: Option<&str>,
        body: Option<&str>,
        attribute_filters: &[S],
    ) -> Result<Self, FilterError> {
        let mut filter = Self {
            id: compile("id", id)?,
            title: compile("title", title)?,
            body: compile("body", body)?,
            ..Self::default()
        };

        for entry in attribute_filters {
            match entry.as_ref().split_once('=') {
                Some((key, pattern)) => {
                    let key = key.trim().to_uppercase();
                    if let Some(regex) = compile(&key, Some(pattern))? {
                        filter.attributes.insert(key, regex);
                    }
                }
                None => {
                    if filter.any_attribute.is_some() {
                        return Err(FilterError::MultipleAnyAttribute);
                    }
                    filter.any_attribute = compile("attribute", Some(entry.as_ref()))?;
                }
            }
        }

        Ok(filter)
    }

    /// Whether the filter selects everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.title.is_none()
            && self.body.is_none()
            && self.any_attribute.is_none()
            && self.attributes.is_empty()
    }
}

impl Req {
    /// Whether the requirement is selected by `filter`.
    ///
    /// An attribute the requirement lacks is matched as an empty value.
    #[must_use]
    pub fn matches(&self, filter: &ReqFilter) -> bool {
        let field =
            |regex: Option<&Regex>, text: &str| regex.is_none_or(|regex| regex.is_match(text));

        field(filter.id.as_ref(), &self.key())
            && field(filter.title.as_ref(), &self.title)
            && field(filter.body.as_ref(), &self.body)
            && filter
                .any_attribute
                .as_ref()
                .is_none_or(|regex| self.attributes.values().any(|value| regex.is_match(value)))
            && filter.attributes.iter().all(|(key, regex)| {
                regex.is_match(self.attributes.get(key).map_or("", String::as_str))
            })
    }
}
