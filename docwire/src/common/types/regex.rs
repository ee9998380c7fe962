use itertools::Itertools;
use std::fmt::{Display, Formatter};

use crate::errors::{DocwireError, DocwireResult, ErrorKind};

/// A regular expression as stored in a document: pattern plus option flags.
///
/// Options are kept sorted and free of duplicates, the form the wire format
/// requires.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Regex {
    pattern: String,
    options: String,
}

impl Regex {
    pub fn new(pattern: impl Into<String>, options: &str) -> Self {
        Regex {
            pattern: pattern.into(),
            options: options.chars().sorted().dedup().collect(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn options(&self) -> &str {
        &self.options
    }

    /// Compiles the pattern with the `regex` crate.
    ///
    /// `i`, `m`, `s` and `x` map to case-insensitive, multi-line,
    /// dot-matches-newline and verbose mode. Other flags (`l`, `u`) have no
    /// counterpart and are ignored.
    pub fn compile(&self) -> DocwireResult<regex::Regex> {
        regex::RegexBuilder::new(&self.pattern)
            .case_insensitive(self.options.contains('i'))
            .multi_line(self.options.contains('m'))
            .dot_matches_new_line(self.options.contains('s'))
            .ignore_whitespace(self.options.contains('x'))
            .build()
            .map_err(|err| {
                log::error!("Invalid regular expression /{}/{}: {}", self.pattern, self.options, err);
                DocwireError::new(
                    &format!("Invalid regular expression /{}/{}: {}", self.pattern, self.options, err),
                    ErrorKind::InvalidDataType,
                )
            })
    }
}

impl Display for Regex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}/{}", self.pattern, self.options)
    }
}
