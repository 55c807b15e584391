use std::path::MAIN_SEPARATOR_STR;

use regex::{Regex, RegexBuilder};

use crate::entry::{Entry, EntryKind};
use crate::error::{Error, Result};
use crate::traits::Matcher;

// ---------------------------------------------------------------------------
// Placeholders
// ---------------------------------------------------------------------------

/// Written in a path pattern wherever a path separator is meant. Becomes the
/// platform separator, escaped for the regex engine.
pub const SEPARATOR_PLACEHOLDER: char = '/';

/// Written in a path pattern wherever a regex backslash escape is meant
/// (`` `. `` for a literal dot, `` `d `` for a digit).
pub const ESCAPE_PLACEHOLDER: char = '`';

/// Rewrite a caller-facing path pattern into regex syntax for this platform.
///
/// Path patterns usually pass through build-file property expansion before
/// they get here, where native backslashes would collide with both Windows
/// separators and regex escapes. Callers therefore write `/` for "separator"
/// and `` ` `` for "escape". This is a single pass, so a substituted
/// separator is never re-read as an escape.
///
/// Content patterns are not translated.
pub fn translate_path_pattern(pattern: &str) -> String {
    let separator = regex::escape(MAIN_SEPARATOR_STR);
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            SEPARATOR_PLACEHOLDER => out.push_str(&separator),
            ESCAPE_PLACEHOLDER => out.push('\\'),
            other => out.push(other),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// MatchOptions
// ---------------------------------------------------------------------------

/// Regex flags for a path or content filter. Case-insensitive by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    pub case_insensitive:     bool,
    pub multi_line:           bool,
    pub dot_matches_new_line: bool,
    pub ignore_whitespace:    bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            case_insensitive:     true,
            multi_line:           false,
            dot_matches_new_line: false,
            ignore_whitespace:    false,
        }
    }
}

impl MatchOptions {
    /// Default flags, but case-sensitive.
    pub fn case_sensitive() -> Self {
        Self {
            case_insensitive: false,
            ..Self::default()
        }
    }

    pub(crate) fn compile(&self, pattern: &str) -> Result<Regex> {
        RegexBuilder::new(pattern)
            .case_insensitive(self.case_insensitive)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_matches_new_line)
            .ignore_whitespace(self.ignore_whitespace)
            .build()
            .map_err(|source| Error::InvalidPattern {
                pattern: pattern.to_owned(),
                source,
            })
    }
}

// ---------------------------------------------------------------------------
// Built-in matchers
// ---------------------------------------------------------------------------

/// Matches entries whose full path matches a translated path pattern.
pub(crate) struct PathMatcher {
    regex: Regex,
}

impl PathMatcher {
    pub(crate) fn new(pattern: &str, options: MatchOptions) -> Result<Self> {
        let regex = options.compile(&translate_path_pattern(pattern))?;
        Ok(Self { regex })
    }
}

impl Matcher for PathMatcher {
    fn is_match(&self, entry: &Entry) -> Result<bool> {
        Ok(self.regex.is_match(&entry.path.to_string_lossy()))
    }
}

/// Matches files whose whole text matches a pattern. Directories always pass.
pub(crate) struct ContentMatcher {
    regex: Regex,
}

impl ContentMatcher {
    pub(crate) fn new(pattern: &str, options: MatchOptions) -> Result<Self> {
        let regex = options.compile(pattern)?;
        Ok(Self { regex })
    }
}

impl Matcher for ContentMatcher {
    fn is_match(&self, entry: &Entry) -> Result<bool> {
        if entry.kind != EntryKind::File {
            return Ok(true);
        }
        // Not valid UTF-8 surfaces as InvalidData here and fails the search.
        let text = std::fs::read_to_string(&entry.path).map_err(|source| Error::Io {
            path: entry.path.clone(),
            source,
        })?;
        Ok(self.regex.is_match(&text))
    }
}
