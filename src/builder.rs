use std::path::{Component, Path, PathBuf};

use crate::engine::{run, EngineOptions};
use crate::entry::{Direction, ItemTypes};
use crate::error::{Error, Result};
use crate::filter::{ContentMatcher, MatchOptions, PathMatcher};
use crate::results::SearchResult;
use crate::traits::Matcher;

// ---------------------------------------------------------------------------
// SearchBuilder
// ---------------------------------------------------------------------------

/// Configures and runs a file-system search.
///
/// Created via [`buildshim::search()`](crate::search). Configure with chained
/// builder methods, then call [`run()`](SearchBuilder::run) to execute.
///
/// # Example
///
/// ```rust,no_run
/// use buildshim::{Direction, ItemTypes};
///
/// let results = buildshim::search("src")
///     .direction(Direction::Down)
///     .item_types(ItemTypes::Files)
///     .path_pattern("`.rs$")
///     .content_pattern("#\\[test\\]")
///     .run()?;
///
/// for file in &results.found_files {
///     println!("{}", file.display());
/// }
/// # Ok::<(), buildshim::Error>(())
/// ```
pub struct SearchBuilder {
    start_dir:       PathBuf,
    direction:       Direction,
    item_types:      ItemTypes,
    path_pattern:    Option<String>,
    path_options:    MatchOptions,
    content_pattern: Option<String>,
    content_options: MatchOptions,
    matchers:        Vec<Box<dyn Matcher>>,
}

impl SearchBuilder {
    pub fn new(start_dir: impl Into<PathBuf>) -> Self {
        Self {
            start_dir:       start_dir.into(),
            direction:       Direction::default(),
            item_types:      ItemTypes::default(),
            path_pattern:    None,
            path_options:    MatchOptions::default(),
            content_pattern: None,
            content_options: MatchOptions::default(),
            matchers:        Vec::new(),
        }
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// Walk into descendants ([`Direction::Down`], the default) or along the
    /// parent chain ([`Direction::Up`]).
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Which kinds of entry to test and collect. [`ItemTypes::All`] by default.
    pub fn item_types(mut self, item_types: ItemTypes) -> Self {
        self.item_types = item_types;
        self
    }

    // ── Filters ───────────────────────────────────────────────────────────

    /// Regex tested against each entry's full path.
    ///
    /// Write `/` for a path separator and `` ` `` where a regex backslash is
    /// meant; see [`translate_path_pattern`](crate::translate_path_pattern).
    /// An empty pattern means no path filter.
    pub fn path_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.path_pattern = Some(pattern.into()).filter(|p| !p.is_empty());
        self
    }

    pub fn path_options(mut self, options: MatchOptions) -> Self {
        self.path_options = options;
        self
    }

    /// Regex tested against the full text of each file. Directories are
    /// never content-filtered. An empty pattern means no content filter.
    pub fn content_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.content_pattern = Some(pattern.into()).filter(|p| !p.is_empty());
        self
    }

    pub fn content_options(mut self, options: MatchOptions) -> Self {
        self.content_options = options;
        self
    }

    /// Add a custom matcher, evaluated after the path and content filters.
    pub fn with_matcher(mut self, m: impl Matcher + 'static) -> Self {
        self.matchers.push(Box::new(m));
        self
    }

    // ── Execute ───────────────────────────────────────────────────────────

    /// Execute the search and return results.
    ///
    /// A start directory that does not exist is not an error: it is logged
    /// and an empty [`SearchResult`] comes back.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPattern`] for a filter that does not compile (checked
    /// before anything else), [`Error::Io`] for a file the content filter
    /// cannot read as text or a directory that cannot be listed.
    pub fn run(self) -> Result<SearchResult> {
        let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
        if let Some(pattern) = &self.path_pattern {
            matchers.push(Box::new(PathMatcher::new(pattern, self.path_options)?));
        }
        if let Some(pattern) = &self.content_pattern {
            matchers.push(Box::new(ContentMatcher::new(pattern, self.content_options)?));
        }
        matchers.extend(self.matchers);

        if !self.start_dir.is_dir() {
            tracing::info!(
                start_dir = %self.start_dir.display(),
                "search root does not exist, nothing to find"
            );
            return Ok(SearchResult::empty());
        }

        let root = absolute(&self.start_dir)?;
        tracing::debug!(
            root = %root.display(),
            direction = ?self.direction,
            item_types = ?self.item_types,
            "starting search"
        );

        run(EngineOptions {
            root,
            direction: self.direction,
            item_types: self.item_types,
            matchers,
        })
    }
}

/// Absolute and lexically normalised, so the upward walk sees each ancestor once.
fn absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        cwd.join(path)
    };

    let mut normal = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normal.pop();
            }
            other => normal.push(other.as_os_str()),
        }
    }
    Ok(normal)
}
