//! # buildshim
//!
//! The plumbing shared by build tasks that wrap external tools: assemble a
//! command line, run the tool with a bounded wait, find the files it needs or
//! produced.
//!
//! - [`ArgsBuilder`] turns keys, values and paths into one argument string,
//!   following an [`ArgumentSyntax`] (`/key:value`, `--key=value`, ...).
//! - [`exec`] launches an executable with that string, optionally captures
//!   its output, and kills it after a timeout.
//! - [`search()`] walks a directory tree up or down with regex path and
//!   content filters.
//!
//! None of these decide whether a tool "succeeded". They hand back exit codes
//! and paths; the calling task interprets them.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use buildshim::{ArgumentSyntax, ItemTypes};
//!
//! let assemblies = buildshim::search("build/bin")
//!     .item_types(ItemTypes::Files)
//!     .path_pattern("`.Tests`.dll$")
//!     .run()?;
//!
//! let args = buildshim::args(ArgumentSyntax::slash_colon())
//!     .add_paths(&assemblies.found_files)
//!     .add_key_path("result", "build/TestResult.xml")
//!     .add_key_if("noshadow", true)
//!     .build();
//!
//! let result = buildshim::exec::execute_captured("nunit-console", args)?;
//! println!("tests exited with {}", result.exit_code);
//! # Ok::<(), buildshim::Error>(())
//! ```
//!
//! # Logging
//!
//! Events go through `tracing`. Install a subscriber in the host to see them;
//! captured process output is emitted on target `buildshim::output`.

#![forbid(unsafe_code)]

pub mod exec;

mod args;
mod builder;
mod engine;
mod entry;
mod error;
mod filter;
mod results;
mod syntax;
mod traits;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use args::ArgsBuilder;
pub use builder::SearchBuilder;
pub use entry::{Direction, Entry, EntryKind, ItemTypes};
pub use error::{Error, Result};
pub use exec::{ExitOutcome, ProcessInvocation, ProcessResult};
pub use filter::{translate_path_pattern, MatchOptions, ESCAPE_PLACEHOLDER, SEPARATOR_PLACEHOLDER};
pub use results::{ScanStats, SearchResult};
pub use syntax::ArgumentSyntax;
pub use traits::{Matcher, OutputSink, Stream, TracingSink};

// ── Entry points ──────────────────────────────────────────────────────────────

/// Create a new [`SearchBuilder`] rooted at `start_dir`.
///
/// # Example
///
/// ```rust
/// let dir = std::env::temp_dir().join("buildshim-doc-missing");
/// let results = buildshim::search(&dir).run().unwrap();
///
/// assert!(results.is_empty());
/// ```
pub fn search(start_dir: impl Into<std::path::PathBuf>) -> SearchBuilder {
    SearchBuilder::new(start_dir)
}

/// Create a new, empty [`ArgsBuilder`] for the given syntax.
///
/// # Example
///
/// ```rust
/// use buildshim::ArgumentSyntax;
///
/// let args = buildshim::args(ArgumentSyntax::double_dash())
///     .add_argument("config", "Release")
///     .add_arguments("feature", ["a", "b"], true)
///     .build();
///
/// assert_eq!(args, "--config=Release --feature=a --feature=b");
/// ```
pub fn args(syntax: ArgumentSyntax) -> ArgsBuilder {
    ArgsBuilder::new(syntax)
}
