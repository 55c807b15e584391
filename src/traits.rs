use crate::entry::Entry;
use crate::error::Result;

/// Decides whether a traversed entry belongs in the search results.
///
/// The path and content filters configured on
/// [`SearchBuilder`](crate::SearchBuilder) are matchers themselves; implement
/// this to layer extra logic on top of them (size limits, timestamps, ...).
/// A search keeps an entry only when every matcher accepts it.
///
/// Returning `Err` aborts the whole search. Use it for conditions a caller
/// must hear about, such as a file that cannot be read.
///
/// # Example
///
/// ```rust
/// use buildshim::{Entry, Matcher, Result};
///
/// struct NotHidden;
///
/// impl Matcher for NotHidden {
///     fn is_match(&self, entry: &Entry) -> Result<bool> {
///         Ok(!entry.name.starts_with('.'))
///     }
/// }
/// ```
pub trait Matcher: Send + Sync {
    /// Returns `Ok(true)` if this entry should be included in results.
    fn is_match(&self, entry: &Entry) -> Result<bool>;
}

/// Closures work as matchers too.
impl<F> Matcher for F
where
    F: Fn(&Entry) -> Result<bool> + Send + Sync,
{
    fn is_match(&self, entry: &Entry) -> Result<bool> {
        self(entry)
    }
}

/// Which stream of a child process a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Receives captured output live, while the child is still running.
///
/// Lines are delivered from the reader threads as they arrive, without the
/// trailing newline. The full text is still returned in
/// [`ProcessResult`](crate::ProcessResult) once the process exits.
///
/// `Send + Sync` are required — stdout and stderr are drained on separate
/// threads that share the sink.
pub trait OutputSink: Send + Sync {
    fn line(&self, stream: Stream, line: &str);
}

/// Default sink: forwards each line to `tracing` on target `buildshim::output`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn line(&self, stream: Stream, line: &str) {
        match stream {
            Stream::Stdout => tracing::info!(target: "buildshim::output", "{}", line),
            Stream::Stderr => tracing::warn!(target: "buildshim::output", "{}", line),
        }
    }
}
