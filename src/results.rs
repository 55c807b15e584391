use std::path::PathBuf;
use std::time::Duration;

/// The output of a completed search.
///
/// `found_items` holds every match in discovery order; `found_files` and
/// `found_dirs` are the same order split by kind.
#[derive(Debug, Default)]
pub struct SearchResult {
    pub found_files: Vec<PathBuf>,
    pub found_dirs:  Vec<PathBuf>,
    pub found_items: Vec<PathBuf>,

    /// Scan statistics.
    pub stats: ScanStats,
}

impl SearchResult {
    /// Nothing found. Returned for a start directory that does not exist.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.found_items.is_empty()
    }
}

/// Statistics for a completed scan.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanStats {
    /// Files tested against the filters (matched or not).
    pub files: usize,

    /// Directories tested against the filters.
    pub dirs: usize,

    /// Wall-clock time from search start to completion.
    pub duration: Duration,

    /// `(files + dirs) / duration`, 0 on zero-duration runs.
    pub entries_per_sec: usize,
}

impl ScanStats {
    pub(crate) fn compute(files: usize, dirs: usize, duration: Duration) -> Self {
        let total = files + dirs;
        let eps = if duration.as_secs_f64() > 0.0 {
            (total as f64 / duration.as_secs_f64()) as usize
        } else {
            0
        };
        Self {
            files,
            dirs,
            duration,
            entries_per_sec: eps,
        }
    }
}
