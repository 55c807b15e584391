use std::path::PathBuf;

/// A single file or directory examined during a search.
///
/// Matchers that need metadata call `std::fs::metadata(&entry.path)`
/// themselves.
#[derive(Debug)]
pub struct Entry {
    /// Full path to the entry.
    pub path: PathBuf,

    /// The final path component.
    pub name: String,

    /// What kind of entry this is.
    pub kind: EntryKind,

    /// Distance from the start directory. Downward searches count levels
    /// below it (start = 0); upward searches count levels above it, so the
    /// start directory's own children are at depth 0 as well.
    pub depth: usize,
}

/// The kind of a traversed entry.
///
/// Symbolic links are not followed, and they are never handed to matchers.
/// The same goes for device files, pipes and sockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file.
    File,

    /// A directory.
    Dir,
}

/// Which kinds of entry a search tests and collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemTypes {
    Files,
    Directories,
    #[default]
    All,
}

impl ItemTypes {
    pub fn wants_files(self) -> bool {
        matches!(self, Self::Files | Self::All)
    }

    pub fn wants_dirs(self) -> bool {
        matches!(self, Self::Directories | Self::All)
    }
}

/// Which way a search walks from its start directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Into descendants, depth first, parents before children.
    #[default]
    Down,

    /// Along the parent chain to the root, testing each level's subdirectories.
    Up,
}
