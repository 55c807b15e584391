use std::path::{Path, PathBuf};
use std::time::Instant;

use ignore::{DirEntry, WalkBuilder};

use crate::entry::{Direction, Entry, EntryKind, ItemTypes};
use crate::error::{Error, Result};
use crate::results::{ScanStats, SearchResult};
use crate::traits::Matcher;

// ---------------------------------------------------------------------------
// Engine options
// ---------------------------------------------------------------------------

/// Internal options passed from the builder to `run()`.
pub(crate) struct EngineOptions {
    pub root:       PathBuf,
    pub direction:  Direction,
    pub item_types: ItemTypes,
    /// Applied in order; the first rejection stops evaluation for that entry.
    pub matchers:   Vec<Box<dyn Matcher>>,
}

// ---------------------------------------------------------------------------
// run()
// ---------------------------------------------------------------------------

/// Walk from `opts.root` and collect every entry all matchers accept.
///
/// Called by `SearchBuilder::run()` once patterns have compiled and the
/// root is known to be a directory. Single-threaded and depth first.
pub(crate) fn run(opts: EngineOptions) -> Result<SearchResult> {
    let start = Instant::now();
    let mut collector = Collector::new(opts.item_types, &opts.matchers);

    match opts.direction {
        Direction::Down => {
            collector.consider(root_entry(&opts.root))?;
            walk_down(&opts.root, 0, &mut collector)?;
        }
        Direction::Up => walk_up(&opts.root, &mut collector)?,
    }

    Ok(collector.finish(start))
}

/// Pre-order below `dir`: its files, then each subdirectory followed by
/// everything under it.
fn walk_down(dir: &Path, depth: usize, collector: &mut Collector<'_>) -> Result<()> {
    let Listing { files, dirs } = list(dir, depth + 1)?;

    for file in files {
        collector.consider(file)?;
    }
    for sub in dirs {
        let path = sub.path.clone();
        collector.consider(sub)?;
        walk_down(&path, depth + 1, collector)?;
    }
    Ok(())
}

/// At each level from `root` to the file-system root, test that level's
/// immediate subdirectories. Files along the way are never examined.
fn walk_up(root: &Path, collector: &mut Collector<'_>) -> Result<()> {
    if !collector.item_types.wants_dirs() {
        return Ok(());
    }

    let mut current = Some(root);
    let mut level = 0;

    while let Some(dir) = current {
        tracing::debug!(dir = %dir.display(), level, "searching upward");

        for sub in list(dir, level)?.dirs {
            collector.consider(sub)?;
        }

        current = dir.parent().filter(|p| !p.as_os_str().is_empty());
        level += 1;
    }
    Ok(())
}

/// Immediate children of one directory, split by kind, each group in
/// file-name order.
struct Listing {
    files: Vec<Entry>,
    dirs:  Vec<Entry>,
}

/// The kind comes from the directory listing itself, so nothing here costs
/// an extra `stat` per entry.
fn list(dir: &Path, depth: usize) -> Result<Listing> {
    let mut builder = WalkBuilder::new(dir);
    builder
        .standard_filters(false)
        .ignore(false)
        .parents(false)
        .hidden(false)
        .follow_links(false)
        .same_file_system(false)
        .max_depth(Some(1))
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut listing = Listing {
        files: Vec::new(),
        dirs:  Vec::new(),
    };

    for res in builder.build() {
        let entry = res.map_err(map_ignore_error)?;
        if entry.depth() == 0 {
            continue;
        }
        match to_entry(&entry, depth) {
            Some(e) if e.kind == EntryKind::Dir => listing.dirs.push(e),
            Some(e) => listing.files.push(e),
            None => {}
        }
    }
    Ok(listing)
}

fn root_entry(root: &Path) -> Entry {
    Entry {
        path:  root.to_path_buf(),
        name:  root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        kind:  EntryKind::Dir,
        depth: 0,
    }
}

/// `None` for symlinks and anything that is neither a file nor a directory.
fn to_entry(entry: &DirEntry, depth: usize) -> Option<Entry> {
    let ft = entry.file_type()?;

    let kind = if ft.is_dir() {
        EntryKind::Dir
    } else if ft.is_file() {
        EntryKind::File
    } else {
        return None;
    };

    Some(Entry {
        path:  entry.path().to_path_buf(),
        name:  entry.file_name().to_string_lossy().into_owned(),
        kind,
        depth,
    })
}

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

struct Collector<'a> {
    item_types:  ItemTypes,
    matchers:    &'a [Box<dyn Matcher>],
    found_files: Vec<PathBuf>,
    found_dirs:  Vec<PathBuf>,
    found_items: Vec<PathBuf>,
    files:       usize,
    dirs:        usize,
}

impl<'a> Collector<'a> {
    fn new(item_types: ItemTypes, matchers: &'a [Box<dyn Matcher>]) -> Self {
        Self {
            item_types,
            matchers,
            found_files: Vec::new(),
            found_dirs:  Vec::new(),
            found_items: Vec::new(),
            files:       0,
            dirs:        0,
        }
    }

    fn consider(&mut self, entry: Entry) -> Result<()> {
        let is_dir = match entry.kind {
            EntryKind::File if self.item_types.wants_files() => false,
            EntryKind::Dir if self.item_types.wants_dirs() => true,
            _ => return Ok(()),
        };

        if is_dir {
            self.dirs += 1;
        } else {
            self.files += 1;
        }

        for matcher in self.matchers {
            if !matcher.is_match(&entry)? {
                return Ok(());
            }
        }

        if is_dir {
            self.found_dirs.push(entry.path.clone());
        } else {
            self.found_files.push(entry.path.clone());
        }
        self.found_items.push(entry.path);
        Ok(())
    }

    fn finish(self, start: Instant) -> SearchResult {
        SearchResult {
            found_files: self.found_files,
            found_dirs:  self.found_dirs,
            found_items: self.found_items,
            stats:       ScanStats::compute(self.files, self.dirs, start.elapsed()),
        }
    }
}

// ---------------------------------------------------------------------------
// Map ignore::Error to Error
// ---------------------------------------------------------------------------

fn map_ignore_error(e: ignore::Error) -> Error {
    match e {
        ignore::Error::WithPath { path, err } => match *err {
            ignore::Error::Io(source) => Error::Io { path, source },
            other => Error::Walk(format!("{}: {}", path.display(), other)),
        },
        ignore::Error::WithDepth { err, .. } => map_ignore_error(*err),
        ignore::Error::Io(source) => Error::Io {
            path: PathBuf::new(),
            source,
        },
        other => Error::Walk(other.to_string()),
    }
}
