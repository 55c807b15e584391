use std::fs;
use std::path::{Path, PathBuf};

use buildshim::{search, Direction, Entry, Error, ItemTypes, MatchOptions};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Create a temporary directory tree for testing.
///
/// Structure:
/// ```text
/// tmp/
///   file1.txt
///   file2.md
///   dirA/
///     fileA1.txt
///   dirB/
///     fileB1.md
/// ```
fn setup_test_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::write(root.join("file1.txt"), "Invoice for January").unwrap();
    fs::write(root.join("file2.md"), "# notes\nnothing to see").unwrap();

    fs::create_dir(root.join("dirA")).unwrap();
    fs::write(root.join("dirA").join("fileA1.txt"), "quarterly report").unwrap();

    fs::create_dir(root.join("dirB")).unwrap();
    fs::write(root.join("dirB").join("fileB1.md"), "invoice draft").unwrap();

    dir
}

fn names(paths: &[PathBuf], root: &Path) -> Vec<String> {
    paths
        .iter()
        .map(|p| {
            p.strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Down
// ---------------------------------------------------------------------------

#[test]
fn down_without_filters_finds_everything() {
    let dir = setup_test_dir();
    let results = search(dir.path()).run().unwrap();

    assert_eq!(results.found_files.len(), 4);
    assert_eq!(results.found_dirs.len(), 3, "root, dirA and dirB");
    assert_eq!(results.found_items.len(), 7);
    assert_eq!(results.stats.files, 4);
    assert_eq!(results.stats.dirs, 3);
}

#[test]
fn down_is_pre_order_files_before_subdirectories() {
    let dir = setup_test_dir();
    let results = search(dir.path()).run().unwrap();

    assert_eq!(
        names(&results.found_items, dir.path()),
        [
            "",
            "file1.txt",
            "file2.md",
            "dirA",
            "dirA/fileA1.txt",
            "dirB",
            "dirB/fileB1.md",
        ]
    );
}

#[test]
fn split_sets_keep_discovery_order() {
    let dir = setup_test_dir();
    let results = search(dir.path()).run().unwrap();

    let files: Vec<_> = results
        .found_items
        .iter()
        .filter(|p| p.is_file())
        .cloned()
        .collect();
    let dirs: Vec<_> = results
        .found_items
        .iter()
        .filter(|p| p.is_dir())
        .cloned()
        .collect();

    assert_eq!(files, results.found_files);
    assert_eq!(dirs, results.found_dirs);
}

#[test]
fn agrees_with_walkdir() {
    let dir = setup_test_dir();
    let results = search(dir.path()).run().unwrap();

    let mut expected: Vec<PathBuf> = walkdir::WalkDir::new(dir.path())
        .into_iter()
        .map(|e| e.unwrap().into_path())
        .collect();
    let mut found = results.found_items.clone();
    expected.sort();
    found.sort();

    assert_eq!(found, expected);
}

#[test]
fn files_come_before_subdirectories_whatever_their_names() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("aaa").join("inner")).unwrap();
    fs::write(root.join("aaa").join("zzz.txt"), "").unwrap();
    fs::write(root.join("zzz.txt"), "").unwrap();
    fs::create_dir(root.join("bbb")).unwrap();

    let results = search(root).run().unwrap();

    assert_eq!(
        names(&results.found_items, root),
        ["", "zzz.txt", "aaa", "aaa/zzz.txt", "aaa/inner", "bbb"]
    );
}

#[cfg(unix)]
#[test]
fn symlinks_are_neither_followed_nor_matched() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let dir = setup_test_dir();
    let root = dir.path();
    std::os::unix::fs::symlink(root.join("file1.txt"), root.join("link.txt")).unwrap();
    std::os::unix::fs::symlink(root.join("dirA"), root.join("linkdir")).unwrap();

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let results = search(root)
        .with_matcher(move |e: &Entry| -> buildshim::Result<bool> {
            if e.name.starts_with("link") {
                counter.fetch_add(1, Ordering::Relaxed);
            }
            Ok(true)
        })
        .run()
        .unwrap();

    assert_eq!(seen.load(Ordering::Relaxed), 0);
    assert_eq!(results.found_files.len(), 4);
    assert_eq!(results.found_dirs.len(), 3);
}

#[test]
fn path_filter_restricts_to_markdown() {
    let dir = setup_test_dir();
    let results = search(dir.path()).path_pattern("`.md$").run().unwrap();

    assert_eq!(
        names(&results.found_files, dir.path()),
        ["file2.md", "dirB/fileB1.md"]
    );
    assert!(results.found_dirs.is_empty());
}

#[test]
fn separator_placeholder_matches_real_separator() {
    let dir = setup_test_dir();
    let results = search(dir.path())
        .item_types(ItemTypes::Files)
        .path_pattern("/dira/")
        .run()
        .unwrap();

    assert_eq!(names(&results.found_files, dir.path()), ["dirA/fileA1.txt"]);
}

#[test]
fn path_filter_can_be_case_sensitive() {
    let dir = setup_test_dir();
    let results = search(dir.path())
        .item_types(ItemTypes::Directories)
        .path_pattern("dira$")
        .path_options(MatchOptions::case_sensitive())
        .run()
        .unwrap();

    assert!(results.found_dirs.is_empty());
}

#[test]
fn item_types_limit_what_is_collected() {
    let dir = setup_test_dir();

    let files = search(dir.path()).item_types(ItemTypes::Files).run().unwrap();
    assert_eq!(files.found_files.len(), 4);
    assert!(files.found_dirs.is_empty());
    assert_eq!(files.found_items, files.found_files);

    let dirs = search(dir.path()).item_types(ItemTypes::Directories).run().unwrap();
    assert!(dirs.found_files.is_empty());
    assert_eq!(dirs.found_dirs.len(), 3);
}

#[test]
fn content_filter_reads_files_only() {
    let dir = setup_test_dir();
    let results = search(dir.path()).content_pattern("invoice").run().unwrap();

    assert_eq!(
        names(&results.found_files, dir.path()),
        ["file1.txt", "dirB/fileB1.md"]
    );
    // directories are never content-filtered
    assert_eq!(results.found_dirs.len(), 3);
}

#[test]
fn content_filter_honours_options() {
    let dir = setup_test_dir();
    let results = search(dir.path())
        .item_types(ItemTypes::Files)
        .content_pattern("Invoice")
        .content_options(MatchOptions::case_sensitive())
        .run()
        .unwrap();

    assert_eq!(names(&results.found_files, dir.path()), ["file1.txt"]);
}

#[test]
fn path_and_content_filters_combine() {
    let dir = setup_test_dir();
    let results = search(dir.path())
        .path_pattern("`.md$")
        .content_pattern("^#")
        .content_options(MatchOptions {
            multi_line: true,
            ..MatchOptions::default()
        })
        .run()
        .unwrap();

    assert_eq!(names(&results.found_items, dir.path()), ["file2.md"]);
}

#[test]
fn undecodable_file_fails_content_search() {
    let dir = setup_test_dir();
    let bad = dir.path().join("blob.bin");
    fs::write(&bad, [0xff, 0xfe, 0x00, 0xc3]).unwrap();

    let err = search(dir.path()).content_pattern("x").run().unwrap_err();

    assert!(matches!(err, Error::Io { .. }));
    assert_eq!(err.path(), Some(&bad));
}

#[test]
fn custom_matcher_runs_after_filters() {
    let dir = setup_test_dir();
    let results = search(dir.path())
        .item_types(ItemTypes::Files)
        .path_pattern("`.txt$")
        .with_matcher(|e: &Entry| -> buildshim::Result<bool> { Ok(e.depth > 1) })
        .run()
        .unwrap();

    assert_eq!(names(&results.found_files, dir.path()), ["dirA/fileA1.txt"]);
}

#[test]
fn missing_start_dir_finds_nothing() {
    let dir = setup_test_dir();
    let results = search(dir.path().join("nope")).run().unwrap();

    assert!(results.is_empty());
    assert!(results.found_files.is_empty());
    assert!(results.found_dirs.is_empty());
}

#[test]
fn bad_pattern_is_fatal() {
    let dir = setup_test_dir();

    let err = search(dir.path()).path_pattern("(").run().unwrap_err();
    assert!(matches!(err, Error::InvalidPattern { .. }));

    let err = search(dir.path().join("nope")).content_pattern("[").run().unwrap_err();
    assert!(matches!(err, Error::InvalidPattern { .. }));
}

// ---------------------------------------------------------------------------
// Up
// ---------------------------------------------------------------------------

/// ```text
/// tmp/
///   a/
///     b/
///       c/
///     sib/
///   x/
///   top.txt
/// ```
fn setup_deep_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("a").join("b").join("c")).unwrap();
    fs::create_dir(root.join("a").join("sib")).unwrap();
    fs::create_dir(root.join("x")).unwrap();
    fs::write(root.join("top.txt"), "top").unwrap();
    dir
}

#[test]
fn up_collects_subdirectories_of_each_ancestor() {
    let dir = setup_deep_dir();
    let root = dir.path().to_path_buf();
    let leaf = root.join("a").join("b").join("c");

    let inside = root.clone();
    let results = search(&leaf)
        .direction(Direction::Up)
        .with_matcher(move |e: &Entry| -> buildshim::Result<bool> {
            Ok(e.path.starts_with(&inside))
        })
        .run()
        .unwrap();

    let expected: Vec<PathBuf> = vec![
        root.join("a").join("b").join("c"),
        root.join("a").join("b"),
        root.join("a").join("sib"),
        root.join("a"),
        root.join("x"),
        root.clone(),
    ];
    assert_eq!(results.found_dirs, expected);
    assert!(results.found_files.is_empty());
    assert_eq!(results.found_items, expected);
}

#[test]
fn up_with_path_filter() {
    let dir = setup_deep_dir();
    let leaf = dir.path().join("a").join("b").join("c");

    let results = search(&leaf)
        .direction(Direction::Up)
        .path_pattern("/sib$")
        .run()
        .unwrap();

    assert_eq!(results.found_dirs, [dir.path().join("a").join("sib")]);
}

#[test]
fn up_never_collects_files() {
    let dir = setup_deep_dir();
    let leaf = dir.path().join("a").join("b").join("c");

    let results = search(&leaf)
        .direction(Direction::Up)
        .item_types(ItemTypes::Files)
        .run()
        .unwrap();

    assert!(results.is_empty());
}

#[test]
fn up_normalises_relative_segments() {
    let dir = setup_deep_dir();
    let root = dir.path().to_path_buf();
    let winding = root.join("a").join("sib").join("..").join("b").join(".");

    let inside = root.clone();
    let results = search(&winding)
        .direction(Direction::Up)
        .item_types(ItemTypes::Directories)
        .with_matcher(move |e: &Entry| -> buildshim::Result<bool> {
            Ok(e.path.starts_with(&inside))
        })
        .run()
        .unwrap();

    let mut unique = results.found_dirs.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), results.found_dirs.len());
    assert_eq!(results.found_dirs.first(), Some(&root.join("a").join("b").join("c")));
}
