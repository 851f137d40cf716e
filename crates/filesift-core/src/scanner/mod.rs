/// Scanner module: collects the files a copy session will transfer.
///
/// The scan is a one-shot, eager listing: the transfer phase needs the
/// total up front for progress, and an empty result must be known before
/// any destination folder is created.
///
/// Traversal uses `jwalk` on a rayon pool. Entries are sorted by name at
/// every directory level, so the result order is depth-first lexicographic
/// and identical from run to run. The excluded directory (the
/// destination folder) is pruned in `process_read_dir`, so it is never
/// even read.
use crate::filter::{is_eligible, FileTypeSelector};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// Eligible files found under a source directory, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Absolute paths of eligible regular files.
    pub files: Vec<PathBuf>,
    /// Entries that could not be read and were skipped.
    pub skipped: u64,
    /// The walk stopped early because cancellation was requested.
    pub cancelled: bool,
}

impl ScanResult {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Errors that prevent a scan from starting.
///
/// Problems below the root are not errors: they are logged and counted
/// in [`ScanResult::skipped`].
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("cannot resolve {}: {source}", path.display())]
    Resolve { path: PathBuf, source: io::Error },
}

/// Entries walked between two checks of the cancel flag.
const CANCEL_CHECK_INTERVAL: u64 = 256;

/// Recursively list the files under `source` that match `selector`.
///
/// `exclude`, if given, is never descended into, whether or not it
/// exists yet. Symlinked directories are not followed; a symlink to a
/// regular file is collected like the file itself.
pub fn scan(
    source: &Path,
    selector: &FileTypeSelector,
    exclude: Option<&Path>,
) -> Result<ScanResult, ScanError> {
    scan_until(source, selector, exclude, &AtomicBool::new(false))
}

/// [`scan`] that gives up once `cancel_flag` is set.
///
/// The flag is polled every [`CANCEL_CHECK_INTERVAL`] entries and once
/// more at the end. A cancelled scan returns what it had collected with
/// [`ScanResult::cancelled`] set.
pub fn scan_until(
    source: &Path,
    selector: &FileTypeSelector,
    exclude: Option<&Path>,
    cancel_flag: &AtomicBool,
) -> Result<ScanResult, ScanError> {
    let start = Instant::now();

    if !source.is_dir() {
        return Err(ScanError::NotADirectory(source.to_path_buf()));
    }
    let root = source.canonicalize().map_err(|err| ScanError::Resolve {
        path: source.to_path_buf(),
        source: err,
    })?;
    let exclude: Option<PathBuf> =
        exclude.map(|p| p.canonicalize().unwrap_or_else(|_| p.to_path_buf()));

    let walker = jwalk::WalkDir::new(&root)
        .sort(true)
        .skip_hidden(false)
        .follow_links(false)
        .parallelism(jwalk::Parallelism::RayonNewPool(num_cpus::get()))
        .process_read_dir(move |_depth, _dir, _state, children| {
            if let Some(ref excluded) = exclude {
                children.retain(|child| match child {
                    Ok(entry) => !(entry.file_type().is_dir() && entry.path() == *excluded),
                    Err(_) => true,
                });
            }
        });

    let mut result = ScanResult::default();
    let mut visited: u64 = 0;

    for entry_result in walker {
        if visited % CANCEL_CHECK_INTERVAL == 0 && cancel_flag.load(Ordering::Relaxed) {
            result.cancelled = true;
            break;
        }

        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                // jwalk errors are typically access-denied on directories.
                result.skipped += 1;
                warn!("Skipping unreadable entry: {err}");
                continue;
            }
        };
        visited += 1;

        let name = entry.file_name().to_string_lossy();
        if !is_eligible(&name, selector) {
            continue;
        }
        let file_type = entry.file_type();
        let is_file = if file_type.is_symlink() {
            // Resolve the link target; dangling links are dropped.
            fs::metadata(entry.path())
                .map(|meta| meta.is_file())
                .unwrap_or(false)
        } else {
            file_type.is_file()
        };
        if is_file {
            result.files.push(entry.path());
        }
    }
    if cancel_flag.load(Ordering::Relaxed) {
        result.cancelled = true;
    }

    debug!(
        "Scan of {} visited {visited} entries, {} eligible, {} skipped in {:?}{}",
        root.display(),
        result.files.len(),
        result.skipped,
        start.elapsed(),
        if result.cancelled { " (cancelled)" } else { "" }
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    fn names(result: &ScanResult) -> Vec<String> {
        result
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn images_selector_picks_images_only() {
        let tmp = TempDir::new().unwrap();
        for name in &["a.jpg", "b.txt", "c.PNG"] {
            touch(&tmp.path().join(name));
        }

        let result = scan(tmp.path(), &FileTypeSelector::Images, None).unwrap();
        assert_eq!(names(&result), vec!["a.jpg", "c.PNG"]);
    }

    #[test]
    fn results_are_absolute() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("sub/a.jpg"));

        let result = scan(tmp.path(), &FileTypeSelector::Images, None).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.files[0].is_absolute());
    }

    #[test]
    fn excluded_directory_is_not_scanned() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("test1.jpg"));
        touch(&tmp.path().join("test2.png"));
        touch(&tmp.path().join("dest/dest.jpg"));

        let dest = tmp.path().join("dest");
        let result = scan(tmp.path(), &FileTypeSelector::Images, Some(&dest)).unwrap();
        assert_eq!(names(&result), vec!["test1.jpg", "test2.png"]);
    }

    #[test]
    fn missing_exclude_directory_is_harmless() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a.gif"));

        let not_yet = tmp.path().join("folder_AbC12");
        let result = scan(tmp.path(), &FileTypeSelector::Images, Some(&not_yet)).unwrap();
        assert_eq!(names(&result), vec!["a.gif"]);
    }

    /// Depth-first, lexicographic at every level.
    #[test]
    fn order_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        for rel in &["b/2.jpg", "b/1.jpg", "a.jpg", "c.jpg", "a/z.jpg"] {
            touch(&tmp.path().join(rel));
        }

        let first = scan(tmp.path(), &FileTypeSelector::Images, None).unwrap();
        let second = scan(tmp.path(), &FileTypeSelector::Images, None).unwrap();
        assert_eq!(first, second);

        let root = tmp.path().canonicalize().unwrap();
        let rel: Vec<PathBuf> = first
            .files
            .iter()
            .map(|p| p.strip_prefix(&root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("a/z.jpg"),
                PathBuf::from("a.jpg"),
                PathBuf::from("b/1.jpg"),
                PathBuf::from("b/2.jpg"),
                PathBuf::from("c.jpg"),
            ]
        );
    }

    #[test]
    fn empty_match_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("notes.txt"));

        let result = scan(tmp.path(), &FileTypeSelector::Videos, None).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn preset_cancel_flag_stops_the_walk() {
        let tmp = TempDir::new().unwrap();
        for i in 0..50 {
            touch(&tmp.path().join(format!("d{i}/x.jpg")));
        }

        let cancel = AtomicBool::new(true);
        let result = scan_until(tmp.path(), &FileTypeSelector::Images, None, &cancel).unwrap();
        assert!(result.cancelled);
        assert!(result.is_empty());

        let full = scan(tmp.path(), &FileTypeSelector::Images, None).unwrap();
        assert!(!full.cancelled);
        assert_eq!(full.len(), 50);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_collected_but_linked_dirs_are_not_walked() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().unwrap();
        let outside = tmp.path().join("outside");
        touch(&outside.join("far.jpg"));
        let src = tmp.path().join("src");
        touch(&src.join("real.jpg"));
        symlink(outside.join("far.jpg"), src.join("link.jpg")).unwrap();
        symlink(&outside, src.join("linked_dir")).unwrap();
        symlink(tmp.path().join("gone.jpg"), src.join("dangling.jpg")).unwrap();

        let result = scan(&src, &FileTypeSelector::Images, None).unwrap();
        assert_eq!(names(&result), vec!["link.jpg", "real.jpg"]);
    }

    #[test]
    fn source_must_be_a_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.jpg");
        touch(&file);

        assert!(matches!(
            scan(&file, &FileTypeSelector::Images, None),
            Err(ScanError::NotADirectory(_))
        ));
        assert!(matches!(
            scan(&tmp.path().join("missing"), &FileTypeSelector::Images, None),
            Err(ScanError::NotADirectory(_))
        ));
    }
}
