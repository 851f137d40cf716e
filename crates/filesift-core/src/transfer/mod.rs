/// Transfer engine: moves a scanned file list into a destination folder.
///
/// Two mutually exclusive strategies:
/// - **Copy:** each file is copied byte-for-byte to `destination/<name>`,
///   with name collisions resolved against the real directory.
/// - **Archive:** every file becomes a deflate entry in one zip archive
///   inside `destination`, with collisions resolved against the names
///   already written to that archive.
///
/// Both share one driver loop ([`drive`]) that owns cancellation and
/// progress. Cancellation is cooperative: the flag is only read between
/// files, so a file that has started is always finished. On cancel or
/// error, files already transferred stay where they are.
pub mod archive;
pub mod copy;
pub mod naming;
pub mod progress;

use progress::{TransferOutcome, TransferProgress};

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use thiserror::Error;
use tracing::info;

/// Default file name of the archive written by [`TransferStrategy::Archive`].
pub const DEFAULT_ARCHIVE_NAME: &str = "compressed_files.zip";

/// Which way the files get into the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStrategy {
    /// Loose byte-for-byte copies.
    Copy,
    /// One zip archive named `archive_name`.
    Archive { archive_name: String },
}

impl TransferStrategy {
    /// Pick the strategy for a request's `compress` flag.
    pub fn for_request(compress: bool, archive_name: &str) -> Self {
        if compress {
            Self::Archive {
                archive_name: archive_name.to_string(),
            }
        } else {
            Self::Copy
        }
    }
}

/// Errors that abort a transfer.
///
/// Files transferred before the error are left in the destination.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("{} has no file name", .0.display())]
    NoFileName(PathBuf),

    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("failed to create archive {}: {source}", path.display())]
    CreateArchive { path: PathBuf, source: io::Error },

    #[error("failed to read {}: {source}", path.display())]
    ReadSource { path: PathBuf, source: io::Error },

    #[error("failed to add {} to the archive as `{entry}`: {source}", path.display())]
    ArchiveEntry {
        path: PathBuf,
        entry: String,
        source: zip::result::ZipError,
    },

    #[error("failed to finalise archive {}: {source}", path.display())]
    FinishArchive {
        path: PathBuf,
        source: zip::result::ZipError,
    },
}

/// How the driver loop ended when no error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopExit {
    Finished,
    Canceled,
}

/// Transfer `files` into `destination`.
///
/// `on_progress` is called once with `completed == 0` before any file is
/// touched and then after every file; `total` is `files.len()` throughout.
/// Returns [`TransferOutcome::Completed`] or [`TransferOutcome::Canceled`];
/// everything else comes back as a [`TransferError`].
///
/// The caller guarantees `files` is non-empty.
pub fn run_transfer<F>(
    files: &[PathBuf],
    destination: &Path,
    strategy: &TransferStrategy,
    cancel_flag: &AtomicBool,
    mut on_progress: F,
) -> Result<TransferOutcome, TransferError>
where
    F: FnMut(TransferProgress),
{
    let start = Instant::now();
    info!(
        "Transferring {} files into {} ({:?})",
        files.len(),
        destination.display(),
        strategy
    );

    on_progress(TransferProgress::new(0, files.len()));

    let exit = match strategy {
        TransferStrategy::Copy => {
            copy::copy_files(files, destination, cancel_flag, &mut on_progress)?
        }
        TransferStrategy::Archive { archive_name } => archive::archive_files(
            files,
            &destination.join(archive_name),
            cancel_flag,
            &mut on_progress,
        )?,
    };

    let outcome = match exit {
        LoopExit::Finished => TransferOutcome::Completed(destination.to_path_buf()),
        LoopExit::Canceled => TransferOutcome::Canceled,
    };
    info!("Transfer ended as {outcome:?} after {:?}", start.elapsed());
    Ok(outcome)
}

/// The loop shared by both strategies.
///
/// Checks the cancel flag before each file, hands the file to `step`, then
/// reports progress. The first error from `step` ends the loop.
pub(crate) fn drive<S>(
    files: &[PathBuf],
    cancel_flag: &AtomicBool,
    on_progress: &mut dyn FnMut(TransferProgress),
    mut step: S,
) -> Result<LoopExit, TransferError>
where
    S: FnMut(&Path) -> Result<(), TransferError>,
{
    let total = files.len();
    for (done, file) in files.iter().enumerate() {
        if cancel_flag.load(Ordering::Relaxed) {
            info!("Cancellation observed after {done} of {total} files");
            return Ok(LoopExit::Canceled);
        }
        step(file)?;
        on_progress(TransferProgress::new(done + 1, total));
    }
    Ok(LoopExit::Finished)
}

/// The base name a file is transferred under, before collision resolution.
pub(crate) fn base_name(path: &Path) -> Result<&std::ffi::OsStr, TransferError> {
    path.file_name()
        .ok_or_else(|| TransferError::NoFileName(path.to_path_buf()))
}
