/// Plain-copy strategy: loose files in the destination directory.
use super::naming::unique_path;
use super::progress::TransferProgress;
use super::{base_name, drive, LoopExit, TransferError};

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tracing::{debug, warn};

/// Copy every file into `destination`, flattening the source tree.
///
/// Collisions are resolved against what already exists on disk, and the
/// target is opened with `create_new`, so nothing is ever overwritten.
pub(crate) fn copy_files(
    files: &[PathBuf],
    destination: &Path,
    cancel_flag: &AtomicBool,
    on_progress: &mut dyn FnMut(TransferProgress),
) -> Result<LoopExit, TransferError> {
    drive(files, cancel_flag, on_progress, |source| {
        let target = unique_path(&destination.join(base_name(source)?), Path::exists);
        let bytes = copy_one(source, &target).map_err(|err| TransferError::CopyFile {
            from: source.to_path_buf(),
            to: target.clone(),
            source: err,
        })?;
        debug!("Copied {} -> {} ({bytes} B)", source.display(), target.display());
        Ok(())
    })
}

/// Copy `source` to a `target` that must not exist yet.
///
/// A half-written target is removed again so an aborted run never
/// leaves a truncated file behind.
fn copy_one(source: &Path, target: &Path) -> io::Result<u64> {
    let mut reader = File::open(source)?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)?;

    match io::copy(&mut reader, &mut writer) {
        Ok(bytes) => Ok(bytes),
        Err(err) => {
            drop(writer);
            if let Err(cleanup) = fs::remove_file(target) {
                warn!(
                    "Could not remove partial copy {}: {cleanup}",
                    target.display()
                );
            }
            Err(err)
        }
    }
}
