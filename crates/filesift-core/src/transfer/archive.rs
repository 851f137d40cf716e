/// Archive strategy: every file becomes one deflate entry in a single zip.
///
/// The writer is finalised on every exit path so a cancelled run still
/// leaves a readable archive holding the entries written so far.
use super::naming::ArchiveNamespace;
use super::progress::TransferProgress;
use super::{base_name, drive, LoopExit, TransferError};

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Entries at or above this size need zip64 headers.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// Write every file into a new archive at `archive_path`.
pub(crate) fn archive_files(
    files: &[PathBuf],
    archive_path: &Path,
    cancel_flag: &AtomicBool,
    on_progress: &mut dyn FnMut(TransferProgress),
) -> Result<LoopExit, TransferError> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(archive_path)
        .map_err(|source| TransferError::CreateArchive {
            path: archive_path.to_path_buf(),
            source,
        })?;
    let mut writer = ZipWriter::new(file);
    let mut namespace = ArchiveNamespace::new();

    let result = drive(files, cancel_flag, on_progress, |source| {
        add_entry(&mut writer, &mut namespace, source)
    });

    match writer.finish() {
        Ok(_) => {}
        Err(err) if result.is_err() => {
            warn!(
                "Archive {} could not be finalised after an earlier error: {err}",
                archive_path.display()
            );
        }
        Err(source) => {
            return Err(TransferError::FinishArchive {
                path: archive_path.to_path_buf(),
                source,
            })
        }
    }

    debug!(
        "Archive {} closed with {} entries",
        archive_path.display(),
        namespace.len()
    );
    result
}

fn add_entry(
    writer: &mut ZipWriter<File>,
    namespace: &mut ArchiveNamespace,
    source: &Path,
) -> Result<(), TransferError> {
    let wanted = base_name(source)?.to_string_lossy();

    let mut reader = File::open(source).map_err(|err| TransferError::ReadSource {
        path: source.to_path_buf(),
        source: err,
    })?;
    let len = reader.metadata().map(|m| m.len()).unwrap_or(0);

    let entry = namespace.claim(&wanted);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(len >= ZIP64_THRESHOLD);

    writer
        .start_file(entry.as_str(), options)
        .map_err(|err| TransferError::ArchiveEntry {
            path: source.to_path_buf(),
            entry: entry.clone(),
            source: err,
        })?;
    let bytes = io::copy(&mut reader, writer).map_err(|err| TransferError::ArchiveEntry {
        path: source.to_path_buf(),
        entry: entry.clone(),
        source: ZipError::Io(err),
    })?;

    debug!("Archived {} as `{entry}` ({bytes} B)", source.display());
    Ok(())
}
