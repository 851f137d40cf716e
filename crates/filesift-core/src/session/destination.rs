/// Destination folder naming and creation.
///
/// Each run writes into a fresh `folder_XXXXX`, where `XXXXX` is drawn
/// uniformly from `[A-Za-z0-9]`. Two runs picking the same name is
/// possible (62^5 ≈ 916 million names) but not guarded against beyond
/// the non-recursive `create_dir`, which turns a clash into an error
/// instead of a merge into an existing folder.
use crate::config::DestinationPlacement;

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const FOLDER_PREFIX: &str = "folder_";
pub const SUFFIX_LEN: usize = 5;

#[derive(Debug, Error)]
pub enum DestinationError {
    #[error("{} has no parent directory to create the destination in", .0.display())]
    NoParent(PathBuf),
    #[error("failed to create destination {}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },
}

/// `folder_` followed by [`SUFFIX_LEN`] random alphanumerics.
pub fn random_folder_name<R: Rng>(rng: &mut R) -> String {
    let suffix: String = rng
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{FOLDER_PREFIX}{suffix}")
}

/// True if `name` looks like a folder produced by [`random_folder_name`].
pub fn is_destination_name(name: &str) -> bool {
    name.strip_prefix(FOLDER_PREFIX)
        .map(|s| s.len() == SUFFIX_LEN && s.bytes().all(|b| b.is_ascii_alphanumeric()))
        .unwrap_or(false)
}

/// Compute (but do not create) the destination path for `source`.
pub fn candidate_path(
    source: &Path,
    placement: DestinationPlacement,
    folder_name: &str,
) -> Result<PathBuf, DestinationError> {
    let base = match placement {
        DestinationPlacement::Inside => source,
        DestinationPlacement::Sibling => source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| DestinationError::NoParent(source.to_path_buf()))?,
    };
    Ok(base.join(folder_name))
}

/// Create exactly `path`; an existing directory is an error.
pub fn create(path: &Path) -> Result<(), DestinationError> {
    fs::create_dir(path).map_err(|source| DestinationError::Create {
        path: path.to_path_buf(),
        source,
    })
}
