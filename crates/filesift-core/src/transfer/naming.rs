/// Collision-free naming for transfer targets.
///
/// Both strategies flatten the source tree into one namespace, so two
/// files called `photo.jpg` must land as `photo.jpg` and `photo_1.jpg`.
/// The probing rule is shared; only the "is this taken?" question
/// differs between a real directory and an archive being written.
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Return `name` if it is free, otherwise the first free `stem_N.ext`
/// with `N` counting up from 1.
///
/// A name without an extension tries `stem_1`, `stem_2`, ... The stem
/// and extension split matches [`Path::file_stem`] / [`Path::extension`],
/// so `a.tar.gz` becomes `a.tar_1.gz` and `.hidden` becomes `.hidden_1`.
pub fn unique_name<F>(name: &OsStr, mut is_taken: F) -> OsString
where
    F: FnMut(&OsStr) -> bool,
{
    if !is_taken(name) {
        return name.to_os_string();
    }

    let as_path = Path::new(name);
    let stem = as_path.file_stem().unwrap_or(name);
    let extension = as_path.extension();

    let mut counter: u64 = 1;
    loop {
        let mut candidate = OsString::with_capacity(name.len() + 8);
        candidate.push(stem);
        candidate.push(format!("_{counter}"));
        if let Some(ext) = extension {
            candidate.push(".");
            candidate.push(ext);
        }
        if !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Resolve `candidate` against a path predicate, usually `Path::exists`.
///
/// Only the final component is rewritten; the parent directory stays
/// the same. A candidate without a file name is returned unchanged.
pub fn unique_path<F>(candidate: &Path, mut exists: F) -> PathBuf
where
    F: FnMut(&Path) -> bool,
{
    let Some(file_name) = candidate.file_name() else {
        return candidate.to_path_buf();
    };
    let parent = candidate.parent().unwrap_or_else(|| Path::new(""));

    let resolved = unique_name(file_name, |name| exists(&parent.join(name)));
    parent.join(resolved)
}

/// Entry names already committed to an archive.
///
/// Archive entries live in their own namespace, independent of any
/// directory on disk, so collisions are checked against this set only.
#[derive(Debug, Default)]
pub struct ArchiveNamespace {
    names: HashSet<String>,
}

impl ArchiveNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `wanted` to a free entry name and record it as taken.
    pub fn claim(&mut self, wanted: &str) -> String {
        let resolved = unique_name(OsStr::new(wanted), |candidate| {
            self.names.contains(candidate.to_string_lossy().as_ref())
        });
        let resolved = resolved.to_string_lossy().into_owned();
        self.names.insert(resolved.clone());
        resolved
    }

    /// Number of entries claimed so far.
    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }
}
