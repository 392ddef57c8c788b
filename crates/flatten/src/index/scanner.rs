use crate::error::{FlattenError, Result};
use crate::index::filter::{FileFilter, FileMatcher};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Options for source tree scanning
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub include_hidden: bool,
}

/// Collects every regular file under `root` accepted by `filter`.
///
/// The walk never follows symlinks and visits directory entries sorted by
/// file name, so the returned list is deterministic for a given tree. An
/// empty list is not an error. Any unreadable entry aborts the scan with
/// [`FlattenError::Traversal`].
pub fn scan_candidates<P: AsRef<Path>>(
    root: P,
    filter: &FileFilter,
    options: &ScanOptions,
) -> Result<Vec<PathBuf>> {
    let matcher = filter.compile()?;
    scan_with_matcher(root.as_ref(), &matcher, options)
}

pub(crate) fn scan_with_matcher(
    root: &Path,
    matcher: &FileMatcher,
    options: &ScanOptions,
) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(FlattenError::Traversal {
            path: root.to_path_buf(),
            message: "not an existing directory".to_string(),
        });
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name();

    let include_hidden = options.include_hidden;
    let mut candidates = Vec::new();

    for entry in walker
        .into_iter()
        .filter_entry(|e| include_hidden || e.depth() == 0 || !is_hidden(e))
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            FlattenError::Traversal {
                path,
                message: e.to_string(),
            }
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        if matcher.is_match(entry.path()) {
            candidates.push(entry.into_path());
        }
    }

    log::debug!(
        "Found {} candidate files under {}",
        candidates.len(),
        root.display()
    );

    Ok(candidates)
}

/// Dot-prefixed names are hidden, whether or not the rest is valid UTF-8.
fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().as_encoded_bytes().first() == Some(&b'.')
}
