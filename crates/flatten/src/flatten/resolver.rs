use crate::error::{FlattenError, Result};
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Upper bound on the numeric suffix tried for one file name.
pub const MAX_DISAMBIGUATOR: u32 = 10_000;

/// Destination names handed out during one run.
///
/// All names are reserved from the planning thread before any copy starts,
/// so two sources with the same base name can never be given the same
/// destination. With `check_disk` set, names already present in the target
/// directory are treated as taken as well.
#[derive(Debug)]
pub struct NameReservations {
    target_dir: PathBuf,
    check_disk: bool,
    limit: u32,
    taken: HashSet<OsString>,
}

impl NameReservations {
    pub fn new<P: AsRef<Path>>(target_dir: P, check_disk: bool) -> Self {
        Self {
            target_dir: target_dir.as_ref().to_path_buf(),
            check_disk,
            limit: MAX_DISAMBIGUATOR,
            taken: HashSet::new(),
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Pick and reserve a free destination for `source_path`.
    ///
    /// Tries `name.ext`, then `name-1.ext`, `name-2.ext`, ... up to the
    /// configured limit ([`MAX_DISAMBIGUATOR`] by default).
    pub fn reserve<P: AsRef<Path>>(&mut self, source_path: P) -> Result<PathBuf> {
        let source_path = source_path.as_ref();
        let raw_name = source_path
            .file_name()
            .ok_or_else(|| FlattenError::InvalidPath(source_path.to_path_buf()))?;
        let (stem, rest) = split_os_name(raw_name);

        for n in 0..=self.limit {
            let candidate = if n == 0 {
                raw_name.to_os_string()
            } else {
                let mut name = OsString::with_capacity(raw_name.len() + 6);
                name.push(&stem);
                name.push(format!("-{}", n));
                name.push(&rest);
                name
            };

            if self.is_taken(&candidate) {
                continue;
            }

            let destination = self.target_dir.join(&candidate);
            self.taken.insert(candidate);
            return Ok(destination);
        }

        Err(FlattenError::NameExhausted(
            raw_name.to_string_lossy().into_owned(),
        ))
    }

    fn is_taken(&self, candidate: &OsString) -> bool {
        if self.taken.contains(candidate) {
            return true;
        }
        self.check_disk && self.target_dir.join(candidate).symlink_metadata().is_ok()
    }
}

/// Split a file name at its first period into stem and remainder.
///
/// The remainder keeps the period. A leading period belongs to the stem so
/// `.bashrc` is a bare stem; a name without a period has an empty remainder.
pub fn split_name(file_name: &str) -> (&str, &str) {
    file_name.split_at(extension_start(file_name.as_bytes()))
}

fn extension_start(name: &[u8]) -> usize {
    let search_from = usize::from(name.first() == Some(&b'.'));
    name[search_from..]
        .iter()
        .position(|&b| b == b'.')
        .map_or(name.len(), |idx| search_from + idx)
}

/// Byte-exact [`split_name`] for names that may not be valid UTF-8.
#[cfg(unix)]
fn split_os_name(name: &OsStr) -> (OsString, OsString) {
    use std::os::unix::ffi::OsStrExt;

    let bytes = name.as_bytes();
    let (stem, rest) = bytes.split_at(extension_start(bytes));
    (
        OsStr::from_bytes(stem).to_os_string(),
        OsStr::from_bytes(rest).to_os_string(),
    )
}

#[cfg(not(unix))]
fn split_os_name(name: &OsStr) -> (OsString, OsString) {
    let name = name.to_string_lossy();
    let (stem, rest) = split_name(&name);
    (OsString::from(stem), OsString::from(rest))
}
