use crate::error::{FlattenError, Result};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct SpaceInfo {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub available_bytes: u64,
}

impl SpaceInfo {
    pub fn can_hold(&self, bytes: u64) -> bool {
        bytes <= self.available_bytes
    }
}

/// Free space of the filesystem holding `path`.
///
/// Returns `Ok(None)` on platforms where this is not implemented.
pub fn get_free_space<P: AsRef<Path>>(path: P) -> Result<Option<SpaceInfo>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FlattenError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    #[cfg(target_os = "linux")]
    {
        use std::ffi::CString;
        use std::mem;
        use std::os::unix::ffi::OsStrExt;

        let path_cstr = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
            FlattenError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path contains null byte",
            ))
        })?;

        let mut stat: libc::statvfs = unsafe { mem::zeroed() };
        let result = unsafe { libc::statvfs(path_cstr.as_ptr(), &mut stat) };

        if result != 0 {
            return Err(FlattenError::Io(std::io::Error::last_os_error()));
        }

        let block_size = stat.f_frsize as u64;
        Ok(Some(SpaceInfo {
            total_bytes: stat.f_blocks as u64 * block_size,
            free_bytes: stat.f_bfree as u64 * block_size,
            available_bytes: stat.f_bavail as u64 * block_size,
        }))
    }

    #[cfg(not(target_os = "linux"))]
    {
        Ok(None)
    }
}

/// Log a warning when `required_bytes` will not fit under `path`.
///
/// Never fails the run; errors while querying are logged at debug level.
pub fn warn_if_insufficient<P: AsRef<Path>>(path: P, required_bytes: u64) -> bool {
    let path = path.as_ref();
    match get_free_space(path) {
        Ok(Some(info)) if !info.can_hold(required_bytes) => {
            log::warn!(
                "Target {} has {} bytes available but {} bytes will be copied",
                path.display(),
                info.available_bytes,
                required_bytes
            );
            false
        }
        Ok(_) => true,
        Err(e) => {
            log::debug!("Could not check free space of {}: {}", path.display(), e);
            true
        }
    }
}
