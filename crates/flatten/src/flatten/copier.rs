use crate::error::{CopyError, CopyStage};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

const BUFFER_SIZE: usize = 64 * 1024;

/// Copy the bytes of `source` into `destination`.
///
/// The destination is created or truncated. The call returns only after
/// the data has been flushed and synced to disk. On failure after the
/// destination was opened, the partial file is removed before the error is
/// returned.
pub fn copy_file<S: AsRef<Path>, D: AsRef<Path>>(
    source: S,
    destination: D,
) -> std::result::Result<u64, CopyError> {
    let source = source.as_ref();
    let destination = destination.as_ref();
    let fail = |stage: CopyStage, error: io::Error| CopyError {
        source_path: source.to_path_buf(),
        destination: destination.to_path_buf(),
        stage,
        error,
    };

    let reader = File::open(source).map_err(|e| fail(CopyStage::OpenSource, e))?;
    let writer = File::create(destination).map_err(|e| fail(CopyStage::CreateDestination, e))?;

    match transfer(reader, writer) {
        Ok(bytes) => {
            log::debug!(
                "Copied {} bytes: {} -> {}",
                bytes,
                source.display(),
                destination.display()
            );
            Ok(bytes)
        }
        Err((stage, error)) => {
            discard_partial(destination);
            Err(fail(stage, error))
        }
    }
}

fn transfer(reader: File, writer: File) -> std::result::Result<u64, (CopyStage, io::Error)> {
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, reader);
    let mut writer = BufWriter::with_capacity(BUFFER_SIZE, writer);

    let bytes = io::copy(&mut reader, &mut writer).map_err(|e| (CopyStage::Transfer, e))?;
    writer.flush().map_err(|e| (CopyStage::Transfer, e))?;

    let file = writer
        .into_inner()
        .map_err(|e| (CopyStage::Transfer, e.into_error()))?;
    file.sync_all().map_err(|e| (CopyStage::Sync, e))?;

    Ok(bytes)
}

fn discard_partial(destination: &Path) {
    if let Err(e) = fs::remove_file(destination) {
        if e.kind() != io::ErrorKind::NotFound {
            log::warn!(
                "Failed to remove partial file {}: {}",
                destination.display(),
                e
            );
        }
    }
}
