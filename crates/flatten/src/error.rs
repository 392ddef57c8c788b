use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlattenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source folder {} doesn't exist", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Source {} is not a directory", .0.display())]
    SourceNotDirectory(PathBuf),

    #[error("Target folder {} already exists and `--overwrite` is not set", .0.display())]
    TargetExists(PathBuf),

    #[error("Target {} exists and is not a directory", .0.display())]
    TargetNotDirectory(PathBuf),

    #[error("Target folder {} lies inside source folder {}", .target_dir.display(), .source_dir.display())]
    TargetInsideSource {
        source_dir: PathBuf,
        target_dir: PathBuf,
    },

    #[error("Failed to read {}: {message}", .path.display())]
    Traversal { path: PathBuf, message: String },

    #[error("Invalid file type filter: {0}")]
    InvalidFilter(String),

    #[error("Path has no file name: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("No free name left for {0} in target folder")]
    NameExhausted(String),

    #[error("{failed} of {total} file copies failed")]
    CopyFailures { failed: usize, total: usize },
}

impl FlattenError {
    /// True for failures that happen before any file is copied.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, FlattenError::CopyFailures { .. })
    }

    /// Process exit status for this error.
    ///
    /// `3` is reserved for an existing target so callers can retry with
    /// `--overwrite`; other rejections are `2`, copy failures `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            FlattenError::TargetExists(_) => 3,
            e if e.is_rejection() => 2,
            _ => 1,
        }
    }
}

/// Stage of a single file copy that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStage {
    OpenSource,
    CreateDestination,
    Transfer,
    Sync,
}

impl fmt::Display for CopyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CopyStage::OpenSource => "open source",
            CopyStage::CreateDestination => "create destination",
            CopyStage::Transfer => "transfer",
            CopyStage::Sync => "sync",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
#[error("Failed to copy {} -> {} ({stage}): {error}", .source_path.display(), .destination.display())]
pub struct CopyError {
    pub source_path: PathBuf,
    pub destination: PathBuf,
    pub stage: CopyStage,
    #[source]
    pub error: std::io::Error,
}

pub type Result<T> = std::result::Result<T, FlattenError>;
