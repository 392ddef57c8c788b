//! File type filters.
//!
//! A [`FileFilter`] is resolved once from the `--suffix` selector and compiled
//! into a case-insensitive [`GlobSet`] that is matched against file names.

use crate::error::{FlattenError, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif"];

pub const AUDIO_VIDEO_EXTENSIONS: &[&str] = &[
    "flv", "ram", "mpg", "mpeg", "avi", "rm", "wmv", "mov", "asf", "rbs", "movie", "divx", "mp4",
    "ogg", "mpeg4", "m4v", "webm",
];

const GLOB_METACHARACTERS: &[char] = &['*', '?', '[', ']', '{', '}', '!', '/', '\\'];

/// Which files of the source tree are copied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FileFilter {
    #[default]
    All,
    Image,
    AudioVideo,
    /// A single extension, stored lowercase and without the leading dot.
    Extension(String),
}

impl FileFilter {
    /// Build an extension filter, validating the user supplied value.
    pub fn extension(ext: &str) -> Result<Self> {
        let ext = ext.trim().trim_start_matches('.');
        if ext.is_empty() {
            return Err(FlattenError::InvalidFilter(
                "extension must not be empty".to_string(),
            ));
        }
        if ext.contains(GLOB_METACHARACTERS) {
            return Err(FlattenError::InvalidFilter(format!(
                "extension '{}' contains a path separator or glob character",
                ext
            )));
        }
        Ok(FileFilter::Extension(ext.to_lowercase()))
    }

    /// Extensions matched by this filter, or `None` when every file matches.
    pub fn extensions(&self) -> Option<Vec<&str>> {
        match self {
            FileFilter::All => None,
            FileFilter::Image => Some(IMAGE_EXTENSIONS.to_vec()),
            FileFilter::AudioVideo => Some(AUDIO_VIDEO_EXTENSIONS.to_vec()),
            FileFilter::Extension(ext) => Some(vec![ext.as_str()]),
        }
    }

    /// Human readable kind, used in "no file found" warnings.
    pub fn describe(&self) -> String {
        match self {
            FileFilter::All => "file".to_string(),
            FileFilter::Image => "image file".to_string(),
            FileFilter::AudioVideo => "audio/video file".to_string(),
            FileFilter::Extension(ext) => format!("{} file", ext),
        }
    }

    pub fn compile(&self) -> Result<FileMatcher> {
        let patterns = match self.extensions() {
            None => vec!["*".to_string()],
            Some(exts) => exts.iter().map(|ext| format!("*.{}", ext)).collect(),
        };

        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = GlobBuilder::new(pattern)
                .case_insensitive(true)
                .literal_separator(true)
                .build()
                .map_err(|e| {
                    FlattenError::InvalidFilter(format!("Invalid glob pattern '{}': {}", pattern, e))
                })?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| FlattenError::InvalidFilter(format!("Failed to build globset: {}", e)))?;

        Ok(FileMatcher { set })
    }
}

impl FromStr for FileFilter {
    type Err = FlattenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "any" | "all" => Ok(FileFilter::All),
            "img" | "image" => Ok(FileFilter::Image),
            "av" | "audio-video" | "video" => Ok(FileFilter::AudioVideo),
            _ => FileFilter::extension(s),
        }
    }
}

impl fmt::Display for FileFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFilter::All => f.write_str("any"),
            FileFilter::Image => f.write_str("img"),
            FileFilter::AudioVideo => f.write_str("av"),
            FileFilter::Extension(ext) => f.write_str(ext),
        }
    }
}

/// Compiled form of a [`FileFilter`].
#[derive(Debug, Clone)]
pub struct FileMatcher {
    set: GlobSet,
}

impl FileMatcher {
    /// Matches on the file name only, never on directory components.
    pub fn is_match<P: AsRef<Path>>(&self, path: P) -> bool {
        match path.as_ref().file_name() {
            Some(name) => self.set.is_match(Path::new(name)),
            None => false,
        }
    }
}
