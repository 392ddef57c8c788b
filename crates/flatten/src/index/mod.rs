pub mod filter;
pub mod scanner;

pub use filter::{FileFilter, FileMatcher, AUDIO_VIDEO_EXTENSIONS, IMAGE_EXTENSIONS};
pub use scanner::{scan_candidates, ScanOptions};
