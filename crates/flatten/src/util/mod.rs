pub mod format;
pub mod progress;

pub use format::{format_bytes, format_duration, format_timestamp};
pub use progress::create_progress_bar;
