pub mod config;
pub mod error;
pub mod flatten;
pub mod index;
pub mod util;

pub use config::{FlattenConfig, Settings};
pub use error::{CopyError, CopyStage, FlattenError, Result};
pub use flatten::{
    copy_file, FlattenEngine, NameReservations, PlannedCopy, RunOutcome, RunState,
};
pub use index::{scan_candidates, FileFilter, ScanOptions};
