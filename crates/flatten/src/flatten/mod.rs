pub mod copier;
pub mod engine;
pub mod resolver;
pub mod space;

pub use copier::copy_file;
pub use engine::{FlattenEngine, PlannedCopy, RunOutcome, RunState};
pub use resolver::{split_name, NameReservations, MAX_DISAMBIGUATOR};
pub use space::{get_free_space, SpaceInfo};
