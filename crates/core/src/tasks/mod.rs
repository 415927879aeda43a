//! Job state tracking.
//!
//! One [`JobState`] slot exists per [`JobKind`]; runners overwrite their
//! own slot as a job progresses and the status API reads consistent
//! copies through [`TaskRegistry::snapshot_all`].

mod registry;
mod types;

pub use registry::TaskRegistry;
pub use types::{round_percent, JobKind, JobPhase, JobState};
