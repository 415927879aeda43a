//! Job supervisor: start-request validation and runner spawning.

#[allow(clippy::module_inception)]
mod supervisor;
mod types;

pub use supervisor::JobSupervisor;
pub use types::{StartError, TranscodeParams};
