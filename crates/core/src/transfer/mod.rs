//! Transfer module: magnet acquisition via a poll-based engine seam.
//!
//! The [`TransferEngine`] trait is the only surface the orchestration
//! core sees; [`LibrqbitEngine`] implements it over an embedded
//! librqbit session, and tests substitute a scripted mock.

mod librqbit;
mod runner;
mod types;

pub use librqbit::LibrqbitEngine;
pub use runner::TransferRunner;
pub use types::{PollPolicy, TransferEngine, TransferError, TransferSnapshot};
