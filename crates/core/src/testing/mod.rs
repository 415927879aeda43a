//! Testing utilities and mock implementations.
//!
//! Controllable test doubles for the transfer-engine and transcoder
//! seams, used by the lifecycle integration tests to exercise the
//! runners without real torrents or an ffmpeg binary.

mod mock_engine;
mod mock_transcoder;

pub use mock_engine::MockTransferEngine;
pub use mock_transcoder::MockTranscoder;
