pub mod config;
pub mod metrics;
pub mod supervisor;
pub mod tasks;
pub mod testing;
pub mod transcode;
pub mod transfer;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ServerConfig,
    StorageConfig, TransferConfig,
};
pub use supervisor::{JobSupervisor, StartError, TranscodeParams};
pub use tasks::{JobKind, JobPhase, JobState, TaskRegistry};
pub use transcode::{
    EncoderPreset, FfmpegTranscoder, TranscodeConfig, TranscodeError, TranscodeJob,
    TranscodeOutcome, TranscodeProgress, TranscodeRunner, Transcoder, VideoCodec,
};
pub use transfer::{
    LibrqbitEngine, PollPolicy, TransferEngine, TransferError, TransferRunner, TransferSnapshot,
};
