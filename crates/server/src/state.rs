use std::path::Path;
use std::sync::Arc;

use mediaforge_core::{Config, JobSupervisor, TaskRegistry};

/// Shared application state
pub struct AppState {
    config: Config,
    registry: Arc<TaskRegistry>,
    supervisor: Arc<JobSupervisor>,
}

impl AppState {
    pub fn new(config: Config, registry: Arc<TaskRegistry>, supervisor: Arc<JobSupervisor>) -> Self {
        Self {
            config,
            registry,
            supervisor,
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn supervisor(&self) -> &JobSupervisor {
        &self.supervisor
    }

    pub fn download_dir(&self) -> &Path {
        &self.config.storage.download_dir
    }

    pub fn convert_dir(&self) -> &Path {
        &self.config.storage.convert_dir
    }
}
