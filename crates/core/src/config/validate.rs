use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Storage directories are not empty
/// - Poll policy bounds are usable
/// - Transcode timeout and audio bitrate are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Storage validation
    if config.storage.download_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.download_dir cannot be empty".to_string(),
        ));
    }
    if config.storage.convert_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.convert_dir cannot be empty".to_string(),
        ));
    }

    // Transfer poll policy validation
    if config.transfer.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "transfer.poll_interval_ms cannot be 0".to_string(),
        ));
    }
    if config.transfer.max_poll_failures == 0 {
        return Err(ConfigError::ValidationError(
            "transfer.max_poll_failures cannot be 0".to_string(),
        ));
    }

    // Transcode validation
    if config.transcode.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "transcode.timeout_secs cannot be 0".to_string(),
        ));
    }
    if config.transcode.audio_bitrate_kbps == 0 {
        return Err(ConfigError::ValidationError(
            "transcode.audio_bitrate_kbps cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServerConfig, TransferConfig};

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_validate_zero_poll_interval_fails() {
        let config = Config {
            transfer: TransferConfig {
                poll_interval_ms: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_max_failures_fails() {
        let config = Config {
            transfer: TransferConfig {
                max_poll_failures: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
