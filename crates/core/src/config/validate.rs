use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Downloader has a tool path, an output root and a non-zero retry budget/timeout
/// - Reporter timeout is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let downloader = &config.downloader;
    if downloader.tool_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "downloader.tool_path cannot be empty".to_string(),
        ));
    }
    if downloader.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "downloader.output_dir cannot be empty".to_string(),
        ));
    }
    if downloader.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "downloader.max_attempts must be at least 1".to_string(),
        ));
    }
    if downloader.attempt_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "downloader.attempt_timeout_ms cannot be 0".to_string(),
        ));
    }

    if config.reporter.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "reporter.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
