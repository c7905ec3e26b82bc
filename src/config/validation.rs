use crate::config::types::{DownloadConfig, FileConfig, MirrorConfig};
use crate::ConfigError;

/// Upper bound on concurrent fetches within a level
pub const MAX_CONCURRENCY: usize = 64;

/// Validates the entire configuration file
pub fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    validate_mirror_config(&config.mirror)?;
    validate_download_config(&config.download)?;
    Ok(())
}

/// Validates mirror configuration
///
/// The rate-limit string is deliberately left alone: an unusable rate only
/// disables limiting for the run (logged as a warning by the crawler).
pub fn validate_mirror_config(config: &MirrorConfig) -> Result<(), ConfigError> {
    if config.max_depth < 1 {
        return Err(ConfigError::Validation(format!(
            "max-depth must be >= 1, got {}",
            config.max_depth
        )));
    }

    if config.max_files < 1 {
        return Err(ConfigError::Validation(format!(
            "max-files must be >= 1, got {}",
            config.max_files
        )));
    }

    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    validate_timeout(config.request_timeout_secs)?;
    validate_user_agent(&config.user_agent)?;

    if let Some(path) = &config.output_path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "output-path cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates download configuration
pub fn validate_download_config(config: &DownloadConfig) -> Result<(), ConfigError> {
    validate_timeout(config.request_timeout_secs)?;
    validate_user_agent(&config.user_agent)?;

    if let Some(name) = &config.output_name {
        if name.is_empty() || name.contains('/') {
            return Err(ConfigError::Validation(format!(
                "output-name must be a plain file name, got '{}'",
                name
            )));
        }
    }

    Ok(())
}

fn validate_timeout(secs: u64) -> Result<(), ConfigError> {
    if secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            secs
        )));
    }
    Ok(())
}

fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
    if user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if user_agent.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(format!(
            "user-agent must not contain control characters, got '{}'",
            user_agent.escape_debug()
        )));
    }

    Ok(())
}
