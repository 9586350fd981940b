//! Configuration validation

use super::*;
use crate::error::{ClientError, Result};

const LOG_FORMATS: &[&str] = &["json", "compact", "pretty"];

/// Validate complete configuration
pub fn validate_config(config: &ClientConfig) -> Result<()> {
    validate_connection(config)?;
    validate_retry_config(&config.retry)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_connection(config: &ClientConfig) -> Result<()> {
    if config.api_key.expose_secret().trim().is_empty() {
        return Err(ClientError::Config("API key is required".to_string()));
    }

    if !config.controller_host.starts_with("http://") && !config.controller_host.starts_with("https://") {
        return Err(ClientError::Config(
            "Controller host must start with http:// or https://".to_string()
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ClientError::Config(
            "Request timeout must be greater than 0".to_string()
        ));
    }

    if config.timeout_secs > 300 {
        return Err(ClientError::Config(
            "Request timeout too large (max: 300 seconds)".to_string()
        ));
    }

    Ok(())
}

/// Validate retry configuration against the executor's own policy checks
fn validate_retry_config(config: &RetryConfig) -> Result<()> {
    config.to_policy().validate()
}

fn validate_logging_config(config: &LoggingConfig) -> Result<()> {
    if !LOG_FORMATS.contains(&config.format.as_str()) {
        return Err(ClientError::Config(
            format!("Unknown log format '{}' (expected one of: {})", config.format, LOG_FORMATS.join(", "))
        ));
    }

    if config.level.trim().is_empty() {
        return Err(ClientError::Config("Log level cannot be empty".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ClientConfig {
        ClientConfig::new("test_key")
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_empty_api_key() {
        let config = ClientConfig::new("  ");
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_controller_host() {
        let config = valid().with_controller_host("api.vectordb.io");
        assert!(validate_connection(&config).is_err());
    }

    #[test]
    fn test_invalid_timeout() {
        let mut config = valid();
        config.timeout_secs = 0;
        assert!(validate_connection(&config).is_err());

        config.timeout_secs = 301;
        assert!(validate_connection(&config).is_err());
    }

    #[test]
    fn test_retry_ceiling() {
        let mut retry = RetryConfig::default();
        retry.max_retries = 10;
        assert!(validate_retry_config(&retry).is_ok());

        retry.max_retries = 11;
        assert!(matches!(validate_retry_config(&retry), Err(ClientError::Config(_))));
        assert_eq!(validate_retry_config(&retry), retry.to_policy().validate());
    }

    #[test]
    fn test_invalid_jitter_and_delays() {
        let mut retry = RetryConfig::default();
        retry.jitter_factor = 1.5;
        assert!(validate_retry_config(&retry).is_err());

        let mut retry = RetryConfig::default();
        retry.base_delay_ms = 30_000;
        assert!(validate_retry_config(&retry).is_err());
    }

    #[test]
    fn test_log_format() {
        let mut config = valid();
        config.logging.format = "xml".to_string();
        assert!(validate_config(&config).is_err());

        config.logging.format = "compact".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
