//! Configuration loader with environment variable support

use super::ClientConfig;
use crate::error::{ClientError, Result};
use config::{Environment, File};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Prefix of every environment variable the client reads
pub const ENV_PREFIX: &str = "VECTORDB";

/// JSON object of extra request headers
pub const HEADERS_ENV_VAR: &str = "VECTORDB_HEADERS_JSON";

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ClientConfig> {
    let config = config::Config::builder()
        .add_source(File::from(path.as_ref()))
        .build()?;

    let cfg: ClientConfig = config.try_deserialize()?;
    Ok(cfg)
}

/// Load configuration from a TOML file with environment variable overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<ClientConfig> {
    let config = config::Config::builder()
        .add_source(File::from(path.as_ref()))
        .add_source(environment())
        .build()?;

    let mut cfg: ClientConfig = config.try_deserialize()?;
    apply_header_env(&mut cfg)?;
    Ok(cfg)
}

/// Load configuration from the environment alone, reading `.env` first if present
pub fn load_config_from_env() -> Result<ClientConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded environment from {}", path.display());
    }

    let config = config::Config::builder()
        .add_source(environment())
        .build()?;

    let mut cfg: ClientConfig = config.try_deserialize()?;
    apply_header_env(&mut cfg)?;
    Ok(cfg)
}

fn apply_header_env(cfg: &mut ClientConfig) -> Result<()> {
    if let Ok(raw) = std::env::var(HEADERS_ENV_VAR) {
        let headers = parse_headers(&raw)?;
        cfg.additional_headers.extend(headers);
    }
    Ok(())
}

/// Parse a JSON object of header names to values
fn parse_headers(raw: &str) -> Result<HashMap<String, String>> {
    serde_json::from_str(raw).map_err(|e| {
        ClientError::Config(format!("{} must be a JSON object of strings: {}", HEADERS_ENV_VAR, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    fn write_temp_config(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("vectordb-client-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_from_file() {
        let path = write_temp_config(
            r#"
api_key = "file-key"
controller_host = "https://control.example.io"

[retry]
max_retries = 5
base_delay_ms = 50

[additional_headers]
x-team = "search"
"#,
        );

        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.api_key.expose_secret(), "file-key");
        assert_eq!(config.controller_host, "https://control.example.io");
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.base_delay_ms, 50);
        assert_eq!(config.retry.max_delay_ms, 20_000);
        assert_eq!(config.additional_headers.get("x-team").map(String::as_str), Some("search"));
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let path = write_temp_config("timeout_secs = 10\n");
        let result = load_config(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers(r#"{"x-source": "tests"}"#).unwrap();
        assert_eq!(headers.get("x-source").map(String::as_str), Some("tests"));
        assert!(parse_headers("[1, 2]").is_err());
    }
}
