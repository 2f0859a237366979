//! Configuration validator
//!
//! This module provides functionality for validating configuration.

use log::warn;

use crate::common::log::parse_level;
use crate::config::error::{ConfigError, Result};
use crate::config::types::ExchangeConfig;

/// Validate the configuration
pub fn validate_config(config: &ExchangeConfig) -> Result<()> {
    // Validate timing settings
    validate_timing_settings(config)?;

    // Validate PROXY header settings
    validate_proxy_settings(config)?;

    // Validate TLS settings
    validate_tls_settings(config)?;

    // Validate general settings
    validate_general_settings(config);

    Ok(())
}

/// Validate timeouts and read sizes
fn validate_timing_settings(config: &ExchangeConfig) -> Result<()> {
    if config.idle_timeout.is_zero() {
        return Err(ConfigError::InvalidValue(
            "idle_timeout_ms".to_string(),
            "Idle timeout must be greater than 0".to_string(),
        ));
    }

    if config.connect_timeout.is_zero() {
        return Err(ConfigError::InvalidValue(
            "connect_timeout_ms".to_string(),
            "Connect timeout must be greater than 0".to_string(),
        ));
    }

    if config.read_chunk_size == 0 {
        return Err(ConfigError::InvalidValue(
            "read_chunk_size".to_string(),
            "Read chunk size must be greater than 0".to_string(),
        ));
    }

    if config.max_response_bytes == Some(0) {
        return Err(ConfigError::InvalidValue(
            "max_response_bytes".to_string(),
            "Response cap must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Encode the header once so a bad endpoint fails before any I/O
fn validate_proxy_settings(config: &ExchangeConfig) -> Result<()> {
    if !config.proxy_protocol {
        return Ok(());
    }

    config
        .proxy_header
        .encode()
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidValue("proxy_header".to_string(), e.to_string()))
}

/// Validate TLS settings
fn validate_tls_settings(config: &ExchangeConfig) -> Result<()> {
    if let Some(name) = &config.tls_server_name {
        if name.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "tls_server_name".to_string(),
                "Server name must not be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validate general settings
fn validate_general_settings(config: &ExchangeConfig) {
    if parse_level(&config.log_level).is_none() {
        warn!(
            "Invalid log level: {}. The current log level stays in effect",
            config.log_level
        );
    }
}

/// Configuration validator trait
pub trait ConfigValidator {
    /// Check configuration for warnings
    fn check_warnings(&self) -> Vec<String>;
}

impl ConfigValidator for ExchangeConfig {
    fn check_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.skip_cert_verification && !self.tls {
            warnings.push("Certificate verification skip has no effect without TLS".to_string());
        }

        if self.tls_server_name.is_some() && !self.tls {
            warnings.push("TLS server name has no effect without TLS".to_string());
        }

        if self.skip_cert_verification && self.tls {
            warnings.push(format!(
                "Peer certificate of {} will not be verified",
                self.target
            ));
        }

        if self.message.is_empty() {
            warnings.push("Message is empty, only a newline will be sent".to_string());
        }

        warnings
    }
}
