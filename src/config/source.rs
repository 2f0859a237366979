//! Configuration sources
//!
//! This module defines traits and implementations for loading configuration
//! from different sources.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;

use crate::config::error::{ConfigError, Result};
use crate::config::types::{ConfigValues, ValueSource};

/// Configuration source trait
pub trait ConfigSource {
    /// Load configuration from this source
    fn load(&self) -> Result<ConfigValues>;

    /// Get the source type
    fn source_type(&self) -> ValueSource;
}

/// File configuration source
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    /// Create a new file source
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigSource for FileSource {
    fn load(&self) -> Result<ConfigValues> {
        debug!("Loading configuration from file: {}", self.path.display());

        if !self.path.is_file() {
            return Err(ConfigError::FileNotFound(self.path.clone()));
        }

        let contents = fs::read_to_string(&self.path)
            .map_err(|e| ConfigError::FileReadError(self.path.clone(), e.to_string()))?;

        serde_json::from_str::<ConfigValues>(&contents).map_err(|e| {
            ConfigError::ParseError(format!("Error parsing {}: {}", self.path.display(), e))
        })
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::File
    }
}

/// Environment variable configuration source
pub struct EnvSource {
    pub prefix: String,
}

impl EnvSource {
    /// Create a new environment source
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    fn get(&self, name: &str) -> Option<String> {
        let full_name = format!("{}{}", self.prefix, name);
        let value = env::var(&full_name).ok()?;
        debug!("Found environment variable {}={}", full_name, value);
        Some(value)
    }

    fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>>
    where
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            Some(value) => value.trim().parse::<T>().map(Some).map_err(|e| {
                ConfigError::InvalidValue(format!("{}{}", self.prefix, name), e.to_string())
            }),
            None => Ok(None),
        }
    }

    fn flag(&self, name: &str) -> Result<Option<bool>> {
        match self.get(name) {
            Some(value) => parse_bool(&value).map(Some).ok_or_else(|| {
                ConfigError::InvalidValue(
                    format!("{}{}", self.prefix, name),
                    format!("Expected true or false, got '{}'", value),
                )
            }),
            None => Ok(None),
        }
    }
}

impl ConfigSource for EnvSource {
    fn load(&self) -> Result<ConfigValues> {
        debug!("Loading configuration from environment variables with prefix: {}", self.prefix);

        Ok(ConfigValues {
            host: self.get("HOST"),
            port: self.parse("PORT")?,
            message: self.get("MESSAGE"),
            proxy_protocol: self.flag("PROXY_PROTOCOL")?,
            proxy_source: self.parse("PROXY_SOURCE")?,
            proxy_destination: self.parse("PROXY_DESTINATION")?,
            proxy_command: self.parse("PROXY_COMMAND")?,
            proxy_family: self.parse("PROXY_FAMILY")?,
            tls: self.flag("TLS")?,
            skip_cert_verification: self.flag("SKIP_CERT_VERIFICATION")?,
            tls_server_name: self.get("TLS_SERVER_NAME"),
            idle_timeout_ms: self.parse("IDLE_TIMEOUT_MS")?,
            connect_timeout_ms: self.parse("CONNECT_TIMEOUT_MS")?,
            read_chunk_size: self.parse("READ_CHUNK_SIZE")?,
            max_response_bytes: self.parse("MAX_RESPONSE_BYTES")?,
            abort_on_read_error: self.flag("ABORT_ON_READ_ERROR")?,
            log_level: self.get("LOG_LEVEL"),
        })
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::Environment
    }
}

/// Command line configuration source
///
/// Wraps values already parsed by the binary's argument parser.
pub struct CliSource {
    pub values: ConfigValues,
}

impl CliSource {
    /// Create a new command line source
    pub fn new(values: ConfigValues) -> Self {
        Self { values }
    }
}

impl ConfigSource for CliSource {
    fn load(&self) -> Result<ConfigValues> {
        debug!("Loading configuration from command line arguments");
        Ok(self.values.clone())
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::CommandLine
    }
}

/// Parse a boolean environment value
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
