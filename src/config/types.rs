//! Configuration types
//!
//! `ConfigValues` holds the optional values contributed by one source.
//! `ExchangeConfig` is the resolved, immutable configuration handed to the core.

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::client::ExchangeOptions;
use crate::common::Endpoint;
use crate::config::defaults;
use crate::config::error::{ConfigError, Result};
use crate::config::validator::validate_config;
use crate::protocol::{Command, ProxyHeader, TransportFamily};

/// Source of a configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueSource {
    /// From configuration file
    File,
    /// From environment variable
    Environment,
    /// From command line argument
    CommandLine,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::File => write!(f, "file"),
            ValueSource::Environment => write!(f, "environment"),
            ValueSource::CommandLine => write!(f, "command line"),
        }
    }
}

/// Configuration values
///
/// Every field is optional so that sources can be layered. Values from a
/// later source replace values from an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigValues {
    // --- Target ---

    /// Host to connect to (name or IP literal)
    #[serde(default)]
    pub host: Option<String>,

    /// Port to connect to
    ///
    /// Kept wide so that out-of-range values are reported, not truncated.
    #[serde(default)]
    pub port: Option<i64>,

    /// Command sent to the peer (a newline is appended)
    #[serde(default)]
    pub message: Option<String>,

    // --- PROXY protocol ---

    /// Prepend a PROXY protocol v2 header
    #[serde(default)]
    pub proxy_protocol: Option<bool>,

    /// Source endpoint announced in the header
    #[serde(default)]
    pub proxy_source: Option<Endpoint>,

    /// Destination endpoint announced in the header
    #[serde(default)]
    pub proxy_destination: Option<Endpoint>,

    /// Header command (local, proxy)
    #[serde(default)]
    pub proxy_command: Option<Command>,

    /// Header transport family (unspec, tcp4, udp4, tcp6, udp6)
    #[serde(default)]
    pub proxy_family: Option<TransportFamily>,

    // --- TLS ---

    /// Wrap the connection in TLS
    #[serde(default)]
    pub tls: Option<bool>,

    /// Skip peer certificate and hostname verification
    #[serde(default)]
    pub skip_cert_verification: Option<bool>,

    /// Server name for SNI and verification (defaults to the host)
    #[serde(default)]
    pub tls_server_name: Option<String>,

    // --- Timing and reads ---

    /// Per-read idle timeout in milliseconds
    #[serde(default)]
    pub idle_timeout_ms: Option<u64>,

    /// Deadline for resolve + connect + header + handshake in milliseconds
    ///
    /// Falls back to the idle timeout when unset.
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,

    /// Size of each read
    #[serde(default)]
    pub read_chunk_size: Option<usize>,

    /// Stop reading once this many bytes have been received
    #[serde(default)]
    pub max_response_bytes: Option<usize>,

    /// Fail on a read error instead of returning what was received
    #[serde(default)]
    pub abort_on_read_error: Option<bool>,

    // --- General ---

    /// Log level (error, warn, info, debug, trace)
    #[serde(default)]
    pub log_level: Option<String>,
}

impl ConfigValues {
    /// Layer `other` on top of `self`
    pub fn merge(self, other: ConfigValues) -> ConfigValues {
        ConfigValues {
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            message: other.message.or(self.message),
            proxy_protocol: other.proxy_protocol.or(self.proxy_protocol),
            proxy_source: other.proxy_source.or(self.proxy_source),
            proxy_destination: other.proxy_destination.or(self.proxy_destination),
            proxy_command: other.proxy_command.or(self.proxy_command),
            proxy_family: other.proxy_family.or(self.proxy_family),
            tls: other.tls.or(self.tls),
            skip_cert_verification: other.skip_cert_verification.or(self.skip_cert_verification),
            tls_server_name: other.tls_server_name.or(self.tls_server_name),
            idle_timeout_ms: other.idle_timeout_ms.or(self.idle_timeout_ms),
            connect_timeout_ms: other.connect_timeout_ms.or(self.connect_timeout_ms),
            read_chunk_size: other.read_chunk_size.or(self.read_chunk_size),
            max_response_bytes: other.max_response_bytes.or(self.max_response_bytes),
            abort_on_read_error: other.abort_on_read_error.or(self.abort_on_read_error),
            log_level: other.log_level.or(self.log_level),
        }
    }

    /// Names of the fields that are set, for source logging
    pub fn present_fields(&self) -> Vec<&'static str> {
        let fields = [
            ("host", self.host.is_some()),
            ("port", self.port.is_some()),
            ("message", self.message.is_some()),
            ("proxy_protocol", self.proxy_protocol.is_some()),
            ("proxy_source", self.proxy_source.is_some()),
            ("proxy_destination", self.proxy_destination.is_some()),
            ("proxy_command", self.proxy_command.is_some()),
            ("proxy_family", self.proxy_family.is_some()),
            ("tls", self.tls.is_some()),
            ("skip_cert_verification", self.skip_cert_verification.is_some()),
            ("tls_server_name", self.tls_server_name.is_some()),
            ("idle_timeout_ms", self.idle_timeout_ms.is_some()),
            ("connect_timeout_ms", self.connect_timeout_ms.is_some()),
            ("read_chunk_size", self.read_chunk_size.is_some()),
            ("max_response_bytes", self.max_response_bytes.is_some()),
            ("abort_on_read_error", self.abort_on_read_error.is_some()),
            ("log_level", self.log_level.is_some()),
        ];

        fields
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect()
    }

    /// Resolve into an `ExchangeConfig`, applying defaults and validation
    pub fn resolve(self) -> Result<ExchangeConfig> {
        let host = self
            .host
            .ok_or_else(|| ConfigError::MissingRequiredValue("host".to_string()))?;
        let port = self
            .port
            .ok_or_else(|| ConfigError::MissingRequiredValue("port".to_string()))?;
        let target = Endpoint::from_parts(&host, port)
            .map_err(|e| ConfigError::InvalidValue("host/port".to_string(), e.to_string()))?;

        let idle_timeout_ms = self.idle_timeout_ms.unwrap_or(defaults::IDLE_TIMEOUT_MS);
        let connect_timeout_ms = self.connect_timeout_ms.unwrap_or(idle_timeout_ms);

        let config = ExchangeConfig {
            target,
            message: self.message.unwrap_or_else(defaults::message),
            proxy_protocol: self.proxy_protocol.unwrap_or(false),
            proxy_header: ProxyHeader::new(
                self.proxy_command.unwrap_or_else(defaults::proxy_command),
                self.proxy_family.unwrap_or_else(defaults::proxy_family),
                self.proxy_source.unwrap_or_else(defaults::proxy_source),
                self.proxy_destination.unwrap_or_else(defaults::proxy_destination),
            ),
            tls: self.tls.unwrap_or(false),
            skip_cert_verification: self.skip_cert_verification.unwrap_or(false),
            tls_server_name: self.tls_server_name,
            idle_timeout: Duration::from_millis(idle_timeout_ms),
            connect_timeout: Duration::from_millis(connect_timeout_ms),
            read_chunk_size: self.read_chunk_size.unwrap_or(defaults::READ_CHUNK_SIZE),
            max_response_bytes: self.max_response_bytes,
            abort_on_read_error: self.abort_on_read_error.unwrap_or(false),
            log_level: self.log_level.unwrap_or_else(defaults::log_level),
        };

        validate_config(&config)?;
        debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }
}

/// Resolved exchange configuration
///
/// Read-only to the dialer and the exchange driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Dial target
    pub target: Endpoint,
    /// Payload sent after the connection is established
    pub message: String,
    /// Prepend a PROXY protocol v2 header
    pub proxy_protocol: bool,
    /// Header written when `proxy_protocol` is set
    pub proxy_header: ProxyHeader,
    /// Wrap the connection in TLS
    pub tls: bool,
    /// Skip peer certificate and hostname verification
    pub skip_cert_verification: bool,
    /// Server name override for TLS
    pub tls_server_name: Option<String>,
    /// Per-read idle timeout
    pub idle_timeout: Duration,
    /// Deadline for the whole connection bootstrap
    pub connect_timeout: Duration,
    /// Size of each read
    pub read_chunk_size: usize,
    /// Optional cap on the accumulated response
    pub max_response_bytes: Option<usize>,
    /// Fail on read errors instead of returning partial data
    pub abort_on_read_error: bool,
    /// Log level
    pub log_level: String,
}

impl ExchangeConfig {
    /// Create a configuration with defaults for everything but target and message
    pub fn new(target: Endpoint, message: impl Into<String>) -> Self {
        let idle_timeout = Duration::from_millis(defaults::IDLE_TIMEOUT_MS);
        Self {
            target,
            message: message.into(),
            proxy_protocol: false,
            proxy_header: ProxyHeader::default(),
            tls: false,
            skip_cert_verification: false,
            tls_server_name: None,
            idle_timeout,
            connect_timeout: idle_timeout,
            read_chunk_size: defaults::READ_CHUNK_SIZE,
            max_response_bytes: None,
            abort_on_read_error: false,
            log_level: defaults::log_level(),
        }
    }

    /// Server name used for TLS SNI and verification
    pub fn server_name(&self) -> &str {
        self.tls_server_name
            .as_deref()
            .unwrap_or_else(|| self.target.host())
    }

    /// Read-loop settings for the exchange driver
    pub fn exchange_options(&self) -> ExchangeOptions {
        ExchangeOptions {
            idle_timeout: self.idle_timeout,
            read_chunk_size: self.read_chunk_size,
            max_response_bytes: self.max_response_bytes,
            abort_on_read_error: self.abort_on_read_error,
        }
    }
}
