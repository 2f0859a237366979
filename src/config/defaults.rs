//! Default configuration values
//!
//! This module provides default values for configuration options.
//! It is the single source of truth for defaults used by the config
//! types, the environment source and the command-line help text.

use crate::common::Endpoint;
use crate::protocol::{Command, TransportFamily};

/// Environment variable prefix for all configuration options
pub const ENV_PREFIX: &str = "SOCKET_TESTER_";

/// Default log level as string
pub const LOG_LEVEL_STR: &str = "info";

/// Default idle timeout in milliseconds
pub const IDLE_TIMEOUT_MS: u64 = 100;

/// Default read chunk size in bytes
pub const READ_CHUNK_SIZE: usize = 256;

/// Default log level
pub fn log_level() -> String {
    LOG_LEVEL_STR.to_string()
}

/// Default message sent to the peer
pub fn message() -> String {
    String::new()
}

/// Default PROXY header source endpoint
pub fn proxy_source() -> Endpoint {
    Endpoint::new("10.0.0.0", 1883)
}

/// Default PROXY header destination endpoint
pub fn proxy_destination() -> Endpoint {
    Endpoint::new("20.0.0.0", 1883)
}

/// Default PROXY command
pub fn proxy_command() -> Command {
    Command::Proxy
}

/// Default PROXY transport family
pub fn proxy_family() -> TransportFamily {
    TransportFamily::Tcp4
}
