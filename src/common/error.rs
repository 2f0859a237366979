//! Error handling module
//!
//! This module defines the error types and result type aliases used in the application.
//! Every connection-level variant carries the target and the phase it failed in,
//! so the binary can print a precise diagnostic without extra context.

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

use super::net::Endpoint;

/// Phase of connection bootstrap that was in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Resolving the target host name
    Resolve,
    /// Opening the TCP connection
    Connect,
    /// Writing the PROXY protocol header
    ProxyHeader,
    /// Negotiating TLS
    TlsHandshake,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve => write!(f, "name resolution"),
            Self::Connect => write!(f, "TCP connect"),
            Self::ProxyHeader => write!(f, "PROXY header write"),
            Self::TlsHandshake => write!(f, "TLS handshake"),
        }
    }
}

/// Socket tester error type
#[derive(Error, Debug)]
pub enum TesterError {
    /// IO error outside of a classified phase
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// OpenSSL setup error
    #[error("OpenSSL error: {0}")]
    Ssl(#[from] openssl::error::ErrorStack),

    /// Malformed endpoint, header or configuration input
    #[error("Configuration error: {0}")]
    Config(String),

    /// Target host could not be resolved
    #[error("Failed to resolve {target}: {reason}")]
    Resolution {
        /// Dial target
        target: Endpoint,
        /// Resolver message
        reason: String,
    },

    /// TCP connection could not be established
    #[error("Failed to connect to {target}: {source}")]
    Connect {
        /// Dial target
        target: Endpoint,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// PROXY protocol header could not be written
    #[error("Failed to write PROXY protocol header to {target}: {source}")]
    HeaderWrite {
        /// Dial target
        target: Endpoint,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// TLS handshake error
    #[error("TLS handshake with {target} (server name {server_name}) failed: {reason}")]
    TlsHandshake {
        /// Dial target
        target: Endpoint,
        /// Server name used for SNI and verification
        server_name: String,
        /// OpenSSL error and verify result
        reason: String,
    },

    /// Connection bootstrap exceeded its deadline
    #[error("Timed out after {elapsed:?} during {phase} with {target}")]
    Timeout {
        /// Dial target
        target: Endpoint,
        /// Phase that was in flight when the deadline fired
        phase: Phase,
        /// Configured deadline
        elapsed: Duration,
    },

    /// Payload could not be written
    #[error("Failed to send message to {target}: {source}")]
    Write {
        /// Dial target
        target: Endpoint,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// Response read failed (only raised when reads are strict)
    #[error("Failed to read response from {target}: {source}")]
    Read {
        /// Dial target
        target: Endpoint,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// Connection was fine but the peer sent nothing
    #[error(
        "message: {payload} to host {} on port {} returned zero length message, \
         proxy protocol was set to {proxy_protocol}, tls was set to {tls}",
        .target.host(),
        .target.port()
    )]
    EmptyResponse {
        /// Payload that was sent
        payload: String,
        /// Dial target
        target: Endpoint,
        /// Whether a PROXY header preceded the payload
        proxy_protocol: bool,
        /// Whether the connection was TLS-wrapped
        tls: bool,
    },
}

impl TesterError {
    /// Process exit code for this error class
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) | Self::Ssl(_) => 1,
            Self::Config(_) => 2,
            Self::Resolution { .. } => 3,
            Self::Connect { .. } => 4,
            Self::HeaderWrite { .. } => 5,
            Self::TlsHandshake { .. } => 6,
            Self::Timeout { .. } => 7,
            Self::Write { .. } => 8,
            Self::Read { .. } => 9,
            Self::EmptyResponse { .. } => 10,
        }
    }
}

/// Result type alias
///
/// This is a `Result` type alias that uses our custom `TesterError`.
pub type Result<T> = std::result::Result<T, TesterError>;
