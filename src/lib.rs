//! Socket Tester: diagnostic TCP/TLS client with PROXY protocol v2 support
//!
//! This library opens one connection to a target (plain TCP or TLS), can
//! prepend a PROXY protocol v2 header announcing arbitrary source and
//! destination endpoints, sends a single newline-terminated command and
//! collects the reply until the peer goes quiet or closes the connection.
//!
//! # Main Features
//!
//! - Byte-exact PROXY protocol v2 header generation (IPv4, IPv6, UNSPEC)
//! - One deadline covering resolution, connect, header write and TLS handshake
//! - Idle-timeout based response collection
//! - Classified errors for every phase of the exchange
//!
//! # Example
//!
//! ```no_run
//! use socket_tester::{run_exchange, Endpoint, ExchangeConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut config = ExchangeConfig::new(Endpoint::new("broker.local", 1883), "PING");
//!     config.proxy_protocol = true;
//!
//!     let response = run_exchange(&config).await?;
//!     print!("{}", response);
//!     Ok(())
//! }
//! ```

// Public modules
pub mod client;
pub mod common;
pub mod config;
pub mod protocol;
pub mod tls;

// Re-export commonly used structures and functions for convenience
pub use client::{bootstrap, exchange, Connection, ExchangeOptions};
pub use common::{Endpoint, Result, TesterError};
pub use config::ExchangeConfig;
pub use protocol::ProxyHeader;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// Run one complete exchange
///
/// Establishes the connection described by `config`, sends `config.message`
/// and returns the collected response. The connection is closed before this
/// function returns, on success and on failure.
///
/// # Errors
///
/// Returns the classified `TesterError` of the phase that failed.
pub async fn run_exchange(config: &ExchangeConfig) -> Result<String> {
    use log::debug;

    let mut conn = bootstrap(config).await?;
    debug!("Connection ready: {:?}", conn);

    let result = exchange(&mut conn, &config.message, &config.exchange_options()).await;
    conn.close().await;

    result
}
