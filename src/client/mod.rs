//! Client module
//!
//! This module implements the diagnostic exchange: establishing the
//! connection (with optional PROXY header and TLS) and running one
//! request/response round over it.

mod bootstrap;
mod connection;
mod exchange;

pub use bootstrap::bootstrap;
pub use connection::{ByteStream, Connection};
pub use exchange::{exchange, read_chunk, ExchangeOptions, ReadOutcome};
