//! TLS handling module
//!
//! This module builds the OpenSSL client side used to wrap outbound connections.

mod connector;

pub use connector::{configure_session, create_tls_connector, VerifyPolicy};
