//! Wire protocol module
//!
//! This module contains the PROXY protocol v2 header encoder used to
//! announce the original connection endpoints to a downstream listener.

pub mod proxy_v2;

pub use proxy_v2::{encode, Command, ProxyHeader, TransportFamily, PROXY_V2_SIGNATURE};
