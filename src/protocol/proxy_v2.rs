//! PROXY Protocol v2 header generation.
//!
//! This module generates the binary PROXY protocol v2 preamble that is
//! written to the wire before any application data.
//!
//! Wire format (HAProxy PROXY protocol, version 2):
//! - 12 bytes signature
//! - 1 byte version and command
//! - 1 byte address family and transport protocol
//! - 2 bytes address length (big-endian)
//! - variable: addresses and ports
//!
//! Reference: https://www.haproxy.org/download/2.8/doc/proxy-protocol.txt

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::{Endpoint, Result, TesterError};

/// PROXY protocol v2 signature (12 bytes).
pub const PROXY_V2_SIGNATURE: [u8; 12] = [
    0x0D, 0x0A, 0x0D, 0x0A, 0x00, 0x0D, 0x0A, 0x51, 0x55, 0x49, 0x54, 0x0A,
];

/// Fixed part of the header: signature, version/command, family, length.
pub const PROXY_V2_FIXED_LEN: usize = 16;

/// Protocol version, stored in the high nibble of byte 13.
const VERSION: u8 = 0x20;

/// Length of IPv4 address block (4 + 4 + 2 + 2 = 12 bytes).
const IPV4_ADDR_LEN: u16 = 12;

/// Length of IPv6 address block (16 + 16 + 2 + 2 = 36 bytes).
const IPV6_ADDR_LEN: u16 = 36;

/// PROXY command (low nibble of byte 13)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    /// Connection established by the proxy itself (health checks)
    Local,
    /// Connection relayed on behalf of another node
    #[default]
    Proxy,
}

impl Command {
    fn nibble(self) -> u8 {
        match self {
            Self::Local => 0x0,
            Self::Proxy => 0x1,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Proxy => write!(f, "proxy"),
        }
    }
}

impl FromStr for Command {
    type Err = TesterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "proxy" => Ok(Self::Proxy),
            _ => Err(TesterError::Config(format!(
                "Invalid PROXY command: {}. Valid values are: local, proxy",
                s
            ))),
        }
    }
}

/// Address family and transport protocol (byte 14)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportFamily {
    /// Unknown or unspecified, empty address block
    Unspec,
    /// TCP over IPv4
    #[default]
    Tcp4,
    /// UDP over IPv4
    Udp4,
    /// TCP over IPv6
    Tcp6,
    /// UDP over IPv6
    Udp6,
}

impl TransportFamily {
    /// Byte 14: address family in the high nibble, transport in the low nibble
    pub fn byte(self) -> u8 {
        match self {
            Self::Unspec => 0x00,
            Self::Tcp4 => 0x11,
            Self::Udp4 => 0x12,
            Self::Tcp6 => 0x21,
            Self::Udp6 => 0x22,
        }
    }

    /// Length of the address block that follows the fixed header
    pub fn address_len(self) -> u16 {
        match self {
            Self::Unspec => 0,
            Self::Tcp4 | Self::Udp4 => IPV4_ADDR_LEN,
            Self::Tcp6 | Self::Udp6 => IPV6_ADDR_LEN,
        }
    }
}

impl fmt::Display for TransportFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspec => write!(f, "unspec"),
            Self::Tcp4 => write!(f, "tcp4"),
            Self::Udp4 => write!(f, "udp4"),
            Self::Tcp6 => write!(f, "tcp6"),
            Self::Udp6 => write!(f, "udp6"),
        }
    }
}

impl FromStr for TransportFamily {
    type Err = TesterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "unspec" => Ok(Self::Unspec),
            "tcp4" | "tcpv4" => Ok(Self::Tcp4),
            "udp4" | "udpv4" => Ok(Self::Udp4),
            "tcp6" | "tcpv6" => Ok(Self::Tcp6),
            "udp6" | "udpv6" => Ok(Self::Udp6),
            _ => Err(TesterError::Config(format!(
                "Invalid PROXY transport family: {}. Valid values are: unspec, tcp4, udp4, tcp6, udp6",
                s
            ))),
        }
    }
}

/// PROXY protocol v2 header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyHeader {
    /// LOCAL or PROXY
    pub command: Command,
    /// Address family and transport
    pub family: TransportFamily,
    /// Original source endpoint
    pub source: Endpoint,
    /// Original destination endpoint
    pub destination: Endpoint,
}

impl Default for ProxyHeader {
    fn default() -> Self {
        Self {
            command: Command::Proxy,
            family: TransportFamily::Tcp4,
            source: Endpoint::new("10.0.0.0", 1883),
            destination: Endpoint::new("20.0.0.0", 1883),
        }
    }
}

impl ProxyHeader {
    /// Create a new header
    pub fn new(
        command: Command,
        family: TransportFamily,
        source: Endpoint,
        destination: Endpoint,
    ) -> Self {
        Self {
            command,
            family,
            source,
            destination,
        }
    }

    /// Generate the header bytes.
    ///
    /// The result must be written to the connection before any application data.
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode(self.command, self.family, &self.source, &self.destination)
    }

    /// Total encoded size of this header
    pub fn encoded_len(&self) -> usize {
        PROXY_V2_FIXED_LEN + self.family.address_len() as usize
    }
}

/// Encode a PROXY v2 header for the given endpoints.
///
/// Fails only when an endpoint host is not an IP literal of a usable family.
pub fn encode(
    command: Command,
    family: TransportFamily,
    source: &Endpoint,
    destination: &Endpoint,
) -> Result<Vec<u8>> {
    let addr_len = family.address_len();
    let mut buf = Vec::with_capacity(PROXY_V2_FIXED_LEN + addr_len as usize);

    buf.extend_from_slice(&PROXY_V2_SIGNATURE);
    buf.push(VERSION | command.nibble());
    buf.push(family.byte());
    buf.extend_from_slice(&addr_len.to_be_bytes());

    match family {
        TransportFamily::Unspec => {}
        TransportFamily::Tcp4 | TransportFamily::Udp4 => {
            buf.extend_from_slice(&as_v4(source)?.octets());
            buf.extend_from_slice(&as_v4(destination)?.octets());
            buf.extend_from_slice(&source.port().to_be_bytes());
            buf.extend_from_slice(&destination.port().to_be_bytes());
        }
        TransportFamily::Tcp6 | TransportFamily::Udp6 => {
            buf.extend_from_slice(&as_v6(source)?.octets());
            buf.extend_from_slice(&as_v6(destination)?.octets());
            buf.extend_from_slice(&source.port().to_be_bytes());
            buf.extend_from_slice(&destination.port().to_be_bytes());
        }
    }

    debug_assert_eq!(buf.len(), PROXY_V2_FIXED_LEN + addr_len as usize);
    Ok(buf)
}

fn as_v4(endpoint: &Endpoint) -> Result<Ipv4Addr> {
    match endpoint.ip()? {
        IpAddr::V4(ip) => Ok(ip),
        IpAddr::V6(ip) => ip.to_ipv4_mapped().ok_or_else(|| {
            TesterError::Config(format!(
                "{} is an IPv6 address and cannot be used with an IPv4 PROXY header",
                endpoint
            ))
        }),
    }
}

fn as_v6(endpoint: &Endpoint) -> Result<Ipv6Addr> {
    match endpoint.ip()? {
        IpAddr::V4(ip) => Ok(ip.to_ipv6_mapped()),
        IpAddr::V6(ip) => Ok(ip),
    }
}
