//! Network utility functions
//!
//! This module provides the `Endpoint` type shared by the dialer, the
//! PROXY header encoder and the configuration layer.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::{Result, TesterError};

/// A host and port pair
///
/// The host is kept as written (name or IP literal). Resolution happens at
/// dial time; the PROXY header encoder requires an IP literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Create an endpoint from parts
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let host = match unbracket(&host) {
            Some(inner) => inner.to_string(),
            None => host,
        };
        Self { host, port }
    }

    /// Create an endpoint from a host and an untyped port number
    ///
    /// Ports outside 0-65535 are rejected with a configuration error.
    pub fn from_parts(host: &str, port: i64) -> Result<Self> {
        let host = host.trim();
        let host = unbracket(host).unwrap_or(host).trim();
        if host.is_empty() {
            return Err(TesterError::Config("Host must not be empty".to_string()));
        }
        let port = u16::try_from(port).map_err(|_| {
            TesterError::Config(format!("Port {} is out of range 0-65535", port))
        })?;
        Ok(Self::new(host, port))
    }

    /// Host name or IP literal
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port number
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Parse the host as an IP literal
    pub fn ip(&self) -> Result<IpAddr> {
        self.host.parse::<IpAddr>().map_err(|_| {
            TesterError::Config(format!("'{}' is not an IP address literal", self.host))
        })
    }

    /// Whether the host is an IP literal rather than a name
    pub fn is_ip_literal(&self) -> bool {
        self.host.parse::<IpAddr>().is_ok()
    }
}

/// Inner part of a `[...]` IPv6 literal; IPv6 is kept unbracketed internally
fn unbracket(host: &str) -> Option<&str> {
    host.strip_prefix('[').and_then(|h| h.strip_suffix(']'))
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = TesterError;

    /// Parse `host:port` or `[v6]:port`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| TesterError::Config(format!("Missing port in address: {}", s)))?;

        if host.contains(':') && !(host.starts_with('[') && host.ends_with(']')) {
            return Err(TesterError::Config(format!(
                "IPv6 addresses must be bracketed: {}",
                s
            )));
        }

        let port: i64 = port
            .parse()
            .map_err(|_| TesterError::Config(format!("Invalid port in address: {}", s)))?;

        Self::from_parts(host, port)
    }
}

impl Serialize for Endpoint {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Endpoint::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint() {
        let ep: Endpoint = "127.0.0.1:8080".parse().unwrap();
        assert_eq!(ep.host(), "127.0.0.1");
        assert_eq!(ep.port(), 8080);
        assert!(ep.is_ip_literal());

        let ep: Endpoint = "broker.example.com:1883".parse().unwrap();
        assert_eq!(ep.host(), "broker.example.com");
        assert!(!ep.is_ip_literal());
        assert!(ep.ip().is_err());
    }

    #[test]
    fn test_parse_ipv6_endpoint() {
        let ep: Endpoint = "[2001:db8::1]:443".parse().unwrap();
        assert_eq!(ep.host(), "2001:db8::1");
        assert_eq!(ep.to_string(), "[2001:db8::1]:443");
        assert!(ep.ip().unwrap().is_ipv6());

        assert!("2001:db8::1:443".parse::<Endpoint>().is_err());
    }

    #[test]
    fn test_invalid_endpoints() {
        assert!("invalid-address".parse::<Endpoint>().is_err());
        assert!("host:70000".parse::<Endpoint>().is_err());
        assert!("host:-1".parse::<Endpoint>().is_err());
        assert!(":80".parse::<Endpoint>().is_err());
    }

    #[test]
    fn test_empty_bracketed_host_rejected() {
        assert!("[]:80".parse::<Endpoint>().is_err());
        assert!(Endpoint::from_parts("[ ]", 80).is_err());
        assert_eq!(
            Endpoint::from_parts("[::1]", 80).unwrap(),
            Endpoint::new("::1", 80)
        );
    }

    #[test]
    fn test_from_parts_range() {
        assert!(Endpoint::from_parts("localhost", 0).is_ok());
        assert!(Endpoint::from_parts("localhost", 65535).is_ok());
        assert!(matches!(
            Endpoint::from_parts("localhost", 65536),
            Err(TesterError::Config(_))
        ));
    }

    #[test]
    fn test_serde_as_string() {
        let ep: Endpoint = serde_json::from_str("\"10.0.0.0:1883\"").unwrap();
        assert_eq!(ep, Endpoint::new("10.0.0.0", 1883));
        assert_eq!(serde_json::to_string(&ep).unwrap(), "\"10.0.0.0:1883\"");
    }
}
