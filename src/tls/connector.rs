//! TLS client connector creation

use log::{debug, warn};
use openssl::ssl::{ConnectConfiguration, SslConnector, SslMethod, SslVerifyMode};

use crate::common::Result;

/// Certificate verification policy for the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyPolicy {
    /// Validate the chain against the system trust store and check the hostname
    Verify,
    /// Accept any certificate (self-signed diagnostics only)
    SkipVerification,
}

impl VerifyPolicy {
    /// Map the `skip_cert_verification` toggle onto a policy
    pub fn from_skip(skip: bool) -> Self {
        if skip {
            Self::SkipVerification
        } else {
            Self::Verify
        }
    }
}

/// Create a TLS connector for the given verification policy
///
/// # Example
///
/// ```no_run
/// # use socket_tester::tls::{create_tls_connector, VerifyPolicy};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let connector = create_tls_connector(VerifyPolicy::Verify)?;
/// # Ok(())
/// # }
/// ```
pub fn create_tls_connector(policy: VerifyPolicy) -> Result<SslConnector> {
    let mut builder = SslConnector::builder(SslMethod::tls_client())?;

    match policy {
        VerifyPolicy::Verify => {
            debug!("Peer certificates will be verified");
            builder.set_verify(SslVerifyMode::PEER);
        }
        VerifyPolicy::SkipVerification => {
            warn!("Peer certificate verification disabled");
            builder.set_verify(SslVerifyMode::NONE);
        }
    }

    Ok(builder.build())
}

/// Per-connection configuration
///
/// Hostname checks follow the policy. OpenSSL leaves SNI out for IP literals
/// and verifies them against the certificate's IP SANs instead.
pub fn configure_session(
    connector: &SslConnector,
    policy: VerifyPolicy,
) -> Result<ConnectConfiguration> {
    let mut config = connector.configure()?;

    if policy == VerifyPolicy::SkipVerification {
        config.set_verify_hostname(false);
    }

    Ok(config)
}
