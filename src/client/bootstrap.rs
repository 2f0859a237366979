//! Connection bootstrap
//!
//! Resolution, TCP connect, PROXY header injection and the TLS handshake run
//! as one future under one deadline. When the deadline fires the future is
//! dropped, and with it any socket it had opened.

use std::net::SocketAddr;
use std::pin::Pin;

use log::{debug, info, warn};
use openssl::ssl::SslConnector;
use openssl::x509::X509VerifyResult;
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tokio_openssl::SslStream;

use crate::common::{Endpoint, Phase, Result, TesterError};
use crate::config::ExchangeConfig;
use crate::tls::{configure_session, create_tls_connector, VerifyPolicy};

use super::connection::Connection;

/// Establish a connection according to `config`
///
/// The header is encoded before any I/O, so a malformed header endpoint is a
/// configuration error and never reaches the wire.
pub async fn bootstrap(config: &ExchangeConfig) -> Result<Connection> {
    let header = if config.proxy_protocol {
        Some(config.proxy_header.encode()?)
    } else {
        None
    };

    let policy = VerifyPolicy::from_skip(config.skip_cert_verification);
    let connector = if config.tls {
        Some(create_tls_connector(policy)?)
    } else {
        None
    };

    let mut phase = Phase::Resolve;
    let outcome = timeout(
        config.connect_timeout,
        dial(config, header.as_deref(), connector.as_ref(), policy, &mut phase),
    )
    .await;

    match outcome {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "Deadline of {:?} exceeded during {} with {}",
                config.connect_timeout, phase, config.target
            );
            Err(TesterError::Timeout {
                target: config.target.clone(),
                phase,
                elapsed: config.connect_timeout,
            })
        }
    }
}

async fn dial(
    config: &ExchangeConfig,
    header: Option<&[u8]>,
    connector: Option<&SslConnector>,
    policy: VerifyPolicy,
    phase: &mut Phase,
) -> Result<Connection> {
    let target = &config.target;

    *phase = Phase::Resolve;
    let addrs = resolve(target).await?;

    *phase = Phase::Connect;
    let mut stream = connect(target, &addrs).await?;
    let peer_addr = stream.peer_addr().ok();
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY: {}", e);
    }
    info!("Connected to {} ({})", target, display_addr(peer_addr));

    if let Some(header) = header {
        *phase = Phase::ProxyHeader;
        write_header(&mut stream, header)
            .await
            .map_err(|source| TesterError::HeaderWrite {
                target: target.clone(),
                source,
            })?;
        debug!("Wrote {} byte PROXY v2 header", header.len());
    }

    match connector {
        Some(connector) => {
            *phase = Phase::TlsHandshake;
            let tls = handshake(config, connector, policy, stream).await?;
            Ok(Connection::new(tls, target.clone(), peer_addr, header.is_some(), true))
        }
        None => Ok(Connection::new(stream, target.clone(), peer_addr, header.is_some(), false)),
    }
}

/// Resolve the target to socket addresses
async fn resolve(target: &Endpoint) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = lookup_host((target.host(), target.port()))
        .await
        .map_err(|e| TesterError::Resolution {
            target: target.clone(),
            reason: e.to_string(),
        })?
        .collect();

    if addrs.is_empty() {
        return Err(TesterError::Resolution {
            target: target.clone(),
            reason: "no addresses returned".to_string(),
        });
    }

    debug!("Resolved {} to {:?}", target, addrs);
    Ok(addrs)
}

/// Connect to the first address that accepts
async fn connect(target: &Endpoint, addrs: &[SocketAddr]) -> Result<TcpStream> {
    let mut last_err = None;

    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!("Connect to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    Err(TesterError::Connect {
        target: target.clone(),
        source: last_err.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "no address to connect to")
        }),
    })
}

/// Write the header in full; a partial header cannot be repaired
async fn write_header(stream: &mut TcpStream, header: &[u8]) -> std::io::Result<()> {
    stream.write_all(header).await?;
    stream.flush().await
}

/// Run the TLS client handshake over `stream`
async fn handshake(
    config: &ExchangeConfig,
    connector: &SslConnector,
    policy: VerifyPolicy,
    stream: TcpStream,
) -> Result<SslStream<TcpStream>> {
    let server_name = config.server_name();
    let ssl = configure_session(connector, policy)?.into_ssl(server_name)?;
    let mut tls = SslStream::new(ssl, stream)?;

    if let Err(e) = Pin::new(&mut tls).connect().await {
        let verify = tls.ssl().verify_result();
        let reason = if verify == X509VerifyResult::OK {
            e.to_string()
        } else {
            format!("{} (certificate verify result: {})", e, verify.error_string())
        };
        return Err(TesterError::TlsHandshake {
            target: config.target.clone(),
            server_name: server_name.to_string(),
            reason,
        });
    }

    info!(
        "TLS handshake with {} complete: {} {}",
        server_name,
        tls.ssl().version_str(),
        tls.ssl().current_cipher().map(|c| c.name()).unwrap_or("unknown cipher")
    );

    Ok(tls)
}

fn display_addr(addr: Option<SocketAddr>) -> String {
    addr.map(|a| a.to_string())
        .unwrap_or_else(|| "unknown peer".to_string())
}
