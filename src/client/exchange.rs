//! Request/response exchange
//!
//! Sends one newline-terminated command and drains the reply. Each read has
//! its own idle deadline, so the loop ends on inactivity rather than on total
//! elapsed time. An idle timeout is the normal end of a response.

use std::io;
use std::time::Duration;

use bytes::BytesMut;
use log::{debug, trace, warn};
use tokio::time::timeout;

use crate::common::{Result, TesterError};
use crate::config::defaults;

use super::connection::Connection;

/// Read-loop settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeOptions {
    /// Deadline for each individual read
    pub idle_timeout: Duration,
    /// Size of the chunk buffer handed to each read
    pub read_chunk_size: usize,
    /// Stop once this many bytes have been received
    pub max_response_bytes: Option<usize>,
    /// Fail on a read error instead of returning what was received
    pub abort_on_read_error: bool,
}

impl Default for ExchangeOptions {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_millis(defaults::IDLE_TIMEOUT_MS),
            read_chunk_size: defaults::READ_CHUNK_SIZE,
            max_response_bytes: None,
            abort_on_read_error: false,
        }
    }
}

/// Result of a single bounded read
#[derive(Debug)]
pub enum ReadOutcome {
    /// Bytes were received
    Data(usize),
    /// The peer closed its side
    Eof,
    /// Nothing arrived within the idle timeout
    IdleTimeout,
    /// Transport error
    Failed(io::Error),
}

/// Read once into `buf`, bounded by `idle_timeout`
pub async fn read_chunk(conn: &mut Connection, buf: &mut [u8], idle_timeout: Duration) -> ReadOutcome {
    match timeout(idle_timeout, conn.read(buf)).await {
        Err(_) => ReadOutcome::IdleTimeout,
        Ok(Ok(0)) => ReadOutcome::Eof,
        Ok(Ok(n)) => ReadOutcome::Data(n),
        // A socket-level timeout is a transport failure, not silence
        Ok(Err(e)) => ReadOutcome::Failed(e),
    }
}

/// Send `payload` followed by a newline and collect the response
///
/// The connection stays open; closing it is up to the caller.
///
/// # Errors
///
/// * `TesterError::Write` if the payload could not be sent
/// * `TesterError::Read` on a read error when `abort_on_read_error` is set
/// * `TesterError::EmptyResponse` if nothing was received
pub async fn exchange(conn: &mut Connection, payload: &str, options: &ExchangeOptions) -> Result<String> {
    let mut request = String::with_capacity(payload.len() + 1);
    request.push_str(payload);
    request.push('\n');

    conn.write_all(request.as_bytes())
        .await
        .map_err(|source| TesterError::Write {
            target: conn.target().clone(),
            source,
        })?;
    debug!("Sent {} bytes to {}", request.len(), conn.target());

    let mut response = BytesMut::with_capacity(options.read_chunk_size);
    let mut chunk = vec![0u8; options.read_chunk_size.max(1)];

    loop {
        let want = match options.max_response_bytes {
            Some(max) => chunk.len().min(max.saturating_sub(response.len())),
            None => chunk.len(),
        };

        match read_chunk(conn, &mut chunk[..want], options.idle_timeout).await {
            ReadOutcome::Data(n) => {
                trace!("Received {} bytes", n);
                response.extend_from_slice(&chunk[..n]);

                if options.max_response_bytes.is_some_and(|max| response.len() >= max) {
                    debug!("Response cap of {} bytes reached", response.len());
                    break;
                }
            }
            ReadOutcome::Eof => {
                debug!("Peer closed the connection");
                break;
            }
            ReadOutcome::IdleTimeout => {
                debug!("No data for {:?}, response complete", options.idle_timeout);
                break;
            }
            ReadOutcome::Failed(source) => {
                if options.abort_on_read_error {
                    return Err(TesterError::Read {
                        target: conn.target().clone(),
                        source,
                    });
                }
                warn!("Read error from {}: {}", conn.target(), source);
                break;
            }
        }
    }

    if response.is_empty() {
        return Err(TesterError::EmptyResponse {
            payload: payload.to_string(),
            target: conn.target().clone(),
            proxy_protocol: conn.proxy_protocol(),
            tls: conn.is_tls(),
        });
    }

    debug!("Received {} bytes in total", response.len());
    Ok(String::from_utf8_lossy(&response).into_owned())
}
