//! Established connection handle
//!
//! A `Connection` owns exactly one transport, plain TCP or TLS over TCP.
//! Dropping it closes the socket; `close` additionally attempts a graceful
//! shutdown (TLS close_notify, TCP FIN).

use std::fmt;
use std::io;
use std::net::SocketAddr;

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::common::Endpoint;

/// Byte stream usable as a connection transport
pub trait ByteStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> ByteStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// An established, ready-to-use connection
pub struct Connection {
    stream: Box<dyn ByteStream>,
    target: Endpoint,
    peer_addr: Option<SocketAddr>,
    proxy_protocol: bool,
    tls: bool,
}

impl Connection {
    /// Wrap an established stream
    ///
    /// # Parameters
    ///
    /// * `stream` - Transport, already past any header write and handshake
    /// * `target` - Endpoint the stream was dialled for
    /// * `peer_addr` - Resolved peer address, if known
    /// * `proxy_protocol` - Whether a PROXY header was written
    /// * `tls` - Whether the stream is TLS-wrapped
    pub fn new<S>(
        stream: S,
        target: Endpoint,
        peer_addr: Option<SocketAddr>,
        proxy_protocol: bool,
        tls: bool,
    ) -> Self
    where
        S: ByteStream + 'static,
    {
        Self {
            stream: Box::new(stream),
            target,
            peer_addr,
            proxy_protocol,
            tls,
        }
    }

    /// Endpoint this connection was dialled for
    pub fn target(&self) -> &Endpoint {
        &self.target
    }

    /// Resolved peer address
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Whether a PROXY protocol header preceded the application data
    pub fn proxy_protocol(&self) -> bool {
        self.proxy_protocol
    }

    /// Whether the connection is TLS-wrapped
    pub fn is_tls(&self) -> bool {
        self.tls
    }

    /// Write the whole buffer and flush it
    pub async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.stream.write_all(buf).await?;
        self.stream.flush().await
    }

    /// Read whatever is available into `buf`
    ///
    /// Returns 0 on end of stream.
    pub async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf).await
    }

    /// Shut the connection down and release it
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!("Shutdown of connection to {} failed: {}", self.target, e);
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("target", &self.target)
            .field("peer_addr", &self.peer_addr)
            .field("proxy_protocol", &self.proxy_protocol)
            .field("tls", &self.tls)
            .field("stream", &"<stream>")
            .finish()
    }
}
