//! Test harness for exchange integration tests.
//!
//! Provides local TCP and TLS peers with scripted behaviour: silent, echo,
//! header capture, and stalled handshakes.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::time::Duration;

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::ssl::{Ssl, SslAcceptor, SslMethod};
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509NameBuilder, X509};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_openssl::SslStream;

use socket_tester::{Endpoint, ExchangeConfig};

/// Exchange config for a local peer with test-friendly timeouts
pub fn local_config(addr: SocketAddr, message: &str) -> ExchangeConfig {
    let mut config = ExchangeConfig::new(Endpoint::new("127.0.0.1", addr.port()), message);
    config.idle_timeout = Duration::from_millis(100);
    config.connect_timeout = Duration::from_secs(5);
    config
}

/// Bind an ephemeral local listener
pub async fn bind() -> io::Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    Ok((listener, addr))
}

/// Read until a newline has been received or the peer closes
pub async fn read_line<S>(stream: &mut S) -> io::Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut line = Vec::new();
    let mut buf = [0u8; 256];
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(line);
        }
        line.extend_from_slice(&buf[..n]);
        if line.contains(&b'\n') {
            return Ok(line);
        }
    }
}

/// Keep the connection open until the client goes away
pub async fn hold<S>(stream: &mut S)
where
    S: AsyncRead + Unpin,
{
    let mut buf = [0u8; 64];
    while let Ok(n) = stream.read(&mut buf).await {
        if n == 0 {
            break;
        }
    }
}

/// Peer that accepts one connection and never writes
pub async fn spawn_silent() -> io::Result<SocketAddr> {
    let (listener, addr) = bind().await?;
    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            hold(&mut stream).await;
        }
    });
    Ok(addr)
}

/// Peer that echoes the first line and keeps the connection open
pub async fn spawn_echo_and_hold() -> io::Result<SocketAddr> {
    let (listener, addr) = bind().await?;
    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            echo_and_hold(&mut stream).await;
        }
    });
    Ok(addr)
}

async fn echo_and_hold<S>(stream: &mut S)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if let Ok(line) = read_line(stream).await {
        if stream.write_all(&line).await.is_ok() {
            let _ = stream.flush().await;
            hold(stream).await;
        }
    }
}

/// Peer that captures the first `header_len` bytes and the request line
///
/// Replies with `OK` and closes.
pub async fn spawn_capture(header_len: usize) -> io::Result<(SocketAddr, oneshot::Receiver<(Vec<u8>, Vec<u8>)>)> {
    let (listener, addr) = bind().await?;
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let mut header = vec![0u8; header_len];
            if stream.read_exact(&mut header).await.is_err() {
                return;
            }
            let line = read_line(&mut stream).await.unwrap_or_default();
            let _ = stream.write_all(b"OK").await;
            let _ = tx.send((header, line));
        }
    });
    Ok((addr, rx))
}

/// Peer that accepts TCP and then says nothing, not even a TLS ServerHello
pub async fn spawn_stalled() -> io::Result<SocketAddr> {
    spawn_silent().await
}

/// Self-signed certificate for `localhost` / `127.0.0.1` in an acceptor
pub fn self_signed_acceptor() -> SslAcceptor {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, "localhost").unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(1).unwrap()).unwrap();
    let san = SubjectAlternativeName::new()
        .dns("localhost")
        .ip("127.0.0.1")
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(san).unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    let cert = builder.build();

    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&key).unwrap();
    acceptor.set_certificate(&cert).unwrap();
    acceptor.check_private_key().unwrap();
    acceptor.build()
}

/// TLS peer with a self-signed certificate that echoes the first line
///
/// With `header_len > 0` the peer first consumes that many plaintext bytes
/// and reports them, then negotiates TLS on the same socket.
pub async fn spawn_tls_echo(header_len: usize) -> io::Result<(SocketAddr, oneshot::Receiver<Vec<u8>>)> {
    let acceptor = self_signed_acceptor();
    let (listener, addr) = bind().await?;
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let mut header = vec![0u8; header_len];
            if stream.read_exact(&mut header).await.is_err() {
                return;
            }
            let _ = tx.send(header);

            if let Some(mut tls) = accept_tls(&acceptor, stream).await {
                echo_and_hold(&mut tls).await;
            }
        }
    });

    Ok((addr, rx))
}

async fn accept_tls(acceptor: &SslAcceptor, stream: TcpStream) -> Option<SslStream<TcpStream>> {
    let ssl = Ssl::new(acceptor.context()).ok()?;
    let mut tls = SslStream::new(ssl, stream).ok()?;
    Pin::new(&mut tls).accept().await.ok()?;
    Some(tls)
}
