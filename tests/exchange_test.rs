//! End-to-end exchange tests against local peers

mod common;

use std::time::{Duration, Instant};

use common::{local_config, spawn_capture, spawn_echo_and_hold, spawn_silent, spawn_stalled, spawn_tls_echo};
use socket_tester::common::Phase;
use socket_tester::protocol::PROXY_V2_SIGNATURE;
use socket_tester::{
    bootstrap, exchange, run_exchange, Connection, Endpoint, ExchangeConfig, ExchangeOptions, ProxyHeader, TesterError,
};

#[tokio::test]
async fn test_silent_peer_reports_empty_response() {
    let addr = spawn_silent().await.unwrap();
    let config = local_config(addr, "PING");

    let start = Instant::now();
    let err = run_exchange(&config).await.unwrap_err();

    assert!(
        matches!(err, TesterError::EmptyResponse { ref payload, proxy_protocol: false, tls: false, .. } if payload == "PING"),
        "unexpected error: {}",
        err
    );
    assert!(err.to_string().contains("returned zero length message"));
    let elapsed = start.elapsed();
    assert!(elapsed >= config.idle_timeout, "returned before the idle timeout: {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(500), "idle timeout should end the read quickly: {:?}", elapsed);
}

#[tokio::test]
async fn test_response_collected_until_idle() {
    let addr = spawn_echo_and_hold().await.unwrap();
    let config = local_config(addr, "hello");

    let response = run_exchange(&config).await.unwrap();

    assert_eq!(response, "hello\n");
}

#[tokio::test]
async fn test_proxy_header_precedes_payload() {
    let expected = ProxyHeader::default().encode().unwrap();
    let (addr, captured) = spawn_capture(expected.len()).await.unwrap();
    let mut config = local_config(addr, "PING");
    config.proxy_protocol = true;

    let response = run_exchange(&config).await.unwrap();
    let (header, line) = captured.await.unwrap();

    assert_eq!(response, "OK");
    assert_eq!(header.len(), 28);
    assert_eq!(&header[..12], &PROXY_V2_SIGNATURE);
    assert_eq!(header, expected);
    assert_eq!(line, b"PING\n");
}

#[tokio::test]
async fn test_custom_proxy_endpoints_reach_the_wire() {
    let mut config_header = ProxyHeader::default();
    config_header.source = Endpoint::new("192.168.1.10", 40000);
    config_header.destination = Endpoint::new("192.168.1.20", 8883);
    let expected = config_header.encode().unwrap();

    let (addr, captured) = spawn_capture(expected.len()).await.unwrap();
    let mut config = local_config(addr, "PING");
    config.proxy_protocol = true;
    config.proxy_header = config_header;

    run_exchange(&config).await.unwrap();
    let (header, _) = captured.await.unwrap();

    assert_eq!(&header[16..20], &[192, 168, 1, 10]);
    assert_eq!(&header[24..26], &40000u16.to_be_bytes());
    assert_eq!(header, expected);
}

#[tokio::test]
async fn test_unencodable_header_fails_before_connecting() {
    let addr = spawn_silent().await.unwrap();
    let mut config = local_config(addr, "PING");
    config.proxy_protocol = true;
    config.proxy_header.source = Endpoint::new("not-an-ip", 1883);

    let err = bootstrap(&config).await.unwrap_err();

    assert!(matches!(err, TesterError::Config(_)), "unexpected error: {}", err);
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_unresolvable_host() {
    let mut config = ExchangeConfig::new(Endpoint::new("does-not-exist.invalid", 1883), "PING");
    config.connect_timeout = Duration::from_secs(10);

    let err = run_exchange(&config).await.unwrap_err();

    assert!(matches!(err, TesterError::Resolution { .. }), "unexpected error: {}", err);
    assert_eq!(err.exit_code(), 3);
}

#[tokio::test]
async fn test_refused_connection() {
    let (listener, addr) = common::bind().await.unwrap();
    drop(listener);
    let config = local_config(addr, "PING");

    let err = run_exchange(&config).await.unwrap_err();

    assert!(matches!(err, TesterError::Connect { .. }), "unexpected error: {}", err);
    assert_eq!(err.exit_code(), 4);
}

#[tokio::test]
async fn test_tls_untrusted_certificate_rejected() {
    let (addr, _) = spawn_tls_echo(0).await.unwrap();
    let mut config = local_config(addr, "PING");
    config.tls = true;

    let err = run_exchange(&config).await.unwrap_err();

    assert!(matches!(err, TesterError::TlsHandshake { .. }), "unexpected error: {}", err);
    assert_eq!(err.exit_code(), 6);
}

#[tokio::test]
async fn test_tls_skip_verification_exchanges() {
    let (addr, _) = spawn_tls_echo(0).await.unwrap();
    let mut config = local_config(addr, "PING");
    config.tls = true;
    config.skip_cert_verification = true;

    let response = run_exchange(&config).await.unwrap();

    assert_eq!(response, "PING\n");
}

#[tokio::test]
async fn test_proxy_header_sent_in_clear_before_tls() {
    let expected = ProxyHeader::default().encode().unwrap();
    let (addr, captured) = spawn_tls_echo(expected.len()).await.unwrap();
    let mut config = local_config(addr, "PING");
    config.proxy_protocol = true;
    config.tls = true;
    config.skip_cert_verification = true;

    let mut conn = bootstrap(&config).await.unwrap();
    assert!(conn.is_tls());
    assert!(conn.proxy_protocol());

    let response = exchange(&mut conn, "PING", &config.exchange_options()).await.unwrap();
    conn.close().await;

    assert_eq!(captured.await.unwrap(), expected);
    assert_eq!(response, "PING\n");
}

#[tokio::test]
async fn test_stalled_handshake_times_out() {
    let addr = spawn_stalled().await.unwrap();
    let mut config = local_config(addr, "PING");
    config.tls = true;
    config.connect_timeout = Duration::from_millis(200);

    let start = Instant::now();
    let err = bootstrap(&config).await.unwrap_err();

    assert!(
        matches!(err, TesterError::Timeout { phase: Phase::TlsHandshake, .. }),
        "unexpected error: {}",
        err
    );
    assert_eq!(err.exit_code(), 7);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_connection_reports_target_and_peer() {
    let addr = spawn_echo_and_hold().await.unwrap();
    let config = local_config(addr, "hi");

    let conn = bootstrap(&config).await.unwrap();

    assert_eq!(conn.target(), &config.target);
    assert_eq!(conn.peer_addr(), Some(addr));
    assert!(!conn.is_tls());
    conn.close().await;
}

#[tokio::test]
async fn test_write_to_closed_peer_is_write_error() {
    let (client, server) = tokio::io::duplex(64);
    drop(server);
    let target = Endpoint::new("127.0.0.1", 1883);
    let mut conn = Connection::new(client, target.clone(), None, false, false);

    let err = exchange(&mut conn, "PING", &ExchangeOptions::default()).await.unwrap_err();

    assert!(
        matches!(err, TesterError::Write { target: ref t, .. } if *t == target),
        "unexpected error: {}",
        err
    );
    assert_eq!(err.exit_code(), 8);
}
