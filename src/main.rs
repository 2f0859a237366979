//! Socket Tester Command Line Tool
//!
//! This binary is the command-line interface for Socket Tester.

use std::env;
use std::io::Write;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::{debug, error, info, warn};

use socket_tester::common::{init_logger, set_log_level, Endpoint, Result};
use socket_tester::config::{defaults, ConfigBuilder, ConfigValidator, ConfigValues, ENV_PREFIX};
use socket_tester::protocol::{Command, TransportFamily};
use socket_tester::{run_exchange, APP_NAME, VERSION};

/// Socket Tester: send one command over TCP/TLS, optionally behind a PROXY v2 header
#[derive(Parser, Debug)]
#[clap(author, version = VERSION, about, long_about = None)]
struct Args {
    /// Host to connect to
    #[clap(long)]
    host: Option<String>,

    /// Port to connect to
    #[clap(long, allow_negative_numbers = true)]
    port: Option<i64>,

    /// Command to be sent to the server (a newline is appended)
    #[clap(long)]
    message: Option<String>,

    /// Prepend a PROXY protocol v2 header (`=false` turns it off)
    #[clap(
        long,
        alias = "proxyProtocol",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    proxy_protocol: Option<bool>,

    /// Source address announced in the PROXY header (default 10.0.0.0:1883)
    #[clap(long, value_name = "ADDR")]
    proxy_source: Option<Endpoint>,

    /// Destination address announced in the PROXY header (default 20.0.0.0:1883)
    #[clap(long, value_name = "ADDR")]
    proxy_destination: Option<Endpoint>,

    /// PROXY header command (local, proxy)
    #[clap(long)]
    proxy_command: Option<Command>,

    /// PROXY header transport family (unspec, tcp4, udp4, tcp6, udp6)
    #[clap(long)]
    proxy_family: Option<TransportFamily>,

    /// Wrap the connection in TLS (`=false` turns it off)
    #[clap(
        long,
        alias = "sslEnabled",
        alias = "tls",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    ssl_enabled: Option<bool>,

    /// Skip server certificate and hostname checks (`=false` turns it off)
    #[clap(
        long,
        alias = "skipSSLChecks",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    skip_ssl_checks: Option<bool>,

    /// Server name for SNI and certificate verification (defaults to the host)
    #[clap(long)]
    tls_server_name: Option<String>,

    /// Milliseconds of silence after which the response is considered complete
    #[clap(long, alias = "customTimeoutMillis")]
    custom_timeout_millis: Option<u64>,

    /// Milliseconds allowed for resolve, connect, header write and TLS handshake
    /// (defaults to the idle timeout)
    #[clap(long)]
    connect_timeout_millis: Option<u64>,

    /// Size of each read in bytes
    #[clap(long)]
    read_chunk_size: Option<usize>,

    /// Stop reading after this many bytes
    #[clap(long)]
    max_response_bytes: Option<usize>,

    /// Fail on a read error instead of printing what was received
    #[clap(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    abort_on_read_error: Option<bool>,

    /// Load configuration from a JSON file
    #[clap(long)]
    config_file: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[clap(long)]
    log_level: Option<String>,
}

impl Args {
    /// Values given on the command line; absent flags stay unset
    ///
    /// A bare boolean flag means `true`; `--flag=false` overrides a lower source.
    fn into_values(self) -> ConfigValues {
        ConfigValues {
            host: self.host,
            port: self.port,
            message: self.message,
            proxy_protocol: self.proxy_protocol,
            proxy_source: self.proxy_source,
            proxy_destination: self.proxy_destination,
            proxy_command: self.proxy_command,
            proxy_family: self.proxy_family,
            tls: self.ssl_enabled,
            skip_cert_verification: self.skip_ssl_checks,
            tls_server_name: self.tls_server_name,
            idle_timeout_ms: self.custom_timeout_millis,
            connect_timeout_ms: self.connect_timeout_millis,
            read_chunk_size: self.read_chunk_size,
            max_response_bytes: self.max_response_bytes,
            abort_on_read_error: self.abort_on_read_error,
            log_level: self.log_level,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config_file = args
        .config_file
        .clone()
        .or_else(|| env::var(format!("{}CONFIG_FILE", ENV_PREFIX)).ok().map(PathBuf::from));
    let cli_values = args.into_values();

    // The logger must exist before configuration sources are read
    let log_level = cli_values
        .log_level
        .clone()
        .or_else(|| env::var(format!("{}LOG_LEVEL", ENV_PREFIX)).ok())
        .unwrap_or_else(defaults::log_level);
    init_logger(&log_level);

    info!("Starting {} v{}", APP_NAME, VERSION);

    match run(config_file, cli_values).await {
        Ok(response) => {
            let mut stdout = std::io::stdout();
            if let Err(e) = stdout
                .write_all(response.as_bytes())
                .and_then(|_| stdout.flush())
            {
                error!("Failed to write response to stdout: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(config_file: Option<PathBuf>, cli_values: ConfigValues) -> Result<String> {
    let mut builder = ConfigBuilder::new();

    if let Some(path) = config_file {
        info!("Loading configuration from file: {}", path.display());
        builder = builder.with_file(path);
    }

    let config = builder
        .with_env(ENV_PREFIX)
        .with_cli(cli_values)
        .build()?;

    // The file may set a level the logger was not started with
    let level = set_log_level(&config.log_level);
    debug!("Log level: {}", level);

    for warning in config.check_warnings() {
        warn!("{}", warning);
    }

    info!(
        "Target: {} (tls: {}, proxy protocol: {}, idle timeout: {:?}, connect timeout: {:?})",
        config.target, config.tls, config.proxy_protocol, config.idle_timeout, config.connect_timeout
    );

    run_exchange(&config).await
}
