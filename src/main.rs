//! nats-http-bridge
//!
//! Carries HTTP request/response exchanges over a NATS request/reply subject.
//!
//! # Architecture Overview
//!
//! ```text
//!   HTTP caller                                                   Upstream
//!       │                                                            ▲
//!       ▼                                                            │
//!  ┌──────────┐   ┌──────────────┐   request subject   ┌──────────────┐
//!  │ ingress  │──▶│ client bridge│ ──────────────────▶ │ server bridge│
//!  │ / fetch  │◀──│  (envelope)  │ ◀────────────────── │  (reqwest)   │
//!  └──────────┘   └──────────────┘   per-request inbox └──────────────┘
//! ```
//!
//! `serve` runs the executor side, `ingress` runs a local HTTP listener on
//! the calling side, and `fetch` performs a single call and prints it.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use nats_http_bridge::config::{load_config, validate_config, BridgeConfig, ConfigError};
use nats_http_bridge::lifecycle::{shutdown_signal, spawn_signal_handler, Shutdown};
use nats_http_bridge::observability::{logging, metrics};
use nats_http_bridge::server::Upstream;
use nats_http_bridge::{
    BridgeClient, BridgeServer, IngressServer, MessagingChannel, NatsChannel,
};

#[derive(Parser)]
#[command(name = "nats-http-bridge")]
#[command(about = "HTTP request/response bridge over NATS", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override broker.url
    #[arg(long)]
    broker_url: Option<String>,

    /// Override broker.request_subject
    #[arg(long)]
    subject: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute bridged requests against real upstreams
    Serve,
    /// Accept local HTTP and forward it through the bridge
    Ingress,
    /// Send one request through the bridge and print the response
    Fetch {
        url: String,

        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request header as 'Name: value'; repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        #[arg(short = 'd', long)]
        data: Option<String>,

        /// Override client.timeout_ms for this call
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    logging::init_logging(&config.observability)?;
    tracing::info!("nats-http-bridge v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let channel: Arc<dyn MessagingChannel> = Arc::new(NatsChannel::connect(&config.broker).await?);

    match cli.command {
        Commands::Serve => serve(config, channel).await?,
        Commands::Ingress => ingress(config, channel).await?,
        Commands::Fetch {
            url,
            method,
            headers,
            data,
            timeout_ms,
        } => {
            let client =
                BridgeClient::new(channel, config.broker.request_subject.as_str(), &config.client);
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| client.timeout());
            let request = build_request(&method, &url, &headers, data)?;
            tracing::debug!(subject = client.subject(), url = %url, "Sending request");
            let response = client.send(request, timeout).await?;

            println!("{:?} {}", response.version(), response.status());
            for (name, value) in response.headers() {
                println!("{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
            }
            println!();
            let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
            println!("{}", String::from_utf8_lossy(&body));
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Load the config file (or defaults), apply CLI overrides, then validate.
fn resolve_config(cli: &Cli) -> Result<BridgeConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(url) = &cli.broker_url {
        config.broker.url = url.clone();
    }
    if let Some(subject) = &cli.subject {
        config.broker.request_subject = subject.clone();
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

async fn serve(
    config: BridgeConfig,
    channel: Arc<dyn MessagingChannel>,
) -> Result<(), Box<dyn std::error::Error>> {
    let upstream = Upstream::new(&config.upstream)?;
    let handle = BridgeServer::new(channel, upstream)
        .with_queue_group(config.server.queue_group.clone())
        .start(&config.broker.request_subject)
        .await?;

    shutdown_signal().await;
    handle.shutdown().await;
    Ok(())
}

async fn ingress(
    config: BridgeConfig,
    channel: Arc<dyn MessagingChannel>,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = BridgeClient::new(channel, config.broker.request_subject.as_str(), &config.client);
    let listener = TcpListener::bind(&config.ingress.bind_address).await?;

    let shutdown = Shutdown::new();
    let _signals = spawn_signal_handler(shutdown.clone());

    IngressServer::new(client, &config.ingress)
        .run(listener, shutdown.subscribe())
        .await?;
    Ok(())
}

fn build_request(
    method: &str,
    url: &str,
    headers: &[String],
    data: Option<String>,
) -> Result<Request<Body>, Box<dyn std::error::Error>> {
    let mut builder = Request::builder().method(method).uri(url);
    for raw in headers {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| format!("header must look like 'Name: value', got {raw:?}"))?;
        builder = builder.header(
            HeaderName::from_bytes(name.trim().as_bytes())?,
            HeaderValue::from_str(value.trim())?,
        );
    }
    let body = data.map(Body::from).unwrap_or_else(Body::empty);
    Ok(builder.body(body)?)
}
