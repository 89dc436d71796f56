use anyhow::Context;
use clap::Parser;
use logon_cache_proxy::api::{build_routes, common};
use logon_cache_proxy::core::models::ProxyConfig;
use logon_cache_proxy::state::AppState;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Upstream BI server base URL, e.g. http://bi.internal:8000/dundas
    upstream_url: String,

    /// Port to listen on
    port: u16,

    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Upstream request timeout in seconds (no timeout when unset)
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS")]
    upstream_timeout_secs: Option<u64>,

    /// Forward everything upstream without intercepting logins
    #[arg(long)]
    passthrough_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = ProxyConfig::new(&args.upstream_url, args.port)?
        .with_bind(args.bind)
        .with_upstream_timeout(args.upstream_timeout_secs.map(Duration::from_secs))
        .with_passthrough_only(args.passthrough_only);

    tracing::info!("Starting PROXY to: {}", config.upstream());
    if config.passthrough_only {
        tracing::info!("Pass-through only, login interception disabled");
    } else {
        tracing::info!("Intercepting logins at {}", config.login_path());
    }

    let addr = config.listen_addr();
    let state = Arc::new(AppState::new(config).context("Failed to init state")?);

    let app = build_routes(state).layer(axum::middleware::from_fn(common::request_logger));

    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
