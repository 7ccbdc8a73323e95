use clap::Parser;
use smsline_core::config::SmslineConfig;
use smsline_gateway::app;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// SMS webhook → live event stream relay.
#[derive(Debug, Parser)]
#[command(name = "smsline-gateway", version, about)]
struct Args {
    /// Config file (default: $SMSLINE_CONFIG or ~/.smsline/smsline.toml).
    #[arg(short, long)]
    config: Option<String>,

    /// Override `gateway.port`.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override `gateway.bind`.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smsline_gateway=info,smsline_store=info,tower_http=debug".into()),
        )
        .init();

    let args = Args::parse();

    // load config: explicit path > SMSLINE_CONFIG env > ~/.smsline/smsline.toml
    let config_path = args.config.or_else(|| std::env::var("SMSLINE_CONFIG").ok());
    let mut config = SmslineConfig::load(config_path.as_deref())?;
    if let Some(port) = args.port {
        config.gateway.port = port;
    }
    if let Some(bind) = args.bind {
        config.gateway.bind = bind;
    }

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    info!(
        capacity = config.store.capacity,
        history_replay = config.stream.history_replay,
        keepalive_secs = config.stream.keepalive_secs,
        verify_signature = config.webhook.verify_signature,
        "configuration loaded"
    );

    let state = Arc::new(app::AppState::from_config(config));
    let router = app::build_router(state);

    info!("smsline gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
