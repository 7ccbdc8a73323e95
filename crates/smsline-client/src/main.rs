use clap::{Parser, Subcommand};
use smsline_client::{
    format::render_toast,
    webhook::{default_webhook_url, send_test_sms, TestSms},
    ListenerEvent, StreamListener, ToastChange, ToastTray,
};
use smsline_core::config::SmslineConfig;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::info;

/// Terminal listener for the smsline message stream.
#[derive(Debug, Parser)]
#[command(name = "smsline-watch", version, about)]
struct Cli {
    /// Config file (default: $SMSLINE_CONFIG or ~/.smsline/smsline.toml).
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Follow the stream and show a toast for every new message.
    Listen {
        /// Override `client.url`.
        #[arg(long)]
        url: Option<String>,
    },
    /// Post a simulated inbound SMS to the gateway webhook.
    SendTest {
        #[arg(long, default_value_t = default_webhook_url())]
        url: String,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        sid: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smsline_client=info,smsline_watch=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Listen { url } => {
            let config_path = cli.config.or_else(|| std::env::var("SMSLINE_CONFIG").ok());
            let mut config = SmslineConfig::load(config_path.as_deref())?;
            if let Some(url) = url {
                config.client.url = url;
            }
            listen(config).await
        }
        Command::SendTest { url, from, body, sid } => {
            let mut sms = TestSms::default();
            if let Some(from) = from {
                sms.from = from;
            }
            if let Some(body) = body {
                sms.body = body;
            }
            if let Some(sid) = sid {
                sms.sid = sid;
            }
            let (status, text) = send_test_sms(&reqwest::Client::new(), &url, &sms).await?;
            println!("Status: {status}");
            println!("Response: {text}");
            Ok(())
        }
    }
}

async fn listen(config: SmslineConfig) -> anyhow::Result<()> {
    let listener = StreamListener::from_config(&config.client);
    info!(url = listener.url(), "listening for messages");

    let (tx, mut rx) = mpsc::channel(64);
    let task = tokio::spawn(listener.run(tx));
    let mut tray = ToastTray::from_config(&config.client);

    loop {
        let deadline = tray
            .next_deadline()
            .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

        tokio::select! {
            event = rx.recv() => match event {
                Some(ListenerEvent::Message(message)) => {
                    println!("{}\n", render_toast(&message, chrono::Utc::now().timestamp_millis()));
                    tray.push(message, Instant::now());
                }
                Some(ListenerEvent::Reconnecting { attempt, delay }) => {
                    eprintln!("disconnected, retrying in {:.1}s (attempt {attempt})", delay.as_secs_f64());
                }
                Some(ListenerEvent::Connected) | Some(ListenerEvent::History(_)) => {}
                None => break,
            },
            _ = tokio::time::sleep_until(deadline.into()) => {
                for change in tray.tick(Instant::now()) {
                    if let ToastChange::Removed(id) = change {
                        info!(%id, "toast expired");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                task.abort();
                return Ok(());
            }
        }
    }

    // the listener only stops on its own when it gives up
    task.await??;
    Ok(())
}
