/*
[INPUT]:  CLI arguments, optional configuration file, OS shutdown signals
[OUTPUT]: Tick history and live ticks written to the log
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tradelink_adapter::{
    ApiManager, ClientConfig, ConnectionEvent, ConnectionManager, TicksHistoryRequest,
    TicksHistoryUpdate,
};

#[derive(Parser, Debug)]
#[command(name = "tradelink-stream", version, about = "Stream tick history and live ticks")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[arg(long, default_value = "R_100")]
    symbol: String,
    /// Live ticks to log before exiting; runs until Ctrl-C when omitted
    #[arg(long)]
    count: Option<u64>,
    /// History points requested with the snapshot
    #[arg(long = "history", default_value_t = 10)]
    history: u32,
    #[arg(long, env = "TRADELINK_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let config = ClientConfig::load(args.config_path.as_deref()).context("load config")?;
    info!(
        websocket_url = %config.websocket_url,
        symbol = %args.symbol,
        count = ?args.count,
        "starting tradelink-stream"
    );

    let connection = ConnectionManager::new(config);
    spawn_event_logger(&connection);
    connection.connect_default().await.context("connect")?;

    let apis = ApiManager::new(connection.clone());
    if let Some(token) = args.token.as_deref() {
        let account = apis.auth().authorize(token).await.context("authorize")?;
        info!(loginid = %account.loginid, currency = %account.currency, "session authorized");
    }

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    let (updates_tx, mut updates) = mpsc::unbounded_channel();
    let request = TicksHistoryRequest::new(args.symbol.as_str()).count(args.history);
    let stream = apis
        .market()
        .subscribe_ticks_history(&request, move |update| {
            let _ = updates_tx.send(update);
        })
        .await
        .context("subscribe ticks_history")?;
    info!(topic = stream.topic(), "subscribed");

    let mut ticks = 0_u64;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("shutdown signal received");
                break;
            }
            update = updates.recv() => {
                let Some(update) = update else { break };
                match update {
                    Ok(update) => {
                        log_update(&update);
                        if !update.is_snapshot() {
                            ticks += 1;
                        }
                    }
                    Err(err) => warn!(error = %err, code = err.code(), "stream error"),
                }
                if args.count.is_some_and(|count| ticks >= count) {
                    info!(ticks, "tick count reached");
                    break;
                }
            }
        }
    }

    stream.unsubscribe();
    connection.disconnect().await;
    info!("disconnected");
    Ok(())
}

fn log_update(update: &TicksHistoryUpdate) {
    match update {
        TicksHistoryUpdate::History { history, .. } => {
            info!(points = history.prices.len(), last = ?update.last_price(), "history snapshot");
        }
        TicksHistoryUpdate::Candles { candles } => {
            info!(candles = candles.len(), last = ?update.last_price(), "candle snapshot");
        }
        TicksHistoryUpdate::Tick { tick } => {
            info!(symbol = %tick.symbol, epoch = tick.epoch, quote = %tick.quote, "tick");
        }
        TicksHistoryUpdate::Ohlc { ohlc } => {
            info!(symbol = %ohlc.symbol, close = %ohlc.close, "ohlc");
        }
    }
}

fn spawn_event_logger(connection: &ConnectionManager) {
    let mut events = connection.events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ConnectionEvent::Reconnecting { attempt, delay } => {
                    warn!(attempt, delay_ms = delay.as_millis() as u64, "reconnecting");
                }
                ConnectionEvent::ReconnectFailed { attempts } => {
                    warn!(attempts, "gave up reconnecting");
                }
                ConnectionEvent::AuthorizationFailed { code, message } => {
                    warn!(%code, %message, "authorization failed");
                }
                other => info!(event = ?other, "connection event"),
            }
        }
    });
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
