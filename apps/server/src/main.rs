//! Binance listings sniper.
//!
//! Polls Binance for new and removed trading pairs, base assets and listing
//! announcements, and relays every change to Telegram and Discord.

mod config;

use config::{ConfigError, EnvConfig};
use listings_alerts::{
    DiscordNotifier, Dispatcher, LogNotifier, NotifyError, TelegramNotifier,
};
use listings_core::{DimensionKind, Permission};
use listings_engine::{
    AnnouncementsDimension, AssetsDimension, Dimension, JsonFileStore, Poller, PollerConfig,
    SnapshotStore, StoreError, SymbolsDimension,
};
use listings_feeds::{
    AnnouncementsConfig, BinanceAnnouncements, BinanceClient, ExchangeClient, FeedError,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Error, Debug)]
enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Exchange client error: {0}")]
    Feed(#[from] FeedError),
    #[error("Snapshot error: {0}")]
    Store(#[from] StoreError),
    #[error("{sink} bot check failed: {source}")]
    Sink {
        sink: &'static str,
        source: NotifyError,
    },
}

/// Initialize logging from `RUST_LOG` (default `info`).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
    }
}

/// Verify the enabled bots and register them with a dispatcher.
async fn build_dispatcher(config: &EnvConfig) -> Result<Dispatcher, StartupError> {
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(Arc::new(LogNotifier));

    if let Some(telegram) = &config.telegram {
        let notifier = TelegramNotifier::new(telegram);
        notifier
            .verify()
            .await
            .map_err(|source| StartupError::Sink { sink: "Telegram", source })?;
        dispatcher.register(Arc::new(notifier));
    } else {
        info!("Telegram messages disabled");
    }

    if let Some(discord) = &config.discord {
        let sink_err = |source: NotifyError| StartupError::Sink { sink: "Discord", source };
        let notifier = DiscordNotifier::new(discord.clone()).map_err(sink_err)?;
        notifier.verify().await.map_err(sink_err)?;
        dispatcher.register(Arc::new(notifier));
    } else {
        info!("Discord messages disabled");
    }

    if config.telegram.is_none() && config.discord.is_none() {
        warn!("No chat sinks enabled, changes will only be logged");
    }

    Ok(dispatcher)
}

fn build_dimension(
    kind: DimensionKind,
    binance: &Arc<dyn ExchangeClient>,
) -> Result<Arc<dyn Dimension>, StartupError> {
    let dimension: Arc<dyn Dimension> = match kind {
        DimensionKind::Symbols => Arc::new(SymbolsDimension::new(Arc::clone(binance))),
        DimensionKind::Assets => {
            Arc::new(AssetsDimension::new(Arc::clone(binance), Permission::Spot))
        }
        DimensionKind::Announcements => Arc::new(AnnouncementsDimension::new(Arc::new(
            BinanceAnnouncements::new(AnnouncementsConfig::default())?,
        ))),
    };
    Ok(dimension)
}

async fn run() -> Result<(), StartupError> {
    let config = EnvConfig::from_env()?;
    info!(?config, "Configuration loaded");

    let dispatcher = Arc::new(build_dispatcher(&config).await?);
    let binance: Arc<dyn ExchangeClient> = Arc::new(BinanceClient::new(config.binance.clone())?);
    let store: Arc<dyn SnapshotStore> = Arc::new(JsonFileStore::new(&config.data_dir));

    // Load every snapshot before starting any loop, so a corrupt file stops
    // the process with nothing running.
    let mut pollers = Vec::new();
    for settings in config.enabled_dimensions() {
        let poller = Poller::new(
            build_dimension(settings.kind, &binance)?,
            Arc::clone(&store),
            dispatcher.clone(),
            PollerConfig::with_rate(settings.rate),
        );
        let state = poller.load_state()?;
        pollers.push((poller, state));
    }

    if pollers.is_empty() {
        warn!("All dimensions disabled, nothing to poll");
    }

    let handles: Vec<_> = pollers
        .into_iter()
        .map(|(poller, state)| tokio::spawn(poller.run(state)))
        .collect();

    info!(
        pollers = handles.len(),
        sinks = ?dispatcher.sink_names(),
        data_dir = %config.data_dir.display(),
        "Listings sniper running. Press Ctrl+C to stop."
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
    }

    info!("Shutting down...");
    for handle in handles {
        handle.abort();
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_logging();

    if let Err(e) = run().await {
        error!("Startup failed: {}", e);
        std::process::exit(1);
    }
}
