//! Change detector for one tracked dimension.
//!
//! Each cycle fetches the current collection, diffs it against the previous
//! snapshot, enriches additions, hands the events to the dispatcher and
//! persists the new snapshot when something changed. The snapshot is owned
//! by the caller and threaded through [`Poller::cycle`].

use crate::{Dimension, LogThrottle, SnapshotStore, StoreError};
use futures_util::future::join_all;
use listings_core::{diff_with, ChangeEvent, Collection, Dispatch, Enrichment};
use listings_feeds::{RateLimit, RateLimiter};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Timing parameters of a poller.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Cycle rate
    pub rate: RateLimit,
    /// Minimum gap between repeated fetch failure warnings
    pub fetch_warning_cooldown: Duration,
    /// Shared budget for metadata requests, across every identifier of a cycle
    pub enrich_rate: RateLimit,
    /// Delay between enrichment attempts for one identifier
    pub enrich_retry_interval: Duration,
    /// Give up on enrichment after this long
    pub enrich_timeout: Duration,
    /// Minimum gap between repeated "not found yet" warnings
    pub enrich_warning_cooldown: Duration,
}

impl PollerConfig {
    /// Cycle at `per_second`; metadata requests may use the same rate but
    /// never go below one per `enrich_retry_interval`.
    pub fn with_rate(per_second: f64) -> Self {
        let defaults = Self::default();
        Self {
            rate: RateLimit::per_second(per_second),
            enrich_rate: RateLimit::per_second(per_second.max(defaults.enrich_rate.per_second)),
            ..defaults
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            rate: RateLimit::per_second(1.0),
            enrich_rate: RateLimit::per_second(1.0),
            fetch_warning_cooldown: Duration::from_secs(60),
            enrich_retry_interval: Duration::from_secs(1),
            enrich_timeout: Duration::from_secs(60),
            enrich_warning_cooldown: Duration::from_secs(10),
        }
    }
}

/// Last observed collection of a dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollerState {
    pub snapshot: Collection,
}

impl PollerState {
    pub fn new(snapshot: Collection) -> Self {
        Self { snapshot }
    }

    /// No collection observed yet; the next successful fetch seeds it.
    pub fn is_unseeded(&self) -> bool {
        self.snapshot.is_empty()
    }
}

pub struct Poller {
    dimension: Arc<dyn Dimension>,
    store: Arc<dyn SnapshotStore>,
    dispatcher: Arc<dyn Dispatch>,
    limiter: RateLimiter,
    enrich_limiter: AsyncMutex<RateLimiter>,
    config: PollerConfig,
    fetch_warnings: LogThrottle,
    consecutive_failures: u64,
    enrich_warnings: Mutex<LogThrottle>,
}

impl Poller {
    pub fn new(
        dimension: Arc<dyn Dimension>,
        store: Arc<dyn SnapshotStore>,
        dispatcher: Arc<dyn Dispatch>,
        config: PollerConfig,
    ) -> Self {
        Self {
            dimension,
            store,
            dispatcher,
            limiter: RateLimiter::new(config.rate),
            enrich_limiter: AsyncMutex::new(RateLimiter::new(config.enrich_rate)),
            fetch_warnings: LogThrottle::new(config.fetch_warning_cooldown),
            consecutive_failures: 0,
            enrich_warnings: Mutex::new(LogThrottle::new(config.enrich_warning_cooldown)),
            config,
        }
    }

    /// Load the persisted snapshot.
    ///
    /// A corrupt or unreadable snapshot is an error; running on without it
    /// would re-announce or miss every change since the last save.
    pub fn load_state(&self) -> Result<PollerState, StoreError> {
        let snapshot = self.store.load(self.dimension.key())?;
        info!(
            dimension = %self.dimension.kind(),
            count = snapshot.len(),
            "Loaded snapshot"
        );
        Ok(PollerState::new(snapshot))
    }

    /// Fetch the current collection, falling back to `previous` when the
    /// exchange fails or reports nothing.
    pub async fn fetch_collection(&mut self, previous: &Collection) -> Collection {
        let kind = self.dimension.kind();

        let reason = match self.dimension.fetch().await {
            Ok(collection) if !collection.is_empty() => {
                if self.consecutive_failures > 0 {
                    info!(
                        dimension = %kind,
                        failures = self.consecutive_failures,
                        "Fetch recovered"
                    );
                    self.consecutive_failures = 0;
                    self.fetch_warnings.reset();
                }
                return collection;
            }
            Ok(_) => "empty response".to_string(),
            Err(e) => e.to_string(),
        };

        self.consecutive_failures += 1;
        if let Some(suppressed) = self.fetch_warnings.check() {
            warn!(
                dimension = %kind,
                error = %reason,
                suppressed,
                "Fetch failed, keeping previous snapshot"
            );
        }
        previous.clone()
    }

    /// Metadata for an added identifier.
    ///
    /// Retries transient failures (including "not found yet") at
    /// `enrich_retry_interval` or the error's own backoff, whichever is
    /// longer, up to `enrich_timeout`. Every attempt takes a token from the
    /// poller's metadata limiter, so concurrent enrichments share one request
    /// budget. Returns `None` on timeout or permanent failure.
    pub async fn enrich(&self, identifier: &str) -> Option<Enrichment> {
        let kind = self.dimension.kind();
        let deadline = Instant::now() + self.config.enrich_timeout;
        let mut attempts = 0u32;

        loop {
            if !self.acquire_enrich_slot(deadline).await {
                warn!(
                    dimension = %kind,
                    identifier,
                    attempts,
                    "Metadata request budget exhausted, notifying without it"
                );
                return None;
            }

            attempts += 1;
            let delay = match self.dimension.enrich(identifier).await {
                Ok(enrichment) => {
                    if attempts > 1 {
                        debug!(dimension = %kind, identifier, attempts, "Enriched after retries");
                    }
                    return enrichment;
                }
                Err(e) if e.is_transient() => {
                    let suppressed = self.enrich_warnings.lock().ok().and_then(|mut t| t.check());
                    if let Some(suppressed) = suppressed {
                        warn!(
                            dimension = %kind,
                            identifier,
                            error = %e,
                            suppressed,
                            "Metadata not available yet, retrying"
                        );
                    }
                    e.suggested_retry_delay().unwrap_or_default()
                }
                Err(e) => {
                    warn!(dimension = %kind, identifier, error = %e, "Failed to fetch metadata");
                    return None;
                }
            };

            let interval = delay
                .max(self.config.enrich_retry_interval)
                .max(Duration::from_millis(1));
            if Instant::now() + interval > deadline {
                warn!(
                    dimension = %kind,
                    identifier,
                    attempts,
                    "Giving up on metadata, notifying without it"
                );
                return None;
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// One fetch, diff, enrich, notify, persist pass.
    pub async fn cycle(&mut self, state: PollerState) -> (PollerState, Vec<ChangeEvent>) {
        let kind = self.dimension.kind();
        let current = self.fetch_collection(&state.snapshot).await;

        if state.is_unseeded() {
            if !current.is_empty() {
                info!(dimension = %kind, count = current.len(), "Seeded snapshot");
                self.persist(&current);
            }
            return (PollerState::new(current), Vec::new());
        }

        let diff = diff_with(self.dimension.diff_mode(), &state.snapshot, &current);
        if diff.is_empty() {
            return (PollerState::new(current), Vec::new());
        }

        let change = diff.kind;
        let enrichments: Vec<Option<Enrichment>> = if change.is_removal() {
            vec![None; diff.len()]
        } else {
            join_all(diff.changed.iter().map(|id| self.enrich(id))).await
        };

        let events: Vec<ChangeEvent> = diff
            .changed
            .into_iter()
            .zip(enrichments)
            .map(|(id, enrichment)| ChangeEvent::new(kind, change, id).with_enrichment(enrichment))
            .collect();

        for event in &events {
            info!(dimension = %kind, kind = %event.kind, identifier = %event.identifier, "Change detected");
            self.dispatcher.dispatch(event.clone());
        }

        self.persist(&current);
        (PollerState::new(current), events)
    }

    /// Poll forever at the configured rate.
    pub async fn run(mut self, mut state: PollerState) {
        info!(
            dimension = %self.dimension.kind(),
            rate = self.config.rate.per_second,
            "Poller started"
        );

        loop {
            self.limiter.acquire().await;
            let (next, _events) = self.cycle(state).await;
            state = next;
        }
    }

    /// Wait for a metadata request token. Returns `false` without waiting
    /// when the next token would only arrive after `deadline`.
    async fn acquire_enrich_slot(&self, deadline: Instant) -> bool {
        let mut limiter = self.enrich_limiter.lock().await;
        match Instant::now().checked_add(limiter.time_until_available()) {
            Some(ready) if ready <= deadline => {}
            _ => return false,
        }
        limiter.acquire().await;
        true
    }

    fn persist(&self, collection: &Collection) {
        let key = self.dimension.key();
        if let Err(e) = self.store.save(key, collection) {
            error!(key, error = %e, "Failed to persist snapshot");
        }
    }
}
