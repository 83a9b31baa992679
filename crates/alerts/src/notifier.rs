//! Sink abstraction and background fan-out.

use crate::format::summary;
use async_trait::async_trait;
use listings_core::{ChangeEvent, Dispatch};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Discord API error ({status}): {body}")]
    Discord { status: u16, body: String },
    #[error("Delivery failed for {failed} of {total} channels")]
    Partial { failed: usize, total: usize },
}

/// A destination for change notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Deliver one event. Best effort; the dispatcher logs failures.
    async fn notify(&self, event: &ChangeEvent) -> Result<(), NotifyError>;
}

/// Notifier that writes every event to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, event: &ChangeEvent) -> Result<(), NotifyError> {
        info!(
            dimension = %event.dimension,
            kind = %event.kind,
            identifier = %event.identifier,
            "{}",
            summary(event)
        );
        Ok(())
    }
}

struct SinkHandle {
    name: String,
    tx: mpsc::UnboundedSender<ChangeEvent>,
}

/// Fans change events out to registered notifiers.
///
/// Every notifier gets its own queue and worker task, so a slow or failing
/// sink delays neither the caller nor the other sinks.
#[derive(Default)]
pub struct Dispatcher {
    sinks: Vec<SinkHandle>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a notifier and spawn its worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn register(&mut self, notifier: Arc<dyn Notifier>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let name = notifier.name().to_string();
        tokio::spawn(sink_worker(notifier, rx));
        self.sinks.push(SinkHandle { name, tx });
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name.as_str()).collect()
    }
}

impl Dispatch for Dispatcher {
    fn dispatch(&self, event: ChangeEvent) {
        for sink in &self.sinks {
            if sink.tx.send(event.clone()).is_err() {
                warn!(
                    sink = %sink.name,
                    identifier = %event.identifier,
                    "Notifier channel closed, dropping event"
                );
            }
        }
    }
}

/// Drains one sink's queue. Errors and panics stop at this boundary.
async fn sink_worker(notifier: Arc<dyn Notifier>, mut rx: mpsc::UnboundedReceiver<ChangeEvent>) {
    let name = notifier.name().to_string();
    info!(sink = %name, "Notifier started");

    while let Some(event) = rx.recv().await {
        let dimension = event.dimension;
        let identifier = event.identifier.clone();

        let task = {
            let notifier = Arc::clone(&notifier);
            tokio::spawn(async move { notifier.notify(&event).await })
        };

        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(
                    sink = %name,
                    dimension = %dimension,
                    identifier = %identifier,
                    error = %e,
                    "Failed to deliver notification"
                );
            }
            Err(e) => {
                error!(
                    sink = %name,
                    dimension = %dimension,
                    identifier = %identifier,
                    error = %e,
                    "Notifier task panicked"
                );
            }
        }
    }

    warn!(sink = %name, "Notifier worker shutting down");
}
