//! Background price fetching
//!
//! [`PriceWorker`] runs the fetch cycle a ticker repeats every update
//! interval: main price first, then any secondary symbols, with each outcome
//! delivered as a [`TickerEvent`] over an mpsc channel. Cycles never
//! overlap; a tick that lands while the previous cycle is still in flight is
//! dropped.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::client::CoinGeckoClient;
use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::types::TickerEvent;

/// What to fetch each cycle
#[derive(Debug, Clone)]
struct WorkerConfig {
    symbol: String,
    vs_currency: String,
    secondary: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            symbol: "btc".to_string(),
            vs_currency: "usd".to_string(),
            secondary: Vec::new(),
        }
    }
}

/// Periodic price fetcher emitting [`TickerEvent`]s
///
/// Share it behind an `Arc`: configuration updates come from the UI thread
/// while fetch cycles run on the runtime.
pub struct PriceWorker {
    client: Arc<CoinGeckoClient>,
    config: Mutex<WorkerConfig>,
    events: mpsc::Sender<TickerEvent>,
    fetch_gate: tokio::sync::Mutex<()>,
}

impl PriceWorker {
    /// Creates a worker and the receiving end of its event channel.
    pub fn new(client: Arc<CoinGeckoClient>) -> (Self, mpsc::Receiver<TickerEvent>) {
        let (events, receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let worker = Self {
            client,
            config: Mutex::new(WorkerConfig::default()),
            events,
            fetch_gate: tokio::sync::Mutex::new(()),
        };
        (worker, receiver)
    }

    fn lock_config(&self) -> MutexGuard<'_, WorkerConfig> {
        self.config
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replaces what the cycle fetches, starting with the next call to
    /// [`PriceWorker::fetch`].
    pub fn set_config(
        &self,
        symbol: impl Into<String>,
        vs_currency: impl Into<String>,
        secondary: Vec<String>,
    ) {
        let mut config = self.lock_config();
        config.symbol = symbol.into();
        config.vs_currency = vs_currency.into();
        config.secondary = secondary;
    }

    async fn emit(&self, event: TickerEvent) {
        if self.events.send(event).await.is_err() {
            tracing::debug!("event receiver dropped, discarding event");
        }
    }

    /// Runs one fetch cycle.
    ///
    /// Emits [`TickerEvent::PriceUpdated`] for the main symbol and, when
    /// secondary symbols are configured, [`TickerEvent::SecondaryPricesUpdated`]
    /// for those. A fetch that comes back empty emits
    /// [`TickerEvent::FetchFailed`] carrying the client's last error, if one
    /// was recorded. Does nothing while the client is paused.
    pub async fn fetch(&self) {
        let Ok(_gate) = self.fetch_gate.try_lock() else {
            tracing::debug!("previous fetch cycle still running, skipping");
            return;
        };

        let (symbol, vs_currency, secondary) = {
            let config = self.lock_config();
            (
                config.symbol.clone(),
                config.vs_currency.clone(),
                config.secondary.clone(),
            )
        };

        if self.client.is_paused() {
            return;
        }

        match self.client.get_price(&symbol, &vs_currency).await {
            Some(price) => {
                self.emit(TickerEvent::PriceUpdated {
                    id: Uuid::new_v4(),
                    symbol: symbol.clone(),
                    price,
                    currency: vs_currency.clone(),
                    timestamp: Utc::now(),
                })
                .await;
            }
            None => {
                if let Some(message) = self.client.last_error() {
                    self.emit(TickerEvent::FetchFailed {
                        id: Uuid::new_v4(),
                        message,
                        timestamp: Utc::now(),
                    })
                    .await;
                }
            }
        }

        if secondary.is_empty() {
            return;
        }

        let prices = self.client.get_prices(&secondary, &vs_currency).await;
        if !prices.is_empty() {
            self.emit(TickerEvent::SecondaryPricesUpdated {
                id: Uuid::new_v4(),
                prices,
                currency: vs_currency,
                timestamp: Utc::now(),
            })
            .await;
        } else if let Some(message) = self.client.last_error() {
            self.emit(TickerEvent::FetchFailed {
                id: Uuid::new_v4(),
                message,
                timestamp: Utc::now(),
            })
            .await;
        }
    }

    /// Spawns a task that fetches on a fixed interval until the returned
    /// handle shuts it down. The first cycle runs immediately, and an
    /// auto-pause window that has elapsed is cleared before each cycle.
    pub fn spawn_periodic(self: Arc<Self>, interval: Duration) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if self
                            .client
                            .auto_resume_remaining()
                            .is_some_and(|left| left.is_zero())
                        {
                            tracing::info!("auto-pause window elapsed, resuming");
                            self.client.resume();
                        }
                        self.fetch().await;
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        WorkerHandle { shutdown_tx }
    }
}

/// Controls a spawned periodic worker
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl WorkerHandle {
    /// Stops the periodic task once its current cycle finishes.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}
