//! CoinGecko API client with caching, retries, and failure tracking
//!
//! [`CoinGeckoClient`] is the crate's front door. Every outbound call runs
//! through one pipeline: skip when paused, retry per the configured policy,
//! then record the outcome on the [`FailureTracker`]. Price lookups never
//! fail loudly; a broken network turns into empty results and a growing
//! failure count that callers can observe.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::cache::ResponseCache;
use crate::constants::{
    CACHE_KEY_COIN_LIST, CACHE_KEY_SUPPORTED_CURRENCIES, COINS_LIST_ENDPOINT,
    FALLBACK_CURRENCIES, SIMPLE_PRICE_ENDPOINT, SUPPORTED_CURRENCIES_ENDPOINT,
};
use crate::error::FetchError;
use crate::retry::RetryPolicy;
use crate::state::{ApiStateSnapshot, FailureTracker};
use crate::symbols::SymbolIndex;
use crate::transport::{ApiTransport, HttpTransport};
use crate::types::Coin;

/// Minimal coin list used when neither the cache nor the API can supply one,
/// so symbol resolution for the majors keeps working offline.
fn fallback_coins() -> Vec<Coin> {
    vec![
        Coin::new("bitcoin", "btc", "Bitcoin"),
        Coin::new("ethereum", "eth", "Ethereum"),
    ]
}

/// Resilient CoinGecko client
///
/// Construct one per application and share it behind an `Arc`; all methods
/// take `&self`.
pub struct CoinGeckoClient {
    transport: Arc<dyn ApiTransport>,
    cache: ResponseCache,
    tracker: FailureTracker,
    retry: RwLock<RetryPolicy>,
}

impl CoinGeckoClient {
    /// Creates a client against the public CoinGecko API, caching responses
    /// under `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self, FetchError> {
        let transport = Arc::new(HttpTransport::new()?);
        Ok(Self::with_transport(transport, ResponseCache::new(cache_dir)))
    }

    /// Creates a client over a custom transport. This is the seam tests use
    /// to script responses.
    pub fn with_transport(transport: Arc<dyn ApiTransport>, cache: ResponseCache) -> Self {
        Self {
            transport,
            cache,
            tracker: FailureTracker::new(),
            retry: RwLock::new(RetryPolicy::default()),
        }
    }

    /// Replaces the retry schedule. Takes effect on the next call; an
    /// in-flight retry cycle keeps the policy it started with.
    pub fn update_retry_settings(&self, attempts: u32, wait: Duration) {
        let mut retry = self.retry.write().unwrap_or_else(|p| p.into_inner());
        *retry = RetryPolicy::new(attempts, wait);
    }

    fn retry_policy(&self) -> RetryPolicy {
        *self.retry.read().unwrap_or_else(|p| p.into_inner())
    }

    /// Runs one logical request: skip check, retries, outcome recording.
    ///
    /// Exactly one success or failure lands on the tracker per call, no
    /// matter how many attempts the retry policy spends.
    async fn fetch_resource<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Option<T> {
        if self.tracker.should_skip() {
            tracing::debug!(path, "skipping request while paused");
            return None;
        }

        let policy = self.retry_policy();
        let outcome = policy
            .run(|| async move {
                let value = self.transport.get_json(path, query).await?;
                serde_json::from_value::<T>(value).map_err(|e| {
                    FetchError::InvalidResponse(format!("unexpected response shape: {e}"))
                })
            })
            .await;

        match outcome {
            Ok(payload) => {
                self.tracker.record_success();
                Some(payload)
            }
            Err(err) => {
                tracing::warn!(path, error = %err, "request failed");
                self.tracker.record_failure(err.to_string());
                None
            }
        }
    }

    /// Returns the full coin list, serving a day-old copy from disk when one
    /// exists. Falls back to a built-in minimal list so callers never see an
    /// empty result; fallbacks and empty downloads are never cached.
    pub async fn get_coin_list(&self) -> Vec<Coin> {
        if let Some(coins) = self
            .cache
            .get::<Vec<Coin>>(CACHE_KEY_COIN_LIST)
            .filter(|coins| !coins.is_empty())
        {
            return coins;
        }

        match self
            .fetch_resource::<Vec<Coin>>(COINS_LIST_ENDPOINT, &[])
            .await
        {
            Some(coins) if !coins.is_empty() => {
                self.cache.put(CACHE_KEY_COIN_LIST, &coins);
                coins
            }
            _ => {
                tracing::warn!("coin list unavailable, using built-in defaults");
                fallback_coins()
            }
        }
    }

    /// Returns the currencies prices can be quoted in, cache-first with a
    /// built-in fallback of the common fiats.
    pub async fn get_supported_currencies(&self) -> Vec<String> {
        if let Some(currencies) = self
            .cache
            .get::<Vec<String>>(CACHE_KEY_SUPPORTED_CURRENCIES)
            .filter(|currencies| !currencies.is_empty())
        {
            return currencies;
        }

        match self
            .fetch_resource::<Vec<String>>(SUPPORTED_CURRENCIES_ENDPOINT, &[])
            .await
        {
            Some(currencies) if !currencies.is_empty() => {
                self.cache.put(CACHE_KEY_SUPPORTED_CURRENCIES, &currencies);
                currencies
            }
            _ => {
                tracing::warn!("currency list unavailable, using built-in defaults");
                FALLBACK_CURRENCIES.iter().map(|c| c.to_string()).collect()
            }
        }
    }

    /// Fetches spot prices for the given symbols in a single request.
    ///
    /// Returns a map from lowercase symbol to price. Symbols the coin list
    /// cannot resolve and entries the provider omits are simply absent; a
    /// skipped or failed request yields an empty map.
    pub async fn get_prices(
        &self,
        symbols: &[String],
        vs_currency: &str,
    ) -> HashMap<String, f64> {
        if symbols.is_empty() {
            return HashMap::new();
        }
        if self.tracker.should_skip() {
            return HashMap::new();
        }

        let coins = self.get_coin_list().await;
        let index = SymbolIndex::from_coins(&coins);
        let resolved = index.resolve(symbols);
        if resolved.is_empty() {
            return HashMap::new();
        }

        let currency = vs_currency.to_lowercase();
        let ids = resolved
            .iter()
            .map(|(id, _)| id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let query = vec![
            ("ids".to_string(), ids),
            ("vs_currencies".to_string(), currency.clone()),
        ];

        let Some(payload) = self
            .fetch_resource::<Value>(SIMPLE_PRICE_ENDPOINT, &query)
            .await
        else {
            return HashMap::new();
        };

        let mut prices = HashMap::new();
        for (id, symbol) in resolved {
            if let Some(price) = payload
                .get(&id)
                .and_then(|entry| entry.get(&currency))
                .and_then(Value::as_f64)
            {
                prices.insert(symbol, price);
            }
        }
        prices
    }

    /// Fetches the price of a single symbol.
    pub async fn get_price(&self, symbol: &str, vs_currency: &str) -> Option<f64> {
        let symbols = [symbol.to_string()];
        let prices = self.get_prices(&symbols, vs_currency).await;
        prices.get(&symbol.to_lowercase()).copied()
    }

    /// Stops outbound calls until [`CoinGeckoClient::resume`].
    pub fn pause(&self) {
        self.tracker.pause();
    }

    /// Clears any manual pause and auto-pause window and resets the failure
    /// count.
    pub fn resume(&self) {
        self.tracker.resume();
    }

    /// True while calls are being skipped, whether from a manual pause or an
    /// active auto-pause window.
    pub fn is_paused(&self) -> bool {
        self.tracker.should_skip()
    }

    /// Current failure-tracking state.
    pub fn state(&self) -> ApiStateSnapshot {
        self.tracker.snapshot()
    }

    /// Subscribes to state-change snapshots, one per recorded outcome and
    /// pause/resume.
    pub fn subscribe(&self) -> broadcast::Receiver<ApiStateSnapshot> {
        self.tracker.subscribe()
    }

    /// Message from the most recent failure, if any.
    pub fn last_error(&self) -> Option<String> {
        self.tracker.last_error()
    }

    /// Time left on the auto-pause window, if one has been armed.
    pub fn auto_resume_remaining(&self) -> Option<Duration> {
        self.tracker.auto_resume_remaining()
    }
}
