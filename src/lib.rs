//! # Ticker Price SDK
//!
//! Resilient CoinGecko price data for desktop cryptocurrency ticker widgets:
//! cached coin metadata, retried price fetches, and an auto-pausing failure
//! tracker that keeps a flaky network from hammering the API.
//!
//! Responses that rarely change (the coin list, the supported currencies)
//! are cached on disk for a day. Every outbound call runs through a
//! configurable retry policy, and after ten consecutive failures the client
//! pauses itself for thirty minutes.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use ticker_price_sdk::{CoinGeckoClient, PriceWorker, Settings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load(&Settings::default_path().unwrap());
//! let interval = settings.update_interval_duration();
//!
//! let client = Arc::new(CoinGeckoClient::new("/tmp/ticker-cache")?);
//! client.update_retry_settings(settings.retry_attempts, settings.retry_wait_duration());
//!
//! // One-off lookup
//! if let Some(price) = client
//!     .get_price(&settings.crypto_symbol, &settings.vs_currency)
//!     .await
//! {
//!     println!("{}: {:.2} {}", settings.crypto_symbol, price, settings.vs_currency);
//! }
//!
//! // Or a periodic worker delivering events
//! let (worker, mut events) = PriceWorker::new(client);
//! worker.set_config(
//!     settings.crypto_symbol,
//!     settings.vs_currency,
//!     settings.secondary_cryptos,
//! );
//! let _handle = Arc::new(worker).spawn_periodic(interval);
//! while let Some(event) = events.recv().await {
//!     println!("{event}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod cache;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod retry;
pub mod state;
pub mod symbols;
pub mod transport;
pub mod types;
pub mod worker;

// Re-export commonly used types
pub use alerts::{AlertDirection, AlertTracker, PriceAlert};
pub use cache::ResponseCache;
pub use client::CoinGeckoClient;
pub use config::Settings;
pub use error::{FetchError, SettingsError};
pub use retry::RetryPolicy;
pub use state::{ApiStateSnapshot, FailureTracker};
pub use symbols::SymbolIndex;
pub use transport::{ApiTransport, HttpTransport};
pub use types::{Coin, TickerEvent};
pub use worker::{PriceWorker, WorkerHandle};
