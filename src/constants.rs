//! Constants for the ticker price SDK
//!
//! Provider endpoints, timeouts, and failure-handling thresholds are
//! centralized here. User-adjustable values (retry tuning, update interval)
//! live in [`crate::config::Settings`]; these are their defaults.

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko endpoint for simple price queries
pub const SIMPLE_PRICE_ENDPOINT: &str = "/simple/price";

/// CoinGecko endpoint for the full coin listing
pub const COINS_LIST_ENDPOINT: &str = "/coins/list";

/// CoinGecko endpoint for supported quote currencies
pub const SUPPORTED_CURRENCIES_ENDPOINT: &str = "/simple/supported_vs_currencies";

/// HTTP request timeout per attempt (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "ticker-price-sdk/0.1.0";

/// How long cached provider responses stay valid (in hours)
pub const CACHE_TTL_HOURS: u64 = 24;

/// Cache key for the coin listing
pub const CACHE_KEY_COIN_LIST: &str = "coin_list";

/// Cache key for the supported currency list
pub const CACHE_KEY_SUPPORTED_CURRENCIES: &str = "supported_currencies";

/// Default number of attempts per outbound call
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default wait between attempts (in seconds)
pub const DEFAULT_RETRY_WAIT_SECS: u64 = 5;

/// Consecutive failures before the client auto-pauses
pub const AUTO_PAUSE_FAILURE_THRESHOLD: u32 = 10;

/// How long an auto-pause lasts (in seconds)
pub const AUTO_PAUSE_DURATION_SECS: u64 = 30 * 60;

/// Default interval between scheduled fetches (in seconds)
///
/// Below 60 seconds the free CoinGecko tier rate-limits aggressively.
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 60;

/// Quote currencies returned when the supported-currency fetch fails
pub const FALLBACK_CURRENCIES: &[&str] = &["usd", "eur", "gbp", "jpy", "cad", "aud", "chf", "cny"];

/// Capacity of the event delivery channels (worker events, state broadcasts)
pub const EVENT_CHANNEL_CAPACITY: usize = 32;
