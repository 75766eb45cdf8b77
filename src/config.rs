//! Persisted user settings
//!
//! Only the fields the price pipeline consumes live here; appearance and
//! window placement belong to the embedding application. Loading is
//! forgiving: unknown fields are ignored, a missing or corrupt file falls
//! back to defaults, and the legacy `crypto_id` field is migrated in place.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::alerts::AlertDirection;
use crate::constants::{
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_WAIT_SECS, DEFAULT_UPDATE_INTERVAL_SECS,
};
use crate::error::SettingsError;

/// Ticker configuration persisted as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Main tracked symbol
    pub crypto_symbol: String,
    /// Currency prices are quoted in
    pub vs_currency: String,
    /// Extra symbols fetched alongside the main one
    pub secondary_cryptos: Vec<String>,
    /// Seconds between refresh cycles; keep at 60 or above to stay inside
    /// the provider's free-tier rate limit
    pub update_interval: u64,
    /// Total request attempts per call
    pub retry_attempts: u32,
    /// Seconds between attempts
    pub retry_wait: u64,
    /// Master switch for price-move alerts
    pub notifications_enabled: bool,
    /// Move size that triggers an alert, in percent
    pub notification_threshold: f64,
    /// Which direction of move should alert
    pub notification_direction: AlertDirection,
    /// Minimum minutes between alerts
    pub notification_cooldown: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            crypto_symbol: "btc".to_string(),
            vs_currency: "usd".to_string(),
            secondary_cryptos: Vec::new(),
            update_interval: DEFAULT_UPDATE_INTERVAL_SECS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_wait: DEFAULT_RETRY_WAIT_SECS,
            notifications_enabled: false,
            notification_threshold: 5.0,
            notification_direction: AlertDirection::Both,
            notification_cooldown: 1,
        }
    }
}

/// Earlier releases stored the tracked coin as a provider id under
/// `crypto_id`. Map the well-known ids to symbols; anything else falls back
/// to bitcoin.
fn migrate_legacy_fields(value: &mut Value) {
    let Some(object) = value.as_object_mut() else {
        return;
    };

    if let Some(old_id) = object.remove("crypto_id") {
        let symbol = old_id
            .as_str()
            .and_then(legacy_id_to_symbol)
            .unwrap_or("btc");
        object.insert(
            "crypto_symbol".to_string(),
            Value::String(symbol.to_string()),
        );
    }
}

fn legacy_id_to_symbol(id: &str) -> Option<&'static str> {
    match id {
        "bitcoin" => Some("btc"),
        "ethereum" => Some("eth"),
        "solana" => Some("sol"),
        "cardano" => Some("ada"),
        "dogecoin" => Some("doge"),
        "ripple" => Some("xrp"),
        "polkadot" => Some("dot"),
        "avalanche-2" => Some("avax"),
        _ => None,
    }
}

impl Settings {
    /// Default settings file location for desktop platforms.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "ticker-price-sdk")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Loads settings from `path`. A missing file yields defaults silently;
    /// anything unreadable is logged and also yields defaults, so callers
    /// always get a working configuration.
    pub fn load(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read settings, using defaults");
                return Self::default();
            }
        };

        let mut value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "settings file is not valid JSON, using defaults");
                return Self::default();
            }
        };

        migrate_legacy_fields(&mut value);

        match serde_json::from_value(value) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "settings file has invalid values, using defaults");
                Self::default()
            }
        }
    }

    /// Writes settings as pretty-printed JSON, creating parent directories
    /// as needed.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(self)?;
        fs::write(path, body)?;
        Ok(())
    }

    /// Retry wait as a [`Duration`], for
    /// [`crate::client::CoinGeckoClient::update_retry_settings`].
    pub fn retry_wait_duration(&self) -> Duration {
        Duration::from_secs(self.retry_wait)
    }

    /// Refresh interval as a [`Duration`].
    pub fn update_interval_duration(&self) -> Duration {
        Duration::from_secs(self.update_interval)
    }

    /// Alert cooldown as a [`Duration`].
    pub fn notification_cooldown_duration(&self) -> Duration {
        Duration::from_secs(self.notification_cooldown * 60)
    }
}
