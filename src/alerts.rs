//! Price-move alert detection
//!
//! Compares each price update against a reference price and produces an
//! alert when the move crosses the configured threshold. A cooldown keeps a
//! volatile market from turning into a notification storm; while it is
//! active the reference stays pinned, so the move keeps accumulating until
//! it can be reported.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::Settings;

/// Which direction of price move should alert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertDirection {
    Up,
    Down,
    #[default]
    Both,
}

/// A triggered alert, ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct PriceAlert {
    pub symbol: String,
    pub price: f64,
    pub change_percent: f64,
    /// Notification title, e.g. `BTC Price Alert`
    pub title: String,
    /// Notification body, e.g. `$53,000.00 (+6.00%)`
    pub message: String,
}

/// Renders `50000.0` as `50,000.00`, grouping the integer digits the way the
/// desktop notification shows prices.
fn format_price(price: f64) -> String {
    let formatted = format!("{:.2}", price.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some(parts) => parts,
        None => (formatted.as_str(), "00"),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if price < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

/// Detects threshold-crossing moves between consecutive price updates
///
/// One tracker per watched symbol; feed it every update for that symbol.
#[derive(Debug, Default)]
pub struct AlertTracker {
    last_price: Option<f64>,
    last_alert_at: Option<Instant>,
}

impl AlertTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one price update through the alert rules.
    ///
    /// The first usable update only seeds the reference price. Later updates
    /// alert when the percentage move from the reference meets the
    /// threshold, survives the direction filter, and the cooldown has
    /// passed. Sub-threshold and filtered moves advance the reference; a
    /// cooldown rejection does not.
    pub fn check(&mut self, settings: &Settings, symbol: &str, price: f64) -> Option<PriceAlert> {
        if !settings.notifications_enabled {
            return None;
        }

        let Some(last) = self.last_price.filter(|p| *p != 0.0) else {
            self.last_price = Some(price);
            return None;
        };

        let change_percent = (price - last) / last * 100.0;

        if change_percent.abs() < settings.notification_threshold {
            self.last_price = Some(price);
            return None;
        }

        let filtered_out = match settings.notification_direction {
            AlertDirection::Up => change_percent < 0.0,
            AlertDirection::Down => change_percent > 0.0,
            AlertDirection::Both => false,
        };
        if filtered_out {
            self.last_price = Some(price);
            return None;
        }

        if let Some(last_alert) = self.last_alert_at {
            if last_alert.elapsed() < settings.notification_cooldown_duration() {
                return None;
            }
        }

        self.last_price = Some(price);
        self.last_alert_at = Some(Instant::now());

        let sign = if change_percent > 0.0 { "+" } else { "" };
        Some(PriceAlert {
            symbol: symbol.to_string(),
            price,
            change_percent,
            title: format!("{} Price Alert", symbol.to_uppercase()),
            message: format!("${} ({sign}{change_percent:.2}%)", format_price(price)),
        })
    }

    /// Clears the reference price. Call when the tracked symbol changes so
    /// the first price of the new coin does not read as a move.
    pub fn reset(&mut self) {
        self.last_price = None;
    }
}
