//! Types for the ticker price SDK

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One row of the provider's coin listing
///
/// Symbols are not unique across the listing; resolution picks the last
/// occurrence (see [`crate::symbols::SymbolIndex`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Provider-internal identifier (e.g. "bitcoin")
    pub id: String,

    /// Ticker symbol (e.g. "btc")
    pub symbol: String,

    /// Human-readable name
    pub name: String,
}

impl Coin {
    /// Create a coin listing row
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

/// Events delivered by the price worker to the UI layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TickerEvent {
    /// The main price was fetched
    PriceUpdated {
        id: Uuid,
        symbol: String,
        price: f64,
        currency: String,
        timestamp: DateTime<Utc>,
    },

    /// Secondary prices were fetched
    SecondaryPricesUpdated {
        id: Uuid,
        prices: HashMap<String, f64>,
        currency: String,
        timestamp: DateTime<Utc>,
    },

    /// A fetch concluded without data
    FetchFailed {
        id: Uuid,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl TickerEvent {
    /// Get the event ID
    pub fn id(&self) -> Uuid {
        match self {
            TickerEvent::PriceUpdated { id, .. } => *id,
            TickerEvent::SecondaryPricesUpdated { id, .. } => *id,
            TickerEvent::FetchFailed { id, .. } => *id,
        }
    }

    /// Get the event type as string
    pub fn event_type(&self) -> &'static str {
        match self {
            TickerEvent::PriceUpdated { .. } => "PRICE_UPDATED",
            TickerEvent::SecondaryPricesUpdated { .. } => "SECONDARY_PRICES_UPDATED",
            TickerEvent::FetchFailed { .. } => "FETCH_FAILED",
        }
    }
}

impl std::fmt::Display for TickerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TickerEvent::PriceUpdated {
                symbol,
                price,
                currency,
                ..
            } => {
                write!(f, "Price updated: {} = {:.2} {}", symbol, price, currency)
            }
            TickerEvent::SecondaryPricesUpdated { prices, .. } => {
                write!(f, "Secondary prices updated: {} symbols", prices.len())
            }
            TickerEvent::FetchFailed { message, .. } => {
                write!(f, "Fetch failed: {}", message)
            }
        }
    }
}
