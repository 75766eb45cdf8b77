//! Symbol to CoinGecko id resolution
//!
//! The API keys its price endpoints by coin id (`bitcoin`) while ticker
//! configuration speaks in symbols (`btc`). The index is rebuilt from each
//! coin-list download and resolves case-insensitively.

use std::collections::{HashMap, HashSet};

use crate::types::Coin;

/// Lookup table from lowercase symbol to coin id
///
/// When several coins share a symbol, the one listed last wins.
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    by_symbol: HashMap<String, String>,
}

impl SymbolIndex {
    /// Builds an index over a coin-list download.
    pub fn from_coins(coins: &[Coin]) -> Self {
        let mut by_symbol = HashMap::with_capacity(coins.len());
        for coin in coins {
            by_symbol.insert(coin.symbol.to_lowercase(), coin.id.clone());
        }
        Self { by_symbol }
    }

    /// Looks up the coin id for a symbol, ignoring case.
    pub fn get(&self, symbol: &str) -> Option<&str> {
        self.by_symbol
            .get(&symbol.to_lowercase())
            .map(String::as_str)
    }

    /// Number of distinct symbols in the index.
    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }

    /// Resolves requested symbols to `(coin_id, symbol)` pairs.
    ///
    /// Request order is preserved, repeated symbols resolve once, and
    /// symbols missing from the index are dropped with a warning. Returned
    /// symbols are normalized to lowercase.
    pub fn resolve(&self, symbols: &[String]) -> Vec<(String, String)> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(symbols.len());

        for raw in symbols {
            let symbol = raw.to_lowercase();
            if !seen.insert(symbol.clone()) {
                continue;
            }
            match self.by_symbol.get(&symbol) {
                Some(id) => resolved.push((id.clone(), symbol)),
                None => tracing::warn!(%symbol, "symbol not in coin list, skipping"),
            }
        }

        resolved
    }
}
