use serde::{Deserialize, Serialize};

use super::price::PriceCache;
use super::settings::Settings;
use super::transaction::Transaction;

/// The main data container. Everything in here gets serialized and saved
/// to the portable portfolio file.
///
/// Contains: the transaction ledger (kept sorted ascending by date), user
/// settings, and the price cache (so historical closes are available
/// offline).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    /// All buy/sell transactions, oldest first
    pub transactions: Vec<Transaction>,

    /// User settings (active provider, API keys, cache tuning)
    pub settings: Settings,

    /// Cached quotes and historical closes — once a historical close is
    /// fetched, it's stored here permanently.
    pub price_cache: PriceCache,
}

impl Default for Portfolio {
    fn default() -> Self {
        Self {
            transactions: Vec::new(),
            settings: Settings::default(),
            price_cache: PriceCache::new(),
        }
    }
}
