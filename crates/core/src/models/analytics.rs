use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Summary of the entire portfolio at the time of the query.
///
/// Tickers whose current price could not be resolved are omitted from
/// `holdings` and from every total, and named in `price_errors` instead —
/// one failing symbol never fails the whole summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Per-ticker breakdown, priced tickers only
    pub holdings: Vec<HoldingSummary>,

    /// Total market value of the priced holdings
    pub total_value: f64,

    /// Total cost basis of the priced holdings
    pub total_cost: f64,

    /// Absolute gain/loss: total_value - total_cost
    pub total_gain_loss: f64,

    /// Percentage gain/loss: (total_gain_loss / total_cost) * 100
    pub total_gain_loss_percent: f64,

    /// Non-fatal per-ticker price failures: ticker → reason
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub price_errors: HashMap<String, String>,
}

/// Summary of a single held ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingSummary {
    /// Ticker symbol, uppercased
    pub ticker: String,

    /// Net shares held
    pub quantity: f64,

    /// Average cost per share
    pub avg_cost_basis: f64,

    /// Cost basis of the held shares
    pub total_cost: f64,

    /// Current price per share
    pub current_price: f64,

    /// quantity × current_price
    pub market_value: f64,

    /// Absolute gain/loss for this ticker
    pub gain_loss: f64,

    /// Percentage gain/loss for this ticker
    pub gain_loss_percent: f64,
}

/// One slice of the allocation breakdown, ordered by market value
/// descending. Tickers without an available current price are excluded
/// entirely (not shown with value 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    /// Ticker symbol, uppercased
    pub ticker: String,

    /// Net shares held
    pub quantity: f64,

    /// quantity × current_price
    pub market_value: f64,

    /// market_value / total_market_value × 100 (0 when the total is 0)
    pub percentage: f64,
}

/// Result of a batch quote fetch: per-ticker successes and failures,
/// collected independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchQuotes {
    /// ticker → current price
    pub prices: HashMap<String, f64>,

    /// ticker → failure reason for tickers that could not be priced
    pub errors: HashMap<String, String>,
}
