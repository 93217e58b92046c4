use serde::{Deserialize, Serialize};

/// A derived per-ticker position. Recomputed from the full ledger on every
/// query, never persisted.
///
/// Uses the average-cost-basis accounting method: all shares of a ticker
/// share one blended cost, recalculated on every buy and apportioned on
/// every sell. Lot-level (FIFO/LIFO) tax reporting is out of scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Ticker symbol, uppercased
    pub ticker: String,

    /// Net shares held (buys minus sells)
    pub quantity: f64,

    /// Cost attributed to the currently-held shares
    pub total_cost: f64,

    /// total_cost / quantity when quantity > 0, else 0
    pub avg_cost_basis: f64,
}

impl Holding {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            quantity: 0.0,
            total_cost: 0.0,
            avg_cost_basis: 0.0,
        }
    }
}
