use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Side of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Buying shares
    Buy,
    /// Selling shares
    Sell,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Buy => write!(f, "Buy"),
            TransactionType::Sell => write!(f, "Sell"),
        }
    }
}

/// Sort order for transaction listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionSortOrder {
    /// Newest date first (default for display)
    DateDesc,
    /// Oldest date first
    DateAsc,
    /// Largest quantity first
    QuantityDesc,
    /// Smallest quantity first
    QuantityAsc,
    /// Alphabetical by ticker
    TickerAsc,
    /// Reverse alphabetical by ticker
    TickerDesc,
}

/// Optional filter for transaction listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Only transactions for this ticker (case-insensitive)
    pub ticker: Option<String>,
    /// Only transactions of this type
    pub kind: Option<TransactionType>,
}

/// A single buy/sell transaction in the ledger.
///
/// Transactions record the executed price per share, so cost basis never
/// needs a price lookup. Quantities may be fractional.
///
/// **Note on precision**: quantities and prices are stored as `f64`, which
/// has ~15-17 significant decimal digits. For a single-user ledger this is
/// plenty, but repeated arithmetic may accumulate small floating-point
/// errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: Uuid,

    /// Buy or Sell
    pub kind: TransactionType,

    /// Ticker symbol, uppercased (e.g., "AAPL", "MSFT")
    pub ticker: String,

    /// Number of shares (always positive; fractional shares allowed)
    pub quantity: f64,

    /// Executed price per share (always positive)
    pub price_per_share: f64,

    /// Date of the transaction (no time component — daily granularity)
    pub date: NaiveDate,

    /// Optional free-text notes (e.g., broker, reason, memo)
    #[serde(default)]
    pub notes: Option<String>,
}

impl Transaction {
    pub fn new(
        kind: TransactionType,
        ticker: impl Into<String>,
        quantity: f64,
        price_per_share: f64,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            ticker: ticker.into().trim().to_uppercase(),
            quantity,
            price_per_share,
            date,
            notes: None,
        }
    }

    /// Create a transaction with notes attached.
    pub fn with_notes(
        kind: TransactionType,
        ticker: impl Into<String>,
        quantity: f64,
        price_per_share: f64,
        date: NaiveDate,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            notes: Some(notes.into()),
            ..Self::new(kind, ticker, quantity, price_per_share, date)
        }
    }

    /// Cash moved by this transaction (quantity × price per share).
    #[must_use]
    pub fn gross_amount(&self) -> f64 {
        self.quantity * self.price_per_share
    }
}
