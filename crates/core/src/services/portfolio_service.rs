use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::holding::Holding;
use crate::models::portfolio::Portfolio;
use crate::models::transaction::{
    Transaction, TransactionFilter, TransactionSortOrder, TransactionType,
};

/// Manages the transaction ledger and derives current holdings.
///
/// Pure business logic — no I/O, no API calls. Easy to test.
///
/// Sells are deliberately NOT validated against available holdings: an
/// oversold ticker folds to a non-positive quantity and is filtered out of
/// current holdings downstream instead of being rejected at write time.
pub struct PortfolioService;

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    // ── Ledger CRUD ─────────────────────────────────────────────────

    /// Add a new transaction to the ledger.
    /// Validates shape only (ticker, quantity, price, date).
    pub fn add_transaction(
        &self,
        portfolio: &mut Portfolio,
        tx: Transaction,
    ) -> Result<(), CoreError> {
        Self::validate_transaction(&tx)?;
        Self::sorted_insert(&mut portfolio.transactions, tx);
        Ok(())
    }

    /// Remove a transaction by its UUID.
    pub fn remove_transaction(
        &self,
        portfolio: &mut Portfolio,
        id: Uuid,
    ) -> Result<Transaction, CoreError> {
        let idx = portfolio
            .transactions
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;
        Ok(portfolio.transactions.remove(idx))
    }

    /// Replace the mutable fields of an existing transaction.
    /// Validates the new state before committing; the id and notes survive.
    #[allow(clippy::too_many_arguments)]
    pub fn update_transaction(
        &self,
        portfolio: &mut Portfolio,
        id: Uuid,
        kind: TransactionType,
        ticker: impl Into<String>,
        quantity: f64,
        price_per_share: f64,
        date: NaiveDate,
    ) -> Result<(), CoreError> {
        let idx = portfolio
            .transactions
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;

        let old = portfolio.transactions.remove(idx);

        let updated = Transaction {
            id: old.id,
            kind,
            ticker: ticker.into().trim().to_uppercase(),
            quantity,
            price_per_share,
            date,
            notes: old.notes.clone(),
        };

        if let Err(e) = Self::validate_transaction(&updated) {
            // Rollback: put the old transaction back at its sorted position
            Self::sorted_insert(&mut portfolio.transactions, old);
            return Err(e);
        }

        Self::sorted_insert(&mut portfolio.transactions, updated);
        Ok(())
    }

    /// Set or clear the notes on an existing transaction.
    pub fn set_notes(
        &self,
        portfolio: &mut Portfolio,
        id: Uuid,
        notes: Option<String>,
    ) -> Result<(), CoreError> {
        let tx = portfolio
            .transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;
        tx.notes = notes;
        Ok(())
    }

    /// List transactions with an optional filter and sort order.
    /// Defaults to newest-first when no order is given.
    pub fn list_transactions<'a>(
        &self,
        portfolio: &'a Portfolio,
        filter: &TransactionFilter,
        order: Option<&TransactionSortOrder>,
    ) -> Vec<&'a Transaction> {
        let ticker = filter.ticker.as_ref().map(|t| t.trim().to_uppercase());
        let mut txs: Vec<&Transaction> = portfolio
            .transactions
            .iter()
            .filter(|t| ticker.as_ref().is_none_or(|sym| &t.ticker == sym))
            .filter(|t| filter.kind.is_none_or(|k| t.kind == k))
            .collect();

        match order.unwrap_or(&TransactionSortOrder::DateDesc) {
            TransactionSortOrder::DateAsc => {} // storage order
            TransactionSortOrder::DateDesc => txs.reverse(),
            TransactionSortOrder::QuantityAsc => {
                txs.sort_by(|a, b| a.quantity.total_cmp(&b.quantity));
            }
            TransactionSortOrder::QuantityDesc => {
                txs.sort_by(|a, b| b.quantity.total_cmp(&a.quantity));
            }
            TransactionSortOrder::TickerAsc => txs.sort_by(|a, b| a.ticker.cmp(&b.ticker)),
            TransactionSortOrder::TickerDesc => txs.sort_by(|a, b| b.ticker.cmp(&a.ticker)),
        }
        txs
    }

    // ── Holdings Calculator ─────────────────────────────────────────

    /// Fold the full ledger into current per-ticker positions.
    ///
    /// Single pass in ascending date order (equal dates keep insertion
    /// order). BUY adds shares at the executed price; SELL removes cost
    /// proportional to the running average cost, so a sell never changes
    /// the average cost of the remaining shares.
    ///
    /// Tickers whose final quantity is zero or negative are dropped from
    /// the result — closed positions simply vanish from current holdings.
    /// A strictly negative final quantity means the ledger sold more than
    /// it ever bought; that is logged as a data-integrity warning.
    pub fn compute_holdings(&self, portfolio: &Portfolio) -> HashMap<String, Holding> {
        let mut holdings: HashMap<String, Holding> = HashMap::new();

        for tx in Self::sorted_by_date(portfolio) {
            let holding = holdings
                .entry(tx.ticker.clone())
                .or_insert_with(|| Holding::new(tx.ticker.clone()));

            match tx.kind {
                TransactionType::Buy => {
                    holding.total_cost += tx.quantity * tx.price_per_share;
                    holding.quantity += tx.quantity;
                }
                TransactionType::Sell => {
                    let cost_basis = if holding.quantity > 0.0 {
                        holding.total_cost / holding.quantity
                    } else {
                        0.0
                    };
                    holding.total_cost -= tx.quantity * cost_basis;
                    holding.quantity -= tx.quantity;
                }
            }
        }

        holdings.retain(|ticker, h| {
            if h.quantity < -f64::EPSILON {
                log::warn!(
                    "Dropping oversold position {ticker}: net quantity {:.4} — ledger sells exceed buys",
                    h.quantity
                );
            }
            h.quantity > f64::EPSILON
        });

        for holding in holdings.values_mut() {
            holding.avg_cost_basis = holding.total_cost / holding.quantity;
        }

        holdings
    }

    /// The ledger re-sorted ascending by date, regardless of stored order.
    /// Stable, so same-date transactions keep their insertion order.
    pub fn sorted_by_date(portfolio: &Portfolio) -> Vec<&Transaction> {
        let mut txs: Vec<&Transaction> = portfolio.transactions.iter().collect();
        txs.sort_by_key(|t| t.date);
        txs
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Shape validation only. Oversells are allowed by design.
    fn validate_transaction(tx: &Transaction) -> Result<(), CoreError> {
        if tx.ticker.is_empty() {
            return Err(CoreError::ValidationError(
                "Ticker must not be empty".into(),
            ));
        }
        if !(tx.quantity > 0.0 && tx.quantity.is_finite()) {
            return Err(CoreError::ValidationError(
                "Transaction quantity must be positive".into(),
            ));
        }
        if !(tx.price_per_share > 0.0 && tx.price_per_share.is_finite()) {
            return Err(CoreError::ValidationError(
                "Price per share must be positive".into(),
            ));
        }

        // Allow +1 day tolerance for timezone differences
        let today = Utc::now().date_naive();
        if let Some(tomorrow) = today.succ_opt() {
            if tx.date > tomorrow {
                return Err(CoreError::ValidationError(format!(
                    "Transaction date {} is in the future — prices won't be available",
                    tx.date
                )));
            }
        }

        Ok(())
    }

    /// Insert into the date-sorted ledger in O(log n) + shift.
    /// `partition_point` places equal dates AFTER the existing run, so
    /// same-date transactions stay in insertion order.
    fn sorted_insert(transactions: &mut Vec<Transaction>, tx: Transaction) {
        let pos = transactions.partition_point(|t| t.date <= tx.date);
        transactions.insert(pos, tx);
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}
