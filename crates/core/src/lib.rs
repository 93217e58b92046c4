pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::NaiveDate;
use std::collections::HashMap;

use models::{
    analytics::{AllocationEntry, BatchQuotes, PortfolioSummary},
    holding::Holding,
    performance::PerformancePoint,
    portfolio::Portfolio,
    settings::{ProviderKind, Settings},
    transaction::{Transaction, TransactionFilter, TransactionSortOrder, TransactionType},
};
use providers::{build_provider, traits::PriceProvider};
use services::{
    analytics_service::AnalyticsService, performance_service::PerformanceService,
    portfolio_service::PortfolioService, price_service::PriceService,
};
use storage::manager::StorageManager;

use errors::CoreError;

/// Main entry point for the Portfolio Tracker core library.
/// Holds the portfolio state and all services needed to operate on it.
#[must_use]
pub struct PortfolioTracker {
    portfolio: Portfolio,
    portfolio_service: PortfolioService,
    price_service: PriceService,
    performance_service: PerformanceService,
    analytics_service: AnalyticsService,
    /// Tracks whether any mutation has occurred since the last save/load.
    dirty: bool,
}

impl std::fmt::Debug for PortfolioTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker")
            .field("transactions", &self.portfolio.transactions.len())
            .field("settings", &self.portfolio.settings)
            .field("cached_quotes", &self.portfolio.price_cache.quote_count())
            .field("cached_closes", &self.portfolio.price_cache.total_closes())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl PortfolioTracker {
    /// Create a brand new empty portfolio with default settings.
    /// Fails only if the configured provider cannot be constructed.
    pub fn create_new() -> Result<Self, CoreError> {
        Self::build(Portfolio::default())
    }

    /// Create an empty portfolio around an externally supplied provider.
    /// The injection seam for tests and embedders with their own upstream.
    pub fn with_provider(provider: Box<dyn PriceProvider>) -> Self {
        let portfolio = Portfolio::default();
        let price_service = PriceService::new(provider, &portfolio.settings);
        Self::assemble(portfolio, price_service)
    }

    /// Load an existing portfolio from raw bytes.
    /// Use this where the frontend handles file I/O itself.
    pub fn load_from_bytes(data: &[u8]) -> Result<Self, CoreError> {
        let portfolio = StorageManager::load_from_bytes(data)?;
        Self::build(portfolio)
    }

    /// Save the current portfolio to raw bytes the caller can persist.
    /// Clears the unsaved-changes flag on success.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, CoreError> {
        let bytes = StorageManager::save_to_bytes(&self.portfolio)?;
        self.dirty = false;
        Ok(bytes)
    }

    /// Load a portfolio from a file on disk.
    pub fn load_from_file(path: &str) -> Result<Self, CoreError> {
        let portfolio = StorageManager::load_from_file(path)?;
        Self::build(portfolio)
    }

    /// Save the portfolio to a file on disk.
    /// Clears the unsaved-changes flag on success.
    pub fn save_to_file(&mut self, path: &str) -> Result<(), CoreError> {
        StorageManager::save_to_file(&self.portfolio, path)?;
        self.dirty = false;
        Ok(())
    }

    fn build(portfolio: Portfolio) -> Result<Self, CoreError> {
        let provider = build_provider(&portfolio.settings)?;
        let price_service = PriceService::new(provider, &portfolio.settings);
        Ok(Self::assemble(portfolio, price_service))
    }

    fn assemble(portfolio: Portfolio, price_service: PriceService) -> Self {
        Self {
            portfolio,
            portfolio_service: PortfolioService::new(),
            price_service,
            performance_service: PerformanceService::new(),
            analytics_service: AnalyticsService::new(),
            dirty: false,
        }
    }

    // ── Transaction Management ──────────────────────────────────────

    /// Record a buy/sell transaction in the ledger.
    pub fn add_transaction(
        &mut self,
        kind: TransactionType,
        ticker: impl Into<String>,
        quantity: f64,
        price_per_share: f64,
        date: NaiveDate,
    ) -> Result<uuid::Uuid, CoreError> {
        let tx = Transaction::new(kind, ticker, quantity, price_per_share, date);
        let id = tx.id;
        self.portfolio_service
            .add_transaction(&mut self.portfolio, tx)?;
        self.dirty = true;
        Ok(id)
    }

    /// Record a buy/sell transaction with notes attached.
    #[allow(clippy::too_many_arguments)]
    pub fn add_transaction_with_notes(
        &mut self,
        kind: TransactionType,
        ticker: impl Into<String>,
        quantity: f64,
        price_per_share: f64,
        date: NaiveDate,
        notes: impl Into<String>,
    ) -> Result<uuid::Uuid, CoreError> {
        let tx = Transaction::with_notes(kind, ticker, quantity, price_per_share, date, notes);
        let id = tx.id;
        self.portfolio_service
            .add_transaction(&mut self.portfolio, tx)?;
        self.dirty = true;
        Ok(id)
    }

    /// Remove a transaction by its ID. Returns the removed transaction.
    pub fn remove_transaction(&mut self, id: uuid::Uuid) -> Result<Transaction, CoreError> {
        let removed = self
            .portfolio_service
            .remove_transaction(&mut self.portfolio, id)?;
        self.dirty = true;
        Ok(removed)
    }

    /// Update an existing transaction by its ID.
    /// Validates the updated transaction before committing.
    #[allow(clippy::too_many_arguments)]
    pub fn update_transaction(
        &mut self,
        id: uuid::Uuid,
        kind: TransactionType,
        ticker: impl Into<String>,
        quantity: f64,
        price_per_share: f64,
        date: NaiveDate,
    ) -> Result<(), CoreError> {
        self.portfolio_service.update_transaction(
            &mut self.portfolio,
            id,
            kind,
            ticker,
            quantity,
            price_per_share,
            date,
        )?;
        self.dirty = true;
        Ok(())
    }

    /// Set or clear notes on an existing transaction.
    pub fn set_transaction_notes(
        &mut self,
        id: uuid::Uuid,
        notes: Option<String>,
    ) -> Result<(), CoreError> {
        self.portfolio_service
            .set_notes(&mut self.portfolio, id, notes)?;
        self.dirty = true;
        Ok(())
    }

    /// Get a single transaction by its ID.
    #[must_use]
    pub fn get_transaction(&self, id: uuid::Uuid) -> Option<&Transaction> {
        self.portfolio.transactions.iter().find(|t| t.id == id)
    }

    /// List transactions, optionally filtered and sorted.
    /// Defaults to newest-first.
    #[must_use]
    pub fn list_transactions(
        &self,
        filter: &TransactionFilter,
        order: Option<&TransactionSortOrder>,
    ) -> Vec<&Transaction> {
        self.portfolio_service
            .list_transactions(&self.portfolio, filter, order)
    }

    /// Number of transactions in the ledger.
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.portfolio.transactions.len()
    }

    // ── Holdings & Analytics ────────────────────────────────────────

    /// Current per-ticker positions from the full ledger fold.
    /// Closed and oversold positions are absent.
    #[must_use]
    pub fn get_holdings(&self) -> HashMap<String, Holding> {
        self.portfolio_service.compute_holdings(&self.portfolio)
    }

    /// Full portfolio summary: market values, cost basis, gain/loss, and
    /// any per-ticker price failures (non-fatal).
    pub async fn get_summary(&mut self) -> Result<PortfolioSummary, CoreError> {
        // Temporarily take price_cache out of portfolio to satisfy the
        // borrow checker: the service needs &Portfolio and &mut PriceCache,
        // and the cache lives inside the portfolio.
        let mut price_cache = std::mem::take(&mut self.portfolio.price_cache);

        let result = self
            .analytics_service
            .get_summary(&self.portfolio, &self.price_service, &mut price_cache)
            .await;

        self.portfolio.price_cache = price_cache;
        result
    }

    /// Percentage-of-portfolio breakdown, descending by market value.
    pub async fn get_allocation(&mut self) -> Result<Vec<AllocationEntry>, CoreError> {
        let mut price_cache = std::mem::take(&mut self.portfolio.price_cache);

        let result = self
            .analytics_service
            .get_allocation(&self.portfolio, &self.price_service, &mut price_cache)
            .await;

        self.portfolio.price_cache = price_cache;
        result
    }

    /// The daily value-vs-invested series from the first transaction
    /// through today, with the last point priced live.
    pub async fn get_performance(&mut self) -> Result<Vec<PerformancePoint>, CoreError> {
        let mut price_cache = std::mem::take(&mut self.portfolio.price_cache);

        let result = self
            .performance_service
            .compute_performance(&self.portfolio, &self.price_service, &mut price_cache)
            .await;

        self.portfolio.price_cache = price_cache;
        result
    }

    // ── Prices ──────────────────────────────────────────────────────

    /// Current price of a ticker, served from the quote cache within its
    /// TTL unless `force_refresh` is set.
    pub async fn get_price(&mut self, ticker: &str, force_refresh: bool) -> Result<f64, CoreError> {
        self.price_service
            .get_quote(&mut self.portfolio.price_cache, ticker, force_refresh)
            .await
    }

    /// Current prices for several tickers at once; per-ticker failures are
    /// reported alongside the successes, never instead of them.
    pub async fn get_batch_prices(&mut self, tickers: &[String]) -> BatchQuotes {
        self.price_service
            .get_batch_quotes(&mut self.portfolio.price_cache, tickers)
            .await
    }

    /// Close of a ticker on a date (nearest prior trading day within the
    /// 10-day lookback window).
    pub async fn get_historical_price(
        &mut self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<f64, CoreError> {
        self.price_service
            .get_historical_price(&mut self.portfolio.price_cache, ticker, date)
            .await
    }

    // ── Cache Management ────────────────────────────────────────────

    /// Total number of cached historical closes.
    #[must_use]
    pub fn cache_total_closes(&self) -> usize {
        self.portfolio.price_cache.total_closes()
    }

    /// Number of tickers with a cached current quote.
    #[must_use]
    pub fn cache_quote_count(&self) -> usize {
        self.portfolio.price_cache.quote_count()
    }

    /// Remove all cached closes older than `before`.
    /// Returns the number of entries removed.
    pub fn cache_prune_before(&mut self, before: NaiveDate) -> usize {
        let removed = self.portfolio.price_cache.prune_before(before);
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Clear all cached price data.
    pub fn cache_clear(&mut self) {
        self.portfolio.price_cache.clear();
        self.dirty = true;
    }

    // ── Settings ────────────────────────────────────────────────────

    /// Current settings.
    #[must_use]
    pub fn get_settings(&self) -> &Settings {
        &self.portfolio.settings
    }

    /// Switch the active upstream provider.
    /// Rebuilds the price service so the change takes effect immediately.
    pub fn set_provider(&mut self, kind: ProviderKind) -> Result<(), CoreError> {
        let previous = self.portfolio.settings.provider;
        self.portfolio.settings.provider = kind;

        match build_provider(&self.portfolio.settings) {
            Ok(provider) => {
                self.price_service = PriceService::new(provider, &self.portfolio.settings);
                self.dirty = true;
                Ok(())
            }
            Err(e) => {
                self.portfolio.settings.provider = previous;
                Err(e)
            }
        }
    }

    /// Set an API key for a provider (e.g., "alphavantage").
    /// Rebuilds the price service so the new key takes effect immediately.
    pub fn set_api_key(&mut self, provider: String, key: String) -> Result<(), CoreError> {
        self.portfolio.settings.api_keys.insert(provider, key);
        let provider = build_provider(&self.portfolio.settings)?;
        self.price_service = PriceService::new(provider, &self.portfolio.settings);
        self.dirty = true;
        Ok(())
    }

    /// Remove an API key. Fails if the active provider still needs it.
    pub fn remove_api_key(&mut self, provider: &str) -> Result<bool, CoreError> {
        let Some(key) = self.portfolio.settings.api_keys.remove(provider) else {
            return Ok(false);
        };

        match build_provider(&self.portfolio.settings) {
            Ok(p) => {
                self.price_service = PriceService::new(p, &self.portfolio.settings);
                self.dirty = true;
                Ok(true)
            }
            Err(e) => {
                self.portfolio
                    .settings
                    .api_keys
                    .insert(provider.to_string(), key);
                Err(e)
            }
        }
    }

    /// Change how long cached quotes stay valid.
    pub fn set_quote_ttl_minutes(&mut self, minutes: u32) {
        self.portfolio.settings.quote_ttl_minutes = minutes;
        self.price_service.set_quote_ttl_minutes(minutes);
        self.dirty = true;
    }

    /// Change the pause between upstream calls in a batch fetch.
    pub fn set_batch_delay_ms(&mut self, millis: u64) {
        self.portfolio.settings.batch_delay_ms = millis;
        self.price_service.set_batch_delay_ms(millis);
        self.dirty = true;
    }

    // ── Dirty State ─────────────────────────────────────────────────

    /// Whether there are unsaved changes.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }
}
