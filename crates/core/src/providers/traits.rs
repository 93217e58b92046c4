use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::price::PricePoint;

/// How many calendar days a historical lookup walks backward to find the
/// nearest prior trading day's close (weekends, holidays, data gaps).
pub const HISTORICAL_LOOKBACK_DAYS: i64 = 10;

/// Trait abstraction over the upstream quote services.
///
/// Exactly one implementation is active per deployment (see
/// [`build_provider`](super::build_provider)). If an API stops working or
/// changes, we replace only that one implementation — the rest of the
/// codebase is untouched.
///
/// Implementations normalize every upstream failure into the
/// `InvalidTicker` / `RateLimited` / `UpstreamUnavailable` /
/// `PriceNotFound` taxonomy and perform no caching of their own.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Get the current (latest) price of a ticker.
    async fn fetch_current_price(&self, ticker: &str) -> Result<f64, CoreError>;

    /// Get the close of a ticker on a specific date.
    ///
    /// If the exact date has no close (non-trading day), walks backward
    /// up to [`HISTORICAL_LOOKBACK_DAYS`] calendar days and returns the
    /// nearest prior close; fails with `PriceNotFound` naming the ticker
    /// and the searched range if the whole window is empty.
    async fn fetch_historical_price(&self, ticker: &str, date: NaiveDate)
        -> Result<f64, CoreError>;

    /// Get daily closes for a date range (inclusive), sorted by date.
    async fn fetch_price_range(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError>;
}
