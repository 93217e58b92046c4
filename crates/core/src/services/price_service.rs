use chrono::{Duration, NaiveDate, Utc};
use std::collections::BTreeSet;

use crate::errors::CoreError;
use crate::models::analytics::BatchQuotes;
use crate::models::price::{PriceCache, PricePoint};
use crate::models::settings::Settings;
use crate::providers::traits::{PriceProvider, HISTORICAL_LOOKBACK_DAYS};

/// Fetches prices from the one active upstream provider, shielded by the
/// time-boxed quote cache.
///
/// Cache strategy:
/// - **Current quotes**: served from cache while younger than the TTL
///   (default 15 minutes); refreshed through the provider otherwise. When
///   the provider fails and ANY cached entry exists — fresh or stale — the
///   cached price is returned instead of the error.
/// - **Historical closes (date < today)**: fetched once, cached forever.
///   Past closes don't change.
/// - **Batch fetches**: sequential with a fixed inter-request delay. The
///   upstream is rate-limited; batch latency is the price of compliance.
pub struct PriceService {
    provider: Box<dyn PriceProvider>,
    quote_ttl: Duration,
    batch_delay: std::time::Duration,
}

impl PriceService {
    pub fn new(provider: Box<dyn PriceProvider>, settings: &Settings) -> Self {
        Self {
            provider,
            quote_ttl: Duration::minutes(i64::from(settings.quote_ttl_minutes)),
            batch_delay: std::time::Duration::from_millis(settings.batch_delay_ms),
        }
    }

    /// Name of the active provider (for logs/errors).
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Change how long cached quotes stay valid.
    pub fn set_quote_ttl_minutes(&mut self, minutes: u32) {
        self.quote_ttl = Duration::minutes(i64::from(minutes));
    }

    /// Change the pause between upstream calls in a batch fetch.
    pub fn set_batch_delay_ms(&mut self, millis: u64) {
        self.batch_delay = std::time::Duration::from_millis(millis);
    }

    // ── Current quotes ──────────────────────────────────────────────

    /// Get the current price of a ticker.
    ///
    /// 1. Unless `force_refresh`, a cache entry younger than the TTL is
    ///    returned without any provider call.
    /// 2. Otherwise the provider is asked; success upserts the cache.
    /// 3. On provider failure the existing entry — even a stale one — is
    ///    returned; the error only propagates when the cache has nothing.
    pub async fn get_quote(
        &self,
        cache: &mut PriceCache,
        ticker: &str,
        force_refresh: bool,
    ) -> Result<f64, CoreError> {
        let ticker = ticker.trim().to_uppercase();
        let now = Utc::now();

        if !force_refresh && cache.is_quote_fresh(&ticker, now, self.quote_ttl) {
            // `is_quote_fresh` only returns true when an entry exists
            if let Some(entry) = cache.get_quote(&ticker) {
                log::debug!("Quote cache hit for {ticker}");
                return Ok(entry.price);
            }
        }

        // A non-finite or negative price is a provider failure like any
        // other and goes through the same cache fallback.
        let fetched = self
            .provider
            .fetch_current_price(&ticker)
            .await
            .and_then(|price| {
                if price.is_finite() && price >= 0.0 {
                    Ok(price)
                } else {
                    Err(CoreError::UpstreamUnavailable {
                        provider: self.provider.name().to_string(),
                        message: format!("Invalid price returned for {ticker}: {price}"),
                    })
                }
            });

        match fetched {
            Ok(price) => {
                cache.set_quote(&ticker, price, Utc::now());
                Ok(price)
            }
            Err(e) => match cache.get_quote(&ticker) {
                Some(entry) => {
                    log::warn!(
                        "Provider {} failed for {ticker} ({e}); serving cached price from {}",
                        self.provider.name(),
                        entry.last_updated
                    );
                    Ok(entry.price)
                }
                None => Err(e),
            },
        }
    }

    /// Fetch current prices for a set of tickers.
    ///
    /// Tickers are deduplicated and fetched sequentially with a fixed
    /// pause between upstream calls; each ticker succeeds or fails on its
    /// own and one failure never aborts the batch.
    pub async fn get_batch_quotes(&self, cache: &mut PriceCache, tickers: &[String]) -> BatchQuotes {
        // BTreeSet: dedupe + deterministic fetch order
        let unique: BTreeSet<String> = tickers
            .iter()
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();

        let mut batch = BatchQuotes::default();
        let mut first = true;

        for ticker in unique {
            if !first {
                tokio::time::sleep(self.batch_delay).await;
            }
            first = false;

            match self.get_quote(cache, &ticker, false).await {
                Ok(price) => {
                    batch.prices.insert(ticker, price);
                }
                Err(e) => {
                    batch.errors.insert(ticker, e.to_string());
                }
            }
        }

        batch
    }

    // ── Historical closes ───────────────────────────────────────────

    /// Get the close of a ticker on a specific date (nearest prior trading
    /// day within the 10-day lookback window).
    ///
    /// Walks the cached history first; only asks the provider when the
    /// whole window is missing from the cache. The fetched close is cached
    /// under the requested date so the same gap is never refetched.
    pub async fn get_historical_price(
        &self,
        cache: &mut PriceCache,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<f64, CoreError> {
        let ticker = ticker.trim().to_uppercase();

        let mut probe = date;
        for _ in 0..=HISTORICAL_LOOKBACK_DAYS {
            if let Some(price) = cache.get_close(&ticker, probe) {
                return Ok(price);
            }
            probe = match probe.pred_opt() {
                Some(prev) => prev,
                None => break,
            };
        }

        let price = self.provider.fetch_historical_price(&ticker, date).await?;
        cache.set_close(&ticker, date, price);
        Ok(price)
    }

    /// Fetch daily closes for a date range (for the performance series).
    /// Uses the cache when it already spans the requested boundaries,
    /// fetches the full range from the provider otherwise.
    pub async fn get_price_range(
        &self,
        cache: &mut PriceCache,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let ticker = ticker.trim().to_uppercase();
        let cached = cache.get_close_range(&ticker, from, to);

        // Use cache if we have data spanning the requested range boundaries
        // (checking first/last dates is more reliable than counting points,
        // since weekends/holidays produce fewer points than calendar days)
        if cached.len() >= 2 {
            let first = cached.first().map(|p| p.date);
            let last = cached.last().map(|p| p.date);
            if let (Some(first), Some(last)) = (first, last) {
                if (first - from).num_days().abs() <= 3 && (to - last).num_days().abs() <= 3 {
                    return Ok(cached);
                }
            }
        }

        let points = self.provider.fetch_price_range(&ticker, from, to).await?;
        cache.set_closes(&ticker, &points);
        Ok(points)
    }
}
