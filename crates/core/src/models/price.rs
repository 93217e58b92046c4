use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single daily close (date → price).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// The last known current price for a ticker.
///
/// Persisted layout mirrors the logical cache table `(ticker PK, price,
/// last_updated)` — at most one entry per ticker, upsert-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteEntry {
    pub price: f64,
    pub last_updated: DateTime<Utc>,
}

/// Local cache of current quotes and historical daily closes.
///
/// Stored inside the portfolio file so that:
/// - Historical closes (date < today) are fetched ONCE and never re-fetched.
/// - A quote within its TTL is served without touching the rate-limited
///   upstream at all.
/// - A stale quote is still available as a fallback when the upstream fails.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceCache {
    /// Current-price entries: ticker → (price, last_updated).
    pub quotes: HashMap<String, QuoteEntry>,

    /// Historical closes: ticker → Vec of PricePoints sorted by date.
    pub history: HashMap<String, Vec<PricePoint>>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Current quotes ──────────────────────────────────────────────

    /// Get the cached quote entry for a ticker, fresh or stale.
    pub fn get_quote(&self, ticker: &str) -> Option<&QuoteEntry> {
        self.quotes.get(&ticker.to_uppercase())
    }

    /// Insert or replace the quote for a ticker, stamping it with `now`.
    /// `last_updated` strictly increases across successful writes.
    pub fn set_quote(&mut self, ticker: &str, price: f64, now: DateTime<Utc>) {
        self.quotes.insert(
            ticker.to_uppercase(),
            QuoteEntry {
                price,
                last_updated: now,
            },
        );
    }

    /// Whether the cached quote for a ticker is younger than `ttl`.
    /// Returns false if there is no entry at all.
    pub fn is_quote_fresh(&self, ticker: &str, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        self.get_quote(ticker)
            .is_some_and(|q| now - q.last_updated < ttl)
    }

    // ── Historical closes ───────────────────────────────────────────

    /// Get a cached close for a specific (ticker, date).
    /// Returns None if not cached. Uses binary search (O(log n)).
    pub fn get_close(&self, ticker: &str, date: NaiveDate) -> Option<f64> {
        let entries = self.history.get(&ticker.to_uppercase())?;
        entries
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| entries[idx].price)
    }

    /// Insert or update a daily close in the cache.
    /// Maintains sorted order by date using binary search (O(log n) insertion).
    pub fn set_close(&mut self, ticker: &str, date: NaiveDate, price: f64) {
        let entries = self.history.entry(ticker.to_uppercase()).or_default();

        match entries.binary_search_by_key(&date, |p| p.date) {
            Ok(idx) => {
                entries[idx].price = price;
            }
            Err(idx) => {
                entries.insert(idx, PricePoint { date, price });
            }
        }
    }

    /// Insert multiple closes at once (e.g., from a range API call).
    pub fn set_closes(&mut self, ticker: &str, points: &[PricePoint]) {
        for point in points {
            self.set_close(ticker, point.date, point.price);
        }
    }

    /// Get all cached closes for a ticker within a date range (inclusive).
    /// Uses binary search to find the range boundaries.
    pub fn get_close_range(&self, ticker: &str, from: NaiveDate, to: NaiveDate) -> Vec<PricePoint> {
        self.history
            .get(&ticker.to_uppercase())
            .map(|entries| {
                let start = entries
                    .binary_search_by_key(&from, |p| p.date)
                    .unwrap_or_else(|pos| pos);
                let end = entries
                    .binary_search_by_key(&to, |p| p.date)
                    .map(|pos| pos + 1)
                    .unwrap_or_else(|pos| pos);
                entries[start..end].to_vec()
            })
            .unwrap_or_default()
    }

    // ── Maintenance ─────────────────────────────────────────────────

    /// Total number of cached closes across all tickers.
    pub fn total_closes(&self) -> usize {
        self.history.values().map(|v| v.len()).sum()
    }

    /// Number of distinct tickers with a cached current quote.
    pub fn quote_count(&self) -> usize {
        self.quotes.len()
    }

    /// Remove all cached closes older than `before`.
    /// Returns the number of points removed. Quote entries are untouched —
    /// staleness there is governed by the TTL, not by pruning.
    pub fn prune_before(&mut self, before: NaiveDate) -> usize {
        let mut removed = 0;
        for entries in self.history.values_mut() {
            let old_len = entries.len();
            let split = entries
                .binary_search_by_key(&before, |p| p.date)
                .unwrap_or_else(|pos| pos);
            if split > 0 {
                entries.drain(..split);
                removed += old_len - entries.len();
            }
        }
        self.history.retain(|_, v| !v.is_empty());
        removed
    }

    /// Clear all cached data.
    pub fn clear(&mut self) {
        self.quotes.clear();
        self.history.clear();
    }
}
