use chrono::{NaiveDate, Utc};
use std::collections::{BTreeSet, HashMap};

use crate::errors::CoreError;
use crate::models::performance::PerformancePoint;
use crate::models::portfolio::Portfolio;
use crate::models::price::PriceCache;
use crate::models::transaction::TransactionType;
use crate::services::portfolio_service::PortfolioService;
use crate::services::price_service::PriceService;

/// Upper bound on the reconstructed window, in days (20 years). A ledger
/// wider than this is treated as corrupt rather than iterated over.
pub const MAX_PERFORMANCE_RANGE_DAYS: i64 = 7300;

/// Running per-ticker position state threaded through the day loop.
#[derive(Debug, Default, Clone, Copy)]
struct Position {
    quantity: f64,
    invested_cost: f64,
}

/// Replays the transaction ledger day by day from the first transaction to
/// the present, producing the daily {value, invested} series.
///
/// - One monotonic cursor walks the date-sorted ledger; every transaction
///   is applied exactly once, on the first day that covers it.
/// - SELLs remove invested cost at the running average cost, mirroring the
///   holdings fold, so `invested` tracks cost basis rather than raw cash.
/// - Each ticker's last known close is carried forward across non-trading
///   days and provider gaps; a ticker with no observed close yet
///   contributes 0 to `value`.
/// - The final point is re-priced with live quotes so "today" reflects
///   real-time valuation rather than yesterday's close.
pub struct PerformanceService {
    portfolio_service: PortfolioService,
}

impl PerformanceService {
    pub fn new() -> Self {
        Self {
            portfolio_service: PortfolioService::new(),
        }
    }

    /// Generate the full ownership-history performance series, one point
    /// per calendar day, ascending. Empty ledger → empty series.
    pub async fn compute_performance(
        &self,
        portfolio: &Portfolio,
        price_service: &PriceService,
        cache: &mut PriceCache,
    ) -> Result<Vec<PerformancePoint>, CoreError> {
        let ledger = PortfolioService::sorted_by_date(portfolio);
        let today = Utc::now().date_naive();

        let start = match ledger.first() {
            Some(tx) => tx.date,
            None => return Ok(Vec::new()),
        };
        if start > today {
            // Nothing owned yet as of today; validation normally prevents
            // future-dated transactions from being recorded at all.
            return Ok(Vec::new());
        }

        let span_days = (today - start).num_days();
        if span_days > MAX_PERFORMANCE_RANGE_DAYS {
            return Err(CoreError::ValidationError(format!(
                "Ledger spans {span_days} days, exceeding the maximum of \
                 {MAX_PERFORMANCE_RANGE_DAYS} days (20 years) — earliest transaction \
                 date {start} looks corrupt"
            )));
        }

        // One historical series per ticker, indexed by date for O(1) lookup
        // in the day loop. A ticker whose fetch fails entirely is a known
        // gap: it contributes 0 until the live re-price at the end.
        let tickers: BTreeSet<&str> = ledger.iter().map(|tx| tx.ticker.as_str()).collect();
        let mut closes_by_ticker: HashMap<String, HashMap<NaiveDate, f64>> = HashMap::new();
        for ticker in &tickers {
            match price_service.get_price_range(cache, ticker, start, today).await {
                Ok(points) => {
                    closes_by_ticker.insert(
                        ticker.to_string(),
                        points.into_iter().map(|p| (p.date, p.price)).collect(),
                    );
                }
                Err(e) => {
                    log::warn!("No historical series for {ticker}: {e}");
                }
            }
        }

        let mut series = Vec::with_capacity(span_days as usize + 1);
        let mut positions: HashMap<String, Position> = HashMap::new();
        let mut last_close: HashMap<String, f64> = HashMap::new();
        let mut total_invested = 0.0;
        let mut cursor = 0;
        let mut day = start;

        while day <= today {
            // Apply every not-yet-applied transaction dated on or before
            // this day. The cursor only moves forward.
            while cursor < ledger.len() && ledger[cursor].date <= day {
                let tx = ledger[cursor];
                let position = positions.entry(tx.ticker.clone()).or_default();
                match tx.kind {
                    TransactionType::Buy => {
                        let cost = tx.quantity * tx.price_per_share;
                        position.invested_cost += cost;
                        position.quantity += tx.quantity;
                        total_invested += cost;
                    }
                    TransactionType::Sell => {
                        let cost_basis = if position.quantity > 0.0 {
                            position.invested_cost / position.quantity
                        } else {
                            0.0
                        };
                        let released = tx.quantity * cost_basis;
                        position.invested_cost -= released;
                        position.quantity -= tx.quantity;
                        total_invested -= released;
                    }
                }
                cursor += 1;
            }

            // Forward-fill: today's close where one exists, otherwise the
            // most recent known close sticks around.
            for (ticker, closes) in &closes_by_ticker {
                if let Some(price) = closes.get(&day) {
                    last_close.insert(ticker.clone(), *price);
                }
            }

            let value: f64 = positions
                .iter()
                .filter(|(_, p)| p.quantity > 0.0)
                .map(|(ticker, p)| p.quantity * last_close.get(ticker).copied().unwrap_or(0.0))
                .sum();

            series.push(PerformancePoint {
                date: day,
                value,
                invested: total_invested,
            });

            day = match day.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        // Re-price the final point with live quotes and current holdings.
        // A ticker whose live quote fails keeps its forward-filled close.
        let holdings = self.portfolio_service.compute_holdings(portfolio);
        if !holdings.is_empty() {
            let held: Vec<String> = holdings.keys().cloned().collect();
            let live = price_service.get_batch_quotes(cache, &held).await;

            let value: f64 = holdings
                .values()
                .map(|h| {
                    let price = live
                        .prices
                        .get(&h.ticker)
                        .or_else(|| last_close.get(&h.ticker))
                        .copied()
                        .unwrap_or(0.0);
                    h.quantity * price
                })
                .sum();

            if let Some(last) = series.last_mut() {
                last.value = value;
            }
        }

        Ok(series)
    }
}

impl Default for PerformanceService {
    fn default() -> Self {
        Self::new()
    }
}
