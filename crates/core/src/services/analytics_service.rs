use crate::errors::CoreError;
use crate::models::analytics::{AllocationEntry, HoldingSummary, PortfolioSummary};
use crate::models::portfolio::Portfolio;
use crate::models::price::PriceCache;
use crate::services::portfolio_service::PortfolioService;
use crate::services::price_service::PriceService;

/// Computes portfolio analytics from current holdings and current prices:
/// summary (gain/loss against cost basis) and allocation breakdown.
///
/// A ticker whose current price cannot be resolved is omitted from the
/// results and reported in the summary's `price_errors` — one failing
/// upstream symbol never fails the request.
pub struct AnalyticsService {
    portfolio_service: PortfolioService,
}

impl AnalyticsService {
    pub fn new() -> Self {
        Self {
            portfolio_service: PortfolioService::new(),
        }
    }

    /// Full portfolio summary: per-ticker market value and gain/loss plus
    /// totals, all derived from the holdings fold and one batch quote
    /// fetch. Totals cover priced tickers only, keeping value, cost and
    /// gain/loss internally consistent.
    pub async fn get_summary(
        &self,
        portfolio: &Portfolio,
        price_service: &PriceService,
        cache: &mut PriceCache,
    ) -> Result<PortfolioSummary, CoreError> {
        let holdings = self.portfolio_service.compute_holdings(portfolio);
        let tickers: Vec<String> = holdings.keys().cloned().collect();
        let quotes = price_service.get_batch_quotes(cache, &tickers).await;

        let mut summaries = Vec::new();
        let mut total_value = 0.0;
        let mut total_cost = 0.0;

        for holding in holdings.values() {
            let Some(&price) = quotes.prices.get(&holding.ticker) else {
                continue;
            };

            let market_value = holding.quantity * price;
            let gain_loss = market_value - holding.total_cost;
            let gain_loss_percent = if holding.total_cost > 0.0 {
                (gain_loss / holding.total_cost) * 100.0
            } else {
                0.0
            };

            total_value += market_value;
            total_cost += holding.total_cost;

            summaries.push(HoldingSummary {
                ticker: holding.ticker.clone(),
                quantity: holding.quantity,
                avg_cost_basis: holding.avg_cost_basis,
                total_cost: holding.total_cost,
                current_price: price,
                market_value,
                gain_loss,
                gain_loss_percent,
            });
        }

        // Largest position first, ties broken by ticker for determinism
        summaries.sort_by(|a, b| {
            b.market_value
                .total_cmp(&a.market_value)
                .then_with(|| a.ticker.cmp(&b.ticker))
        });

        let total_gain_loss = total_value - total_cost;
        let total_gain_loss_percent = if total_cost > 0.0 {
            (total_gain_loss / total_cost) * 100.0
        } else {
            0.0
        };

        Ok(PortfolioSummary {
            holdings: summaries,
            total_value,
            total_cost,
            total_gain_loss,
            total_gain_loss_percent,
            price_errors: quotes.errors,
        })
    }

    /// Percentage-of-portfolio breakdown from current holdings and current
    /// prices, descending by market value. Tickers without a price are
    /// excluded entirely; when nothing can be priced all percentages are 0.
    pub async fn get_allocation(
        &self,
        portfolio: &Portfolio,
        price_service: &PriceService,
        cache: &mut PriceCache,
    ) -> Result<Vec<AllocationEntry>, CoreError> {
        let holdings = self.portfolio_service.compute_holdings(portfolio);
        let tickers: Vec<String> = holdings.keys().cloned().collect();
        let quotes = price_service.get_batch_quotes(cache, &tickers).await;

        let mut entries: Vec<AllocationEntry> = holdings
            .values()
            .filter_map(|h| {
                let &price = quotes.prices.get(&h.ticker)?;
                Some(AllocationEntry {
                    ticker: h.ticker.clone(),
                    quantity: h.quantity,
                    market_value: h.quantity * price,
                    percentage: 0.0, // filled below
                })
            })
            .collect();

        let total_market_value: f64 = entries.iter().map(|e| e.market_value).sum();
        if total_market_value > 0.0 {
            for entry in &mut entries {
                entry.percentage = (entry.market_value / total_market_value) * 100.0;
            }
        }

        entries.sort_by(|a, b| {
            b.market_value
                .total_cmp(&a.market_value)
                .then_with(|| a.ticker.cmp(&b.ticker))
        });

        Ok(entries)
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new()
    }
}
