use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use time::OffsetDateTime;

use super::traits::{PriceProvider, HISTORICAL_LOOKBACK_DAYS};
use crate::errors::CoreError;
use crate::models::price::PricePoint;

const PROVIDER_NAME: &str = "Yahoo Finance";

/// Yahoo Finance provider — the "most-recent-close" variant.
///
/// - **Free**: No API key required.
/// - **No strict rate limits** (unofficial public API).
/// - **Coverage**: Global equities, ETFs, indices.
///
/// Uses the `yahoo_finance_api` crate which wraps Yahoo Finance's public
/// endpoints. Its errors carry transport detail, so everything is folded
/// into the normalized taxonomy here: "not found"-shaped failures become
/// `InvalidTicker`, the rest `UpstreamUnavailable`.
pub struct YahooFinanceProvider {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        let connector =
            yahoo_finance_api::YahooConnector::new().map_err(|e| CoreError::UpstreamUnavailable {
                provider: PROVIDER_NAME.into(),
                message: format!("Failed to create connector: {e}"),
            })?;
        Ok(Self { connector })
    }

    /// Map a `yahoo_finance_api` error onto the normalized taxonomy.
    fn normalize(ticker: &str, e: yahoo_finance_api::YahooError) -> CoreError {
        match e {
            yahoo_finance_api::YahooError::FetchFailed(msg) if msg.contains("Not Found") => {
                CoreError::InvalidTicker(ticker.to_uppercase())
            }
            yahoo_finance_api::YahooError::NoResult | yahoo_finance_api::YahooError::NoQuotes => {
                CoreError::InvalidTicker(ticker.to_uppercase())
            }
            other => CoreError::UpstreamUnavailable {
                provider: PROVIDER_NAME.into(),
                message: other.to_string(),
            },
        }
    }

    /// Convert a `chrono::NaiveDate` to `time::OffsetDateTime` (midnight UTC).
    fn to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime, CoreError> {
        let month: time::Month = match date.month() {
            1 => time::Month::January,
            2 => time::Month::February,
            3 => time::Month::March,
            4 => time::Month::April,
            5 => time::Month::May,
            6 => time::Month::June,
            7 => time::Month::July,
            8 => time::Month::August,
            9 => time::Month::September,
            10 => time::Month::October,
            11 => time::Month::November,
            12 => time::Month::December,
            _ => unreachable!(),
        };

        let odt = time::Date::from_calendar_date(date.year(), month, date.day() as u8)
            .map_err(|e| CoreError::ValidationError(format!("Invalid date {date}: {e}")))?
            .with_hms(0, 0, 0)
            .map_err(|e| CoreError::ValidationError(format!("Invalid time for {date}: {e}")))?
            .assume_utc();
        Ok(odt)
    }

    /// Convert a unix timestamp (seconds) to `chrono::NaiveDate`.
    fn timestamp_to_naive_date(ts: i64) -> Option<NaiveDate> {
        chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
    }
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_current_price(&self, ticker: &str) -> Result<f64, CoreError> {
        let resp = self
            .connector
            .get_latest_quotes(&ticker.to_uppercase(), "1d")
            .await
            .map_err(|e| Self::normalize(ticker, e))?;

        let quote = resp.last_quote().map_err(|e| Self::normalize(ticker, e))?;

        Ok(quote.close)
    }

    async fn fetch_historical_price(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<f64, CoreError> {
        // Request the whole lookback window and take the latest close at or
        // before the requested date — weekends and holidays simply have no
        // bars, so the latest bar in the window IS the nearest prior close.
        let window_start = date - Duration::days(HISTORICAL_LOOKBACK_DAYS);
        let start = Self::to_offset_datetime(window_start)?;
        let end = Self::to_offset_datetime(date + Duration::days(1))?;

        let resp = self
            .connector
            .get_quote_history(&ticker.to_uppercase(), start, end)
            .await
            .map_err(|e| Self::normalize(ticker, e))?;

        let quotes = resp.quotes().map_err(|e| Self::normalize(ticker, e))?;

        quotes
            .iter()
            .filter_map(|q| {
                let quote_date = Self::timestamp_to_naive_date(q.timestamp)?;
                (quote_date <= date).then_some((quote_date, q.close))
            })
            .max_by_key(|(quote_date, _)| *quote_date)
            .map(|(_, close)| close)
            .ok_or_else(|| CoreError::PriceNotFound {
                ticker: ticker.to_uppercase(),
                from: window_start.to_string(),
                to: date.to_string(),
            })
    }

    async fn fetch_price_range(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let start = Self::to_offset_datetime(from)?;
        let end = Self::to_offset_datetime(to + Duration::days(1))?; // inclusive end

        let resp = self
            .connector
            .get_quote_history(&ticker.to_uppercase(), start, end)
            .await
            .map_err(|e| Self::normalize(ticker, e))?;

        let quotes = resp.quotes().map_err(|e| Self::normalize(ticker, e))?;

        let mut points: Vec<PricePoint> = quotes
            .iter()
            .filter_map(|q| {
                let date = Self::timestamp_to_naive_date(q.timestamp)?;
                if date >= from && date <= to {
                    Some(PricePoint {
                        date,
                        price: q.close,
                    })
                } else {
                    None
                }
            })
            .collect();

        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}
