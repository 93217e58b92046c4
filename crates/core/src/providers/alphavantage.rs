use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::traits::{PriceProvider, HISTORICAL_LOOKBACK_DAYS};
use crate::errors::CoreError;
use crate::models::price::PricePoint;

const BASE_URL: &str = "https://www.alphavantage.co/query";

const PROVIDER_NAME: &str = "Alpha Vantage";

/// Alpha Vantage provider — the "daily time series" variant.
///
/// - **Free tier**: 25 requests/day (across ALL endpoints).
/// - **Requires**: API key (set via settings as "alphavantage").
/// - **Strategy**: current price via GLOBAL_QUOTE, everything historical
///   via TIME_SERIES_DAILY; let the price cache absorb repeat lookups.
///
/// Alpha Vantage signals rate limiting with a `"Note"`/`"Information"`
/// payload and an unknown symbol with `"Error Message"`, both as HTTP 200.
/// Those are mapped onto the normalized error taxonomy here so nothing
/// upstream-specific leaks to callers.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: String) -> Self {
        let builder = Client::builder().timeout(std::time::Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            api_key,
        }
    }
}

// ── Alpha Vantage API response types ────────────────────────────────

#[derive(Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(flatten)]
    envelope: Envelope,
}

#[derive(Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
}

#[derive(Deserialize)]
struct TimeSeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<HashMap<String, DailyData>>,
    #[serde(flatten)]
    envelope: Envelope,
}

#[derive(Deserialize)]
struct DailyData {
    #[serde(rename = "4. close")]
    close: String,
}

/// Out-of-band status fields Alpha Vantage mixes into any response body.
#[derive(Deserialize, Default)]
struct Envelope {
    // { "Note": "Thank you for using Alpha Vantage! ... call frequency ..." }
    #[serde(rename = "Note")]
    note: Option<String>,
    // Newer endpoints use "Information" for the same purpose.
    #[serde(rename = "Information")]
    information: Option<String>,
    // { "Error Message": "Invalid API call. ..." }
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

impl Envelope {
    /// Turn a soft-error payload into the normalized taxonomy, if present.
    fn check(&self, ticker: &str) -> Result<(), CoreError> {
        if self.note.is_some() || self.information.is_some() {
            return Err(CoreError::RateLimited {
                provider: PROVIDER_NAME.into(),
            });
        }
        if self.error_message.is_some() {
            return Err(CoreError::InvalidTicker(ticker.to_uppercase()));
        }
        Ok(())
    }
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_current_price(&self, ticker: &str) -> Result<f64, CoreError> {
        let resp: GlobalQuoteResponse = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", &ticker.to_uppercase()),
                ("apikey", &self.api_key),
            ])
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::UpstreamUnavailable {
                provider: PROVIDER_NAME.into(),
                message: format!("Failed to parse quote for {ticker}: {e}"),
            })?;

        resp.envelope.check(ticker)?;

        let price_str = resp
            .global_quote
            .and_then(|q| q.price)
            // An empty "Global Quote" object is how unknown symbols come back
            .ok_or_else(|| CoreError::InvalidTicker(ticker.to_uppercase()))?;

        price_str
            .parse()
            .map_err(|e| CoreError::UpstreamUnavailable {
                provider: PROVIDER_NAME.into(),
                message: format!("Invalid price format for {ticker}: {e}"),
            })
    }

    async fn fetch_historical_price(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<f64, CoreError> {
        let time_series = self.fetch_daily_series(ticker, date).await?;

        // Walk backward over weekends/holidays to the nearest prior close.
        let mut probe = date;
        for _ in 0..=HISTORICAL_LOOKBACK_DAYS {
            let key = probe.format("%Y-%m-%d").to_string();
            if let Some(close) = time_series.get(&key).and_then(|d| d.close.parse().ok()) {
                return Ok(close);
            }
            probe = match probe.pred_opt() {
                Some(prev) => prev,
                None => break,
            };
        }

        Err(CoreError::PriceNotFound {
            ticker: ticker.to_uppercase(),
            from: (date - Duration::days(HISTORICAL_LOOKBACK_DAYS)).to_string(),
            to: date.to_string(),
        })
    }

    async fn fetch_price_range(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let time_series = self.fetch_daily_series(ticker, from).await?;

        let mut points: Vec<PricePoint> = time_series
            .iter()
            .filter_map(|(date_str, data)| {
                let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
                if date >= from && date <= to {
                    let price: f64 = data.close.parse().ok()?;
                    Some(PricePoint { date, price })
                } else {
                    None
                }
            })
            .collect();

        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

impl AlphaVantageProvider {
    /// Fetch the daily time series for a ticker as a date-string → close map.
    /// Compact output covers the last 100 trading days; anything reaching
    /// further back needs the full series.
    async fn fetch_daily_series(
        &self,
        ticker: &str,
        earliest: NaiveDate,
    ) -> Result<HashMap<String, DailyData>, CoreError> {
        let today = chrono::Utc::now().date_naive();
        let output_size = if (today - earliest).num_days() > 120 {
            "full"
        } else {
            "compact"
        };

        let resp: TimeSeriesResponse = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", &ticker.to_uppercase()),
                ("outputsize", output_size),
                ("apikey", &self.api_key),
            ])
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::UpstreamUnavailable {
                provider: PROVIDER_NAME.into(),
                message: format!("Failed to parse time series for {ticker}: {e}"),
            })?;

        resp.envelope.check(ticker)?;

        resp.time_series
            .ok_or_else(|| CoreError::InvalidTicker(ticker.to_uppercase()))
    }
}
