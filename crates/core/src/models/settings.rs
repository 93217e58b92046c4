use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which upstream quote service this deployment talks to.
/// Exactly one provider is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Yahoo Finance — most-recent-close quotes, no API key required
    YahooFinance,
    /// Alpha Vantage — daily time series, requires an API key
    AlphaVantage,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::YahooFinance => write!(f, "Yahoo Finance"),
            ProviderKind::AlphaVantage => write!(f, "Alpha Vantage"),
        }
    }
}

/// User-configurable settings, stored inside the portfolio file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// The active upstream price provider.
    pub provider: ProviderKind,

    /// Optional API keys for providers that require them.
    /// Keys: provider name (e.g., "alphavantage"). Values: the key string.
    pub api_keys: HashMap<String, String>,

    /// How long a cached current quote stays valid without refetching.
    #[serde(default = "default_quote_ttl_minutes")]
    pub quote_ttl_minutes: u32,

    /// Pause between consecutive upstream calls in a batch fetch.
    /// Deliberately trades batch latency for rate-limit compliance.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

fn default_quote_ttl_minutes() -> u32 {
    15
}

fn default_batch_delay_ms() -> u64 {
    500
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::YahooFinance,
            api_keys: HashMap::new(),
            quote_ttl_minutes: default_quote_ttl_minutes(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}
