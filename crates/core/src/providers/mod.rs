pub mod traits;

// API provider implementations
pub mod alphavantage;
pub mod yahoo_finance;

use crate::errors::CoreError;
use crate::models::settings::{ProviderKind, Settings};

use alphavantage::AlphaVantageProvider;
use traits::PriceProvider;
use yahoo_finance::YahooFinanceProvider;

/// Build the one active price provider for this deployment.
///
/// Settings pick the provider; API keys come from the same settings. A
/// provider that needs a key and doesn't have one is a configuration
/// error, caught here rather than on the first fetch.
pub fn build_provider(settings: &Settings) -> Result<Box<dyn PriceProvider>, CoreError> {
    match settings.provider {
        ProviderKind::YahooFinance => Ok(Box::new(YahooFinanceProvider::new()?)),
        ProviderKind::AlphaVantage => {
            let key = settings.api_keys.get("alphavantage").ok_or_else(|| {
                CoreError::NoProvider(
                    "Alpha Vantage requires an API key (settings key \"alphavantage\")".into(),
                )
            })?;
            Ok(Box::new(AlphaVantageProvider::new(key.clone())))
        }
    }
}
