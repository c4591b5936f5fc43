use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;

use super::types::{ApiGeckoQuote, ApiMarketChart};
use super::{SourceError, SpotSource};
use crate::models::{PriceRecord, Symbol};

const API_BASE: &str = "https://api.coingecko.com/api/v3";

/// The batch quote is the fallback path and may be slow on the free tier.
const SIMPLE_PRICE_TIMEOUT: Duration = Duration::from_secs(15);
const MARKET_CHART_TIMEOUT: Duration = Duration::from_secs(6);

/// Secondary quote source: one batched `simple/price` call for all symbols.
/// Also serves the hourly volume series the spike detector runs on.
#[derive(Debug, Clone)]
pub struct CoinGecko {
    http: Client,
    base_url: String,
}

impl CoinGecko {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: API_BASE.into(),
        }
    }

    /// Hourly price/volume series for the last day, oldest first.
    pub async fn market_chart(&self, symbol: Symbol) -> Result<ApiMarketChart, SourceError> {
        let url = format!("{}/coins/{}/market_chart", self.base_url, symbol.coingecko_id());
        let resp = self
            .http
            .get(&url)
            .query(&[("vs_currency", "usd"), ("days", "1"), ("interval", "hourly")])
            .timeout(MARKET_CHART_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl SpotSource for CoinGecko {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    async fn fetch_quotes(
        &self,
        symbols: &[Symbol],
    ) -> Result<HashMap<Symbol, PriceRecord>, SourceError> {
        let ids = symbols
            .iter()
            .map(|s| s.coingecko_id())
            .collect::<Vec<_>>()
            .join(",");

        let url = format!("{}/simple/price", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("ids", ids.as_str()),
                ("vs_currencies", "usd"),
                ("include_24hr_change", "true"),
                ("include_24hr_vol", "true"),
            ])
            .timeout(SIMPLE_PRICE_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let data: HashMap<String, ApiGeckoQuote> = resp.json().await?;

        let mut quotes = HashMap::new();
        for symbol in symbols {
            let Some(quote) = data.get(symbol.coingecko_id()) else {
                tracing::debug!(symbol = %symbol, "Symbol missing from batch response");
                continue;
            };
            if quote.usd <= Decimal::ZERO {
                tracing::debug!(symbol = %symbol, "Dropping non-positive batch quote");
                continue;
            }
            quotes.insert(
                *symbol,
                PriceRecord {
                    price: quote.usd,
                    change_24h_pct: quote.usd_24h_change.unwrap_or_default(),
                    volume_24h: quote.usd_24h_vol.unwrap_or_default(),
                    // The batch endpoint carries no daily range.
                    high_24h: Decimal::ZERO,
                    low_24h: Decimal::ZERO,
                },
            );
        }
        Ok(quotes)
    }
}
