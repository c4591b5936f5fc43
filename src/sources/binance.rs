use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use futures_util::future::join_all;
use reqwest::Client;
use rust_decimal::Decimal;

use super::types::{ApiOpenInterest, ApiPremiumIndex, ApiSpotTicker};
use super::{DerivativesSource, SourceError, SpotSource};
use crate::models::{FundingRecord, PriceRecord, Symbol};

const SPOT_API_BASE: &str = "https://api.binance.com";
const FUTURES_API_BASE: &str = "https://fapi.binance.com";

/// Per-symbol request timeout. One slow pair must not stall the whole
/// fan-out.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Spot
// ---------------------------------------------------------------------------

/// Primary quote source: one 24h-ticker request per symbol, issued
/// concurrently. Failed or non-positive quotes are dropped; the result is
/// whatever subset parsed clean.
#[derive(Debug, Clone)]
pub struct BinanceSpot {
    http: Client,
    base_url: String,
}

impl BinanceSpot {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: SPOT_API_BASE.into(),
        }
    }

    async fn fetch_one(&self, symbol: Symbol) -> Result<ApiSpotTicker, SourceError> {
        let url = format!("{}/api/v3/ticker/24hr", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("symbol", symbol.spot_pair())])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl SpotSource for BinanceSpot {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn fetch_quotes(
        &self,
        symbols: &[Symbol],
    ) -> Result<HashMap<Symbol, PriceRecord>, SourceError> {
        let results = join_all(symbols.iter().map(|s| {
            let symbol = *s;
            async move { (symbol, self.fetch_one(symbol).await) }
        }))
        .await;

        let mut quotes = HashMap::new();
        for (symbol, result) in results {
            match result {
                Ok(ticker) if ticker.last_price > Decimal::ZERO => {
                    quotes.insert(
                        symbol,
                        PriceRecord {
                            price: ticker.last_price,
                            change_24h_pct: ticker.price_change_percent,
                            volume_24h: ticker.quote_volume,
                            high_24h: ticker.high_price,
                            low_24h: ticker.low_price,
                        },
                    );
                }
                Ok(_) => {
                    tracing::debug!(symbol = %symbol, "Dropping non-positive spot quote");
                }
                Err(e) => {
                    tracing::warn!(symbol = %symbol, error = %e, "Spot ticker request failed");
                }
            }
        }
        Ok(quotes)
    }
}

// ---------------------------------------------------------------------------
// Futures
// ---------------------------------------------------------------------------

/// Funding and open-interest source, one request per symbol against the
/// USD-M futures API. Tolerant per symbol: whatever responded is returned.
#[derive(Debug, Clone)]
pub struct BinanceFutures {
    http: Client,
    base_url: String,
}

impl BinanceFutures {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: FUTURES_API_BASE.into(),
        }
    }

    async fn fetch_premium_index(&self, symbol: Symbol) -> Result<ApiPremiumIndex, SourceError> {
        let url = format!("{}/fapi/v1/premiumIndex", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("symbol", symbol.futures_pair())])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        Ok(resp.json().await?)
    }

    async fn fetch_oi(&self, symbol: Symbol) -> Result<ApiOpenInterest, SourceError> {
        let url = format!("{}/fapi/v1/openInterest", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("symbol", symbol.futures_pair())])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl DerivativesSource for BinanceFutures {
    fn name(&self) -> &'static str {
        "binance_futures"
    }

    async fn fetch_funding(
        &self,
        symbols: &[Symbol],
    ) -> Result<HashMap<Symbol, FundingRecord>, SourceError> {
        let results = join_all(symbols.iter().map(|s| {
            let symbol = *s;
            async move { (symbol, self.fetch_premium_index(symbol).await) }
        }))
        .await;

        let mut funding = HashMap::new();
        for (symbol, result) in results {
            match result {
                Ok(idx) => {
                    let Some(next) = DateTime::from_timestamp_millis(idx.next_funding_time) else {
                        tracing::warn!(symbol = %symbol, "Funding snapshot with unusable settlement time");
                        continue;
                    };
                    funding.insert(
                        symbol,
                        FundingRecord {
                            // Exchange reports a decimal fraction; we store percent.
                            rate: idx.last_funding_rate * Decimal::ONE_HUNDRED,
                            next_funding_time: next,
                            mark_price: idx.mark_price,
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!(symbol = %symbol, error = %e, "Premium index request failed");
                }
            }
        }
        Ok(funding)
    }

    async fn fetch_open_interest(
        &self,
        symbols: &[Symbol],
    ) -> Result<HashMap<Symbol, Decimal>, SourceError> {
        let results = join_all(symbols.iter().map(|s| {
            let symbol = *s;
            async move { (symbol, self.fetch_oi(symbol).await) }
        }))
        .await;

        let mut open_interest = HashMap::new();
        for (symbol, result) in results {
            match result {
                Ok(oi) => {
                    open_interest.insert(symbol, oi.open_interest);
                }
                Err(e) => {
                    tracing::warn!(symbol = %symbol, error = %e, "Open interest request failed");
                }
            }
        }
        Ok(open_interest)
    }
}
