pub mod binance;
pub mod coingecko;
pub mod mempool;
pub mod types;
pub mod volume_spike;

pub use binance::{BinanceFutures, BinanceSpot};
pub use coingecko::CoinGecko;
pub use mempool::MempoolSource;
pub use volume_spike::{SpikeProfile, VolumeSpikeSource};

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{FundingRecord, PriceRecord, Symbol, WhaleTransfer};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// A provider of spot market quotes.
///
/// Implementations may return a partial map when only some symbols came
/// back clean; the polling engine decides whether partial coverage counts
/// as success. Quotes with non-positive prices must be dropped here, at
/// the boundary.
#[async_trait]
pub trait SpotSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_quotes(
        &self,
        symbols: &[Symbol],
    ) -> Result<HashMap<Symbol, PriceRecord>, SourceError>;
}

/// A provider of perpetual-futures funding and open-interest data.
#[async_trait]
pub trait DerivativesSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Funding snapshots for whichever symbols responded.
    async fn fetch_funding(
        &self,
        symbols: &[Symbol],
    ) -> Result<HashMap<Symbol, FundingRecord>, SourceError>;

    /// Open-interest contract counts for whichever symbols responded.
    /// Valuation against a price is the caller's business.
    async fn fetch_open_interest(
        &self,
        symbols: &[Symbol],
    ) -> Result<HashMap<Symbol, Decimal>, SourceError>;
}

/// A producer of whale-transfer candidates.
///
/// `prices` carries the effective USD conversion price per symbol (live
/// where available, static fallback otherwise); sources use it to value
/// amounts, never to decide freshness.
#[async_trait]
pub trait TransferSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_transfers(
        &self,
        prices: &HashMap<Symbol, Decimal>,
    ) -> Result<Vec<WhaleTransfer>, SourceError>;
}
