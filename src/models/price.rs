use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::Symbol;

// ---------------------------------------------------------------------------
// ConnectionStatus / ApiSource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Idle,
    Loading,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Idle => "idle",
            ConnectionStatus::Loading => "loading",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which upstream produced the prices currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiSource {
    Binance,
    Coingecko,
}

impl fmt::Display for ApiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiSource::Binance => write!(f, "binance"),
            ApiSource::Coingecko => write!(f, "coingecko"),
        }
    }
}

// ---------------------------------------------------------------------------
// PriceRecord — one symbol's 24h market snapshot
// ---------------------------------------------------------------------------

/// A quote as produced by a spot source and stored in [`PriceState`].
///
/// `price <= 0` never appears here: adapters drop unparseable or zero quotes
/// at the boundary. Secondary sources that do not report highs/lows leave
/// those fields at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub price: Decimal,
    pub change_24h_pct: Decimal,
    pub volume_24h: Decimal,
    pub high_24h: Decimal,
    pub low_24h: Decimal,
}

// ---------------------------------------------------------------------------
// PriceState — everything the price engine publishes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceState {
    pub prices: HashMap<Symbol, PriceRecord>,
    pub loading: bool,
    pub error: Option<String>,
    pub connection: ConnectionStatus,
    pub api_source: Option<ApiSource>,
    pub retry_count: u32,
    pub last_update: Option<DateTime<Utc>>,
}

impl PriceState {
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
            loading: true,
            error: None,
            connection: ConnectionStatus::Idle,
            api_source: None,
            retry_count: 0,
            last_update: None,
        }
    }

    /// Live price for a symbol, or its static fallback when no cycle has
    /// delivered one yet.
    pub fn price_or_fallback(&self, symbol: Symbol) -> Decimal {
        self.prices
            .get(&symbol)
            .map(|r| r.price)
            .filter(|p| *p > Decimal::ZERO)
            .unwrap_or_else(|| symbol.fallback_price())
    }
}

impl Default for PriceState {
    fn default() -> Self {
        Self::new()
    }
}
