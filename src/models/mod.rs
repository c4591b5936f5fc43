pub mod derivatives;
pub mod event;
pub mod price;
pub mod transfer;

pub use derivatives::{FundingRecord, OpenInterestRecord};
pub use event::{CriticalEvent, EventData, EventKind, Severity, SoundProfile, ToneSpec};
pub use price::{ApiSource, ConnectionStatus, PriceRecord, PriceState};
pub use transfer::{Network, Prediction, TransferType, WhaleTransfer};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Symbol — the tracked asset universe
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Symbol {
    Btc,
    Eth,
    Sol,
    Rndr,
}

impl Symbol {
    pub const ALL: [Symbol; 4] = [Symbol::Btc, Symbol::Eth, Symbol::Sol, Symbol::Rndr];

    pub fn code(&self) -> &'static str {
        match self {
            Symbol::Btc => "BTC",
            Symbol::Eth => "ETH",
            Symbol::Sol => "SOL",
            Symbol::Rndr => "RNDR",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Symbol::Btc => "Bitcoin",
            Symbol::Eth => "Ethereum",
            Symbol::Sol => "Solana",
            Symbol::Rndr => "Render",
        }
    }

    /// Binance spot ticker pair.
    pub fn spot_pair(&self) -> &'static str {
        match self {
            Symbol::Btc => "BTCUSDT",
            Symbol::Eth => "ETHUSDT",
            Symbol::Sol => "SOLUSDT",
            Symbol::Rndr => "RNDRUSDT",
        }
    }

    /// Binance USD-M futures pair. Render trades under its rebranded ticker
    /// on futures, unlike spot.
    pub fn futures_pair(&self) -> &'static str {
        match self {
            Symbol::Rndr => "RENDERUSDT",
            _ => self.spot_pair(),
        }
    }

    /// CoinGecko API asset id.
    pub fn coingecko_id(&self) -> &'static str {
        match self {
            Symbol::Btc => "bitcoin",
            Symbol::Eth => "ethereum",
            Symbol::Sol => "solana",
            Symbol::Rndr => "render-token",
        }
    }

    /// Rough conversion price used to value transfers before the first
    /// successful price cycle has landed.
    pub fn fallback_price(&self) -> Decimal {
        match self {
            Symbol::Btc => Decimal::new(100_000, 0),
            Symbol::Eth => Decimal::new(4_000, 0),
            Symbol::Sol => Decimal::new(240, 0),
            Symbol::Rndr => Decimal::new(12, 0),
        }
    }

    pub fn from_pair(pair: &str) -> Option<Self> {
        match pair {
            "BTCUSDT" => Some(Symbol::Btc),
            "ETHUSDT" => Some(Symbol::Eth),
            "SOLUSDT" => Some(Symbol::Sol),
            "RNDRUSDT" | "RENDERUSDT" => Some(Symbol::Rndr),
            _ => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
