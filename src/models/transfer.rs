use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Symbol;

// ---------------------------------------------------------------------------
// Network — chain the transfer settled on
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Bitcoin,
    Ethereum,
    Solana,
}

impl Network {
    /// Block explorer link for a transaction hash on this chain.
    pub fn explorer_url(&self, hash: &str) -> String {
        match self {
            Network::Bitcoin => format!("https://blockstream.info/tx/{hash}"),
            Network::Ethereum => format!("https://etherscan.io/tx/{hash}"),
            Network::Solana => format!("https://solscan.io/tx/{hash}"),
        }
    }

    pub fn explorer_name(&self) -> &'static str {
        match self {
            Network::Bitcoin => "Blockstream",
            Network::Ethereum => "Etherscan",
            Network::Solana => "Solscan",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Bitcoin => write!(f, "bitcoin"),
            Network::Ethereum => write!(f, "ethereum"),
            Network::Solana => write!(f, "solana"),
        }
    }
}

// ---------------------------------------------------------------------------
// TransferType / Prediction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferType {
    ExchangeInflow,
    ExchangeOutflow,
    TreasuryMint,
    ProtocolTreasury,
    RecoveryTransfer,
    ColdStorageMove,
    HistoricMove,
    MempoolTransfer,
    VolumeSpike,
    LargeTransfer,
}

impl TransferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferType::ExchangeInflow => "exchange_inflow",
            TransferType::ExchangeOutflow => "exchange_outflow",
            TransferType::TreasuryMint => "treasury_mint",
            TransferType::ProtocolTreasury => "protocol_treasury",
            TransferType::RecoveryTransfer => "recovery_transfer",
            TransferType::ColdStorageMove => "cold_storage_move",
            TransferType::HistoricMove => "historic_move",
            TransferType::MempoolTransfer => "mempool_transfer",
            TransferType::VolumeSpike => "volume_spike",
            TransferType::LargeTransfer => "large_transfer",
        }
    }
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Directional read on what a transfer implies for price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prediction {
    Bullish,
    Bearish,
    Neutral,
}

impl Prediction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Prediction::Bullish => "bullish",
            Prediction::Bearish => "bearish",
            Prediction::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// WhaleTransfer — one detected large movement
// ---------------------------------------------------------------------------

/// A large on-chain movement (or a synthetic volume-spike / demo entry).
///
/// `full_hash` is the only cross-cycle identity: dedup against history uses
/// it and nothing else. `hash` is the short display form. `is_real` is false
/// for demo placeholders injected when every live source came back empty;
/// `source` names where the record came from, for provenance display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhaleTransfer {
    pub id: String,
    pub symbol: Symbol,
    pub amount: Decimal,
    pub value_usd: Decimal,
    pub from: String,
    pub to: String,
    pub from_address: String,
    pub to_address: String,
    pub hash: String,
    pub full_hash: String,
    pub timestamp: DateTime<Utc>,
    pub transfer_type: TransferType,
    pub network: Network,
    pub prediction: Prediction,
    pub is_real: bool,
    pub source: String,
}

impl fmt::Display for WhaleTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transfer: {} {} (${}) {} -> {} type={} real={}",
            self.amount, self.symbol, self.value_usd, self.from, self.to, self.transfer_type, self.is_real,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explorer_links_per_network() {
        assert_eq!(
            Network::Bitcoin.explorer_url("abc123"),
            "https://blockstream.info/tx/abc123"
        );
        assert_eq!(
            Network::Ethereum.explorer_url("0xdead"),
            "https://etherscan.io/tx/0xdead"
        );
        assert_eq!(
            Network::Solana.explorer_url("sig"),
            "https://solscan.io/tx/sig"
        );
        assert_eq!(Network::Solana.explorer_name(), "Solscan");
    }

    #[test]
    fn transfer_type_wire_names() {
        assert_eq!(TransferType::ColdStorageMove.as_str(), "cold_storage_move");
        assert_eq!(
            serde_json::to_string(&TransferType::VolumeSpike).ok(),
            Some("\"volume_spike\"".to_string())
        );
    }
}
