use rust_decimal::Decimal;

use crate::models::{Prediction, TransferType};

/// Directional read on a transfer, from its type and USD value.
///
/// Rules:
/// - exchange_inflow above $5M: **bearish** (supply headed to order books)
/// - exchange_outflow above $3M: **bullish** (supply leaving order books)
/// - treasury_mint above $10M: **neutral**
/// - protocol_treasury, historic_move, mempool_transfer: **neutral**
/// - recovery_transfer: **bearish** (estate sales settle eventually)
/// - cold_storage_move: **bullish**
/// - volume_spike: **bullish**
/// - everything else, including flows below the thresholds: **neutral**
///
/// The function is total and deterministic; callers that want a different
/// read for a specific source (volume-spike profiles do) apply their own
/// rule before falling back to this table.
pub fn predict_market_impact(value_usd: Decimal, transfer_type: TransferType) -> Prediction {
    let five_m = Decimal::new(5_000_000, 0);
    let three_m = Decimal::new(3_000_000, 0);
    let ten_m = Decimal::new(10_000_000, 0);

    match transfer_type {
        TransferType::ExchangeInflow if value_usd > five_m => Prediction::Bearish,
        TransferType::ExchangeOutflow if value_usd > three_m => Prediction::Bullish,
        TransferType::TreasuryMint if value_usd > ten_m => Prediction::Neutral,
        TransferType::ProtocolTreasury => Prediction::Neutral,
        TransferType::RecoveryTransfer => Prediction::Bearish,
        TransferType::ColdStorageMove => Prediction::Bullish,
        TransferType::HistoricMove => Prediction::Neutral,
        TransferType::MempoolTransfer => Prediction::Neutral,
        TransferType::VolumeSpike => Prediction::Bullish,
        _ => Prediction::Neutral,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
