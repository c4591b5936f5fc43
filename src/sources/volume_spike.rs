use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use rust_decimal::{Decimal, RoundingStrategy};

use super::coingecko::CoinGecko;
use super::{SourceError, TransferSource};
use crate::models::{Network, Prediction, Symbol, TransferType, WhaleTransfer};

/// Per-asset tuning for volume-spike detection.
///
/// A sample counts as a spike when its volume exceeds `min_spike` times the
/// day's average, and only samples inside the recent window are considered.
/// The estimated token amount is `floor((volume / price) / amount_divisor)`
/// and must reach `min_amount` to be reported. A spike ratio above
/// `bullish_above` reads as bullish, anything else as neutral — this
/// per-profile rule replaces the generic prediction table for this source.
#[derive(Debug, Clone)]
pub struct SpikeProfile {
    pub symbol: Symbol,
    pub network: Network,
    pub min_spike: Decimal,
    pub recent_window: usize,
    pub amount_divisor: Decimal,
    pub min_amount: Decimal,
    pub bullish_above: Decimal,
    source_name: &'static str,
    source_label: &'static str,
    hash_prefix: &'static str,
    slug: &'static str,
    from_label: &'static str,
    to_address: &'static str,
}

impl SpikeProfile {
    pub fn eth() -> Self {
        Self {
            symbol: Symbol::Eth,
            network: Network::Ethereum,
            min_spike: Decimal::new(15, 1),
            recent_window: 8,
            amount_divisor: Decimal::new(10, 0),
            min_amount: Decimal::new(10, 0),
            bullish_above: Decimal::new(5, 0),
            source_name: "volume_spike_eth",
            source_label: "CoinGecko Market Data",
            hash_prefix: "Vol",
            slug: "volume-spike",
            from_label: "Volume Spike Detected",
            to_address: "Market Data",
        }
    }

    pub fn sol() -> Self {
        Self {
            symbol: Symbol::Sol,
            network: Network::Solana,
            min_spike: Decimal::new(13, 1),
            recent_window: 6,
            amount_divisor: Decimal::new(100, 0),
            min_amount: Decimal::new(5_000, 0),
            bullish_above: Decimal::new(4, 0),
            source_name: "volume_spike_sol",
            source_label: "CoinGecko SOL Data",
            hash_prefix: "Sol",
            slug: "sol-volume-spike",
            from_label: "SOL Volume Spike",
            to_address: "SOL Market",
        }
    }

    pub fn rndr() -> Self {
        Self {
            symbol: Symbol::Rndr,
            network: Network::Ethereum,
            min_spike: Decimal::new(12, 1),
            recent_window: 8,
            amount_divisor: Decimal::new(50, 0),
            min_amount: Decimal::new(10_000, 0),
            bullish_above: Decimal::new(3, 0),
            source_name: "volume_spike_rndr",
            source_label: "CoinGecko RNDR Data",
            hash_prefix: "Rnd",
            slug: "rndr-volume-spike",
            from_label: "RNDR Volume Spike",
            to_address: "RNDR Market",
        }
    }
}

/// Scan an hourly volume series (oldest first) for spikes per the profile.
///
/// The average is taken over the whole series; the spike test only runs on
/// the `recent_window` newest samples.
pub fn detect_spikes(
    profile: &SpikeProfile,
    series: &[(i64, Decimal)],
    price: Decimal,
) -> Vec<WhaleTransfer> {
    if series.is_empty() || price <= Decimal::ZERO {
        return Vec::new();
    }
    let total: Decimal = series.iter().map(|(_, v)| *v).sum();
    let avg = total / Decimal::from(series.len() as i64);
    if avg <= Decimal::ZERO {
        return Vec::new();
    }

    let tail_start = series.len().saturating_sub(profile.recent_window);
    let mut transfers = Vec::new();

    for (ts, volume) in &series[tail_start..] {
        let spike = *volume / avg;
        if spike <= profile.min_spike {
            continue;
        }

        let amount = ((*volume / price) / profile.amount_divisor).floor();
        if amount < profile.min_amount {
            continue;
        }

        let Some(timestamp) = DateTime::from_timestamp_millis(*ts) else {
            tracing::warn!(source = profile.source_name, ts, "Sample with unusable timestamp");
            continue;
        };

        let value_usd = amount * price;
        let ts_str = ts.to_string();
        let ts_tail = &ts_str[ts_str.len().saturating_sub(4)..];
        let spike_2dp = spike.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        transfers.push(WhaleTransfer {
            id: format!("coingecko_{}_{ts}", profile.symbol.code().to_lowercase()),
            symbol: profile.symbol,
            amount,
            value_usd,
            from: profile.from_label.to_string(),
            to: "Market Activity".to_string(),
            from_address: "Volume Analysis".to_string(),
            to_address: profile.to_address.to_string(),
            hash: format!("{}{}x____{ts_tail}", profile.hash_prefix, spike.floor()),
            full_hash: format!("{}-{ts}-{:.2}x-average", profile.slug, spike_2dp),
            timestamp,
            transfer_type: TransferType::VolumeSpike,
            network: profile.network,
            prediction: if spike > profile.bullish_above {
                Prediction::Bullish
            } else {
                Prediction::Neutral
            },
            is_real: true,
            source: profile.source_label.to_string(),
        });
    }
    transfers
}

/// Transfer source that reads one asset's hourly volumes from CoinGecko and
/// reports spikes as synthetic transfers.
pub struct VolumeSpikeSource {
    gecko: CoinGecko,
    profile: SpikeProfile,
}

impl VolumeSpikeSource {
    pub fn new(gecko: CoinGecko, profile: SpikeProfile) -> Self {
        Self { gecko, profile }
    }
}

#[async_trait]
impl TransferSource for VolumeSpikeSource {
    fn name(&self) -> &'static str {
        self.profile.source_name
    }

    async fn fetch_transfers(
        &self,
        prices: &HashMap<Symbol, Decimal>,
    ) -> Result<Vec<WhaleTransfer>, SourceError> {
        let price = prices
            .get(&self.profile.symbol)
            .copied()
            .unwrap_or_else(|| self.profile.symbol.fallback_price());

        let chart = self.gecko.market_chart(self.profile.symbol).await?;
        let transfers = detect_spikes(&self.profile, &chart.total_volumes, price);

        tracing::debug!(
            source = self.profile.source_name,
            samples = chart.total_volumes.len(),
            spikes = transfers.len(),
            "Volume series scanned"
        );
        Ok(transfers)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
