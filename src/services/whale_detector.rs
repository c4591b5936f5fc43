use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, gauge, histogram};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::models::{Network, Prediction, Symbol, TransferType, WhaleTransfer};
use crate::sources::TransferSource;

/// Candidates kept per cycle after the newest-first sort.
const CYCLE_TAKE: usize = 15;
/// History buffer cap; oldest entries beyond this are dropped.
const HISTORY_CAP: usize = 20;

const DEMO_SOURCE: &str = "Demo (no API data)";

// ---------------------------------------------------------------------------
// WhaleDetector
// ---------------------------------------------------------------------------

/// Merges whale-transfer candidates from every configured source into a
/// bounded, deduplicated history.
///
/// Rules per cycle:
/// - Sources are polled in order and tolerantly: one failing source logs a
///   warning and contributes nothing, the rest still run.
/// - When every source comes back empty, a fixed demo set (flagged
///   `is_real = false`) stands in so the feed is never blank.
/// - Candidates are sorted newest first, capped at 15, then deduplicated
///   against history by `full_hash`. Only genuinely new entries are
///   prepended, and only those are returned to the caller.
pub struct WhaleDetector {
    sources: Vec<Arc<dyn TransferSource>>,
    history: Mutex<Vec<WhaleTransfer>>,
}

impl WhaleDetector {
    pub fn new(sources: Vec<Arc<dyn TransferSource>>) -> Self {
        Self {
            sources,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Run one detection cycle and return the genuinely new transfers.
    pub async fn detect(&self, prices: &HashMap<Symbol, Decimal>) -> Vec<WhaleTransfer> {
        let started = std::time::Instant::now();

        let mut candidates = Vec::new();
        for source in &self.sources {
            match source.fetch_transfers(prices).await {
                Ok(mut transfers) => {
                    tracing::debug!(
                        source = source.name(),
                        count = transfers.len(),
                        "Transfer source polled"
                    );
                    candidates.append(&mut transfers);
                }
                Err(e) => {
                    tracing::warn!(source = source.name(), error = %e, "Transfer source failed");
                }
            }
        }

        if candidates.is_empty() {
            counter!("demo_fallbacks_total").increment(1);
            tracing::info!("No live whale signals this cycle, substituting demo entries");
            candidates = demo_transfers(prices, Utc::now());
        }

        candidates.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        candidates.truncate(CYCLE_TAKE);

        let mut history = self.history.lock().await;
        let fresh: Vec<WhaleTransfer> = candidates
            .into_iter()
            .filter(|c| !history.iter().any(|h| h.full_hash == c.full_hash))
            .collect();

        if !fresh.is_empty() {
            counter!("transfers_detected_total").increment(fresh.len() as u64);
            let mut merged = Vec::with_capacity(fresh.len() + history.len());
            merged.extend(fresh.iter().cloned());
            merged.append(&mut history);
            merged.truncate(HISTORY_CAP);
            *history = merged;
            tracing::info!(
                new = fresh.len(),
                history = history.len(),
                "Whale transfers updated"
            );
        }
        gauge!("transfer_history_entries").set(history.len() as f64);
        histogram!("whale_cycle_seconds").record(started.elapsed().as_secs_f64());

        fresh
    }

    /// Snapshot of the retained history, newest first.
    pub async fn transfers(&self) -> Vec<WhaleTransfer> {
        self.history.lock().await.clone()
    }
}

// ---------------------------------------------------------------------------
// Demo fallback
// ---------------------------------------------------------------------------

/// Fixed placeholder transfers shown when no live signal was found, valued
/// at current (or fallback) prices.
fn demo_transfers(prices: &HashMap<Symbol, Decimal>, now: DateTime<Utc>) -> Vec<WhaleTransfer> {
    let price_of =
        |symbol: Symbol| -> Decimal { prices.get(&symbol).copied().unwrap_or_else(|| symbol.fallback_price()) };

    let btc_amount = Decimal::new(258, 1);
    let eth_amount = Decimal::new(1_250, 0);
    let sol_amount = Decimal::new(15_000, 0);

    vec![
        WhaleTransfer {
            id: "demo_btc_recent".to_string(),
            symbol: Symbol::Btc,
            amount: btc_amount,
            value_usd: btc_amount * price_of(Symbol::Btc),
            from: "Cold Storage".to_string(),
            to: "Exchange".to_string(),
            from_address: "bc1q...xyz".to_string(),
            to_address: "bc1q...abc".to_string(),
            hash: "Demo____BTC1".to_string(),
            full_hash: "demo-btc-transaction-recent-example".to_string(),
            timestamp: now - Duration::minutes(30),
            transfer_type: TransferType::MempoolTransfer,
            network: Network::Bitcoin,
            prediction: Prediction::Bearish,
            is_real: false,
            source: DEMO_SOURCE.to_string(),
        },
        WhaleTransfer {
            id: "demo_eth_volume".to_string(),
            symbol: Symbol::Eth,
            amount: eth_amount,
            value_usd: eth_amount * price_of(Symbol::Eth),
            from: "Volume Spike Detected".to_string(),
            to: "Market Activity".to_string(),
            from_address: "Volume Analysis".to_string(),
            to_address: "ETH Market".to_string(),
            hash: "Demo____ETH1".to_string(),
            full_hash: "demo-eth-volume-spike-example".to_string(),
            timestamp: now - Duration::hours(1),
            transfer_type: TransferType::VolumeSpike,
            network: Network::Ethereum,
            prediction: Prediction::Bullish,
            is_real: false,
            source: DEMO_SOURCE.to_string(),
        },
        WhaleTransfer {
            id: "demo_sol_activity".to_string(),
            symbol: Symbol::Sol,
            amount: sol_amount,
            value_usd: sol_amount * price_of(Symbol::Sol),
            from: "SOL Volume Spike".to_string(),
            to: "Market Activity".to_string(),
            from_address: "Volume Analysis".to_string(),
            to_address: "SOL Market".to_string(),
            hash: "Demo____SOL1".to_string(),
            full_hash: "demo-sol-volume-activity-example".to_string(),
            timestamp: now - Duration::hours(2),
            transfer_type: TransferType::VolumeSpike,
            network: Network::Solana,
            prediction: Prediction::Bullish,
            is_real: false,
            source: DEMO_SOURCE.to_string(),
        },
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceError;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    struct ScriptedSource {
        name: &'static str,
        batches: Mutex<VecDeque<Result<Vec<WhaleTransfer>, SourceError>>>,
    }

    impl ScriptedSource {
        fn new(
            name: &'static str,
            batches: Vec<Result<Vec<WhaleTransfer>, SourceError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                name,
                batches: Mutex::new(batches.into()),
            })
        }
    }

    #[async_trait]
    impl TransferSource for ScriptedSource {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch_transfers(
            &self,
            _prices: &HashMap<Symbol, Decimal>,
        ) -> Result<Vec<WhaleTransfer>, SourceError> {
            self.batches
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn make_transfer(id: &str, full_hash: &str, age_secs: i64) -> WhaleTransfer {
        WhaleTransfer {
            id: id.to_string(),
            symbol: Symbol::Eth,
            amount: Decimal::new(500, 0),
            value_usd: Decimal::new(2_000_000, 0),
            from: "Unknown Wallet".to_string(),
            to: "Binance".to_string(),
            from_address: "0xabc".to_string(),
            to_address: "0xdef".to_string(),
            hash: "0xabc1____beef".to_string(),
            full_hash: full_hash.to_string(),
            timestamp: Utc::now() - Duration::seconds(age_secs),
            transfer_type: TransferType::ExchangeInflow,
            network: Network::Ethereum,
            prediction: Prediction::Neutral,
            is_real: true,
            source: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn demo_fallback_when_all_sources_are_empty() {
        let detector = WhaleDetector::new(vec![
            ScriptedSource::new("empty", vec![Ok(Vec::new())]),
            ScriptedSource::new(
                "broken",
                vec![Err(SourceError::Unexpected("boom".to_string()))],
            ),
        ]);

        let fresh = detector.detect(&HashMap::new()).await;
        assert_eq!(fresh.len(), 3);
        assert!(fresh.iter().all(|t| !t.is_real));
        // Valued at fallback prices when no live quote exists
        let btc = fresh
            .iter()
            .find(|t| t.symbol == Symbol::Btc)
            .map(|t| t.value_usd);
        assert_eq!(btc, Some(Decimal::new(2_580_000, 0)));
    }

    #[tokio::test]
    async fn one_failing_source_does_not_trigger_demo_data() {
        let detector = WhaleDetector::new(vec![
            ScriptedSource::new(
                "broken",
                vec![Err(SourceError::Unexpected("boom".to_string()))],
            ),
            ScriptedSource::new("live", vec![Ok(vec![make_transfer("a", "hash-a", 10)])]),
        ]);

        let fresh = detector.detect(&HashMap::new()).await;
        assert_eq!(fresh.len(), 1);
        assert!(fresh[0].is_real);
        assert_eq!(fresh[0].full_hash, "hash-a");
    }

    #[tokio::test]
    async fn repeated_full_hash_is_reported_once() {
        let detector = WhaleDetector::new(vec![ScriptedSource::new(
            "live",
            vec![
                Ok(vec![make_transfer("a", "same-hash", 10)]),
                // Same logical event, different source-assigned id
                Ok(vec![make_transfer("b", "same-hash", 5)]),
            ],
        )]);

        let first = detector.detect(&HashMap::new()).await;
        assert_eq!(first.len(), 1);

        let second = detector.detect(&HashMap::new()).await;
        assert!(second.is_empty());
        assert_eq!(detector.transfers().await.len(), 1);
    }

    #[tokio::test]
    async fn cycle_keeps_the_fifteen_newest_candidates() {
        let batch: Vec<WhaleTransfer> = (0..18)
            .map(|i| make_transfer(&format!("id{i}"), &format!("hash{i}"), i * 60))
            .collect();
        let detector = WhaleDetector::new(vec![ScriptedSource::new("live", vec![Ok(batch)])]);

        let fresh = detector.detect(&HashMap::new()).await;
        assert_eq!(fresh.len(), 15);
        // Newest first; the three oldest candidates were cut
        assert_eq!(fresh[0].full_hash, "hash0");
        assert!(!fresh.iter().any(|t| t.full_hash == "hash17"));
    }

    #[tokio::test]
    async fn history_is_capped_and_newest_first() {
        let first: Vec<WhaleTransfer> = (0..15)
            .map(|i| make_transfer(&format!("a{i}"), &format!("old{i}"), 3_600 + i * 60))
            .collect();
        let second: Vec<WhaleTransfer> = (0..15)
            .map(|i| make_transfer(&format!("b{i}"), &format!("new{i}"), i * 60))
            .collect();
        let detector = WhaleDetector::new(vec![ScriptedSource::new(
            "live",
            vec![Ok(first), Ok(second)],
        )]);

        detector.detect(&HashMap::new()).await;
        let fresh = detector.detect(&HashMap::new()).await;
        assert_eq!(fresh.len(), 15);

        let history = detector.transfers().await;
        assert_eq!(history.len(), HISTORY_CAP);
        assert_eq!(history[0].full_hash, "new0");
        assert_eq!(history[14].full_hash, "new14");
        // Only the five newest of the older cycle survive the cap
        assert_eq!(history[15].full_hash, "old0");
        assert_eq!(history[19].full_hash, "old4");
    }
}
