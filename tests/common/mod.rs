use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;

use whalewatch::models::{
    FundingRecord, Network, Prediction, PriceRecord, Symbol, TransferType, WhaleTransfer,
};
use whalewatch::sources::{DerivativesSource, SourceError, SpotSource, TransferSource};

#[allow(dead_code)]
static METRICS: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the process-wide recorder once and hand out its handle.
#[allow(dead_code)]
pub fn metrics_handle() -> PrometheusHandle {
    METRICS.get_or_init(whalewatch::init_metrics).clone()
}

// ---------------------------------------------------------------------------
// Scripted sources
// ---------------------------------------------------------------------------

type SpotStep = Result<HashMap<Symbol, PriceRecord>, String>;

/// Spot source that replays a scripted sequence of outcomes; once the
/// script is down to its last step, that step repeats forever.
#[allow(dead_code)]
pub struct ScriptedSpot {
    name: &'static str,
    steps: Mutex<VecDeque<SpotStep>>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedSpot {
    pub fn new(name: &'static str, steps: Vec<SpotStep>) -> Self {
        Self {
            name,
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fetch attempts made against this source so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> SpotStep {
        let mut steps = self.steps.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(HashMap::new()))
        }
    }
}

#[async_trait]
impl SpotSource for ScriptedSpot {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_quotes(
        &self,
        _symbols: &[Symbol],
    ) -> Result<HashMap<Symbol, PriceRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.next_step().map_err(SourceError::Unexpected)
    }
}

/// Derivatives source with fixed payloads and a health switch.
#[allow(dead_code)]
pub struct ScriptedDerivatives {
    funding: HashMap<Symbol, FundingRecord>,
    open_interest: HashMap<Symbol, Decimal>,
    healthy: AtomicBool,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedDerivatives {
    pub fn new(
        funding: HashMap<Symbol, FundingRecord>,
        open_interest: HashMap<Symbol, Decimal>,
    ) -> Self {
        Self {
            funding,
            open_interest,
            healthy: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(HashMap::new(), HashMap::new())
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Fetch attempts (funding and open interest each count one).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DerivativesSource for ScriptedDerivatives {
    fn name(&self) -> &'static str {
        "derivatives-test"
    }

    async fn fetch_funding(
        &self,
        _symbols: &[Symbol],
    ) -> Result<HashMap<Symbol, FundingRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.healthy.load(Ordering::SeqCst) {
            return Err(SourceError::Unexpected("derivatives offline".into()));
        }
        Ok(self.funding.clone())
    }

    async fn fetch_open_interest(
        &self,
        _symbols: &[Symbol],
    ) -> Result<HashMap<Symbol, Decimal>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.healthy.load(Ordering::SeqCst) {
            return Err(SourceError::Unexpected("derivatives offline".into()));
        }
        Ok(self.open_interest.clone())
    }
}

type TransferStep = Result<Vec<WhaleTransfer>, String>;

/// Transfer source with the same repeat-last script semantics as
/// [`ScriptedSpot`]. An exhausted empty script keeps returning no transfers.
#[allow(dead_code)]
pub struct ScriptedTransfers {
    name: &'static str,
    steps: Mutex<VecDeque<TransferStep>>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedTransfers {
    pub fn new(name: &'static str, steps: Vec<TransferStep>) -> Self {
        Self {
            name,
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> TransferStep {
        let mut steps = self.steps.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps.front().cloned().unwrap_or_else(|| Ok(Vec::new()))
        }
    }
}

#[async_trait]
impl TransferSource for ScriptedTransfers {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_transfers(
        &self,
        _prices: &HashMap<Symbol, Decimal>,
    ) -> Result<Vec<WhaleTransfer>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.next_step().map_err(SourceError::Unexpected)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A quote around the given price with plausible 24h context.
#[allow(dead_code)]
pub fn quote(price: i64) -> PriceRecord {
    PriceRecord {
        price: Decimal::from(price),
        change_24h_pct: Decimal::new(12, 1),
        volume_24h: Decimal::from(2_000_000_000_i64),
        high_24h: Decimal::from(price) * Decimal::new(102, 2),
        low_24h: Decimal::from(price) * Decimal::new(98, 2),
    }
}

#[allow(dead_code)]
pub fn quotes(entries: &[(Symbol, i64)]) -> HashMap<Symbol, PriceRecord> {
    entries.iter().map(|(s, p)| (*s, quote(*p))).collect()
}

/// All four tracked symbols quoted.
#[allow(dead_code)]
pub fn full_quotes() -> HashMap<Symbol, PriceRecord> {
    quotes(&[
        (Symbol::Btc, 97_000),
        (Symbol::Eth, 3_500),
        (Symbol::Sol, 210),
        (Symbol::Rndr, 9),
    ])
}

#[allow(dead_code)]
pub fn make_transfer(id: &str, value_usd: i64, minutes_ago: i64) -> WhaleTransfer {
    WhaleTransfer {
        id: id.to_string(),
        symbol: Symbol::Btc,
        amount: Decimal::from(25),
        value_usd: Decimal::from(value_usd),
        from: "Unknown Wallet".to_string(),
        to: "Binance".to_string(),
        from_address: "bc1qfrom".to_string(),
        to_address: "bc1qto".to_string(),
        hash: format!("{id}____hash"),
        full_hash: format!("{id}-full-hash"),
        timestamp: Utc::now() - ChronoDuration::minutes(minutes_ago),
        transfer_type: TransferType::ExchangeInflow,
        network: Network::Bitcoin,
        prediction: Prediction::Bearish,
        is_real: true,
        source: "Mempool.space".to_string(),
    }
}

/// Funding snapshot at the given rate (in percent).
#[allow(dead_code)]
pub fn funding_record(rate: Decimal) -> FundingRecord {
    FundingRecord {
        rate,
        next_funding_time: Utc::now() + ChronoDuration::hours(4),
        mark_price: Decimal::from(97_000),
    }
}
