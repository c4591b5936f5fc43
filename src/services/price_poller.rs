use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::PollConfig;
use crate::models::{
    ApiSource, ConnectionStatus, FundingRecord, OpenInterestRecord, PriceRecord, PriceState,
    Symbol,
};
use crate::services::rate_limit::RateLimiter;
use crate::sources::{DerivativesSource, SpotSource};

/// Consecutive failed cycles before the poll interval backs off.
pub const BACKOFF_RETRY_THRESHOLD: u32 = 3;

// ---------------------------------------------------------------------------
// Interval policy
// ---------------------------------------------------------------------------

/// Poll interval for the current conditions, strongest rule first:
/// hidden page, then failure backoff, then power save, then normal.
pub fn interval_policy(
    poll: &PollConfig,
    visible: bool,
    power_save: bool,
    retry_count: u32,
) -> Duration {
    if !visible {
        poll.price_interval_hidden
    } else if retry_count >= BACKOFF_RETRY_THRESHOLD {
        poll.price_interval_backoff
    } else if power_save {
        poll.price_interval_power_save
    } else {
        poll.price_interval
    }
}

// ---------------------------------------------------------------------------
// PricePoller
// ---------------------------------------------------------------------------

/// Request-side counters surfaced to the dashboard's developer panel.
#[derive(Debug, Clone, Serialize)]
pub struct PollerStats {
    pub total_requests: u64,
    pub last_request_at: Option<DateTime<Utc>>,
    pub connection: ConnectionStatus,
    pub api_source: Option<ApiSource>,
    pub retry_count: u32,
}

/// Polls spot prices with ordered source fallback, then follows up with a
/// derivatives poll on success.
///
/// Rules per cycle:
/// - The rate limiter gates the whole cycle; a denied cycle changes nothing.
/// - The primary source fans out per symbol and succeeds when at least half
///   the symbols came back parseable. The secondary is only tried after the
///   primary's failure is established, and succeeds on any parseable body.
/// - New quotes overwrite, missing symbols keep their previous records.
/// - Both sources failing folds into one error string and bumps
///   `retry_count`; any success resets it.
/// - Funding and open-interest maps are replaced wholesale with whatever the
///   derivatives source returned; a missing symbol means unknown this cycle.
pub struct PricePoller {
    symbols: Vec<Symbol>,
    primary: Arc<dyn SpotSource>,
    secondary: Arc<dyn SpotSource>,
    derivatives: Arc<dyn DerivativesSource>,
    state: Mutex<PriceState>,
    funding: Mutex<HashMap<Symbol, FundingRecord>>,
    open_interest: Mutex<HashMap<Symbol, OpenInterestRecord>>,
    limiter: Mutex<RateLimiter>,
}

impl PricePoller {
    pub fn new(
        primary: Arc<dyn SpotSource>,
        secondary: Arc<dyn SpotSource>,
        derivatives: Arc<dyn DerivativesSource>,
    ) -> Self {
        Self {
            symbols: Symbol::ALL.to_vec(),
            primary,
            secondary,
            derivatives,
            state: Mutex::new(PriceState::new()),
            funding: Mutex::new(HashMap::new()),
            open_interest: Mutex::new(HashMap::new()),
            limiter: Mutex::new(RateLimiter::new()),
        }
    }

    /// Run one full polling cycle. Returns the retry count after the cycle
    /// so the caller can reprogram the poll interval.
    pub async fn run_cycle(&self) -> u32 {
        {
            let mut limiter = self.limiter.lock().await;
            if !limiter.can_make_request() {
                counter!("rate_limited_skips_total").increment(1);
                tracing::debug!("Price cycle denied by rate limiter");
                return self.state.lock().await.retry_count;
            }
            limiter.record_request();
        }
        counter!("price_cycles_total").increment(1);
        let started = std::time::Instant::now();

        {
            let mut state = self.state.lock().await;
            if state.connection == ConnectionStatus::Idle {
                state.connection = ConnectionStatus::Loading;
            }
            state.loading = true;
            state.error = None;
        }

        // Primary succeeds on >= 50% symbol coverage.
        let needed = self.symbols.len().div_ceil(2);
        let primary_err = match self.primary.fetch_quotes(&self.symbols).await {
            Ok(quotes) if quotes.len() >= needed => {
                self.apply_success(quotes, ApiSource::Binance).await;
                None
            }
            Ok(quotes) => Some(format!(
                "{}: only {} of {} symbols",
                self.primary.name(),
                quotes.len(),
                self.symbols.len()
            )),
            Err(e) => Some(format!("{}: {}", self.primary.name(), e)),
        };

        if let Some(primary_err) = primary_err {
            tracing::warn!(error = %primary_err, "Primary price source failed, falling back");
            match self.secondary.fetch_quotes(&self.symbols).await {
                Ok(quotes) => self.apply_success(quotes, ApiSource::Coingecko).await,
                Err(e) => {
                    let combined = format!("{} | {}: {}", primary_err, self.secondary.name(), e);
                    self.apply_failure(combined).await;
                }
            }
        }

        let connected = {
            let state = self.state.lock().await;
            state.connection == ConnectionStatus::Connected
        };
        if connected {
            self.refresh_derivatives().await;
        }

        histogram!("price_cycle_seconds").record(started.elapsed().as_secs_f64());
        self.state.lock().await.retry_count
    }

    async fn apply_success(&self, quotes: HashMap<Symbol, PriceRecord>, source: ApiSource) {
        let fetched = quotes.len();
        let mut state = self.state.lock().await;
        for (symbol, record) in quotes {
            state.prices.insert(symbol, record);
        }
        state.loading = false;
        state.error = None;
        state.connection = ConnectionStatus::Connected;
        state.api_source = Some(source);
        state.retry_count = 0;
        state.last_update = Some(Utc::now());
        tracing::info!(source = %source, symbols = fetched, "Spot prices refreshed");
    }

    async fn apply_failure(&self, error: String) {
        counter!("price_cycle_failures_total").increment(1);
        let mut state = self.state.lock().await;
        state.loading = false;
        state.connection = ConnectionStatus::Error;
        state.retry_count += 1;
        tracing::error!(
            error = %error,
            retry_count = state.retry_count,
            "All price sources failed, keeping previous quotes"
        );
        state.error = Some(error);
    }

    /// Funding and open interest, polled only after a connected spot cycle.
    /// Failures here never touch the spot cycle's outcome.
    async fn refresh_derivatives(&self) {
        match self.derivatives.fetch_funding(&self.symbols).await {
            Ok(funding) => {
                tracing::debug!(symbols = funding.len(), "Funding rates refreshed");
                *self.funding.lock().await = funding;
            }
            Err(e) => {
                tracing::warn!(source = self.derivatives.name(), error = %e, "Funding poll failed");
            }
        }

        match self.derivatives.fetch_open_interest(&self.symbols).await {
            Ok(amounts) => {
                let valued = {
                    let state = self.state.lock().await;
                    amounts
                        .into_iter()
                        .map(|(symbol, amount)| {
                            let notional = amount * state.price_or_fallback(symbol);
                            (symbol, OpenInterestRecord { amount, notional })
                        })
                        .collect::<HashMap<_, _>>()
                };
                tracing::debug!(symbols = valued.len(), "Open interest refreshed");
                *self.open_interest.lock().await = valued;
            }
            Err(e) => {
                tracing::warn!(source = self.derivatives.name(), error = %e, "Open interest poll failed");
            }
        }
    }

    // -- read-side snapshots -------------------------------------------------

    pub async fn price_state(&self) -> PriceState {
        self.state.lock().await.clone()
    }

    pub async fn funding(&self) -> HashMap<Symbol, FundingRecord> {
        self.funding.lock().await.clone()
    }

    pub async fn open_interest(&self) -> HashMap<Symbol, OpenInterestRecord> {
        self.open_interest.lock().await.clone()
    }

    /// Effective USD conversion price per tracked symbol, live where
    /// available and static fallback otherwise.
    pub async fn conversion_prices(&self) -> HashMap<Symbol, Decimal> {
        let state = self.state.lock().await;
        self.symbols
            .iter()
            .map(|s| (*s, state.price_or_fallback(*s)))
            .collect()
    }

    pub async fn stats(&self) -> PollerStats {
        let limiter = self.limiter.lock().await;
        let state = self.state.lock().await;
        PollerStats {
            total_requests: limiter.total_requests(),
            last_request_at: limiter.last_request_at(),
            connection: state.connection,
            api_source: state.api_source,
            retry_count: state.retry_count,
        }
    }
}
