use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::format::{format_funding_rate, format_transfer_amount, format_usd_value};
use crate::models::{
    CriticalEvent, EventData, EventKind, FundingRecord, Network, Prediction, Severity,
    SoundProfile, Symbol, TransferType, WhaleTransfer,
};

/// USD floor for a whale transfer to alert at all.
const WHALE_ALERT_USD: i64 = 2_000_000;
/// USD floor for critical severity.
const WHALE_CRITICAL_USD: i64 = 10_000_000;

// ---------------------------------------------------------------------------
// AlertChannel
// ---------------------------------------------------------------------------

/// Delivery backend for system-level notifications.
///
/// Failures are tolerated: the visual alert still displays, the channel
/// error is only logged.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    async fn send(&self, event: &CriticalEvent) -> anyhow::Result<()>;
}

/// Default channel: writes the alert to the log.
pub struct LogChannel;

#[async_trait]
impl AlertChannel for LogChannel {
    async fn send(&self, event: &CriticalEvent) -> anyhow::Result<()> {
        tracing::info!(
            kind = event.kind.as_str(),
            severity = %event.severity,
            title = %event.title,
            message = %event.message,
            "Alert"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AlertCenter
// ---------------------------------------------------------------------------

struct ActiveAlert {
    event: CriticalEvent,
    expires_at: Instant,
}

struct AlertInner {
    notified: HashSet<String>,
    notifications_enabled: bool,
    sound_enabled: bool,
    current: Option<ActiveAlert>,
}

/// Turns newly detected transfers and funding snapshots into critical
/// events, and owns the transient on-screen alert.
///
/// Rules:
/// - A transfer alerts once per id (the notified set only grows) and only
///   at `value_usd >= $2M`; `>= $10M` is critical severity, else high.
/// - A funding rate alerts at `|rate| >= 0.1%` (critical at `>= 0.2%`) and
///   re-fires every evaluation while the condition holds.
/// - Disabling notifications suppresses display and delivery, not event
///   production: transfers evaluated while muted are still marked notified.
/// - The newest delivered event replaces the current alert, which expires
///   `display_duration` after being raised. Expiry is lazy: the reader
///   checks the deadline, so no timer outlives the center.
pub struct AlertCenter {
    inner: Mutex<AlertInner>,
    channel: Arc<dyn AlertChannel>,
    display_duration: Duration,
}

impl AlertCenter {
    pub fn new(
        channel: Arc<dyn AlertChannel>,
        notifications_enabled: bool,
        sound_enabled: bool,
        display_duration: Duration,
    ) -> Self {
        Self {
            inner: Mutex::new(AlertInner {
                notified: HashSet::new(),
                notifications_enabled,
                sound_enabled,
                current: None,
            }),
            channel,
            display_duration,
        }
    }

    /// Evaluate one cycle's new transfers plus the latest funding snapshot.
    /// Returns every event produced, delivered or not.
    pub async fn evaluate(
        &self,
        new_transfers: &[WhaleTransfer],
        funding: &HashMap<Symbol, FundingRecord>,
    ) -> Vec<CriticalEvent> {
        let mut inner = self.inner.lock().await;
        let mut events = Vec::new();

        for transfer in new_transfers {
            if transfer.value_usd < Decimal::from(WHALE_ALERT_USD)
                || inner.notified.contains(&transfer.id)
            {
                continue;
            }
            inner.notified.insert(transfer.id.clone());
            events.push(whale_event(transfer));
        }

        // Fixed symbol order keeps the "last event wins" outcome stable.
        for symbol in Symbol::ALL {
            let Some(record) = funding.get(&symbol) else {
                continue;
            };
            if record.rate.abs() >= Decimal::new(1, 1) {
                events.push(funding_event(symbol, record));
            }
        }

        if inner.notifications_enabled {
            for event in &events {
                self.deliver(&mut inner, event.clone()).await;
            }
        } else if !events.is_empty() {
            tracing::debug!(
                count = events.len(),
                "Notifications disabled, events produced but not displayed"
            );
        }

        events
    }

    /// Raise a canned critical event through the full delivery path, for
    /// exercising the notification chain end to end.
    pub async fn test_alert(&self) -> CriticalEvent {
        let amount = Decimal::from(50);
        let value_usd = Decimal::from(5_000_000);
        let event = CriticalEvent {
            id: "test_alert".to_string(),
            kind: EventKind::WhaleTransfer,
            severity: Severity::Critical,
            title: "Notification test".to_string(),
            message: format!(
                "TEST: {} ({}) - Cold Storage -> Exchange",
                format_transfer_amount(amount, "BTC"),
                format_usd_value(value_usd)
            ),
            sound: SoundProfile::Critical,
            timestamp: Utc::now(),
            data: EventData::Whale(WhaleTransfer {
                id: "test_alert".to_string(),
                symbol: Symbol::Btc,
                amount,
                value_usd,
                from: "Cold Storage".to_string(),
                to: "Exchange".to_string(),
                from_address: "bc1q...cold".to_string(),
                to_address: "bc1q...hot".to_string(),
                hash: "Test____BTC1".to_string(),
                full_hash: "notification-test-event".to_string(),
                timestamp: Utc::now(),
                transfer_type: TransferType::ColdStorageMove,
                network: Network::Bitcoin,
                prediction: Prediction::Bullish,
                is_real: false,
                source: "Notification test".to_string(),
            }),
        };

        let mut inner = self.inner.lock().await;
        self.deliver(&mut inner, event.clone()).await;
        event
    }

    async fn deliver(&self, inner: &mut AlertInner, event: CriticalEvent) {
        counter!("alerts_raised_total").increment(1);
        tracing::info!(
            kind = event.kind.as_str(),
            severity = %event.severity,
            message = %event.message,
            "Raising alert"
        );
        if inner.sound_enabled {
            let tone = event.sound.tone();
            tracing::debug!(
                sound = ?event.sound,
                duration_secs = tone.duration_secs,
                "Alert tone selected"
            );
        }
        if let Err(e) = self.channel.send(&event).await {
            tracing::warn!(error = %e, "Alert channel delivery failed");
        }
        inner.current = Some(ActiveAlert {
            event,
            expires_at: Instant::now() + self.display_duration,
        });
    }

    /// The alert currently on screen, if it has not expired or been
    /// dismissed.
    pub async fn current_alert(&self) -> Option<CriticalEvent> {
        let mut inner = self.inner.lock().await;
        match &inner.current {
            Some(active) if Instant::now() < active.expires_at => Some(active.event.clone()),
            Some(_) => {
                inner.current = None;
                None
            }
            None => None,
        }
    }

    /// Clear the current alert ahead of its expiry.
    pub async fn dismiss(&self) {
        self.inner.lock().await.current = None;
    }

    pub async fn set_notifications_enabled(&self, enabled: bool) {
        self.inner.lock().await.notifications_enabled = enabled;
        tracing::info!(enabled, "Notifications toggled");
    }

    pub async fn notifications_enabled(&self) -> bool {
        self.inner.lock().await.notifications_enabled
    }

    pub async fn set_sound_enabled(&self, enabled: bool) {
        self.inner.lock().await.sound_enabled = enabled;
        tracing::info!(enabled, "Alert sound toggled");
    }

    pub async fn sound_enabled(&self) -> bool {
        self.inner.lock().await.sound_enabled
    }
}

// ---------------------------------------------------------------------------
// Event builders
// ---------------------------------------------------------------------------

fn whale_event(transfer: &WhaleTransfer) -> CriticalEvent {
    let critical = transfer.value_usd >= Decimal::from(WHALE_CRITICAL_USD);
    CriticalEvent {
        id: transfer.id.clone(),
        kind: EventKind::WhaleTransfer,
        severity: if critical {
            Severity::Critical
        } else {
            Severity::High
        },
        title: "Whale transfer".to_string(),
        message: format!(
            "WHALE: {} ({})",
            format_transfer_amount(transfer.amount, transfer.symbol.code()),
            format_usd_value(transfer.value_usd)
        ),
        sound: if critical {
            SoundProfile::Critical
        } else {
            SoundProfile::Whale
        },
        timestamp: Utc::now(),
        data: EventData::Whale(transfer.clone()),
    }
}

fn funding_event(symbol: Symbol, record: &FundingRecord) -> CriticalEvent {
    let critical = record.rate.abs() >= Decimal::new(2, 1);
    let direction = if record.rate > Decimal::ZERO {
        "longs pay"
    } else {
        "shorts pay"
    };
    CriticalEvent {
        id: format!("funding_{}", symbol.code().to_lowercase()),
        kind: EventKind::FundingExtreme,
        severity: if critical {
            Severity::Critical
        } else {
            Severity::Medium
        },
        title: "Extreme funding".to_string(),
        message: format!(
            "EXTREME FUNDING: {} {} ({direction})",
            symbol.code(),
            format_funding_rate(record.rate)
        ),
        sound: SoundProfile::Funding,
        timestamp: Utc::now(),
        data: EventData::Funding {
            symbol,
            rate: record.rate,
            mark_price: record.mark_price,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingChannel {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AlertChannel for RecordingChannel {
        async fn send(&self, event: &CriticalEvent) -> anyhow::Result<()> {
            self.sent.lock().await.push(event.message.clone());
            Ok(())
        }
    }

    struct FailingChannel;

    #[async_trait]
    impl AlertChannel for FailingChannel {
        async fn send(&self, _event: &CriticalEvent) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("channel down"))
        }
    }

    fn make_transfer(id: &str, value_usd: i64) -> WhaleTransfer {
        WhaleTransfer {
            id: id.to_string(),
            symbol: Symbol::Btc,
            amount: Decimal::new(25, 0),
            value_usd: Decimal::from(value_usd),
            from: "Unknown Wallet".to_string(),
            to: "Binance".to_string(),
            from_address: "bc1qfrom".to_string(),
            to_address: "bc1qto".to_string(),
            hash: "abc123____de45".to_string(),
            full_hash: format!("{id}-full-hash"),
            timestamp: Utc::now(),
            transfer_type: TransferType::ExchangeInflow,
            network: Network::Bitcoin,
            prediction: Prediction::Neutral,
            is_real: true,
            source: "test".to_string(),
        }
    }

    fn make_funding(rate: Decimal) -> FundingRecord {
        FundingRecord {
            rate,
            next_funding_time: Utc::now() + chrono::Duration::hours(4),
            mark_price: Decimal::new(97_000, 0),
        }
    }

    fn center() -> AlertCenter {
        AlertCenter::new(Arc::new(LogChannel), true, true, Duration::from_secs(8))
    }

    #[tokio::test]
    async fn whale_value_thresholds_gate_severity() {
        let center = center();
        let no_funding = HashMap::new();

        let events = center
            .evaluate(&[make_transfer("small", 1_999_999)], &no_funding)
            .await;
        assert!(events.is_empty());

        let events = center
            .evaluate(&[make_transfer("high", 2_000_000)], &no_funding)
            .await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::High);
        assert_eq!(events[0].sound, SoundProfile::Whale);

        let events = center
            .evaluate(&[make_transfer("almost", 9_999_999)], &no_funding)
            .await;
        assert_eq!(events[0].severity, Severity::High);

        let events = center
            .evaluate(&[make_transfer("huge", 10_000_000)], &no_funding)
            .await;
        assert_eq!(events[0].severity, Severity::Critical);
        assert_eq!(events[0].sound, SoundProfile::Critical);
    }

    #[tokio::test]
    async fn whale_event_fires_once_per_id() {
        let center = center();
        let no_funding = HashMap::new();
        let transfer = make_transfer("whale-1", 3_000_000);

        let first = center.evaluate(&[transfer.clone()], &no_funding).await;
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].kind, EventKind::WhaleTransfer);

        let second = center.evaluate(&[transfer], &no_funding).await;
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn funding_thresholds_and_refiring() {
        let center = center();
        let mut funding = HashMap::new();
        funding.insert(Symbol::Btc, make_funding(Decimal::new(999, 4)));

        // 0.0999% is under the floor
        assert!(center.evaluate(&[], &funding).await.is_empty());

        funding.insert(Symbol::Btc, make_funding(Decimal::new(1, 1)));
        let events = center.evaluate(&[], &funding).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Medium);
        assert_eq!(events[0].sound, SoundProfile::Funding);
        assert!(events[0].message.contains("longs pay"));

        // Same snapshot fires again next evaluation
        let events = center.evaluate(&[], &funding).await;
        assert_eq!(events.len(), 1);

        funding.insert(Symbol::Btc, make_funding(Decimal::new(-2, 1)));
        let events = center.evaluate(&[], &funding).await;
        assert_eq!(events[0].severity, Severity::Critical);
        assert!(events[0].message.contains("shorts pay"));
    }

    #[tokio::test]
    async fn muted_center_still_marks_transfers_notified() {
        let center = AlertCenter::new(Arc::new(LogChannel), false, true, Duration::from_secs(8));
        let no_funding = HashMap::new();
        let transfer = make_transfer("muted-whale", 5_000_000);

        let events = center.evaluate(&[transfer.clone()], &no_funding).await;
        assert_eq!(events.len(), 1);
        assert!(center.current_alert().await.is_none());

        // Re-enabling must not replay transfers seen while muted
        center.set_notifications_enabled(true).await;
        let events = center.evaluate(&[transfer], &no_funding).await;
        assert!(events.is_empty());
        assert!(center.current_alert().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn current_alert_expires_lazily() {
        let center = center();
        center
            .evaluate(&[make_transfer("expiring", 3_000_000)], &HashMap::new())
            .await;
        assert!(center.current_alert().await.is_some());

        tokio::time::advance(Duration::from_secs(7)).await;
        assert!(center.current_alert().await.is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(center.current_alert().await.is_none());
    }

    #[tokio::test]
    async fn newest_event_wins_the_display() {
        let center = center();
        let mut funding = HashMap::new();
        funding.insert(Symbol::Eth, make_funding(Decimal::new(15, 2)));

        center
            .evaluate(
                &[
                    make_transfer("first", 3_000_000),
                    make_transfer("second", 12_000_000),
                ],
                &funding,
            )
            .await;

        // Funding events are evaluated after whales, so the funding alert
        // is the one left on screen.
        let current = center.current_alert().await.unwrap();
        assert_eq!(current.kind, EventKind::FundingExtreme);
        assert_eq!(current.id, "funding_eth");
    }

    #[tokio::test]
    async fn dismiss_clears_before_expiry() {
        let center = center();
        center
            .evaluate(&[make_transfer("dismissed", 3_000_000)], &HashMap::new())
            .await;
        assert!(center.current_alert().await.is_some());

        center.dismiss().await;
        assert!(center.current_alert().await.is_none());
    }

    #[tokio::test]
    async fn channel_failure_does_not_block_display() {
        let center = AlertCenter::new(Arc::new(FailingChannel), true, true, Duration::from_secs(8));
        center
            .evaluate(&[make_transfer("undelivered", 3_000_000)], &HashMap::new())
            .await;
        assert!(center.current_alert().await.is_some());
    }

    #[tokio::test]
    async fn events_reach_the_channel() {
        let channel = Arc::new(RecordingChannel {
            sent: Mutex::new(Vec::new()),
        });
        let center = AlertCenter::new(channel.clone(), true, true, Duration::from_secs(8));
        center
            .evaluate(&[make_transfer("delivered", 3_000_000)], &HashMap::new())
            .await;

        let sent = channel.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("WHALE: 25.00 BTC"));
    }

    #[tokio::test]
    async fn test_alert_runs_the_full_path_even_when_muted() {
        let center = AlertCenter::new(Arc::new(LogChannel), false, false, Duration::from_secs(8));
        let event = center.test_alert().await;

        assert_eq!(event.severity, Severity::Critical);
        assert_eq!(event.message, "TEST: 50.00 BTC ($5.0M) - Cold Storage -> Exchange");

        let current = center.current_alert().await.unwrap();
        assert_eq!(current.id, "test_alert");
    }
}
