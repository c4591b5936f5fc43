use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;

use crate::config::AppConfig;
use crate::models::{
    CriticalEvent, FundingRecord, OpenInterestRecord, PriceState, Symbol, WhaleTransfer,
};
use crate::services::{
    interval_policy, AlertCenter, LogChannel, PollerStats, PricePoller, Scheduler, TaskName,
    WhaleDetector,
};
use crate::sources::{DerivativesSource, SpotSource, TransferSource};

/// Process-wide handle over the dashboard engines.
///
/// Owns the pollers, the alert center, the scheduler driving them, and the
/// visibility/power-save flags that feed the poll-interval policy. Everything
/// the outer surface needs goes through here; the engines never learn about
/// timers or visibility.
pub struct DashboardContext {
    config: AppConfig,
    poller: Arc<PricePoller>,
    detector: Arc<WhaleDetector>,
    alerts: Arc<AlertCenter>,
    scheduler: Scheduler,
    metrics_handle: PrometheusHandle,
    visible: AtomicBool,
    power_save: AtomicBool,
}

impl DashboardContext {
    pub fn new(
        config: AppConfig,
        primary: Arc<dyn SpotSource>,
        secondary: Arc<dyn SpotSource>,
        derivatives: Arc<dyn DerivativesSource>,
        transfer_sources: Vec<Arc<dyn TransferSource>>,
        metrics_handle: PrometheusHandle,
    ) -> Arc<Self> {
        let alerts = Arc::new(AlertCenter::new(
            Arc::new(LogChannel),
            config.alerts.notifications_enabled,
            config.alerts.sound_enabled,
            config.alerts.display_duration,
        ));
        Arc::new(Self {
            poller: Arc::new(PricePoller::new(primary, secondary, derivatives)),
            detector: Arc::new(WhaleDetector::new(transfer_sources)),
            alerts,
            scheduler: Scheduler::new(),
            metrics_handle,
            visible: AtomicBool::new(true),
            power_save: AtomicBool::new(false),
            config,
        })
    }

    /// Spawn both timers. The price poll runs immediately; whale detection
    /// waits out its initial delay so the first price cycle has already
    /// seeded conversion prices.
    pub async fn start(self: &Arc<Self>) {
        let ctx = self.clone();
        self.scheduler
            .spawn(
                TaskName::PricePoll,
                Duration::ZERO,
                self.config.poll.price_interval,
                move || {
                    let ctx = ctx.clone();
                    async move {
                        let retry_count = ctx.poller.run_cycle().await;
                        let next = interval_policy(
                            &ctx.config.poll,
                            ctx.visible.load(Ordering::Relaxed),
                            ctx.power_save.load(Ordering::Relaxed),
                            retry_count,
                        );
                        ctx.scheduler.set_interval(TaskName::PricePoll, next).await;
                    }
                },
            )
            .await;

        let ctx = self.clone();
        self.scheduler
            .spawn(
                TaskName::WhaleDetect,
                self.config.poll.whale_initial_delay,
                self.config.poll.whale_interval,
                move || {
                    let ctx = ctx.clone();
                    async move {
                        let prices = ctx.poller.conversion_prices().await;
                        let fresh = ctx.detector.detect(&prices).await;
                        let funding = ctx.poller.funding().await;
                        ctx.alerts.evaluate(&fresh, &funding).await;
                    }
                },
            )
            .await;

        tracing::info!("Dashboard context started");
    }

    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
        tracing::info!("Dashboard context stopped");
    }

    /// Request an immediate price refresh. Rides the scheduled task's loop,
    /// so it can never overlap a cycle already in flight.
    pub async fn refresh(&self) {
        self.scheduler.trigger(TaskName::PricePoll).await;
    }

    /// Page visibility. Hiding slows the price poll; returning to visible
    /// restores the policy interval and refreshes immediately.
    pub async fn set_visible(&self, visible: bool) {
        let was_visible = self.visible.swap(visible, Ordering::Relaxed);
        self.reprogram_price_interval().await;
        if visible && !was_visible {
            self.refresh().await;
        }
    }

    pub async fn set_power_save(&self, enabled: bool) {
        self.power_save.store(enabled, Ordering::Relaxed);
        self.reprogram_price_interval().await;
    }

    async fn reprogram_price_interval(&self) {
        let retry_count = self.poller.stats().await.retry_count;
        let next = interval_policy(
            &self.config.poll,
            self.visible.load(Ordering::Relaxed),
            self.power_save.load(Ordering::Relaxed),
            retry_count,
        );
        self.scheduler.set_interval(TaskName::PricePoll, next).await;
    }

    // -- alert controls ------------------------------------------------------

    pub async fn set_notifications_enabled(&self, enabled: bool) {
        self.alerts.set_notifications_enabled(enabled).await;
    }

    pub async fn set_sound_enabled(&self, enabled: bool) {
        self.alerts.set_sound_enabled(enabled).await;
    }

    /// Raise a canned critical alert through the real delivery path.
    pub async fn test_alert(&self) -> CriticalEvent {
        self.alerts.test_alert().await
    }

    pub async fn dismiss_alert(&self) {
        self.alerts.dismiss().await;
    }

    // -- read-side snapshots -------------------------------------------------

    pub async fn price_state(&self) -> PriceState {
        self.poller.price_state().await
    }

    pub async fn funding(&self) -> HashMap<Symbol, FundingRecord> {
        self.poller.funding().await
    }

    pub async fn open_interest(&self) -> HashMap<Symbol, OpenInterestRecord> {
        self.poller.open_interest().await
    }

    /// Effective USD conversion price per tracked symbol.
    pub async fn conversion_prices(&self) -> HashMap<Symbol, Decimal> {
        self.poller.conversion_prices().await
    }

    pub async fn transfers(&self) -> Vec<WhaleTransfer> {
        self.detector.transfers().await
    }

    pub async fn current_alert(&self) -> Option<CriticalEvent> {
        self.alerts.current_alert().await
    }

    pub async fn stats(&self) -> PollerStats {
        self.poller.stats().await
    }

    /// Prometheus scrape payload.
    pub fn render_metrics(&self) -> String {
        self.metrics_handle.render()
    }
}
