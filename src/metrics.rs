use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // Pre-register counters so they appear even before the first increment.
    counter!("price_cycles_total").absolute(0);
    counter!("price_cycle_failures_total").absolute(0);
    counter!("rate_limited_skips_total").absolute(0);
    counter!("transfers_detected_total").absolute(0);
    counter!("demo_fallbacks_total").absolute(0);
    counter!("alerts_raised_total").absolute(0);

    // Pre-register gauges at zero.
    gauge!("transfer_history_entries").set(0.0);

    // Histograms are lazily created on first record; force creation.
    histogram!("price_cycle_seconds").record(0.0);
    histogram!("whale_cycle_seconds").record(0.0);

    handle
}
