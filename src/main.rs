use std::sync::Arc;

use whalewatch::config::AppConfig;
use whalewatch::context::DashboardContext;
use whalewatch::intelligence::AddressBook;
use whalewatch::metrics::init_metrics;
use whalewatch::sources::{
    BinanceFutures, BinanceSpot, CoinGecko, MempoolSource, SpikeProfile, TransferSource,
    VolumeSpikeSource,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let metrics_handle = init_metrics();

    let http = reqwest::Client::new();

    // --- Price sources: Binance primary, CoinGecko fallback, futures follow-up ---
    let primary = Arc::new(BinanceSpot::new(http.clone()));
    let secondary = Arc::new(CoinGecko::new(http.clone()));
    let derivatives = Arc::new(BinanceFutures::new(http.clone()));

    // --- Transfer sources: BTC mempool plus per-asset volume-spike watchers ---
    let transfer_sources: Vec<Arc<dyn TransferSource>> = vec![
        Arc::new(MempoolSource::new(
            http.clone(),
            AddressBook::with_known_entities(),
        )),
        Arc::new(VolumeSpikeSource::new(
            CoinGecko::new(http.clone()),
            SpikeProfile::eth(),
        )),
        Arc::new(VolumeSpikeSource::new(
            CoinGecko::new(http.clone()),
            SpikeProfile::sol(),
        )),
        Arc::new(VolumeSpikeSource::new(
            CoinGecko::new(http),
            SpikeProfile::rndr(),
        )),
    ];

    let ctx = DashboardContext::new(
        config,
        primary,
        secondary,
        derivatives,
        transfer_sources,
        metrics_handle,
    );
    ctx.start().await;
    tracing::info!("Watching prices and whale transfers (Ctrl-C to stop)");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    ctx.shutdown().await;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
