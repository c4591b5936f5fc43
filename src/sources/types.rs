use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Binance spot (api.binance.com)
// ---------------------------------------------------------------------------

/// 24h rolling ticker. Binance serializes every numeric field as a string.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSpotTicker {
    pub symbol: String,
    pub last_price: Decimal,
    pub price_change_percent: Decimal,
    pub quote_volume: Decimal,
    pub high_price: Decimal,
    pub low_price: Decimal,
}

// ---------------------------------------------------------------------------
// Binance USD-M futures (fapi.binance.com)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPremiumIndex {
    pub symbol: String,
    pub mark_price: Decimal,
    /// Funding rate as a decimal fraction, e.g. "0.00010000" for 0.01%.
    pub last_funding_rate: Decimal,
    /// Next settlement, epoch milliseconds.
    pub next_funding_time: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOpenInterest {
    pub symbol: String,
    pub open_interest: Decimal,
}

// ---------------------------------------------------------------------------
// CoinGecko (api.coingecko.com)
// ---------------------------------------------------------------------------

/// One asset's entry in a `simple/price` batch response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiGeckoQuote {
    pub usd: Decimal,
    #[serde(default)]
    pub usd_24h_change: Option<Decimal>,
    #[serde(default)]
    pub usd_24h_vol: Option<Decimal>,
}

/// `coins/{id}/market_chart` series. Points are `[epoch_ms, value]` pairs,
/// oldest first.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiMarketChart {
    #[serde(default)]
    pub prices: Vec<(i64, Decimal)>,
    #[serde(default)]
    pub total_volumes: Vec<(i64, Decimal)>,
}

// ---------------------------------------------------------------------------
// Mempool.space
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiMempoolVout {
    /// Output value in satoshis.
    #[serde(default)]
    pub value: Option<u64>,
    #[serde(default)]
    pub scriptpubkey_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiMempoolTx {
    pub txid: String,
    #[serde(default)]
    pub fee: Option<u64>,
    /// Seconds the transaction has been waiting in the mempool.
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub vout: Vec<ApiMempoolVout>,
}
