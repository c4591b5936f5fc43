use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;

use super::types::ApiMempoolTx;
use super::{SourceError, TransferSource};
use crate::format::format_hash_short;
use crate::intelligence::{predict_market_impact, AddressBook, UNKNOWN_WALLET};
use crate::models::{Network, Symbol, TransferType, WhaleTransfer};

const API_BASE: &str = "https://mempool.space/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// How many of the most recent unconfirmed transactions to scan per cycle.
const RECENT_TX_SCAN_LIMIT: usize = 20;

const SATS_PER_BTC: i64 = 100_000_000;

/// Keep a transaction only when both floors hold.
const MIN_BTC_AMOUNT: i64 = 1;
const MIN_USD_VALUE: i64 = 500_000;

/// Bitcoin whale candidates straight from the public mempool.
///
/// Output values are summed per transaction (inputs are not resolved, so
/// the sum over-counts change, which is acceptable for a detection feed).
/// The timestamp is backdated by the time the transaction has already
/// spent waiting.
pub struct MempoolSource {
    http: Client,
    base_url: String,
    address_book: AddressBook,
}

impl MempoolSource {
    pub fn new(http: Client, address_book: AddressBook) -> Self {
        Self {
            http,
            base_url: API_BASE.into(),
            address_book,
        }
    }

    fn transfer_from_tx(
        &self,
        tx: &ApiMempoolTx,
        btc_price: Decimal,
        now: DateTime<Utc>,
    ) -> Option<WhaleTransfer> {
        let sats: u64 = tx.vout.iter().filter_map(|v| v.value).sum();
        let amount = Decimal::from(sats) / Decimal::from(SATS_PER_BTC);
        let value_usd = amount * btc_price;

        if amount < Decimal::from(MIN_BTC_AMOUNT) || value_usd < Decimal::from(MIN_USD_VALUE) {
            return None;
        }

        let first_output = tx.vout.iter().find_map(|v| v.scriptpubkey_address.clone());
        let to = match first_output.as_deref() {
            Some(addr) => {
                let label = self.address_book.classify(addr);
                if label == UNKNOWN_WALLET {
                    "Multiple Outputs".to_string()
                } else {
                    label.to_string()
                }
            }
            None => "Multiple Outputs".to_string(),
        };
        let to_address = first_output.unwrap_or_else(|| "Multiple".to_string());

        Some(WhaleTransfer {
            id: format!("{}_btc", tx.txid),
            symbol: Symbol::Btc,
            amount,
            value_usd,
            from: "Mempool".to_string(),
            to,
            from_address: "Multiple Inputs".to_string(),
            to_address,
            hash: format_hash_short(&tx.txid),
            full_hash: tx.txid.clone(),
            timestamp: now - chrono::Duration::seconds(tx.time.unwrap_or(0)),
            transfer_type: TransferType::MempoolTransfer,
            network: Network::Bitcoin,
            prediction: predict_market_impact(value_usd, TransferType::MempoolTransfer),
            is_real: true,
            source: "Mempool.space".to_string(),
        })
    }
}

#[async_trait]
impl TransferSource for MempoolSource {
    fn name(&self) -> &'static str {
        "mempool"
    }

    async fn fetch_transfers(
        &self,
        prices: &HashMap<Symbol, Decimal>,
    ) -> Result<Vec<WhaleTransfer>, SourceError> {
        let btc_price = prices
            .get(&Symbol::Btc)
            .copied()
            .unwrap_or_else(|| Symbol::Btc.fallback_price());

        let url = format!("{}/mempool/recent", self.base_url);
        let resp = self
            .http
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let txs: Vec<ApiMempoolTx> = resp.json().await?;
        let now = Utc::now();

        let transfers: Vec<WhaleTransfer> = txs
            .iter()
            .take(RECENT_TX_SCAN_LIMIT)
            .filter_map(|tx| self.transfer_from_tx(tx, btc_price, now))
            .collect();

        tracing::debug!(
            scanned = txs.len().min(RECENT_TX_SCAN_LIMIT),
            kept = transfers.len(),
            "Mempool scan complete"
        );
        Ok(transfers)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
