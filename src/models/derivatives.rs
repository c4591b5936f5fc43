use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Funding snapshot for one perpetual pair.
///
/// `rate` is stored in percent (the exchange reports a decimal fraction; the
/// adapter multiplies by 100 once, at the boundary). The funding map is
/// replaced wholesale on every successful derivatives poll, so a missing
/// symbol means "unknown this cycle", never "stale".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRecord {
    pub rate: Decimal,
    pub next_funding_time: DateTime<Utc>,
    pub mark_price: Decimal,
}

/// Open interest for one perpetual pair. `notional` is `amount` valued at
/// the mark price seen in the same poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenInterestRecord {
    pub amount: Decimal,
    pub notional: Decimal,
}
