//! Display formatting for prices, rates and transfer metadata.
//!
//! Pure functions, one per surface element. Callers decide what to do about
//! missing data; nothing here takes an `Option`.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::Symbol;

fn fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", dp as usize, rounded)
}

fn group_thousands(s: &str) -> String {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(d) => ("-", d),
        None => ("", int_part),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

// ---------------------------------------------------------------------------
// Prices and percentages
// ---------------------------------------------------------------------------

/// "$97,432.10". Sub-dollar assets get 6 decimals, sub-$100 get 4, the rest 2.
pub fn format_price(price: Decimal) -> String {
    let dp = if price < Decimal::ONE {
        6
    } else if price < Decimal::ONE_HUNDRED {
        4
    } else {
        2
    };
    format!("${}", group_thousands(&fixed(price, dp)))
}

/// "+2.41%" / "-0.87%". The sign is always explicit.
pub fn format_change(change: Decimal) -> String {
    let sign = if change >= Decimal::ZERO { "+" } else { "" };
    format!("{sign}{}%", fixed(change, 2))
}

/// Funding rate in percent. Small magnitudes get more precision:
/// below 0.001 five decimals, below 0.01 four, otherwise three.
pub fn format_funding_rate(rate: Decimal) -> String {
    let abs = rate.abs();
    let dp = if abs < Decimal::new(1, 3) {
        5
    } else if abs < Decimal::new(1, 2) {
        4
    } else {
        3
    };
    let sign = if rate >= Decimal::ZERO { "+" } else { "" };
    format!("{sign}{}%", fixed(rate, dp))
}

// ---------------------------------------------------------------------------
// Compact USD values
// ---------------------------------------------------------------------------

/// "$1.2B" / "$45.3M" / "$890.1K" / "$742".
pub fn format_usd_value(value: Decimal) -> String {
    let billion = Decimal::new(1_000_000_000, 0);
    let million = Decimal::new(1_000_000, 0);
    if value >= billion {
        format!("${}B", fixed(value / billion, 1))
    } else if value >= million {
        format!("${}M", fixed(value / million, 1))
    } else if value >= Decimal::ONE_THOUSAND {
        format!("${}K", fixed(value / Decimal::ONE_THOUSAND, 1))
    } else {
        format!("${}", fixed(value, 0))
    }
}

/// 24h quote volume, same compaction as [`format_usd_value`].
pub fn format_volume(volume: Decimal) -> String {
    format_usd_value(volume)
}

/// Open-interest notional: contracts valued at the mark price, compacted.
pub fn format_oi_notional(amount: Decimal, price: Decimal) -> String {
    format_usd_value(amount * price)
}

/// Open-interest contract count with a symbol suffix. BTC counts stay in the
/// K/M range; the other assets can legitimately reach billions of tokens.
pub fn format_oi_amount(amount: Decimal, symbol: Symbol) -> String {
    let billion = Decimal::new(1_000_000_000, 0);
    let million = Decimal::new(1_000_000, 0);
    let code = symbol.code();
    if symbol != Symbol::Btc && amount >= billion {
        return format!("{}B {code}", fixed(amount / billion, 1));
    }
    if amount >= million {
        format!("{}M {code}", fixed(amount / million, 1))
    } else if amount >= Decimal::ONE_THOUSAND {
        format!("{}K {code}", fixed(amount / Decimal::ONE_THOUSAND, 1))
    } else {
        format!("{} {code}", fixed(amount, 0))
    }
}

// ---------------------------------------------------------------------------
// Transfer metadata
// ---------------------------------------------------------------------------

/// Transfer amount with coin suffix. Stablecoin amounts compact to K/M with
/// one decimal; everything else keeps two decimals.
pub fn format_transfer_amount(amount: Decimal, coin: &str) -> String {
    if coin == "USDT" || coin == "USDC" {
        let million = Decimal::new(1_000_000, 0);
        if amount >= million {
            return format!("{}M {coin}", fixed(amount / million, 1));
        }
        if amount >= Decimal::ONE_THOUSAND {
            return format!("{}K {coin}", fixed(amount / Decimal::ONE_THOUSAND, 1));
        }
        return format!("{} {coin}", fixed(amount, 0));
    }
    format!("{} {coin}", fixed(amount, 2))
}

/// "a1b2c3____9f8e". Strings shorter than 10 chars pass through untouched.
pub fn format_hash_short(full_hash: &str) -> String {
    if full_hash.len() < 10 {
        return full_hash.to_string();
    }
    format!("{}____{}", &full_hash[..6], &full_hash[full_hash.len() - 4..])
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// "3h" / "42m" / "now", measured from `now`.
pub fn format_time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now - timestamp;
    let hours = diff.num_hours();
    let minutes = diff.num_minutes();
    if hours > 0 {
        format!("{hours}h")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        "now".to_string()
    }
}

/// Countdown to the next funding settlement, "7h 23m", or "now" once passed.
pub fn format_next_funding(next: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = next - now;
    if diff <= chrono::Duration::zero() {
        return "now".to_string();
    }
    let hours = diff.num_hours();
    let minutes = diff.num_minutes() % 60;
    format!("{hours}h {minutes}m")
}
