use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Symbol, WhaleTransfer};

// ---------------------------------------------------------------------------
// Severity / EventKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    WhaleTransfer,
    FundingExtreme,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::WhaleTransfer => "whale_transfer",
            EventKind::FundingExtreme => "funding_extreme",
        }
    }
}

// ---------------------------------------------------------------------------
// Sound profiles
// ---------------------------------------------------------------------------

/// Oscillator program for one alert sound: frequency steps as
/// (offset seconds, Hz), a gain ramp, and total duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub freq_steps: &'static [(f32, f32)],
    pub gain_start: f32,
    pub gain_end: f32,
    pub duration_secs: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundProfile {
    Critical,
    Whale,
    Funding,
}

impl SoundProfile {
    /// Tone program played for this profile. The critical tone is a fast
    /// two-way sweep; whale and funding are single rising intervals.
    pub fn tone(&self) -> &'static ToneSpec {
        match self {
            SoundProfile::Critical => &ToneSpec {
                freq_steps: &[(0.0, 800.0), (0.1, 1200.0), (0.2, 800.0)],
                gain_start: 0.3,
                gain_end: 0.01,
                duration_secs: 0.5,
            },
            SoundProfile::Whale => &ToneSpec {
                freq_steps: &[(0.0, 220.0), (0.3, 440.0)],
                gain_start: 0.2,
                gain_end: 0.01,
                duration_secs: 0.8,
            },
            SoundProfile::Funding => &ToneSpec {
                freq_steps: &[(0.0, 440.0), (0.2, 660.0)],
                gain_start: 0.15,
                gain_end: 0.01,
                duration_secs: 0.6,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// CriticalEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "payload", rename_all = "snake_case")]
pub enum EventData {
    Whale(WhaleTransfer),
    Funding {
        symbol: Symbol,
        rate: Decimal,
        mark_price: Decimal,
    },
}

/// An alert-worthy market event, ready for display and delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalEvent {
    pub id: String,
    pub kind: EventKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub sound: SoundProfile,
    pub timestamp: DateTime<Utc>,
    pub data: EventData,
}
