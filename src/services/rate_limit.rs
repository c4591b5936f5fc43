use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Hard floor between consecutive upstream cycles.
const MIN_REQUEST_SPACING: Duration = Duration::from_secs(5);
/// Cap inside one rolling window.
const MAX_REQUESTS_PER_WINDOW: u32 = 10;
const WINDOW_LENGTH: Duration = Duration::from_secs(60);

/// Client-side limiter shared by every upstream-touching poll cycle.
///
/// Two independent gates, both of which must pass:
/// - at least 5 seconds since the previous recorded request
/// - fewer than 10 requests in the window that began with the first request
///   after the previous window expired; a window expires 60 seconds after it
///   started, regardless of what happened inside it
///
/// `can_make_request` is a pure read. Callers that go ahead with a cycle
/// must call `record_request` exactly once, whether or not the cycle then
/// succeeds — the limiter meters attempts, not successes.
#[derive(Debug, Default)]
pub struct RateLimiter {
    last_request: Option<Instant>,
    window_started: Option<Instant>,
    window_count: u32,
    total_requests: u64,
    last_request_wall: Option<DateTime<Utc>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_make_request(&self) -> bool {
        let now = Instant::now();

        if let Some(last) = self.last_request {
            if now.duration_since(last) < MIN_REQUEST_SPACING {
                return false;
            }
        }

        if let Some(started) = self.window_started {
            let window_active = now.duration_since(started) < WINDOW_LENGTH;
            if window_active && self.window_count >= MAX_REQUESTS_PER_WINDOW {
                return false;
            }
        }

        true
    }

    pub fn record_request(&mut self) {
        let now = Instant::now();

        match self.window_started {
            Some(started) if now.duration_since(started) < WINDOW_LENGTH => {
                self.window_count += 1;
            }
            _ => {
                self.window_started = Some(now);
                self.window_count = 1;
            }
        }

        self.last_request = Some(now);
        self.total_requests += 1;
        self.last_request_wall = Some(Utc::now());
    }

    /// Requests recorded since construction.
    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn last_request_at(&self) -> Option<DateTime<Utc>> {
        self.last_request_wall
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
