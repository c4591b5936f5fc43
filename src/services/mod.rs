pub mod alert_center;
pub mod price_poller;
pub mod rate_limit;
pub mod scheduler;
pub mod whale_detector;

pub use alert_center::{AlertCenter, AlertChannel, LogChannel};
pub use price_poller::{interval_policy, PollerStats, PricePoller, BACKOFF_RETRY_THRESHOLD};
pub use rate_limit::RateLimiter;
pub use scheduler::{Scheduler, TaskName};
pub use whale_detector::WhaleDetector;
