use std::env;
use std::time::Duration;

const DEFAULT_PRICE_POLL_SECS: u64 = 15;
const DEFAULT_PRICE_POLL_HIDDEN_SECS: u64 = 60;
const DEFAULT_PRICE_POLL_BACKOFF_SECS: u64 = 60;
const DEFAULT_PRICE_POLL_POWER_SAVE_SECS: u64 = 30;
const DEFAULT_WHALE_POLL_SECS: u64 = 30;
const DEFAULT_WHALE_INITIAL_DELAY_SECS: u64 = 2;
const DEFAULT_ALERT_DISPLAY_SECS: u64 = 8;

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub poll: PollConfig,
    pub alerts: AlertConfig,
}

/// Timer cadences. Product thresholds (whale USD floors, funding limits,
/// rate-limit constants) are compile-time constants in their own modules;
/// only the cadences are environment-tunable.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub price_interval: Duration,
    pub price_interval_hidden: Duration,
    pub price_interval_backoff: Duration,
    pub price_interval_power_save: Duration,
    pub whale_interval: Duration,
    pub whale_initial_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct AlertConfig {
    pub notifications_enabled: bool,
    pub sound_enabled: bool,
    pub display_duration: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            poll: PollConfig {
                price_interval: env_secs("PRICE_POLL_SECS", DEFAULT_PRICE_POLL_SECS)?,
                price_interval_hidden: env_secs(
                    "PRICE_POLL_HIDDEN_SECS",
                    DEFAULT_PRICE_POLL_HIDDEN_SECS,
                )?,
                price_interval_backoff: env_secs(
                    "PRICE_POLL_BACKOFF_SECS",
                    DEFAULT_PRICE_POLL_BACKOFF_SECS,
                )?,
                price_interval_power_save: env_secs(
                    "PRICE_POLL_POWER_SAVE_SECS",
                    DEFAULT_PRICE_POLL_POWER_SAVE_SECS,
                )?,
                whale_interval: env_secs("WHALE_POLL_SECS", DEFAULT_WHALE_POLL_SECS)?,
                whale_initial_delay: env_secs(
                    "WHALE_INITIAL_DELAY_SECS",
                    DEFAULT_WHALE_INITIAL_DELAY_SECS,
                )?,
            },
            alerts: AlertConfig {
                notifications_enabled: env_bool("NOTIFICATIONS_ENABLED", true),
                sound_enabled: env_bool("SOUND_ENABLED", true),
                display_duration: env_secs("ALERT_DISPLAY_SECS", DEFAULT_ALERT_DISPLAY_SECS)?,
            },
        })
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            price_interval: Duration::from_secs(DEFAULT_PRICE_POLL_SECS),
            price_interval_hidden: Duration::from_secs(DEFAULT_PRICE_POLL_HIDDEN_SECS),
            price_interval_backoff: Duration::from_secs(DEFAULT_PRICE_POLL_BACKOFF_SECS),
            price_interval_power_save: Duration::from_secs(DEFAULT_PRICE_POLL_POWER_SAVE_SECS),
            whale_interval: Duration::from_secs(DEFAULT_WHALE_POLL_SECS),
            whale_initial_delay: Duration::from_secs(DEFAULT_WHALE_INITIAL_DELAY_SECS),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            sound_enabled: true,
            display_duration: Duration::from_secs(DEFAULT_ALERT_DISPLAY_SECS),
        }
    }
}

fn env_secs(key: &str, default: u64) -> anyhow::Result<Duration> {
    let secs = match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{key} must be a whole number of seconds"))?,
        Err(_) => default,
    };
    Ok(Duration::from_secs(secs))
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_product_cadences() {
        let config = AppConfig::default();
        assert_eq!(config.poll.price_interval, Duration::from_secs(15));
        assert_eq!(config.poll.price_interval_hidden, Duration::from_secs(60));
        assert_eq!(config.poll.price_interval_backoff, Duration::from_secs(60));
        assert_eq!(
            config.poll.price_interval_power_save,
            Duration::from_secs(30)
        );
        assert_eq!(config.poll.whale_interval, Duration::from_secs(30));
        assert_eq!(config.poll.whale_initial_delay, Duration::from_secs(2));
        assert!(config.alerts.notifications_enabled);
        assert_eq!(config.alerts.display_duration, Duration::from_secs(8));
    }
}
