use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::backend::MockCoach;

#[derive(Debug, Clone)]
pub struct Config {
    pub analyze_delay: Duration,
    pub stats_delay: Duration,
    pub latency_jitter: Duration,
    pub tick_rate: Duration,
    pub log_dir: PathBuf,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analyze_delay: MockCoach::DEFAULT_ANALYZE_DELAY,
            stats_delay: MockCoach::DEFAULT_STATS_DELAY,
            latency_jitter: Duration::ZERO,
            tick_rate: Duration::from_millis(250),
            log_dir: env::temp_dir().join("echo_coach"),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_env()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let opt = |key: &str| {
            lookup(key).and_then(|val| if val.trim().is_empty() { None } else { Some(val) })
        };
        let num = |key: &str| opt(key).and_then(|val| val.trim().parse::<u64>().ok());

        Self {
            analyze_delay: Duration::from_millis(
                num("COACH_ANALYZE_DELAY_MS").unwrap_or(defaults.analyze_delay.as_millis() as u64),
            ),
            stats_delay: Duration::from_millis(
                num("COACH_STATS_DELAY_MS").unwrap_or(defaults.stats_delay.as_millis() as u64),
            ),
            latency_jitter: Duration::from_millis(
                num("COACH_LATENCY_JITTER_MS").unwrap_or(0).min(10_000),
            ),
            tick_rate: Duration::from_millis(num("COACH_TICK_MS").unwrap_or(250).clamp(50, 1000)),
            log_dir: opt("COACH_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            log_filter: opt("COACH_LOG").unwrap_or(defaults.log_filter),
        }
    }
}
