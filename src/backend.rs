//! Blocking coaching and stats backends, run off the UI loop by the provider.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use serde::Serialize;

use crate::config::Config;
use crate::upload::{MediaKind, UploadFile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoachingAdvice {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerStats {
    pub level: u32,
    pub rank: String,
    pub games_played: u32,
    /// Percentage, 0..=100.
    pub win_rate: u8,
}

pub trait CoachBackend: Send + Sync {
    fn analyze(&self, file: &UploadFile) -> Result<CoachingAdvice>;
    fn fetch_stats(&self, tag: &str) -> Result<PlayerStats>;
}

#[derive(Debug, Clone)]
pub struct MockCoach {
    pub analyze_delay: Duration,
    pub stats_delay: Duration,
    pub jitter: Duration,
}

impl MockCoach {
    pub const DEFAULT_ANALYZE_DELAY: Duration = Duration::from_millis(3000);
    pub const DEFAULT_STATS_DELAY: Duration = Duration::from_millis(2000);

    pub fn new(analyze_delay: Duration, stats_delay: Duration) -> Self {
        Self {
            analyze_delay,
            stats_delay,
            jitter: Duration::ZERO,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            analyze_delay: config.analyze_delay,
            stats_delay: config.stats_delay,
            jitter: config.latency_jitter,
        }
    }

    /// Zero-latency variant for tests and headless runs.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    fn wait(&self, base: Duration) {
        let extra = if self.jitter.is_zero() {
            Duration::ZERO
        } else {
            let max = self.jitter.as_millis() as u64;
            Duration::from_millis(rand::thread_rng().gen_range(0..=max))
        };
        let total = base + extra;
        if !total.is_zero() {
            thread::sleep(total);
        }
    }
}

impl Default for MockCoach {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ANALYZE_DELAY, Self::DEFAULT_STATS_DELAY)
    }
}

impl CoachBackend for MockCoach {
    fn analyze(&self, file: &UploadFile) -> Result<CoachingAdvice> {
        self.wait(self.analyze_delay);
        Ok(CoachingAdvice {
            text: mock_advice(file.kind()),
        })
    }

    fn fetch_stats(&self, _tag: &str) -> Result<PlayerStats> {
        self.wait(self.stats_delay);
        Ok(mock_stats())
    }
}

pub fn mock_advice(kind: MediaKind) -> String {
    let subject = match kind {
        MediaKind::Video => "gameplay clip",
        MediaKind::Image => "screenshot",
    };
    format!(
        "Great analysis of your {subject}! Here are some key insights:

• **Positioning**: Try to stay behind cover more often, especially when engaging enemies at medium range.

• **Cooldown Management**: You used your abilities well, but consider saving your escape ability for disengaging rather than engaging.

• **Target Priority**: Focus on eliminating supports first - Ana and Mercy should be primary targets.

• **Team Coordination**: Your timing with team pushes was good, but communicate ultimate status more frequently.

• **Mechanical Skills**: Your aim is solid, but work on pre-aiming common angles to reduce reaction time.

Keep practicing these fundamentals and you'll see improvement in your next matches!"
    )
}

pub fn mock_stats() -> PlayerStats {
    PlayerStats {
        level: 423,
        rank: "Diamond 3".to_string(),
        games_played: 147,
        win_rate: 68,
    }
}
