use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::CoachError;

const MAX_NOTICES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: title.into(),
            body: body.into(),
        }
    }
}

impl From<&CoachError> for Notice {
    fn from(err: &CoachError) -> Self {
        Notice::error(err.title(), err.description())
    }
}

#[derive(Debug, Clone)]
struct Posted {
    notice: Notice,
    at: Instant,
}

/// Outbound notice queue. Carries no session state; the renderer shows
/// whatever is recent enough and older notices age out.
#[derive(Debug, Clone, Default)]
pub struct Notices {
    items: VecDeque<Posted>,
}

impl Notices {
    pub fn new() -> Self {
        Self {
            items: VecDeque::with_capacity(MAX_NOTICES),
        }
    }

    pub fn push(&mut self, notice: Notice) {
        match notice.severity {
            Severity::Error => tracing::warn!(title = %notice.title, body = %notice.body, "notice"),
            _ => tracing::info!(title = %notice.title, body = %notice.body, "notice"),
        }
        self.items.push_back(Posted {
            notice,
            at: Instant::now(),
        });
        while self.items.len() > MAX_NOTICES {
            self.items.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter().map(|p| &p.notice)
    }

    pub fn last(&self) -> Option<&Notice> {
        self.items.back().map(|p| &p.notice)
    }

    /// Notices posted within `ttl` of `now`, oldest first.
    pub fn recent(&self, now: Instant, ttl: Duration) -> Vec<&Notice> {
        self.items
            .iter()
            .filter(|p| now.saturating_duration_since(p.at) <= ttl)
            .map(|p| &p.notice)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
