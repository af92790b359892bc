use std::time::{Duration, Instant};

use crate::backend::{CoachingAdvice, PlayerStats};
use crate::clipboard::Clipboard;
use crate::error::CoachError;
use crate::history::{HistoryEntry, HistoryStore};
use crate::notify::{Notice, Notices};
use crate::upload::{self, MediaKind, UploadFile};

/// How long the coach panel shows "Copied" after a successful copy.
pub const COPIED_INDICATOR: Duration = Duration::from_secs(2);

/// Monotonic id attached to every request handed to the provider. Results
/// carrying anything but the flow's current id are stale and dropped.
pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Validating,
    Processing {
        request: RequestId,
        file_name: String,
        kind: MediaKind,
    },
    Ready,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsPhase {
    Idle,
    Fetching { request: RequestId, tag: String },
    Ready,
    RejectedInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    DropZone,
    Stats,
    History,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::DropZone => Focus::Stats,
            Focus::Stats => Focus::History,
            Focus::History => Focus::DropZone,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::DropZone => Focus::History,
            Focus::Stats => Focus::DropZone,
            Focus::History => Focus::Stats,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub upload_phase: UploadPhase,
    pub stats_phase: StatsPhase,
    pub advice: String,
    pub stats: Option<PlayerStats>,
    pub history: HistoryStore,
    pub notices: Notices,
    pub focus: Focus,
    pub tag_input: String,
    /// `Some` while the user is typing a file path into the drop zone.
    pub path_input: Option<String>,
    pub history_selected: usize,
    pub help_overlay: bool,
    pub copied_at: Option<Instant>,
    next_request: RequestId,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            upload_phase: UploadPhase::Idle,
            stats_phase: StatsPhase::Idle,
            advice: String::new(),
            stats: None,
            history: HistoryStore::new(),
            notices: Notices::new(),
            focus: Focus::DropZone,
            tag_input: String::new(),
            path_input: None,
            history_selected: 0,
            help_overlay: false,
            copied_at: None,
            next_request: 0,
        }
    }

    fn next_request_id(&mut self) -> RequestId {
        self.next_request += 1;
        self.next_request
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.upload_phase, UploadPhase::Processing { .. })
    }

    /// The drop zone is closed while an analysis runs.
    pub fn accepts_drop(&self) -> bool {
        !self.is_processing()
    }

    pub fn is_coach_loading(&self) -> bool {
        self.is_processing()
    }

    pub fn is_stats_loading(&self) -> bool {
        matches!(self.stats_phase, StatsPhase::Fetching { .. })
    }

    pub fn is_copied(&self, now: Instant) -> bool {
        self.copied_at
            .is_some_and(|at| now.saturating_duration_since(at) < COPIED_INDICATOR)
    }

    /// Validates a submitted file and, if accepted, returns the analysis
    /// command for the provider. The shown advice is cleared as soon as the
    /// new request starts; any older in-flight analysis becomes stale.
    pub fn submit_file(&mut self, file: UploadFile) -> Option<ProviderCommand> {
        let previous = std::mem::replace(&mut self.upload_phase, UploadPhase::Validating);

        match upload::validate(&file) {
            Err(err) => {
                tracing::info!(file = %file.name, mime = %file.mime_type, "upload rejected");
                // A bad drop never disturbs an analysis that is already running.
                self.upload_phase = match previous {
                    processing @ UploadPhase::Processing { .. } => processing,
                    _ => UploadPhase::Rejected,
                };
                self.notices.push(Notice::from(&err));
                None
            }
            Ok(kind) => {
                let request = self.next_request_id();
                tracing::info!(request, file = %file.name, kind = kind.label(), "upload accepted");
                self.advice.clear();
                self.copied_at = None;
                self.upload_phase = UploadPhase::Processing {
                    request,
                    file_name: file.name.clone(),
                    kind,
                };
                self.notices.push(Notice::info(
                    "File received!",
                    format!("Processing {}...", file.name),
                ));
                Some(ProviderCommand::Analyze { request, file })
            }
        }
    }

    /// Handles a drop of one or more files: the first acceptable one is
    /// submitted, otherwise a single rejection notice is raised.
    pub fn submit_dropped(&mut self, files: Vec<UploadFile>) -> Option<ProviderCommand> {
        match upload::first_accepted(files.iter().cloned()) {
            Some(file) => self.submit_file(file),
            None => {
                let rejected = files
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| UploadFile::new("", ""));
                self.submit_file(rejected)
            }
        }
    }

    /// Starts a stats lookup for a non-blank tag. Blank input raises a notice
    /// and leaves current stats untouched.
    pub fn submit_tag(&mut self, raw: &str) -> Option<ProviderCommand> {
        let tag = raw.trim();
        if tag.is_empty() {
            let err = CoachError::EmptyInput;
            if !self.is_stats_loading() {
                self.stats_phase = StatsPhase::RejectedInput;
            }
            self.notices.push(Notice::from(&err));
            return None;
        }

        let request = self.next_request_id();
        tracing::info!(request, tag, "stats lookup started");
        self.stats_phase = StatsPhase::Fetching {
            request,
            tag: tag.to_string(),
        };
        self.notices
            .push(Notice::info("Fetching stats...", format!("Looking up {tag}")));
        Some(ProviderCommand::FetchStats {
            request,
            tag: tag.to_string(),
        })
    }

    /// Re-displays a past session's advice. Does not touch the upload phase.
    pub fn select_history(&mut self, index: usize) {
        let Some(entry) = self.history.get(index) else {
            return;
        };
        self.advice = entry.advice.clone();
        self.history_selected = index;
    }

    pub fn select_next_history(&mut self) {
        if self.history.is_empty() {
            return;
        }
        self.history_selected = (self.history_selected + 1).min(self.history.len() - 1);
    }

    pub fn select_prev_history(&mut self) {
        self.history_selected = self.history_selected.saturating_sub(1);
    }

    pub fn copy_advice(&mut self, clipboard: &mut dyn Clipboard) -> Result<(), CoachError> {
        if self.advice.is_empty() || self.is_coach_loading() {
            return Ok(());
        }
        match clipboard.set_text(&self.advice) {
            Ok(()) => {
                self.copied_at = Some(Instant::now());
                self.notices
                    .push(Notice::success("Copied!", "Coaching advice copied to clipboard"));
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "clipboard copy failed");
                let err = CoachError::Clipboard(err.to_string());
                self.notices.push(Notice::from(&err));
                Err(err)
            }
        }
    }

    fn current_analysis(&self) -> Option<RequestId> {
        match &self.upload_phase {
            UploadPhase::Processing { request, .. } => Some(*request),
            _ => None,
        }
    }

    fn current_lookup(&self) -> Option<RequestId> {
        match &self.stats_phase {
            StatsPhase::Fetching { request, .. } => Some(*request),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    Analyze { request: RequestId, file: UploadFile },
    FetchStats { request: RequestId, tag: String },
}

#[derive(Debug, Clone)]
pub enum Delta {
    AdviceReady {
        request: RequestId,
        file_name: String,
        kind: MediaKind,
        advice: CoachingAdvice,
    },
    AnalysisFailed {
        request: RequestId,
        error: String,
    },
    StatsReady {
        request: RequestId,
        tag: String,
        stats: PlayerStats,
    },
    StatsFailed {
        request: RequestId,
        error: String,
    },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::AdviceReady {
            request,
            file_name,
            kind,
            advice,
        } => {
            if state.current_analysis() != Some(request) {
                tracing::debug!(request, "dropping stale analysis result");
                return;
            }
            state.advice = advice.text.clone();
            state
                .history
                .push(HistoryEntry::new(file_name.clone(), kind, advice.text));
            state.history_selected = 0;
            state.upload_phase = UploadPhase::Ready;
            tracing::info!(request, file = %file_name, "analysis complete");
            state.notices.push(Notice::success(
                "Analysis complete",
                format!("Coach Echo reviewed {file_name}"),
            ));
        }
        Delta::AnalysisFailed { request, error } => {
            if state.current_analysis() != Some(request) {
                tracing::debug!(request, "dropping stale analysis failure");
                return;
            }
            state.upload_phase = UploadPhase::Idle;
            let err = CoachError::Backend(error);
            state.notices.push(Notice::from(&err));
        }
        Delta::StatsReady {
            request,
            tag,
            stats,
        } => {
            if state.current_lookup() != Some(request) {
                tracing::debug!(request, "dropping stale stats result");
                return;
            }
            tracing::info!(request, tag, "stats updated");
            state.stats = Some(stats);
            state.stats_phase = StatsPhase::Ready;
        }
        Delta::StatsFailed { request, error } => {
            if state.current_lookup() != Some(request) {
                tracing::debug!(request, "dropping stale stats failure");
                return;
            }
            state.stats_phase = StatsPhase::Idle;
            let err = CoachError::Backend(error);
            state.notices.push(Notice::from(&err));
        }
    }
}

pub fn phase_label(phase: &UploadPhase) -> &'static str {
    match phase {
        UploadPhase::Idle => "IDLE",
        UploadPhase::Validating => "VALIDATING",
        UploadPhase::Processing { .. } => "PROCESSING",
        UploadPhase::Ready => "READY",
        UploadPhase::Rejected => "REJECTED",
    }
}
