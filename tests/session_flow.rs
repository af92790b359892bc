use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::anyhow;

use echo_coach::backend::{CoachBackend, CoachingAdvice, MockCoach, PlayerStats, mock_stats};
use echo_coach::clipboard::Clipboard;
use echo_coach::error::CoachError;
use echo_coach::notify::Severity;
use echo_coach::provider::{execute, spawn_provider};
use echo_coach::state::{
    AppState, Delta, ProviderCommand, StatsPhase, UploadPhase, apply_delta,
};
use echo_coach::upload::{MediaKind, UploadFile};

fn run(state: &mut AppState, cmd: Option<ProviderCommand>) {
    let cmd = cmd.expect("command should be issued");
    apply_delta(state, execute(&MockCoach::instant(), cmd));
}

#[test]
fn video_upload_produces_clip_advice_and_history() {
    let mut state = AppState::new();
    let cmd = state.submit_file(UploadFile::new("clip.mp4", "video/mp4"));
    assert!(state.is_processing());
    assert!(state.is_coach_loading());
    assert!(matches!(state.upload_phase, UploadPhase::Processing { .. }));

    run(&mut state, cmd);

    assert_eq!(state.upload_phase, UploadPhase::Ready);
    assert!(!state.is_processing());
    assert!(state.advice.contains("gameplay clip"));
    let first = state.history.get(0).expect("history entry appended");
    assert_eq!(first.file_name, "clip.mp4");
    assert_eq!(first.file_kind, MediaKind::Video);
    assert_eq!(first.advice, state.advice);
}

#[test]
fn image_upload_produces_screenshot_advice() {
    let mut state = AppState::new();
    let cmd = state.submit_file(UploadFile::new("shot.png", "image/png"));
    run(&mut state, cmd);

    assert!(state.advice.contains("screenshot"));
    assert!(!state.advice.contains("gameplay clip"));
    assert_eq!(state.history.get(0).map(|e| e.file_kind), Some(MediaKind::Image));
}

#[test]
fn invalid_upload_is_rejected_without_state_change() {
    let mut state = AppState::new();
    let cmd = state.submit_file(UploadFile::new("notes.txt", "text/plain"));

    assert!(cmd.is_none());
    assert_eq!(state.upload_phase, UploadPhase::Rejected);
    assert!(state.advice.is_empty());
    assert!(state.history.is_empty());
    let notice = state.notices.last().expect("rejection notice");
    assert_eq!(notice.severity, Severity::Error);
    assert_eq!(notice.title, "Invalid file type");

    // Next valid submission starts fresh.
    let cmd = state.submit_file(UploadFile::new("clip.mp4", "video/mp4"));
    assert!(cmd.is_some());
    assert!(state.is_processing());
}

#[test]
fn new_submission_clears_shown_advice() {
    let mut state = AppState::new();
    let cmd = state.submit_file(UploadFile::new("clip.mp4", "video/mp4"));
    run(&mut state, cmd);
    assert!(!state.advice.is_empty());

    let _ = state.submit_file(UploadFile::new("shot.png", "image/png"));
    assert!(state.advice.is_empty());
    assert!(state.is_processing());
}

#[test]
fn selecting_history_sets_advice_verbatim_and_idempotently() {
    let mut state = AppState::new();
    let cmd = state.submit_file(UploadFile::new("clip.mp4", "video/mp4"));
    run(&mut state, cmd);
    let cmd = state.submit_file(UploadFile::new("shot.png", "image/png"));
    run(&mut state, cmd);

    let older = state.history.get(1).expect("two entries").advice.clone();
    state.select_history(1);
    assert_eq!(state.advice, older);
    state.select_history(1);
    assert_eq!(state.advice, older);
    assert_eq!(state.upload_phase, UploadPhase::Ready);

    state.select_history(42);
    assert_eq!(state.advice, older);
}

#[test]
fn selecting_history_while_processing_keeps_phase() {
    let mut state = AppState::new();
    let cmd = state.submit_file(UploadFile::new("clip.mp4", "video/mp4"));
    run(&mut state, cmd);
    let _pending = state.submit_file(UploadFile::new("shot.png", "image/png"));

    state.select_history(0);
    assert!(state.advice.contains("gameplay clip"));
    assert!(state.is_processing());
}

#[test]
fn blank_tag_never_issues_a_lookup() {
    let mut state = AppState::new();
    assert!(state.submit_tag("").is_none());
    assert!(state.submit_tag("   \t").is_none());
    assert_eq!(state.stats_phase, StatsPhase::RejectedInput);
    assert!(state.stats.is_none());
    assert_eq!(
        state.notices.last().map(|n| n.title.as_str()),
        Some(CoachError::EmptyInput.title())
    );

    let cmd = state.submit_tag("Player#1234");
    run(&mut state, cmd);
    let before = state.stats.clone();
    assert!(state.submit_tag(" ").is_none());
    assert_eq!(state.stats, before);
}

#[test]
fn tag_lookup_returns_fixed_record() {
    let mut state = AppState::new();
    let cmd = state.submit_tag("  Player#1234 ");
    match &cmd {
        Some(ProviderCommand::FetchStats { tag, .. }) => assert_eq!(tag, "Player#1234"),
        other => panic!("unexpected command {other:?}"),
    }
    assert!(state.is_stats_loading());

    run(&mut state, cmd);

    assert_eq!(state.stats_phase, StatsPhase::Ready);
    assert_eq!(
        state.stats,
        Some(PlayerStats {
            level: 423,
            rank: "Diamond 3".to_string(),
            games_played: 147,
            win_rate: 68,
        })
    );
}

#[test]
fn stale_analysis_result_is_dropped() {
    let mut state = AppState::new();
    let first = state
        .submit_file(UploadFile::new("old.mp4", "video/mp4"))
        .expect("accepted");
    let second = state
        .submit_file(UploadFile::new("new.png", "image/png"))
        .expect("accepted");

    let coach = MockCoach::instant();
    let fresh = execute(&coach, second);
    let stale = execute(&coach, first);

    apply_delta(&mut state, fresh);
    assert!(state.advice.contains("screenshot"));
    assert_eq!(state.history.len(), 1);

    apply_delta(&mut state, stale);
    assert!(state.advice.contains("screenshot"));
    assert_eq!(state.history.len(), 1);
    assert_eq!(state.history.get(0).map(|e| e.file_name.as_str()), Some("new.png"));
}

#[test]
fn stale_result_arriving_first_does_not_finish_the_session() {
    let mut state = AppState::new();
    let first = state
        .submit_file(UploadFile::new("old.mp4", "video/mp4"))
        .expect("accepted");
    let _second = state
        .submit_file(UploadFile::new("new.png", "image/png"))
        .expect("accepted");

    apply_delta(&mut state, execute(&MockCoach::instant(), first));
    assert!(state.is_processing());
    assert!(state.advice.is_empty());
    assert!(state.history.is_empty());
}

#[test]
fn stale_stats_result_is_dropped() {
    let mut state = AppState::new();
    let first = state.submit_tag("Old#1").expect("accepted");
    let second = state.submit_tag("New#2").expect("accepted");
    let ProviderCommand::FetchStats {
        request: first_id, ..
    } = first
    else {
        panic!("expected stats command");
    };

    let mut older = mock_stats();
    older.level = 1;
    apply_delta(
        &mut state,
        Delta::StatsReady {
            request: first_id,
            tag: "Old#1".to_string(),
            stats: older,
        },
    );
    assert!(state.stats.is_none());
    assert!(state.is_stats_loading());

    apply_delta(&mut state, execute(&MockCoach::instant(), second));
    assert_eq!(state.stats, Some(mock_stats()));
}

struct FailingBackend;

impl CoachBackend for FailingBackend {
    fn analyze(&self, _file: &UploadFile) -> anyhow::Result<CoachingAdvice> {
        Err(anyhow!("analysis service unavailable"))
    }

    fn fetch_stats(&self, _tag: &str) -> anyhow::Result<PlayerStats> {
        Err(anyhow!("stats service timed out"))
    }
}

#[test]
fn stale_analysis_failure_does_not_reset_fresh_request() {
    let mut state = AppState::new();
    let first = state
        .submit_file(UploadFile::new("old.mp4", "video/mp4"))
        .expect("accepted");
    let second = state
        .submit_file(UploadFile::new("new.png", "image/png"))
        .expect("accepted");
    let ProviderCommand::Analyze {
        request: first_id, ..
    } = first
    else {
        panic!("expected analyze command");
    };
    let notices_before = state.notices.len();

    apply_delta(
        &mut state,
        Delta::AnalysisFailed {
            request: first_id,
            error: "analysis service unavailable".to_string(),
        },
    );
    assert!(state.is_processing());
    assert!(matches!(state.upload_phase, UploadPhase::Processing { .. }));
    assert_eq!(state.notices.len(), notices_before);

    apply_delta(&mut state, execute(&MockCoach::instant(), second));
    assert_eq!(state.upload_phase, UploadPhase::Ready);
    assert!(state.advice.contains("screenshot"));
    assert_eq!(state.history.get(0).map(|e| e.file_name.as_str()), Some("new.png"));
}

#[test]
fn stale_stats_failure_does_not_reset_fresh_lookup() {
    let mut state = AppState::new();
    let first = state.submit_tag("Old#1").expect("accepted");
    let second = state.submit_tag("New#2").expect("accepted");
    let ProviderCommand::FetchStats {
        request: first_id, ..
    } = first
    else {
        panic!("expected stats command");
    };
    let notices_before = state.notices.len();

    apply_delta(
        &mut state,
        Delta::StatsFailed {
            request: first_id,
            error: "stats service timed out".to_string(),
        },
    );
    assert!(state.is_stats_loading());
    assert!(matches!(state.stats_phase, StatsPhase::Fetching { .. }));
    assert_eq!(state.notices.len(), notices_before);

    apply_delta(&mut state, execute(&MockCoach::instant(), second));
    assert_eq!(state.stats_phase, StatsPhase::Ready);
    assert_eq!(state.stats, Some(mock_stats()));
}

#[test]
fn backend_failures_return_flows_to_idle() {
    let mut state = AppState::new();
    let cmd = state
        .submit_file(UploadFile::new("clip.mp4", "video/mp4"))
        .expect("accepted");
    apply_delta(&mut state, execute(&FailingBackend, cmd));
    assert_eq!(state.upload_phase, UploadPhase::Idle);
    assert!(state.history.is_empty());
    let notice = state.notices.last().expect("failure notice");
    assert_eq!(notice.severity, Severity::Error);
    assert!(notice.body.contains("analysis service unavailable"));

    let cmd = state.submit_tag("Player#1234").expect("accepted");
    apply_delta(&mut state, execute(&FailingBackend, cmd));
    assert_eq!(state.stats_phase, StatsPhase::Idle);
    assert!(state.stats.is_none());
}

struct BrokenClipboard;

impl Clipboard for BrokenClipboard {
    fn set_text(&mut self, _text: &str) -> anyhow::Result<()> {
        Err(anyhow!("no display"))
    }
}

#[derive(Default)]
struct MemoryClipboard {
    text: Option<String>,
}

impl Clipboard for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.text = Some(text.to_string());
        Ok(())
    }
}

#[test]
fn clipboard_failure_is_reported_without_touching_coaching() {
    let mut state = AppState::new();
    let cmd = state.submit_file(UploadFile::new("clip.mp4", "video/mp4"));
    run(&mut state, cmd);
    let advice = state.advice.clone();

    let err = state
        .copy_advice(&mut BrokenClipboard)
        .expect_err("copy should fail");
    assert!(matches!(err, CoachError::Clipboard(_)));
    assert_eq!(state.advice, advice);
    assert_eq!(state.upload_phase, UploadPhase::Ready);
    let notice = state.notices.last().expect("notice");
    assert_eq!(notice.title, "Failed to copy");
    assert_eq!(notice.severity, Severity::Error);
    assert!(!state.is_copied(std::time::Instant::now()));
}

#[test]
fn copy_writes_current_advice() {
    let mut state = AppState::new();
    let mut clipboard = MemoryClipboard::default();

    state.copy_advice(&mut clipboard).expect("empty advice is a no-op");
    assert!(clipboard.text.is_none());

    let cmd = state.submit_file(UploadFile::new("shot.png", "image/png"));
    run(&mut state, cmd);
    state.copy_advice(&mut clipboard).expect("copy succeeds");
    assert_eq!(clipboard.text.as_deref(), Some(state.advice.as_str()));
    assert!(state.is_copied(std::time::Instant::now()));
    assert_eq!(state.notices.last().map(|n| n.severity), Some(Severity::Success));
}

#[test]
fn drop_with_mixed_files_submits_first_valid_one() {
    let mut state = AppState::new();
    let cmd = state.submit_dropped(vec![
        UploadFile::new("readme.md", "text/markdown"),
        UploadFile::new("shot.jpg", "image/jpeg"),
    ]);
    match cmd {
        Some(ProviderCommand::Analyze { file, .. }) => assert_eq!(file.name, "shot.jpg"),
        other => panic!("unexpected command {other:?}"),
    }

    let mut state = AppState::new();
    assert!(state
        .submit_dropped(vec![UploadFile::new("readme.md", "text/markdown")])
        .is_none());
    assert_eq!(state.upload_phase, UploadPhase::Rejected);
}

#[test]
fn provider_thread_delivers_results_for_both_flows() {
    let backend: Arc<dyn CoachBackend> = Arc::new(MockCoach::new(
        Duration::from_millis(30),
        Duration::from_millis(10),
    ));
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let handle = spawn_provider(backend, tx, cmd_rx);

    let mut state = AppState::new();
    let analyze = state
        .submit_file(UploadFile::new("clip.mp4", "video/mp4"))
        .expect("accepted");
    let stats = state.submit_tag("Player#1234").expect("accepted");
    cmd_tx.send(analyze).expect("provider alive");
    cmd_tx.send(stats).expect("provider alive");

    for _ in 0..2 {
        let delta = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("provider should answer");
        apply_delta(&mut state, delta);
    }

    assert_eq!(state.upload_phase, UploadPhase::Ready);
    assert_eq!(state.stats_phase, StatsPhase::Ready);
    assert!(state.advice.contains("gameplay clip"));
    assert_eq!(state.stats, Some(mock_stats()));

    drop(cmd_tx);
    handle.join().expect("provider exits when commands close");
}
