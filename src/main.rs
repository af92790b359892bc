use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use echo_coach::backend::{CoachBackend, MockCoach};
use echo_coach::clipboard::SystemClipboard;
use echo_coach::config::Config;
use echo_coach::logging;
use echo_coach::notify::Severity;
use echo_coach::provider::spawn_provider;
use echo_coach::state::{AppState, Delta, Focus, ProviderCommand, apply_delta, phase_label};
use echo_coach::upload::{MediaKind, UploadFile, parse_dropped_paths};

const NOTICE_TTL: Duration = Duration::from_secs(5);
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
    clipboard: SystemClipboard,
    ticks: usize,
}

impl App {
    fn new(cmd_tx: mpsc::Sender<ProviderCommand>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
            clipboard: SystemClipboard::new(),
            ticks: 0,
        }
    }

    fn dispatch(&mut self, cmd: Option<ProviderCommand>) {
        let Some(cmd) = cmd else {
            return;
        };
        if self.cmd_tx.send(cmd).is_err() {
            tracing::error!("provider is gone; request dropped");
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.state.path_input.is_some() {
            self.on_path_key(key);
            return;
        }

        match key.code {
            KeyCode::Tab => {
                self.state.focus = self.state.focus.next();
                return;
            }
            KeyCode::BackTab => {
                self.state.focus = self.state.focus.prev();
                return;
            }
            _ => {}
        }

        if self.state.focus == Focus::Stats {
            self.on_stats_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            KeyCode::Char('c') => {
                // Failure is already surfaced as a notice.
                let _ = self.state.copy_advice(&mut self.clipboard);
            }
            KeyCode::Char('o') | KeyCode::Enter if self.state.focus == Focus::DropZone => {
                if self.state.accepts_drop() {
                    self.state.path_input = Some(String::new());
                }
            }
            KeyCode::Char('j') | KeyCode::Down if self.state.focus == Focus::History => {
                self.state.select_next_history();
            }
            KeyCode::Char('k') | KeyCode::Up if self.state.focus == Focus::History => {
                self.state.select_prev_history();
            }
            KeyCode::Enter if self.state.focus == Focus::History => {
                let index = self.state.history_selected;
                self.state.select_history(index);
            }
            _ => {}
        }
    }

    fn on_path_key(&mut self, key: KeyEvent) {
        let Some(input) = self.state.path_input.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.state.path_input = None,
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(ch) => input.push(ch),
            KeyCode::Enter => {
                let raw = self.state.path_input.take().unwrap_or_default();
                self.on_drop(&raw);
            }
            _ => {}
        }
    }

    fn on_stats_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state.focus = Focus::DropZone,
            KeyCode::Backspace => {
                self.state.tag_input.pop();
            }
            KeyCode::Enter => {
                if self.state.is_stats_loading() {
                    return;
                }
                let tag = self.state.tag_input.clone();
                let cmd = self.state.submit_tag(&tag);
                self.dispatch(cmd);
            }
            KeyCode::Char(ch) => self.state.tag_input.push(ch),
            _ => {}
        }
    }

    fn on_paste(&mut self, text: &str) {
        if self.state.focus == Focus::Stats {
            self.state.tag_input.push_str(text.trim());
            return;
        }
        if let Some(input) = self.state.path_input.as_mut() {
            input.push_str(text);
            return;
        }
        if self.state.accepts_drop() {
            self.on_drop(text);
        }
    }

    fn on_drop(&mut self, raw: &str) {
        let files = parse_dropped_paths(raw)
            .iter()
            .map(|p| UploadFile::from_path(Path::new(p)))
            .collect::<Vec<_>>();
        if files.is_empty() {
            return;
        }
        let cmd = self.state.submit_dropped(files);
        self.dispatch(cmd);
    }
}

fn main() -> Result<()> {
    let config = Config::load();
    let _log_guard = logging::init(&config)?;

    let backend: Arc<dyn CoachBackend> = Arc::new(MockCoach::from_config(&config));
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(backend, tx, cmd_rx);

    enable_raw_mode().context("failed to enable raw mode")?;
    let guard = TerminalGuard;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(cmd_tx);
    let res = run_app(&mut terminal, &mut app, rx, config.tick_rate);

    drop(guard);
    terminal.show_cursor()?;

    if let Err(err) = &res {
        tracing::error!(error = %err, "terminal loop failed");
    }
    res
}

/// Leaves raw mode and the alternate screen on every exit path.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableBracketedPaste);
    }
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key),
                Event::Paste(text) => app.on_paste(&text),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.ticks = app.ticks.wrapping_add(1);
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(66), Constraint::Percentage(34)])
        .split(chunks[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(1)])
        .split(columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(1)])
        .split(columns[1]);

    render_drop_zone(frame, left[0], app);
    render_coach_panel(frame, left[1], &app.state);
    render_stats_panel(frame, right[0], &app.state);
    render_history_panel(frame, right[1], &app.state);
    render_notices(frame, chunks[2], &app.state);

    let footer = Paragraph::new(footer_text(&app.state))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let line1 = format!(
        "  (o)  OVERWATCH AI COACH | Upload: {} | Stats: {}",
        phase_label(&state.upload_phase),
        if state.is_stats_loading() { "FETCHING" } else { "IDLE" }
    );
    let line2 = " /|_|\\ Elevate your gameplay with AI-powered coaching insights".to_string();
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    if state.path_input.is_some() {
        return "Type a path | Enter Submit | Esc Cancel".to_string();
    }
    match state.focus {
        Focus::DropZone => {
            "Tab Focus | o/Enter Open path | paste/drag Drop file | c Copy | ? Help | q Quit"
                .to_string()
        }
        Focus::Stats => "Type BattleTag | Enter Fetch | Esc/Tab Leave".to_string(),
        Focus::History => {
            "Tab Focus | j/k/↑/↓ Move | Enter Show advice | c Copy | ? Help | q Quit".to_string()
        }
    }
}

fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(style)
}

fn render_drop_zone(frame: &mut Frame, area: Rect, app: &App) {
    let state = &app.state;
    let block = panel_block("Drop Zone", state.focus == Focus::DropZone);

    let text = if state.is_processing() {
        let spin = SPINNER[app.ticks % SPINNER.len()];
        format!("{spin} Processing...\nAI Coach is analyzing your gameplay")
    } else if let Some(input) = &state.path_input {
        format!("Path to clip or screenshot:\n> {input}_")
    } else {
        [
            "Drop Your Gameplay Here",
            "Drag & drop clips (.mp4, .wav) or screenshots (.png, .jpg)",
            "Press o to browse by path",
        ]
        .join("\n")
    };

    let style = if state.is_processing() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let paragraph = Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}

fn render_coach_panel(frame: &mut Frame, area: Rect, state: &AppState) {
    let title = if !state.advice.is_empty() && !state.is_coach_loading() {
        if state.is_copied(Instant::now()) {
            "Coach Echo Says: [Copied]"
        } else {
            "Coach Echo Says: [c Copy]"
        }
    } else {
        "Coach Echo Says:"
    };
    let block = panel_block(title, false);

    let paragraph = if state.is_coach_loading() {
        Paragraph::new("░░░░░░░░░░░░░░░░░░░░░░░░\n░░░░░░░░░░░░░░░░░░\n░░░░░░░░░░░░")
            .style(Style::default().fg(Color::DarkGray))
    } else if !state.advice.is_empty() {
        Paragraph::new(state.advice.as_str()).wrap(Wrap { trim: false })
    } else {
        Paragraph::new(
            "Upload a gameplay clip or screenshot to get personalized coaching advice!",
        )
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
    };
    frame.render_widget(paragraph.block(block), area);
}

fn render_stats_panel(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = panel_block("Live Overwatch Stats", state.focus == Focus::Stats);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(inner);

    let cursor = if state.focus == Focus::Stats { "_" } else { "" };
    let button = if state.is_stats_loading() { "[Fetching...]" } else { "[Fetch]" };
    let input = if state.tag_input.is_empty() && state.focus != Focus::Stats {
        "Enter BattleTag (e.g., Player#1234)".to_string()
    } else {
        format!("{}{cursor}", state.tag_input)
    };
    frame.render_widget(Paragraph::new(format!("{input}  {button}")), rows[0]);

    let body = match &state.stats {
        Some(stats) => Paragraph::new(format!(
            "Level:            {}\nCompetitive Rank: {}\nGames Played:     {}\nWin Rate:         {}%",
            stats.level, stats.rank, stats.games_played, stats.win_rate
        )),
        None if !state.is_stats_loading() => {
            Paragraph::new("Enter your BattleTag to view live Overwatch statistics")
                .style(Style::default().fg(Color::DarkGray))
                .wrap(Wrap { trim: true })
        }
        None => Paragraph::new(""),
    };
    frame.render_widget(body, rows[1]);
}

fn render_history_panel(frame: &mut Frame, area: Rect, state: &AppState) {
    let focused = state.focus == Focus::History;
    let block = panel_block("Coaching History", focused);

    if state.history.is_empty() {
        let empty = Paragraph::new("No coaching sessions yet\nUpload files to build your history")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    const ROW_HEIGHT: u16 = 2;
    let visible = (inner.height / ROW_HEIGHT) as usize;
    if visible == 0 {
        return;
    }
    let (start, end) = visible_range(state.history_selected, state.history.len(), visible);

    for (i, (idx, entry)) in state
        .history
        .entries()
        .enumerate()
        .skip(start)
        .take(end - start)
        .enumerate()
    {
        let row_area = Rect {
            x: inner.x,
            y: inner.y + (i as u16) * ROW_HEIGHT,
            width: inner.width,
            height: ROW_HEIGHT,
        };
        let selected = focused && idx == state.history_selected;
        let style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        let icon = match entry.file_kind {
            MediaKind::Video => "[VID]",
            MediaKind::Image => "[IMG]",
        };
        let preview = entry
            .advice
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        let text = format!(
            "{icon} {} {}\n      {preview}",
            entry.file_name,
            entry.created_at.format("%H:%M")
        );
        let paragraph = Paragraph::new(text).style(style);
        frame.render_widget(paragraph, row_area);
    }
}

fn render_notices(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Notices").borders(Borders::ALL);
    let recent = state.notices.recent(Instant::now(), NOTICE_TTL);
    let lines = recent
        .iter()
        .rev()
        .take(area.height.saturating_sub(2) as usize)
        .rev()
        .map(|n| {
            let color = match n.severity {
                Severity::Info => Color::Cyan,
                Severity::Success => Color::Green,
                Severity::Error => Color::Red,
            };
            Line::from(vec![
                Span::styled(
                    format!("{} ", n.title),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(n.body.clone()),
            ])
        })
        .collect::<Vec<_>>();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Echo Coach - Help",
        "",
        "Global:",
        "  Tab / S-Tab  Cycle panel focus",
        "  c            Copy advice",
        "  ?            Toggle help",
        "  q / Ctrl-C   Quit",
        "",
        "Drop zone:",
        "  o / Enter    Type a file path",
        "  paste/drag   Drop file(s)",
        "",
        "Stats:",
        "  type, Enter  Fetch stats for BattleTag",
        "",
        "History:",
        "  j/k or ↑/↓   Move",
        "  Enter        Show stored advice",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
