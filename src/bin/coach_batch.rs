use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde_json::json;

use echo_coach::backend::MockCoach;
use echo_coach::config::Config;
use echo_coach::provider;
use echo_coach::state::{AppState, UploadPhase, apply_delta};
use echo_coach::upload::UploadFile;

struct Args {
    files: Vec<String>,
    tag: Option<String>,
    delay: Option<Duration>,
}

fn main() -> Result<()> {
    let args = parse_args()?;
    if args.files.is_empty() && args.tag.is_none() {
        return Err(anyhow!(
            "usage: coach_batch [--tag TAG] [--delay-ms N] FILE..."
        ));
    }

    let config = Config::load();
    let backend = match args.delay {
        Some(delay) => MockCoach::new(delay, delay),
        None => MockCoach {
            jitter: Duration::ZERO,
            ..MockCoach::from_config(&config)
        },
    };

    let mut state = AppState::new();
    let mut accepted = 0usize;
    for raw in &args.files {
        let file = UploadFile::from_path(Path::new(raw));
        let Some(cmd) = state.submit_file(file) else {
            continue;
        };
        accepted += 1;
        apply_delta(&mut state, provider::execute(&backend, cmd));
        if state.upload_phase != UploadPhase::Ready {
            eprintln!("[WARN] {raw}: analysis did not complete");
        }
    }

    if let Some(tag) = &args.tag {
        if let Some(cmd) = state.submit_tag(tag) {
            apply_delta(&mut state, provider::execute(&backend, cmd));
        }
    }

    let report = json!({
        "history": state.history.entries().collect::<Vec<_>>(),
        "stats": state.stats,
        "notices": state.notices.iter().collect::<Vec<_>>(),
    });
    let rendered = serde_json::to_string_pretty(&report).context("failed to render report")?;
    println!("{rendered}");

    if !args.files.is_empty() && accepted == 0 {
        return Err(anyhow!("no file was accepted"));
    }
    Ok(())
}

fn parse_args() -> Result<Args> {
    let mut files = Vec::new();
    let mut tag = None;
    let mut delay = None;
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        if let Some(value) = arg.strip_prefix("--tag=") {
            tag = Some(value.to_string());
        } else if arg == "--tag" {
            tag = Some(iter.next().context("--tag needs a value")?);
        } else if let Some(value) = arg.strip_prefix("--delay-ms=") {
            delay = Some(parse_delay(value)?);
        } else if arg == "--delay-ms" {
            let value = iter.next().context("--delay-ms needs a value")?;
            delay = Some(parse_delay(&value)?);
        } else {
            files.push(arg);
        }
    }

    Ok(Args { files, tag, delay })
}

fn parse_delay(raw: &str) -> Result<Duration> {
    let ms = raw
        .trim()
        .parse::<u64>()
        .with_context(|| format!("invalid --delay-ms value '{raw}'"))?;
    Ok(Duration::from_millis(ms))
}
