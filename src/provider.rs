use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::backend::CoachBackend;
use crate::state::{Delta, ProviderCommand};

/// Runs provider commands against `backend`. Each command gets its own
/// worker so an analysis and a stats lookup overlap. The loop ends when the
/// command sender is dropped.
pub fn spawn_provider(
    backend: Arc<dyn CoachBackend>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            let backend = backend.clone();
            let tx = tx.clone();
            thread::spawn(move || run_command(backend.as_ref(), cmd, &tx));
        }
        tracing::debug!("provider command channel closed");
    })
}

pub fn run_command(backend: &dyn CoachBackend, cmd: ProviderCommand, tx: &Sender<Delta>) {
    let delta = execute(backend, cmd);
    // The UI may already be gone on shutdown.
    let _ = tx.send(delta);
}

/// Blocking execution of a single command, shared by the provider workers
/// and the headless batch runner.
pub fn execute(backend: &dyn CoachBackend, cmd: ProviderCommand) -> Delta {
    match cmd {
        ProviderCommand::Analyze { request, file } => match backend.analyze(&file) {
            Ok(advice) => Delta::AdviceReady {
                request,
                kind: file.kind(),
                file_name: file.name,
                advice,
            },
            Err(err) => {
                tracing::warn!(request, error = %err, "analysis failed");
                Delta::AnalysisFailed {
                    request,
                    error: format!("{err:#}"),
                }
            }
        },
        ProviderCommand::FetchStats { request, tag } => match backend.fetch_stats(&tag) {
            Ok(stats) => Delta::StatsReady {
                request,
                tag,
                stats,
            },
            Err(err) => {
                tracing::warn!(request, error = %err, "stats lookup failed");
                Delta::StatsFailed {
                    request,
                    error: format!("{err:#}"),
                }
            }
        },
    }
}
