use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_error, engine_info, engine_warn};
use thiserror::Error;

use crate::batch::{run_batch, ChannelUpdateSink, RunTracker};
use crate::persist::ArtifactStore;
use crate::service::ConversionService;
use crate::{EngineEvent, RunId, UploadItem};

const MSG_ABORTED: &str = "Conversion stopped unexpectedly.";

enum EngineCommand {
    StartRun {
        run_id: RunId,
        items: Vec<UploadItem>,
        target_format: String,
    },
    Download {
        input_name: String,
        filename: String,
        dir: PathBuf,
    },
}

/// What to report when the task handling a command dies without finishing.
enum AbortReport {
    Run(RunId),
    Download(String),
}

impl EngineCommand {
    fn abort_report(&self) -> AbortReport {
        match self {
            EngineCommand::StartRun { run_id, .. } => AbortReport::Run(*run_id),
            EngineCommand::Download { filename, .. } => AbortReport::Download(filename.clone()),
        }
    }
}

impl AbortReport {
    fn into_event(self) -> EngineEvent {
        match self {
            AbortReport::Run(run_id) => EngineEvent::RunAborted {
                run_id,
                message: MSG_ABORTED.to_string(),
            },
            AbortReport::Download(filename) => EngineEvent::ArtifactDownloaded {
                filename,
                result: Err(MSG_ABORTED.to_string()),
            },
        }
    }
}

/// The engine thread has exited; no further events will arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("conversion engine stopped")]
pub struct EngineStopped;

/// Sending half: owned by whoever executes effects.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    tracker: RunTracker,
}

/// Receiving half: engine events in emission order.
pub struct EngineEvents {
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    /// Start the engine thread with its own tokio runtime.
    pub fn spawn(service: Arc<dyn ConversionService>) -> std::io::Result<(Self, EngineEvents)> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let (event_tx, event_rx) = mpsc::channel();
        let tracker = RunTracker::default();
        let engine_tracker = tracker.clone();

        thread::Builder::new()
            .name("batch-engine".to_string())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    let report = command.abort_report();
                    let service = service.clone();
                    let tracker = engine_tracker.clone();
                    let task_tx = event_tx.clone();
                    let task = runtime.spawn(async move {
                        handle_command(service.as_ref(), &tracker, command, task_tx).await;
                    });
                    let watch_tx = event_tx.clone();
                    runtime.spawn(async move {
                        if let Err(err) = task.await {
                            engine_error!("Engine task failed: {}", err);
                            let _ = watch_tx.send(report.into_event());
                        }
                    });
                }
                runtime.shutdown_timeout(Duration::from_secs(1));
            })?;

        Ok((Self { cmd_tx, tracker }, EngineEvents { event_rx }))
    }

    /// Start a run. Any earlier run counts as superseded from now on.
    pub fn start_run(
        &self,
        run_id: RunId,
        items: Vec<UploadItem>,
        target_format: impl Into<String>,
    ) {
        self.tracker.begin(run_id);
        self.send(EngineCommand::StartRun {
            run_id,
            items,
            target_format: target_format.into(),
        });
    }

    /// Fetch the artifact produced for `input_name` and save it into `dir`.
    pub fn download(
        &self,
        input_name: impl Into<String>,
        filename: impl Into<String>,
        dir: PathBuf,
    ) {
        self.send(EngineCommand::Download {
            input_name: input_name.into(),
            filename: filename.into(),
            dir,
        });
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_error!("Engine thread is gone; command dropped");
        }
    }
}

impl EngineEvents {
    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks until the next event; `None` once the engine has shut down.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Like `recv_timeout`, but tells a quiet engine from a stopped one.
    pub fn poll(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineStopped> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineStopped),
        }
    }
}

async fn handle_command(
    service: &dyn ConversionService,
    tracker: &RunTracker,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::StartRun {
            run_id,
            items,
            target_format,
        } => {
            let sink = ChannelUpdateSink::new(event_tx);
            // Rejections are already reported through the sink.
            let _ = run_batch(service, tracker, run_id, &items, &target_format, &sink).await;
        }
        EngineCommand::Download {
            input_name,
            filename,
            dir,
        } => {
            let result = match service.fetch_artifact(&filename).await {
                Ok(bytes) => ArtifactStore::open(dir)
                    .and_then(|store| store.save(&input_name, &filename, &bytes))
                    .map_err(|err| err.to_string()),
                Err(err) => Err(err.to_string()),
            };
            match &result {
                Ok(saved) => engine_info!("Saved artifact {} to {:?}", filename, saved.path),
                Err(err) => engine_warn!("Download of {} failed: {}", filename, err),
            }
            let _ = event_tx.send(EngineEvent::ArtifactDownloaded { filename, result });
        }
    }
}
