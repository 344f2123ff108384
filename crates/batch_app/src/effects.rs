use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use batch_core::{ArtifactRef, ConversionOutcome, Effect, InputItem, Msg};
use batch_engine::{
    ConversionService, EngineEvent, EngineEvents, EngineHandle, EngineStopped, SavedArtifact,
    UploadItem,
};
use engine_logging::{engine_info, engine_warn};

/// Something the engine reported that the app has to react to.
#[derive(Debug)]
pub enum Incoming {
    Msg(Msg),
    Downloaded {
        filename: String,
        result: Result<SavedArtifact, String>,
    },
}

pub struct EffectRunner {
    engine: EngineHandle,
    events: EngineEvents,
}

impl EffectRunner {
    pub fn new(service: Arc<dyn ConversionService>) -> std::io::Result<Self> {
        let (engine, events) = EngineHandle::spawn(service)?;
        Ok(Self { engine, events })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartRun {
                    run_id,
                    items,
                    target_format,
                } => {
                    engine_info!(
                        "StartRun run_id={} items={} target_format={}",
                        run_id,
                        items.len(),
                        target_format
                    );
                    let uploads = items.iter().map(to_upload).collect();
                    self.engine.start_run(run_id, uploads, target_format);
                }
            }
        }
    }

    pub fn download(&self, input_name: &str, filename: &str, dir: PathBuf) {
        self.engine.download(input_name, filename, dir);
    }

    /// Next engine report, or `None` once `timeout` passes without one.
    pub fn next(&self, timeout: Duration) -> Result<Option<Incoming>, EngineStopped> {
        Ok(self.events.poll(timeout)?.map(map_event))
    }
}

fn to_upload(item: &InputItem) -> UploadItem {
    UploadItem {
        name: item.name().to_string(),
        content: item.content().clone(),
        content_kind: item.content_kind().to_string(),
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Incoming {
    let msg = match event {
        EngineEvent::ItemStarted { run_id, name } => Msg::ItemUpdated {
            run_id,
            name,
            outcome: ConversionOutcome::InProgress,
        },
        EngineEvent::ItemCompleted {
            run_id,
            name,
            result,
        } => {
            let outcome = match result {
                Ok(output) => ConversionOutcome::Succeeded(map_output(output)),
                Err(err) => {
                    engine_warn!("Item '{}' failed: {}", name, err);
                    ConversionOutcome::Failed {
                        message: err.to_string(),
                    }
                }
            };
            Msg::ItemUpdated {
                run_id,
                name,
                outcome,
            }
        }
        EngineEvent::RunCompleted { run_id, summary } => {
            engine_info!(
                "Engine finished run {}: {} succeeded, {} failed",
                run_id,
                summary.succeeded,
                summary.failed
            );
            Msg::RunFinished { run_id }
        }
        EngineEvent::RunRejected { run_id, error } => Msg::RunRejected {
            run_id,
            message: error.to_string(),
        },
        EngineEvent::RunAborted { run_id, message } => Msg::RunAborted { run_id, message },
        EngineEvent::ArtifactDownloaded { filename, result } => {
            return Incoming::Downloaded { filename, result };
        }
    };
    Incoming::Msg(msg)
}

fn map_output(output: batch_engine::ConversionOutput) -> batch_core::ConversionOutput {
    match output {
        batch_engine::ConversionOutput::Artifact { filename, location } => {
            batch_core::ConversionOutput::Artifact(ArtifactRef { filename, location })
        }
        batch_engine::ConversionOutput::Text(text) => batch_core::ConversionOutput::Text(text),
    }
}
