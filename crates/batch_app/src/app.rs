use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use batch_core::{
    update, AppState, Catalog, ConversionOutcome, ConversionOutput, GlobalStatus, InputItem, Msg,
    RunSummary,
};
use batch_engine::{ArtifactStore, ReqwestConversionService, SavedArtifact};
use chrono::Local;
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};

use crate::config::AppConfig;
use crate::effects::{EffectRunner, Incoming};
use crate::render::Renderer;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub struct ConvertRequest {
    pub category: String,
    pub operation: String,
    pub server: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub files: Vec<PathBuf>,
}

/// Owns the state and pushes every message through `update`.
struct Session {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
}

impl Session {
    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.renderer.render(&state.view());
        }
        self.state = state;
        self.runner.enqueue(effects);
    }

    /// Feed engine reports back in until the current run settles.
    fn wait_for_run(&mut self) {
        while self.state.results().global().is_none() {
            match self.runner.next(POLL_INTERVAL) {
                Ok(Some(Incoming::Msg(msg))) => self.dispatch(msg),
                Ok(Some(Incoming::Downloaded { filename, .. })) => {
                    engine_debug!("Ignoring download report for {} during a run", filename);
                }
                Ok(None) => {}
                Err(err) => {
                    engine_error!("{}", err);
                    match self.state.active_run() {
                        Some(run_id) => self.dispatch(Msg::RunAborted {
                            run_id,
                            message: err.to_string(),
                        }),
                        None => return,
                    }
                }
            }
        }
    }

    fn download_artifacts(&self, dir: &Path) -> anyhow::Result<usize> {
        ArtifactStore::open(dir)
            .with_context(|| format!("cannot use download directory {}", dir.display()))?;

        let mut pending = 0;
        for item in self.state.selection().items() {
            if let Some(ConversionOutcome::Succeeded(ConversionOutput::Artifact(artifact))) =
                self.state.results().outcome(item.name())
            {
                self.runner.download(item.name(), &artifact.filename, dir.to_path_buf());
                pending += 1;
            }
        }

        let mut failed = 0;
        while pending > 0 {
            match self.runner.next(POLL_INTERVAL) {
                Ok(Some(Incoming::Downloaded { filename, result })) => {
                    pending -= 1;
                    match result {
                        Ok(saved) => println!("{}", saved_line(&filename, &saved)),
                        Err(err) => {
                            eprintln!("Download of {filename} failed: {err}");
                            failed += 1;
                        }
                    }
                }
                Ok(Some(Incoming::Msg(msg))) => {
                    engine_debug!("Ignoring late engine message {:?}", msg);
                }
                Ok(None) => {}
                Err(err) => {
                    eprintln!("{pending} download(s) lost: {err}");
                    failed += pending;
                    pending = 0;
                }
            }
        }
        Ok(failed)
    }

    fn completed(&self) -> Option<RunSummary> {
        match self.state.results().global() {
            Some(GlobalStatus::Completed) => Some(self.state.results().summary()),
            _ => None,
        }
    }
}

pub fn run_catalog() -> ExitCode {
    crate::render::print_catalog(&Catalog::builtin());
    ExitCode::SUCCESS
}

pub fn run_convert(config: &AppConfig, request: ConvertRequest) -> anyhow::Result<ExitCode> {
    let catalog = Catalog::builtin();
    let Some(category) = catalog.category(&request.category) else {
        let known: Vec<&str> = catalog.categories().iter().map(|c| c.id.as_str()).collect();
        bail!(
            "unknown category '{}' (expected one of: {})",
            request.category,
            known.join(", ")
        );
    };

    let mut settings = config.service_settings();
    if let Some(server) = request.server {
        settings.base_url = server;
    }
    engine_info!("Using conversion service at {}", settings.base_url);
    let service = ReqwestConversionService::new(settings)?;
    let runner = EffectRunner::new(Arc::new(service)).context("cannot start engine")?;

    let (items, skipped_any) = read_inputs(&request.files, |name, kind| {
        category.accept.accepts(name, kind)
    });

    let mut session = Session {
        state: AppState::default(),
        runner,
        renderer: Renderer::default(),
    };
    session.dispatch(Msg::CategorySelected(category.id.clone()));
    session.dispatch(Msg::ItemsAdded(items));
    session.dispatch(Msg::OperationChosen(request.operation.clone()));

    println!(
        "{} Converting {} file(s) to {} via {}",
        Local::now().format("%H:%M:%S"),
        session.state.selection().items().len(),
        request.operation,
        category.label
    );
    session.dispatch(Msg::ConvertClicked);
    session.wait_for_run();

    let Some(summary) = session.completed() else {
        return Ok(ExitCode::FAILURE);
    };
    let mut failed = summary.failed;
    if let Some(dir) = request.download_dir.or_else(|| config.download_dir.clone()) {
        failed += session.download_artifacts(&dir)?;
    }

    Ok(if failed == 0 && !skipped_any {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn saved_line(filename: &str, saved: &SavedArtifact) -> String {
    match &saved.renamed_from {
        Some(taken) => format!(
            "Saved {} to {} ({} already existed)",
            filename,
            saved.path.display(),
            taken
        ),
        None => format!("Saved {} to {}", filename, saved.path.display()),
    }
}

/// Read every readable file that `accepts` allows. The flag is set when any
/// file had to be skipped.
fn read_inputs(
    files: &[PathBuf],
    accepts: impl Fn(&str, &str) -> bool,
) -> (Vec<InputItem>, bool) {
    let mut items = Vec::new();
    let mut skipped = false;
    for path in files {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => {
                eprintln!("Skipping {}: not a file name", path.display());
                skipped = true;
                continue;
            }
        };
        let kind = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        if !accepts(&name, &kind) {
            eprintln!("Skipping {name}: {kind} is not accepted by this category");
            skipped = true;
            continue;
        }
        match fs::read(path) {
            Ok(content) => items.push(InputItem::new(name, content, kind)),
            Err(err) => {
                engine_warn!("Failed to read {:?}: {}", path, err);
                eprintln!("Skipping {}: {}", path.display(), err);
                skipped = true;
            }
        }
    }
    (items, skipped)
}
