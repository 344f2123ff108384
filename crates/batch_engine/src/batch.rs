use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};

use crate::service::{ConversionService, ServiceResponse};
use crate::{
    ConversionError, ConversionOutput, EngineEvent, RunId, RunSummary, UploadItem,
    ValidationError,
};

/// Output format whose results come back as inline text.
pub const TEXT_EXTRACTION_FORMAT: &str = "txt";

pub trait UpdateSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelUpdateSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelUpdateSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl UpdateSink for ChannelUpdateSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Remembers the newest run id so older runs can stop dispatching.
#[derive(Debug, Clone, Default)]
pub struct RunTracker {
    latest: Arc<AtomicU64>,
}

impl RunTracker {
    pub fn begin(&self, run_id: RunId) {
        self.latest.fetch_max(run_id, Ordering::SeqCst);
    }

    pub fn is_current(&self, run_id: RunId) -> bool {
        self.latest.load(Ordering::SeqCst) == run_id
    }
}

pub fn validate(items: &[UploadItem], target_format: &str) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::NoItems);
    }
    if target_format.trim().is_empty() {
        return Err(ValidationError::NoTargetFormat);
    }
    Ok(())
}

/// Convert `items` one at a time, in order, reporting through `sink`.
///
/// Returns `Ok(None)` when a newer run started before this one finished; the
/// request already in flight settles, the remaining items are not sent, and
/// no summary is emitted.
pub async fn run_batch(
    service: &dyn ConversionService,
    tracker: &RunTracker,
    run_id: RunId,
    items: &[UploadItem],
    target_format: &str,
    sink: &dyn UpdateSink,
) -> Result<Option<RunSummary>, ValidationError> {
    tracker.begin(run_id);
    if let Err(error) = validate(items, target_format) {
        engine_warn!("Run {} rejected: {}", run_id, error);
        sink.emit(EngineEvent::RunRejected {
            run_id,
            error: error.clone(),
        });
        return Err(error);
    }

    let mut summary = RunSummary::default();
    for (index, item) in items.iter().enumerate() {
        if !tracker.is_current(run_id) {
            engine_info!(
                "Run {} superseded, {} item(s) not sent",
                run_id,
                items.len() - index
            );
            return Ok(None);
        }

        sink.emit(EngineEvent::ItemStarted {
            run_id,
            name: item.name.clone(),
        });
        engine_info!(
            "Run {} converting '{}' ({} bytes) -> {}",
            run_id,
            item.name,
            item.content.len(),
            target_format
        );

        let result = match service.convert(item, target_format).await {
            Ok(response) => reconcile(service, response, target_format),
            Err(err) => Err(err),
        };
        match &result {
            Ok(_) => summary.succeeded += 1,
            Err(ConversionError::InconsistentResponse) => {
                engine_warn!(
                    "Run {}: service reported success for '{}' without output",
                    run_id,
                    item.name
                );
                summary.failed += 1;
            }
            Err(err) => {
                engine_warn!("Run {}: '{}' failed: {}", run_id, item.name, err);
                summary.failed += 1;
            }
        }

        sink.emit(EngineEvent::ItemCompleted {
            run_id,
            name: item.name.clone(),
            result,
        });
    }

    sink.emit(EngineEvent::RunCompleted { run_id, summary });
    Ok(Some(summary))
}

/// Turn a service response into a payload. A success flag without any
/// payload is an error, not an empty success. Inline text only counts for
/// text extraction; other formats need an output filename.
pub fn reconcile(
    service: &dyn ConversionService,
    response: ServiceResponse,
    target_format: &str,
) -> Result<ConversionOutput, ConversionError> {
    if !response.success {
        return Err(ConversionError::service(None, response.error));
    }

    let artifact = response
        .output_filename
        .filter(|filename| !filename.trim().is_empty())
        .map(|filename| ConversionOutput::Artifact {
            location: service.artifact_location(&filename),
            filename,
        });

    let output = if target_format.eq_ignore_ascii_case(TEXT_EXTRACTION_FORMAT) {
        response.text_content.map(ConversionOutput::Text).or(artifact)
    } else {
        artifact
    };
    output.ok_or(ConversionError::InconsistentResponse)
}
