use crate::results::{ConversionOutcome, ConversionOutput, GlobalStatus, StatusTag};
use crate::selection::AddStats;
use crate::{AppState, RunId};

pub(crate) const MSG_PENDING: &str = "Waiting";
pub(crate) const MSG_IN_PROGRESS: &str = "Converting, please wait...";
pub(crate) const MSG_SUCCEEDED: &str = "Operation successful!";

/// Which of the three workflow steps the user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowStep {
    #[default]
    SelectFiles,
    SelectOperation,
    Convert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub category_id: String,
    pub category_label: String,
    pub accept: String,
    pub operations: Vec<OperationView>,
    pub target_format: Option<String>,
    pub items: Vec<ItemRowView>,
    pub last_add: Option<AddStats>,
    pub status_message: Option<String>,
    pub status_severity: Severity,
    pub step: WorkflowStep,
    pub busy: bool,
    pub batch_complete: bool,
    pub active_run: Option<RunId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationView {
    pub id: String,
    pub label: String,
    pub output_format: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRowView {
    pub name: String,
    pub size: u64,
    pub content_kind: String,
    pub status: Option<StatusTag>,
    pub artifact_ref: Option<String>,
    pub extracted_text: Option<String>,
    pub message: String,
}

pub(crate) fn build(state: &AppState) -> AppViewModel {
    let selection = state.selection();
    let results = state.results();
    let chosen = selection.operation();

    let (category_label, accept, operations) = match state.category() {
        Some(category) => (
            category.label.clone(),
            category.accept.descriptor().to_string(),
            category
                .target_operations()
                .into_iter()
                .map(|op| OperationView {
                    selected: chosen.is_some_and(|c| c.id == op.id),
                    id: op.id,
                    label: op.label,
                    output_format: op.output_format,
                })
                .collect(),
        ),
        None => (String::new(), String::new(), Vec::new()),
    };

    let items = selection
        .items()
        .iter()
        .map(|item| {
            row(
                item.name(),
                item.size(),
                item.content_kind(),
                results.outcome(item.name()),
            )
        })
        .collect();

    let in_flight = results.in_flight();
    let busy = in_flight > 0;
    let batch_complete = results.is_complete();

    let (status_message, status_severity) = match results.global() {
        Some(GlobalStatus::Rejected { message }) => (Some(message.clone()), Severity::Error),
        Some(GlobalStatus::Completed) => {
            let summary = results.summary();
            (
                Some(format!(
                    "All files processed: {} succeeded, {} failed.",
                    summary.succeeded, summary.failed
                )),
                if summary.failed > 0 {
                    Severity::Error
                } else {
                    Severity::Success
                },
            )
        }
        None if busy => (
            Some(format!("Processing {} files...", in_flight)),
            Severity::Info,
        ),
        None => (None, Severity::Info),
    };

    let step = if selection.is_empty() {
        WorkflowStep::SelectFiles
    } else if chosen.is_none() {
        WorkflowStep::SelectOperation
    } else {
        WorkflowStep::Convert
    };

    AppViewModel {
        category_id: state.category_id().to_string(),
        category_label,
        accept,
        operations,
        target_format: chosen.map(|op| op.output_format.clone()),
        items,
        last_add: state.last_add(),
        status_message,
        status_severity,
        step,
        busy,
        batch_complete,
        active_run: state.active_run(),
    }
}

fn row(
    name: &str,
    size: u64,
    content_kind: &str,
    outcome: Option<&ConversionOutcome>,
) -> ItemRowView {
    let (artifact_ref, extracted_text, message) = match outcome {
        None => (None, None, String::new()),
        Some(ConversionOutcome::Pending) => (None, None, MSG_PENDING.to_string()),
        Some(ConversionOutcome::InProgress) => (None, None, MSG_IN_PROGRESS.to_string()),
        Some(ConversionOutcome::Succeeded(ConversionOutput::Artifact(artifact))) => (
            Some(artifact.location.clone()),
            None,
            MSG_SUCCEEDED.to_string(),
        ),
        Some(ConversionOutcome::Succeeded(ConversionOutput::Text(text))) => {
            (None, Some(text.clone()), MSG_SUCCEEDED.to_string())
        }
        Some(ConversionOutcome::Failed { message }) => (None, None, message.clone()),
    };

    ItemRowView {
        name: name.to_string(),
        size,
        content_kind: content_kind.to_string(),
        status: outcome.map(ConversionOutcome::status),
        artifact_ref,
        extracted_text,
        message,
    }
}
