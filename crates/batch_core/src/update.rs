use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::results::{BatchUpdate, GlobalStatus};
use crate::state::{MSG_NO_ITEMS, MSG_NO_OPERATION};
use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::CategorySelected(id) => {
            if state.catalog().category(&id).is_some() {
                state.select_category(id);
            } else {
                engine_warn!("Ignoring unknown category '{}'", id);
            }
            Vec::new()
        }
        Msg::ItemsAdded(items) => {
            let stats = state.add_items(items);
            engine_debug!("Items added={} skipped={}", stats.added, stats.skipped);
            Vec::new()
        }
        Msg::ItemRemoved(name) => {
            if !state.remove_item(&name) {
                engine_debug!("Remove ignored, no item named '{}'", name);
            }
            Vec::new()
        }
        Msg::ClearAllClicked => {
            state.clear_all();
            Vec::new()
        }
        Msg::OperationChosen(choice) => {
            choose_operation(&mut state, &choice);
            Vec::new()
        }
        Msg::ConvertClicked => start_run(&mut state),
        Msg::ItemUpdated {
            run_id,
            name,
            outcome,
        } => {
            if !state.is_current_run(run_id) {
                engine_debug!("Dropping stale update for '{}' from run {}", name, run_id);
            } else if !state.apply_run_update(BatchUpdate::Item { name, outcome }) {
                engine_debug!("Dropping update for removed or settled item in run {}", run_id);
            }
            Vec::new()
        }
        Msg::RunFinished { run_id } => {
            if state.is_current_run(run_id) {
                state.apply_run_update(BatchUpdate::Global(GlobalStatus::Completed));
                let summary = state.results().summary();
                engine_info!(
                    "Run {} finished: {} succeeded, {} failed",
                    run_id,
                    summary.succeeded,
                    summary.failed
                );
            } else {
                engine_debug!("Dropping stale summary from run {}", run_id);
            }
            Vec::new()
        }
        Msg::RunRejected { run_id, message } => {
            if state.is_current_run(run_id) {
                engine_warn!("Run {} rejected: {}", run_id, message);
                state.reject_run(&message);
            }
            Vec::new()
        }
        Msg::RunAborted { run_id, message } => {
            if state.is_current_run(run_id) {
                engine_warn!("Run {} aborted: {}", run_id, message);
                state.abort_run(&message);
            }
            Vec::new()
        }
    };

    (state, effects)
}

fn choose_operation(state: &mut AppState, choice: &str) {
    if choice.trim().is_empty() {
        state.choose_operation(None);
        return;
    }
    let resolved = state.category().and_then(|category| category.resolve(choice));
    match resolved {
        Some(operation) => {
            engine_debug!(
                "Operation '{}' resolved to format '{}'",
                operation.label,
                operation.output_format
            );
            state.choose_operation(Some(operation));
        }
        None => {
            engine_warn!(
                "Operation '{}' is not available for category '{}'",
                choice,
                state.category_id()
            );
        }
    }
}

fn start_run(state: &mut AppState) -> Vec<Effect> {
    if state.selection().is_empty() {
        state.reject_run(MSG_NO_ITEMS);
        return Vec::new();
    }
    let Some(target_format) = state
        .selection()
        .operation()
        .map(|operation| operation.output_format.clone())
    else {
        state.reject_run(MSG_NO_OPERATION);
        return Vec::new();
    };

    let run_id = state.begin_run();
    let items = state.selection().items().to_vec();
    engine_info!(
        "Starting run {} with {} item(s) -> {}",
        run_id,
        items.len(),
        target_format
    );
    vec![Effect::StartRun {
        run_id,
        items,
        target_format,
    }]
}
