use batch_core::{
    update, AppState, ArtifactRef, ConversionOutcome, ConversionOutput, Effect, GlobalStatus,
    InputItem, Msg, RunId, RunSummary, Severity, StatusTag,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    engine_logging::initialize_for_tests();
}

fn item(name: &str) -> InputItem {
    InputItem::new(name, name.as_bytes().to_vec(), "image/png")
}

fn ready(names: &[&str], operation: &str) -> AppState {
    let (state, _) = update(
        AppState::default(),
        Msg::ItemsAdded(names.iter().map(|name| item(name)).collect()),
    );
    let (state, _) = update(state, Msg::OperationChosen(operation.to_string()));
    state
}

fn convert(state: AppState) -> (AppState, RunId) {
    let (state, effects) = update(state, Msg::ConvertClicked);
    let run_id = match effects.as_slice() {
        [Effect::StartRun { run_id, .. }] => *run_id,
        other => panic!("expected one StartRun effect, got {other:?}"),
    };
    (state, run_id)
}

fn item_update(run_id: RunId, name: &str, outcome: ConversionOutcome) -> Msg {
    Msg::ItemUpdated {
        run_id,
        name: name.to_string(),
        outcome,
    }
}

fn artifact(filename: &str) -> ConversionOutcome {
    ConversionOutcome::Succeeded(ConversionOutput::Artifact(ArtifactRef {
        filename: filename.to_string(),
        location: format!("http://localhost:5001/download/{filename}"),
    }))
}

#[test]
fn convert_without_items_is_rejected_without_effects() {
    init_logging();
    let (state, effects) = update(AppState::default(), Msg::OperationChosen("png".to_string()));
    let (state, effects_after) = update(state, Msg::ConvertClicked);

    assert!(effects.is_empty());
    assert!(effects_after.is_empty());
    let view = state.view();
    assert_eq!(view.status_message.as_deref(), Some("Please select a file."));
    assert_eq!(view.status_severity, Severity::Error);
    assert!(view.items.is_empty());
    assert!(state.active_run().is_none());
    assert_eq!(state.results().outcomes().count(), 0);
}

#[test]
fn convert_without_operation_is_rejected_without_effects() {
    init_logging();
    let (state, _) = update(AppState::default(), Msg::ItemsAdded(vec![item("a.png")]));
    let (state, effects) = update(state, Msg::ConvertClicked);

    assert!(effects.is_empty());
    assert_eq!(
        state.results().global(),
        Some(&GlobalStatus::Rejected {
            message: "Please select a target format or operation.".to_string()
        })
    );
    assert_eq!(state.results().outcomes().count(), 0);
    assert_eq!(state.view().items[0].status, None);
}

#[test]
fn convert_seeds_pending_outcomes_and_snapshots_selection() {
    init_logging();
    let state = ready(&["a.png", "b.png"], "webp");
    let (state, effects) = update(state, Msg::ConvertClicked);

    assert_eq!(
        effects,
        vec![Effect::StartRun {
            run_id: 1,
            items: vec![item("a.png"), item("b.png")],
            target_format: "webp".to_string(),
        }]
    );
    let view = state.view();
    assert!(view.busy);
    assert!(!view.batch_complete);
    assert_eq!(view.status_message.as_deref(), Some("Processing 2 files..."));
    assert!(view
        .items
        .iter()
        .all(|row| row.status == Some(StatusTag::Pending) && row.message == "Waiting"));
}

#[test]
fn mixed_batch_reconciles_each_item_independently() {
    init_logging();
    let (state, run_id) = convert(ready(&["A.png", "B.png", "C.png"], "png"));

    let msgs = vec![
        item_update(run_id, "A.png", ConversionOutcome::InProgress),
        item_update(run_id, "A.png", artifact("a_output.png")),
        item_update(run_id, "B.png", ConversionOutcome::InProgress),
        item_update(
            run_id,
            "B.png",
            ConversionOutcome::Failed {
                message: "disk full".to_string(),
            },
        ),
        item_update(run_id, "C.png", ConversionOutcome::InProgress),
        item_update(
            run_id,
            "C.png",
            ConversionOutcome::Succeeded(ConversionOutput::Text("hello".to_string())),
        ),
        Msg::RunFinished { run_id },
    ];
    let state = msgs
        .into_iter()
        .fold(state, |state, msg| update(state, msg).0);

    let view = state.view();
    let a = &view.items[0];
    assert_eq!(a.status, Some(StatusTag::Succeeded));
    assert_eq!(
        a.artifact_ref.as_deref(),
        Some("http://localhost:5001/download/a_output.png")
    );
    assert_eq!(a.extracted_text, None);

    let b = &view.items[1];
    assert_eq!(b.status, Some(StatusTag::Failed));
    assert_eq!(b.message, "disk full");
    assert_eq!(b.artifact_ref, None);

    let c = &view.items[2];
    assert_eq!(c.status, Some(StatusTag::Succeeded));
    assert_eq!(c.extracted_text.as_deref(), Some("hello"));
    assert_eq!(c.artifact_ref, None);

    assert!(view.batch_complete);
    assert!(!view.busy);
    assert_eq!(
        view.status_message.as_deref(),
        Some("All files processed: 2 succeeded, 1 failed.")
    );
    assert_eq!(view.status_severity, Severity::Error);
}

#[test]
fn stale_run_results_are_discarded() {
    init_logging();
    let (state, first) = convert(ready(&["x.png", "y.png"], "png"));
    let (state, _) = update(state, item_update(first, "x.png", ConversionOutcome::InProgress));

    // Second run starts while the first run's request for x is outstanding.
    let (state, second) = convert(state);
    assert!(second > first);
    let (mut state, _) =
        update(state, item_update(second, "x.png", ConversionOutcome::InProgress));
    assert!(state.consume_dirty());

    // The first run's response for x finally settles.
    let (mut state, _) = update(state, item_update(first, "x.png", artifact("old.png")));
    assert!(!state.consume_dirty());
    assert_eq!(
        state.results().outcome("x.png"),
        Some(&ConversionOutcome::InProgress)
    );

    let (state, _) = update(state, Msg::RunFinished { run_id: first });
    assert!(state.results().global().is_none());
    assert_eq!(state.active_run(), Some(second));
}

#[test]
fn removed_item_never_reappears_in_a_new_run() {
    init_logging();
    let (state, first) = convert(ready(&["a.png", "b.png"], "png"));
    let (state, _) = update(state, Msg::ItemRemoved("a.png".to_string()));

    // Late result for the removed item from the running batch.
    let (state, _) = update(state, item_update(first, "a.png", artifact("a.png")));
    assert!(state.results().outcome("a.png").is_none());

    let (state, effects) = update(state, Msg::ConvertClicked);
    match effects.as_slice() {
        [Effect::StartRun { items, .. }] => {
            let names: Vec<_> = items.iter().map(InputItem::name).collect();
            assert_eq!(names, vec!["b.png"]);
        }
        other => panic!("unexpected effects {other:?}"),
    }
    let keys: Vec<_> = state.results().outcomes().map(|(name, _)| name).collect();
    assert_eq!(keys, vec!["b.png"]);
}

#[test]
fn terminal_outcome_is_not_revisited_within_a_run() {
    init_logging();
    let (state, run_id) = convert(ready(&["a.png"], "png"));
    let (state, _) = update(
        state,
        item_update(
            run_id,
            "a.png",
            ConversionOutcome::Failed {
                message: "timeout".to_string(),
            },
        ),
    );
    let (state, _) = update(state, item_update(run_id, "a.png", ConversionOutcome::InProgress));

    assert_eq!(
        state.results().outcome("a.png"),
        Some(&ConversionOutcome::Failed {
            message: "timeout".to_string()
        })
    );
}

#[test]
fn updates_after_selection_change_are_stale() {
    init_logging();
    let (state, run_id) = convert(ready(&["a.png"], "png"));
    let (state, _) = update(state, Msg::OperationChosen("jpg".to_string()));
    let (state, _) = update(state, item_update(run_id, "a.png", artifact("a.png")));

    assert!(state.results().is_empty());
    assert!(state.view().items[0].status.is_none());
}

#[test]
fn engine_rejection_becomes_single_global_message() {
    init_logging();
    let (state, run_id) = convert(ready(&["a.png"], "png"));
    let (state, _) = update(
        state,
        Msg::RunRejected {
            run_id,
            message: "Please select a file.".to_string(),
        },
    );

    assert_eq!(state.results().outcomes().count(), 0);
    assert_eq!(state.view().status_message.as_deref(), Some("Please select a file."));
    assert!(state.active_run().is_none());
}

#[test]
fn all_succeeded_summary_is_success_severity() {
    init_logging();
    let (state, run_id) = convert(ready(&["a.png"], "png"));
    let (state, _) = update(state, item_update(run_id, "a.png", artifact("a_out.png")));
    let (state, _) = update(state, Msg::RunFinished { run_id });

    let view = state.view();
    assert_eq!(view.status_severity, Severity::Success);
    assert_eq!(view.items[0].message, "Operation successful!");
}

#[test]
fn final_status_counts_only_items_still_selected() {
    init_logging();
    let (state, run_id) = convert(ready(&["a.png", "b.png"], "png"));
    let (state, _) = update(state, item_update(run_id, "a.png", artifact("a_out.png")));
    let (state, _) = update(state, Msg::ItemRemoved("a.png".to_string()));
    let (state, _) = update(state, item_update(run_id, "b.png", artifact("b_out.png")));
    let (state, _) = update(state, Msg::RunFinished { run_id });

    let view = state.view();
    assert_eq!(view.items.len(), 1);
    assert_eq!(
        state.results().summary(),
        RunSummary {
            succeeded: 1,
            failed: 0
        }
    );
    assert_eq!(
        view.status_message.as_deref(),
        Some("All files processed: 1 succeeded, 0 failed.")
    );
}

#[test]
fn aborted_run_fails_unsettled_items_and_keeps_finished_ones() {
    init_logging();
    let (state, run_id) = convert(ready(&["a.png", "b.png", "c.png"], "png"));
    let (state, _) = update(state, item_update(run_id, "a.png", artifact("a_out.png")));
    let (state, _) = update(state, item_update(run_id, "b.png", ConversionOutcome::InProgress));
    let (state, _) = update(
        state,
        Msg::RunAborted {
            run_id,
            message: "Conversion stopped unexpectedly".to_string(),
        },
    );

    let view = state.view();
    let statuses: Vec<_> = view.items.iter().map(|row| row.status).collect();
    assert_eq!(
        statuses,
        vec![
            Some(StatusTag::Succeeded),
            Some(StatusTag::Failed),
            Some(StatusTag::Failed)
        ]
    );
    assert_eq!(view.items[2].message, "Conversion stopped unexpectedly");
    assert!(view.batch_complete);
    assert!(!view.busy);
    assert_eq!(
        view.status_message.as_deref(),
        Some("All files processed: 1 succeeded, 2 failed.")
    );
}

#[test]
fn abort_from_an_older_run_is_ignored() {
    init_logging();
    let (state, first) = convert(ready(&["a.png"], "png"));
    let (state, second) = convert(state);
    let (state, _) = update(
        state,
        Msg::RunAborted {
            run_id: first,
            message: "gone".to_string(),
        },
    );

    assert_eq!(state.active_run(), Some(second));
    assert_eq!(
        state.results().outcome("a.png"),
        Some(&ConversionOutcome::Pending)
    );
    assert!(state.results().global().is_none());
}
