use crate::{ConversionOutcome, InputItem, RunId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User switched to another category tab.
    CategorySelected(String),
    /// User picked or dropped files.
    ItemsAdded(Vec<InputItem>),
    /// User removed one file from the batch.
    ItemRemoved(String),
    /// User cleared the whole batch.
    ClearAllClicked,
    /// User picked an operation id or a literal output format.
    OperationChosen(String),
    /// User asked to convert the current selection.
    ConvertClicked,
    /// Engine progress or result for one item of a run.
    ItemUpdated {
        run_id: RunId,
        name: String,
        outcome: ConversionOutcome,
    },
    /// Engine handled every item of a run.
    RunFinished { run_id: RunId },
    /// Engine refused a run before dispatching anything.
    RunRejected { run_id: RunId, message: String },
    /// Engine lost a run part way; unsettled items fail with `message`.
    RunAborted { run_id: RunId, message: String },
}
