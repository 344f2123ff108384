//! Batch conversion core: pure state machine, operation catalog and view-model helpers.
mod catalog;
mod effect;
mod msg;
mod results;
mod selection;
mod state;
mod update;
mod view_model;

pub use catalog::{
    AcceptFilter, Catalog, Category, FormatOption, OperationSet, SubOperation, TargetOperation,
    TEXT_EXTRACTION_FORMAT,
};
pub use effect::Effect;
pub use msg::Msg;
pub use results::{
    ArtifactRef, BatchUpdate, ConversionOutcome, ConversionOutput, GlobalStatus, ResultSet,
    RunSummary, StatusTag,
};
pub use selection::{AddStats, InputItem, Selection};
pub use state::{AppState, RunId};
pub use update::update;
pub use view_model::{AppViewModel, ItemRowView, OperationView, Severity, WorkflowStep};
