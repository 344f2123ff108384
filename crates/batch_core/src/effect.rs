use crate::{InputItem, RunId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Convert a snapshot of the selection. Items are in selection order.
    StartRun {
        run_id: RunId,
        items: Vec<InputItem>,
        target_format: String,
    },
}
