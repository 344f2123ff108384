use std::sync::Arc;

use crate::catalog::{Catalog, Category, TargetOperation};
use crate::results::{BatchUpdate, ConversionOutcome, GlobalStatus, ResultSet};
use crate::selection::{AddStats, InputItem, Selection};
use crate::view_model::{self, AppViewModel};

pub type RunId = u64;

pub(crate) const MSG_NO_ITEMS: &str = "Please select a file.";
pub(crate) const MSG_NO_OPERATION: &str = "Please select a target format or operation.";

/// Everything the client knows: catalog, selection, results and run bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    catalog: Arc<Catalog>,
    category_id: String,
    selection: Selection,
    results: ResultSet,
    last_add: Option<AddStats>,
    next_run_id: RunId,
    active_run: Option<RunId>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_catalog(Catalog::builtin())
    }
}

impl AppState {
    /// Start with the first category of `catalog` active.
    pub fn with_catalog(catalog: Catalog) -> Self {
        let category_id = catalog
            .first()
            .map(|category| category.id.clone())
            .unwrap_or_default();
        Self {
            catalog: Arc::new(catalog),
            category_id,
            selection: Selection::default(),
            results: ResultSet::default(),
            last_add: None,
            next_run_id: 1,
            active_run: None,
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        view_model::build(self)
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn category(&self) -> Option<&Category> {
        self.catalog.category(&self.category_id)
    }

    pub fn category_id(&self) -> &str {
        &self.category_id
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn active_run(&self) -> Option<RunId> {
        self.active_run
    }

    pub(crate) fn last_add(&self) -> Option<AddStats> {
        self.last_add
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Outcomes belong to one (items, operation) pair; any change to either ends them.
    fn invalidate_results(&mut self) {
        self.results.clear();
        self.active_run = None;
    }

    pub(crate) fn select_category(&mut self, id: String) {
        self.category_id = id;
        self.selection.clear();
        self.last_add = None;
        self.invalidate_results();
        self.mark_dirty();
    }

    pub(crate) fn add_items(&mut self, items: Vec<InputItem>) -> AddStats {
        let stats = self.selection.add_items(items);
        self.last_add = Some(stats);
        if stats.added > 0 {
            self.invalidate_results();
        }
        self.mark_dirty();
        stats
    }

    pub(crate) fn remove_item(&mut self, name: &str) -> bool {
        if !self.selection.remove_item(name) {
            return false;
        }
        self.results.prune(name);
        if self.results.is_empty() {
            self.active_run = None;
        }
        self.mark_dirty();
        true
    }

    pub(crate) fn clear_all(&mut self) {
        self.selection.clear();
        self.last_add = None;
        self.invalidate_results();
        self.mark_dirty();
    }

    pub(crate) fn choose_operation(&mut self, operation: Option<TargetOperation>) {
        self.selection.set_operation(operation);
        self.invalidate_results();
        self.mark_dirty();
    }

    /// Record a refused run start as the single global message.
    pub(crate) fn reject_run(&mut self, message: &str) {
        self.invalidate_results();
        self.results.apply(BatchUpdate::Global(GlobalStatus::Rejected {
            message: message.to_string(),
        }));
        self.mark_dirty();
    }

    /// Allocate the next run id and seed every selected item as Pending.
    pub(crate) fn begin_run(&mut self) -> RunId {
        let run_id = self.next_run_id;
        self.next_run_id += 1;
        self.results.clear();
        for item in self.selection.items() {
            self.results.apply(BatchUpdate::Item {
                name: item.name().to_string(),
                outcome: ConversionOutcome::Pending,
            });
        }
        self.active_run = Some(run_id);
        self.mark_dirty();
        run_id
    }

    /// Fail every item the run never settled, then close the run.
    pub(crate) fn abort_run(&mut self, message: &str) {
        let unsettled: Vec<String> = self
            .results
            .outcomes()
            .filter(|(_, outcome)| !outcome.is_terminal())
            .map(|(name, _)| name.to_string())
            .collect();
        for name in unsettled {
            self.results.apply(BatchUpdate::Item {
                name,
                outcome: ConversionOutcome::Failed {
                    message: message.to_string(),
                },
            });
        }
        self.results.apply(BatchUpdate::Global(GlobalStatus::Completed));
        self.mark_dirty();
    }

    pub(crate) fn is_current_run(&self, run_id: RunId) -> bool {
        self.active_run == Some(run_id)
    }

    /// Apply an update from the active run. Item updates for names no longer
    /// selected are dropped, and terminal outcomes are never revisited.
    pub(crate) fn apply_run_update(&mut self, update: BatchUpdate) -> bool {
        if let BatchUpdate::Item { name, .. } = &update {
            if !self.selection.contains(name) {
                return false;
            }
            if self
                .results
                .outcome(name)
                .is_some_and(ConversionOutcome::is_terminal)
            {
                return false;
            }
        }
        self.results.apply(update);
        self.mark_dirty();
        true
    }
}
