//! Result aggregation: a pure reducer from per-item and global updates into
//! the current outcome set.

use std::collections::BTreeMap;

/// Where a converted artifact can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    /// Name assigned by the conversion service.
    pub filename: String,
    /// Retrieval location built from the filename.
    pub location: String,
}

/// Payload of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutput {
    Artifact(ArtifactRef),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Pending,
    InProgress,
    Succeeded(ConversionOutput),
    Failed { message: String },
}

impl ConversionOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed { .. })
    }

    pub fn status(&self) -> StatusTag {
        match self {
            Self::Pending => StatusTag::Pending,
            Self::InProgress => StatusTag::InProgress,
            Self::Succeeded(_) => StatusTag::Succeeded,
            Self::Failed { .. } => StatusTag::Failed,
        }
    }
}

/// Display-ready status of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTag {
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

/// Terminal counts over the current outcome set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Run-wide status entry, kept apart from the per-item outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalStatus {
    /// The run was refused before anything was dispatched.
    Rejected { message: String },
    /// Every item of the run was handled. Counts come from `ResultSet::summary`.
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchUpdate {
    Item {
        name: String,
        outcome: ConversionOutcome,
    },
    Global(GlobalStatus),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultSet {
    outcomes: BTreeMap<String, ConversionOutcome>,
    global: Option<GlobalStatus>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold an ordered update stream into a fresh result set.
    pub fn reduce<I>(updates: I) -> Self
    where
        I: IntoIterator<Item = BatchUpdate>,
    {
        updates.into_iter().fold(Self::new(), |mut set, update| {
            set.apply(update);
            set
        })
    }

    /// Last write wins per key; global updates never touch item entries.
    pub fn apply(&mut self, update: BatchUpdate) {
        match update {
            BatchUpdate::Item { name, outcome } => {
                self.outcomes.insert(name, outcome);
            }
            BatchUpdate::Global(status) => {
                self.global = Some(status);
            }
        }
    }

    pub fn outcome(&self, name: &str) -> Option<&ConversionOutcome> {
        self.outcomes.get(name)
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (&str, &ConversionOutcome)> {
        self.outcomes.iter().map(|(name, outcome)| (name.as_str(), outcome))
    }

    pub fn global(&self) -> Option<&GlobalStatus> {
        self.global.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty() && self.global.is_none()
    }

    /// Number of items still Pending or InProgress.
    pub fn in_flight(&self) -> usize {
        self.outcomes
            .values()
            .filter(|outcome| !outcome.is_terminal())
            .count()
    }

    /// True iff nothing is Pending/InProgress and at least one item is terminal.
    pub fn is_complete(&self) -> bool {
        self.in_flight() == 0 && self.outcomes.values().any(ConversionOutcome::is_terminal)
    }

    pub fn summary(&self) -> RunSummary {
        self.outcomes
            .values()
            .fold(RunSummary::default(), |mut summary, outcome| {
                match outcome {
                    ConversionOutcome::Succeeded(_) => summary.succeeded += 1,
                    ConversionOutcome::Failed { .. } => summary.failed += 1,
                    ConversionOutcome::Pending | ConversionOutcome::InProgress => {}
                }
                summary
            })
    }

    /// Drop the item's entry; a global status without items goes with it.
    pub(crate) fn prune(&mut self, name: &str) {
        self.outcomes.remove(name);
        if self.outcomes.is_empty() {
            self.global = None;
        }
    }

    pub(crate) fn clear(&mut self) {
        self.outcomes.clear();
        self.global = None;
    }
}
