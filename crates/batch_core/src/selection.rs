use bytes::Bytes;

use crate::catalog::TargetOperation;

/// One user-supplied file. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputItem {
    name: String,
    size: u64,
    content: Bytes,
    content_kind: String,
}

impl InputItem {
    pub fn new(
        name: impl Into<String>,
        content: impl Into<Bytes>,
        content_kind: impl Into<String>,
    ) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len() as u64,
            content,
            content_kind: content_kind.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Cheap handle to the raw bytes; cloning does not copy the content.
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn content_kind(&self) -> &str {
        &self.content_kind
    }
}

/// Counts reported back for the most recent `add_items` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddStats {
    pub added: usize,
    pub skipped: usize,
}

/// Items of the active category plus the chosen operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    items: Vec<InputItem>,
    operation: Option<TargetOperation>,
}

impl Selection {
    pub fn items(&self) -> &[InputItem] {
        &self.items
    }

    pub fn operation(&self) -> Option<&TargetOperation> {
        self.operation.as_ref()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|item| item.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append items in arrival order; first-seen name wins.
    pub(crate) fn add_items(&mut self, incoming: Vec<InputItem>) -> AddStats {
        let mut stats = AddStats::default();
        for item in incoming {
            if self.contains(&item.name) {
                stats.skipped += 1;
            } else {
                self.items.push(item);
                stats.added += 1;
            }
        }
        stats
    }

    pub(crate) fn remove_item(&mut self, name: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.name != name);
        self.items.len() != before
    }

    pub(crate) fn set_operation(&mut self, operation: Option<TargetOperation>) {
        self.operation = operation;
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.operation = None;
    }
}
