use std::collections::HashMap;

use batch_core::{
    AddStats, AppViewModel, Catalog, ItemRowView, Severity, StatusTag, TargetOperation,
};

pub fn print_catalog(catalog: &Catalog) {
    for category in catalog.categories() {
        println!(
            "{} ({})  accepts: {}",
            category.id,
            category.label,
            category.accept.descriptor()
        );
        for op in category.target_operations() {
            println!("    {}", operation_line(&op));
        }
    }
}

fn operation_line(op: &TargetOperation) -> String {
    let mut line = format!("{:<14} {}", op.id, op.label);
    if op.id != op.output_format {
        line.push_str(" -> ");
        line.push_str(&op.output_format);
    }
    if op.is_text_extraction() {
        line.push_str(" (text shown inline)");
    }
    line
}

/// Prints only what changed since the previous view.
#[derive(Default)]
pub struct Renderer {
    rows: HashMap<String, (Option<StatusTag>, String)>,
    last_add: Option<AddStats>,
    status: Option<String>,
}

impl Renderer {
    pub fn render(&mut self, view: &AppViewModel) {
        if view.last_add != self.last_add {
            if let Some(stats) = view.last_add {
                println!("{}", add_line(stats));
            }
            self.last_add = view.last_add;
        }

        for row in &view.items {
            let key = (row.status, row.message.clone());
            if self.rows.get(&row.name) == Some(&key) {
                continue;
            }
            if row.status.is_some() {
                println!("{}", row_line(row));
                if let Some(text) = &row.extracted_text {
                    for line in text.lines() {
                        println!("    | {line}");
                    }
                }
            }
            self.rows.insert(row.name.clone(), key);
        }

        if view.status_message != self.status {
            if let Some(message) = &view.status_message {
                match view.status_severity {
                    Severity::Error => eprintln!("{message}"),
                    Severity::Info | Severity::Success => println!("{message}"),
                }
            }
            self.status = view.status_message.clone();
        }
    }
}

fn add_line(stats: AddStats) -> String {
    if stats.skipped == 0 {
        format!("Added {} file(s)", stats.added)
    } else {
        format!(
            "Added {} file(s), skipped {} duplicate(s)",
            stats.added, stats.skipped
        )
    }
}

fn row_line(row: &ItemRowView) -> String {
    let mut line = format!(
        "[{:<9}] {} ({}) {}",
        status_label(row.status),
        row.name,
        format_size(row.size),
        row.message
    );
    if let Some(location) = &row.artifact_ref {
        line.push_str(" -> ");
        line.push_str(location);
    }
    line
}

fn status_label(status: Option<StatusTag>) -> &'static str {
    match status {
        None => "",
        Some(StatusTag::Pending) => "pending",
        Some(StatusTag::InProgress) => "working",
        Some(StatusTag::Succeeded) => "done",
        Some(StatusTag::Failed) => "failed",
    }
}

pub(crate) fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
