use chrono::{DateTime, Utc};
use memory_augment_schemas::{BlockLabel, MemoryBlock, Snippet};
use tracing::{debug, warn};

use crate::similarity::is_similar;
use crate::templates::{EntryTemplate, ENTRY_SEPARATOR};

/// Appended when older entries were dropped to respect the size bound.
pub const TRUNCATION_MARKER: &str = "\n[... older entries truncated ...]";

/// Builds and updates memory blocks from retrieval snippets.
pub struct ContextAssembler {
    template: EntryTemplate,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextAssembler {
    pub fn new() -> Self {
        Self {
            template: EntryTemplate::new(),
        }
    }

    pub fn template(&self) -> &EntryTemplate {
        &self.template
    }

    pub fn assemble(
        &self,
        existing: Option<&MemoryBlock>,
        new_snippets: &[Snippet],
        label: &BlockLabel,
        max_length: usize,
    ) -> MemoryBlock {
        self.assemble_at(existing, new_snippets, label, max_length, Utc::now())
    }

    /// Assemble with an explicit entry timestamp.
    ///
    /// The result always carries `label`. An existing block with a
    /// different label is ignored so its id can never be reused for this
    /// label.
    pub fn assemble_at(
        &self,
        existing: Option<&MemoryBlock>,
        new_snippets: &[Snippet],
        label: &BlockLabel,
        max_length: usize,
        at: DateTime<Utc>,
    ) -> MemoryBlock {
        let existing = match existing {
            Some(block) if &block.label != label => {
                warn!(
                    "Ignoring existing block {:?} labelled '{}' while assembling '{}'",
                    block.id, block.label, label
                );
                None
            }
            other => other,
        };

        let new_entries: Vec<String> = new_snippets
            .iter()
            .map(|snippet| self.template.format_entry(label, snippet, at))
            .collect();

        let Some(existing) = existing else {
            return MemoryBlock {
                label: label.clone(),
                value: truncate_entries(&new_entries, max_length),
                id: None,
            };
        };

        let unchanged = MemoryBlock {
            label: label.clone(),
            value: existing.value.clone(),
            id: existing.id.clone(),
        };

        let Some(newest) = new_entries.first() else {
            return unchanged;
        };

        let stored_entries = self
            .template
            .split_entries(existing.value.trim_end_matches(TRUNCATION_MARKER));

        if let Some(latest) = stored_entries.first() {
            if is_similar(
                self.template.entry_content(newest),
                self.template.entry_content(latest),
            ) {
                debug!("'{}': newest entry matches stored content, skipping", label);
                return unchanged;
            }
        }

        let mut entries = new_entries;
        entries.extend(stored_entries);

        MemoryBlock {
            label: label.clone(),
            value: truncate_entries(&entries, max_length),
            id: existing.id.clone(),
        }
    }
}

/// [`ContextAssembler::assemble`] with a default assembler.
pub fn assemble(
    existing_block: Option<&MemoryBlock>,
    new_snippets: &[Snippet],
    label: &BlockLabel,
    max_length: usize,
) -> MemoryBlock {
    ContextAssembler::new().assemble(existing_block, new_snippets, label, max_length)
}

/// Join entries (newest first) keeping as many whole entries as fit in
/// `max_length` characters. When anything is dropped the result ends with
/// [`TRUNCATION_MARKER`], so it is at most `max_length` plus the marker.
fn truncate_entries(entries: &[String], max_length: usize) -> String {
    let separator_len = ENTRY_SEPARATOR.chars().count();
    let mut kept: Vec<&str> = Vec::new();
    let mut used = 0usize;

    for entry in entries {
        let entry_len = entry.chars().count();
        let needed = if kept.is_empty() {
            entry_len
        } else {
            entry_len + separator_len
        };

        if used + needed > max_length {
            break;
        }

        kept.push(entry);
        used += needed;
    }

    if kept.len() == entries.len() {
        return kept.join(ENTRY_SEPARATOR);
    }

    if kept.is_empty() {
        // Even the newest entry is too long: keep its head.
        let head: String = entries[0].chars().take(max_length).collect();
        return format!("{}{}", head, TRUNCATION_MARKER);
    }

    format!("{}{}", kept.join(ENTRY_SEPARATOR), TRUNCATION_MARKER)
}
