use chrono::{DateTime, Utc};
use memory_augment_schemas::{BlockLabel, Snippet};
use regex::Regex;

/// Timestamp layout of an entry header.
pub const ENTRY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Blank line between entries.
pub const ENTRY_SEPARATOR: &str = "\n\n";

/// Renders snippets as timestamped block entries and splits block values
/// back into entries.
///
/// An entry looks like:
///
/// ```text
/// [2025-01-31 09:15 UTC] arxiv | Attention Is All You Need
/// Authors: Vaswani, Shazeer, Parmar et al. | Published: 2017-06-12
/// The dominant sequence transduction models ...
/// Source: https://arxiv.org/abs/1706.03762
/// ```
pub struct EntryTemplate {
    header: Regex,
}

impl Default for EntryTemplate {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryTemplate {
    pub fn new() -> Self {
        Self {
            header: Regex::new(r"(?m)^\[\d{4}-\d{2}-\d{2} \d{2}:\d{2} UTC\] ").unwrap(),
        }
    }

    pub fn format_entry(&self, label: &BlockLabel, snippet: &Snippet, at: DateTime<Utc>) -> String {
        let mut lines = vec![format!(
            "[{}] {} | {}",
            at.format(ENTRY_TIMESTAMP_FORMAT),
            label,
            snippet.title.trim()
        )];

        let body = snippet.body.trim();
        if !body.is_empty() && body != snippet.title.trim() {
            lines.push(body.to_string());
        }

        if let Some(ref url) = snippet.source_url {
            lines.push(format!("Source: {}", url));
        }

        lines.join("\n")
    }

    /// Entries of a block value, newest first as stored. Text before the
    /// first header (content written by something other than this
    /// template) counts as one entry.
    pub fn split_entries(&self, value: &str) -> Vec<String> {
        let starts: Vec<usize> = self.header.find_iter(value).map(|m| m.start()).collect();

        let mut bounds = Vec::with_capacity(starts.len() + 1);
        if starts.first() != Some(&0) {
            bounds.push(0);
        }
        bounds.extend(starts);

        bounds
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = bounds.get(i + 1).copied().unwrap_or(value.len());
                value[start..end].trim().to_string()
            })
            .filter(|entry| !entry.is_empty())
            .collect()
    }

    /// Entry text without its timestamp, used for duplicate checks so the
    /// same content written at different times compares equal.
    pub fn entry_content<'a>(&self, entry: &'a str) -> &'a str {
        match self.header.find(entry) {
            Some(m) if m.start() == 0 => &entry[m.end()..],
            _ => entry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 31, 9, 15, 42).unwrap()
    }

    #[test]
    fn test_format_entry() {
        let template = EntryTemplate::new();
        let snippet = Snippet {
            title: "Attention Is All You Need".to_string(),
            body: "Transformers replace recurrence.".to_string(),
            source_url: Some("https://arxiv.org/abs/1706.03762".to_string()),
            score: Some(0.9),
        };

        let entry = template.format_entry(&BlockLabel::new("arxiv"), &snippet, at());
        assert_eq!(
            entry,
            "[2025-01-31 09:15 UTC] arxiv | Attention Is All You Need\n\
             Transformers replace recurrence.\n\
             Source: https://arxiv.org/abs/1706.03762"
        );
    }

    #[test]
    fn test_format_entry_skips_body_equal_to_title() {
        let template = EntryTemplate::new();
        let snippet = Snippet::new("Ada Lovelace", "Ada Lovelace");
        let entry = template.format_entry(&BlockLabel::new("graphiti_context"), &snippet, at());
        assert_eq!(entry, "[2025-01-31 09:15 UTC] graphiti_context | Ada Lovelace");
    }

    #[test]
    fn test_split_entries() {
        let template = EntryTemplate::new();
        let value = "[2025-01-31 09:15 UTC] arxiv | B\nbody b\n\n\
                     [2025-01-30 08:00 UTC] arxiv | A\nbody a";

        let entries = template.split_entries(value);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].ends_with("body b"));
        assert!(entries[1].starts_with("[2025-01-30"));
    }

    #[test]
    fn test_split_entries_keeps_leading_free_text() {
        let template = EntryTemplate::new();
        let value = "Notes written by hand\n\n[2025-01-30 08:00 UTC] arxiv | A\nbody a";

        let entries = template.split_entries(value);
        assert_eq!(entries, vec![
            "Notes written by hand".to_string(),
            "[2025-01-30 08:00 UTC] arxiv | A\nbody a".to_string(),
        ]);
        assert!(template.split_entries("   ").is_empty());
    }

    #[test]
    fn test_entry_content_strips_timestamp() {
        let template = EntryTemplate::new();
        assert_eq!(
            template.entry_content("[2025-01-30 08:00 UTC] arxiv | A\nbody a"),
            "arxiv | A\nbody a"
        );
        assert_eq!(template.entry_content("free text"), "free text");
    }
}
