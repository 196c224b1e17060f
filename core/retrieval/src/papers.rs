use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use memory_augment_schemas::{EventCategory, RetrievalSource, Snippet};
use serde_json::Value;
use tracing::{debug, info};

use crate::adapter::RetrievalAdapter;
use crate::config::{RetryPolicy, ServiceConfig};
use crate::error::RetrievalError;
use crate::http::RetryingClient;
use crate::normalize::{items, score_field, str_field, string_list};

const SEARCH_PATH: &str = "/search";
const MAX_LISTED_AUTHORS: usize = 3;

/// Academic paper index search.
pub struct PaperIndexAdapter {
    http: RetryingClient,
}

impl PaperIndexAdapter {
    pub fn new(config: ServiceConfig, policy: RetryPolicy) -> Result<Self, RetrievalError> {
        Ok(Self {
            http: RetryingClient::new("paper-index", config, policy)?,
        })
    }
}

#[async_trait]
impl RetrievalAdapter for PaperIndexAdapter {
    fn source(&self) -> RetrievalSource {
        RetrievalSource::PaperIndex
    }

    async fn fetch(
        &self,
        query: &str,
        _category: Option<EventCategory>,
        limit: usize,
    ) -> Result<Vec<Snippet>, RetrievalError> {
        let url = self.http.config().endpoint(SEARCH_PATH);
        let max_results = limit.to_string();

        debug!("Paper search: {}", url);
        let response = self
            .http
            .send_json(|c| {
                c.get(&url)
                    .query(&[("query", query), ("max_results", max_results.as_str())])
            })
            .await?;

        let snippets = normalize_papers(&response, limit);
        info!("Paper index returned {} snippets", snippets.len());
        Ok(snippets)
    }
}

/// Map paper metadata to snippets; authors and publication date are
/// folded into the body ahead of the abstract.
pub fn normalize_papers(response: &Value, limit: usize) -> Vec<Snippet> {
    items(response, &["papers", "results", "entries"])
        .into_iter()
        .filter_map(|paper| {
            let title = str_field(paper, &["title"])?;
            let abstract_text = str_field(paper, &["abstract", "summary"]);

            let mut meta = Vec::new();
            let authors = string_list(paper, "authors");
            if !authors.is_empty() {
                meta.push(format!("Authors: {}", format_authors(&authors)));
            }
            if let Some(published) = str_field(paper, &["published", "published_date", "date"]) {
                meta.push(format!("Published: {}", format_published(&published)));
            }

            let mut body = meta.join(" | ");
            if let Some(abstract_text) = abstract_text {
                if !body.is_empty() {
                    body.push('\n');
                }
                body.push_str(&collapse_whitespace(&abstract_text));
            }
            if body.is_empty() {
                body = title.clone();
            }

            Some(Snippet {
                title: collapse_whitespace(&title),
                body,
                source_url: str_field(paper, &["url", "pdf_url", "link", "id"]),
                score: score_field(paper, &["score", "relevance"]),
            })
        })
        .take(limit)
        .collect()
}

fn format_authors(authors: &[String]) -> String {
    if authors.len() > MAX_LISTED_AUTHORS {
        format!("{} et al.", authors[..MAX_LISTED_AUTHORS].join(", "))
    } else {
        authors.join(", ")
    }
}

/// Reduce RFC3339 timestamps to a date; anything else is kept verbatim.
fn format_published(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
