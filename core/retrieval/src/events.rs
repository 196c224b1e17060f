use async_trait::async_trait;
use memory_augment_schemas::{EventCategory, RetrievalSource, Snippet};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::adapter::RetrievalAdapter;
use crate::config::{RetryPolicy, ServiceConfig};
use crate::error::RetrievalError;
use crate::http::RetryingClient;
use crate::normalize::{items, score_field, str_field};

const SEARCH_PATH: &str = "/events/search";

/// Structured news / event dataset search.
pub struct EventDataAdapter {
    http: RetryingClient,
}

impl EventDataAdapter {
    pub fn new(config: ServiceConfig, policy: RetryPolicy) -> Result<Self, RetrievalError> {
        Ok(Self {
            http: RetryingClient::new("event-data", config, policy)?,
        })
    }
}

#[async_trait]
impl RetrievalAdapter for EventDataAdapter {
    fn source(&self) -> RetrievalSource {
        RetrievalSource::EventData
    }

    async fn fetch(
        &self,
        query: &str,
        category: Option<EventCategory>,
        limit: usize,
    ) -> Result<Vec<Snippet>, RetrievalError> {
        let url = self.http.config().endpoint(SEARCH_PATH);
        let category_hint = category.map(|c| c.as_str()).unwrap_or("");
        let body = json!({
            "query": query,
            "category_hint": category_hint,
            "limit": limit,
        });

        debug!("Event-data search: category_hint={:?}", category_hint);
        let response = self.http.send_json(|c| c.post(&url).json(&body)).await?;

        let snippets = normalize_event_rows(&response, limit);
        info!(
            "Event data returned {} snippets for category {:?}",
            snippets.len(),
            category_hint
        );
        Ok(snippets)
    }
}

/// Map result rows to snippets. Rows without a title fall back to the
/// body, and rows with neither are dropped.
pub fn normalize_event_rows(response: &Value, limit: usize) -> Vec<Snippet> {
    items(response, &["rows", "results", "events", "articles"])
        .into_iter()
        .filter_map(|row| {
            let title = str_field(row, &["title", "headline", "event_title", "name"]);
            let body = str_field(row, &["summary", "description", "body", "snippet", "content"]);
            let (title, body) = match (title, body) {
                (Some(title), Some(body)) => (title, body),
                (Some(only), None) | (None, Some(only)) => (only.clone(), only),
                (None, None) => return None,
            };

            Some(Snippet {
                title,
                body,
                source_url: str_field(row, &["url", "source_url", "link"]),
                score: score_field(row, &["score", "relevance"]),
            })
        })
        .take(limit)
        .collect()
}
