use async_trait::async_trait;
use memory_augment_schemas::{EventCategory, RetrievalSource, Snippet};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::adapter::RetrievalAdapter;
use crate::config::{RetryPolicy, ServiceConfig};
use crate::error::RetrievalError;
use crate::http::RetryingClient;
use crate::normalize::{items, score_field, str_field};

const SEARCH_PATH: &str = "/search";
const MAX_TITLE_CHARS: usize = 80;

/// Knowledge-graph search over entities and facts.
pub struct KnowledgeGraphAdapter {
    http: RetryingClient,
    group_filter: Vec<String>,
}

impl KnowledgeGraphAdapter {
    pub fn new(
        config: ServiceConfig,
        policy: RetryPolicy,
        group_filter: Vec<String>,
    ) -> Result<Self, RetrievalError> {
        Ok(Self {
            http: RetryingClient::new("knowledge-graph", config, policy)?,
            group_filter,
        })
    }
}

#[async_trait]
impl RetrievalAdapter for KnowledgeGraphAdapter {
    fn source(&self) -> RetrievalSource {
        RetrievalSource::KnowledgeGraph
    }

    async fn fetch(
        &self,
        query: &str,
        _category: Option<EventCategory>,
        limit: usize,
    ) -> Result<Vec<Snippet>, RetrievalError> {
        let url = self.http.config().endpoint(SEARCH_PATH);
        let body = json!({
            "query": query,
            "max_results": limit,
            "group_filter": self.group_filter,
        });

        debug!("Knowledge-graph search: {}", url);
        let response = self.http.send_json(|c| c.post(&url).json(&body)).await?;

        let snippets = normalize_graph_results(&response, limit);
        info!("Knowledge graph returned {} snippets", snippets.len());
        Ok(snippets)
    }
}

/// Map node and fact objects to snippets.
///
/// Nodes carry `name` + `summary`; facts (edges) usually carry only a
/// `fact` sentence, which becomes the body with a shortened title.
pub fn normalize_graph_results(response: &Value, limit: usize) -> Vec<Snippet> {
    items(response, &["facts", "nodes", "results", "edges"])
        .into_iter()
        .filter_map(|item| {
            let body = str_field(item, &["summary", "fact", "content", "description"]);
            let title = str_field(item, &["name", "title"])
                .or_else(|| body.as_deref().map(short_title));
            let (title, body) = match (title, body) {
                (Some(title), Some(body)) => (title, body),
                (Some(title), None) => (title.clone(), title),
                _ => return None,
            };

            Some(Snippet {
                title,
                body,
                source_url: str_field(item, &["url", "source_url", "uuid"]),
                score: score_field(item, &["score", "relevance"]),
            })
        })
        .take(limit)
        .collect()
}

fn short_title(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or(text);
    match first_line.char_indices().nth(MAX_TITLE_CHARS) {
        Some((idx, _)) => format!("{}...", first_line[..idx].trim_end()),
        None => first_line.to_string(),
    }
}
