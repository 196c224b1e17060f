use async_trait::async_trait;
use memory_augment_schemas::{EventCategory, RetrievalSource, Snippet};

use crate::error::RetrievalError;

/// A retrieval integration that turns a message into snippets.
#[async_trait]
pub trait RetrievalAdapter: Send + Sync {
    fn source(&self) -> RetrievalSource;

    /// Look `query` up upstream and normalize at most `limit` results.
    async fn fetch(
        &self,
        query: &str,
        category: Option<EventCategory>,
        limit: usize,
    ) -> Result<Vec<Snippet>, RetrievalError>;
}
