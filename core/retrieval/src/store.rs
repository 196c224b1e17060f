//! Client for the agent memory-block storage collaborator.

use async_trait::async_trait;
use memory_augment_schemas::{generate_block_id, AgentScope, BlockId, BlockLabel};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{RetryPolicy, ServiceConfig};
use crate::error::{RetrievalError, StoreError};
use crate::http::RetryingClient;

/// A block as returned by storage. `value` is optional because stored
/// records are not guaranteed to carry one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlock {
    pub id: BlockId,
    pub label: BlockLabel,
    #[serde(default)]
    pub value: Option<String>,
}

/// Get-by-label and create/update-by-id over an agent's memory blocks.
#[async_trait]
pub trait BlockStore: Send + Sync {
    async fn get_block(
        &self,
        scope: &AgentScope,
        label: &BlockLabel,
    ) -> Result<Option<StoredBlock>, StoreError>;

    /// Create a block and attach it to the agent.
    async fn create_block(
        &self,
        scope: &AgentScope,
        label: &BlockLabel,
        value: &str,
    ) -> Result<StoredBlock, StoreError>;

    async fn update_block(
        &self,
        scope: &AgentScope,
        id: &BlockId,
        value: &str,
    ) -> Result<StoredBlock, StoreError>;
}

// ============================================================================
// HTTP store
// ============================================================================

pub struct HttpBlockStore {
    http: RetryingClient,
    block_limit: usize,
}

impl HttpBlockStore {
    /// `block_limit` is sent as the character limit of newly created blocks.
    pub fn new(
        config: ServiceConfig,
        policy: RetryPolicy,
        block_limit: usize,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            http: RetryingClient::new("memory-store", config, policy)?,
            block_limit,
        })
    }

    async fn discard(&self, id: &BlockId) {
        let url = self.http.config().endpoint(&format!("/v1/blocks/{}", id));
        match self.http.send(|c| c.delete(&url)).await {
            Ok(_) => debug!("Deleted unattached block {}", id),
            Err(e) => warn!("Could not delete unattached block {}: {}", id, e),
        }
    }

    fn decode(value: Value) -> Result<StoredBlock, StoreError> {
        serde_json::from_value(value).map_err(|e| StoreError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl BlockStore for HttpBlockStore {
    async fn get_block(
        &self,
        scope: &AgentScope,
        label: &BlockLabel,
    ) -> Result<Option<StoredBlock>, StoreError> {
        let url = self.http.config().endpoint(&format!(
            "/v1/agents/{}/core-memory/blocks/{}",
            scope, label
        ));

        match self.http.send_json(|c| c.get(&url)).await {
            Ok(value) => Ok(Some(Self::decode(value)?)),
            Err(RetrievalError::Status { status: 404, .. }) => {
                debug!("No block '{}' for agent {}", label, scope);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_block(
        &self,
        scope: &AgentScope,
        label: &BlockLabel,
        value: &str,
    ) -> Result<StoredBlock, StoreError> {
        let url = self.http.config().endpoint("/v1/blocks");
        let body = json!({
            "label": label,
            "value": value,
            "limit": self.block_limit,
        });
        let created = Self::decode(self.http.send_json(|c| c.post(&url).json(&body)).await?)?;

        let attach_url = self.http.config().endpoint(&format!(
            "/v1/agents/{}/core-memory/blocks/attach/{}",
            scope, created.id
        ));
        if let Err(e) = self.http.send(|c| c.patch(&attach_url)).await {
            // Unattached blocks are invisible to lookups by label.
            self.discard(&created.id).await;
            return Err(StoreError::AttachFailed {
                id: created.id.0,
                reason: e.to_string(),
            });
        }

        info!("Created block '{}' ({}) for agent {}", label, created.id, scope);
        Ok(created)
    }

    async fn update_block(
        &self,
        _scope: &AgentScope,
        id: &BlockId,
        value: &str,
    ) -> Result<StoredBlock, StoreError> {
        let url = self.http.config().endpoint(&format!("/v1/blocks/{}", id));
        let body = json!({ "value": value });

        match self.http.send_json(|c| c.patch(&url).json(&body)).await {
            Ok(updated) => Self::decode(updated),
            Err(RetrievalError::Status { status: 404, .. }) => {
                Err(StoreError::NotFound(id.0.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store for tests and offline runs.
#[derive(Default)]
pub struct InMemoryBlockStore {
    blocks: Mutex<HashMap<(AgentScope, BlockLabel), StoredBlock>>,
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record as-is, including ones with no value.
    pub async fn insert(&self, scope: &AgentScope, block: StoredBlock) {
        self.blocks
            .lock()
            .await
            .insert((scope.clone(), block.label.clone()), block);
    }

    pub async fn blocks_for(&self, scope: &AgentScope) -> Vec<StoredBlock> {
        let blocks = self.blocks.lock().await;
        let mut found: Vec<StoredBlock> = blocks
            .iter()
            .filter(|((s, _), _)| s == scope)
            .map(|(_, block)| block.clone())
            .collect();
        found.sort_by(|a, b| a.label.0.cmp(&b.label.0));
        found
    }
}

#[async_trait]
impl BlockStore for InMemoryBlockStore {
    async fn get_block(
        &self,
        scope: &AgentScope,
        label: &BlockLabel,
    ) -> Result<Option<StoredBlock>, StoreError> {
        Ok(self
            .blocks
            .lock()
            .await
            .get(&(scope.clone(), label.clone()))
            .cloned())
    }

    async fn create_block(
        &self,
        scope: &AgentScope,
        label: &BlockLabel,
        value: &str,
    ) -> Result<StoredBlock, StoreError> {
        let block = StoredBlock {
            id: generate_block_id(),
            label: label.clone(),
            value: Some(value.to_string()),
        };
        self.insert(scope, block.clone()).await;
        Ok(block)
    }

    async fn update_block(
        &self,
        scope: &AgentScope,
        id: &BlockId,
        value: &str,
    ) -> Result<StoredBlock, StoreError> {
        let mut blocks = self.blocks.lock().await;
        let block = blocks
            .iter_mut()
            .find(|((s, _), block)| s == scope && &block.id == id)
            .map(|(_, block)| block)
            .ok_or_else(|| StoreError::NotFound(id.0.clone()))?;

        block.value = Some(value.to_string());
        Ok(block.clone())
    }
}
