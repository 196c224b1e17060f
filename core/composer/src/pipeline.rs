use memory_augment_retrieval::{
    BlockStore, EventDataAdapter, HttpBlockStore, KnowledgeGraphAdapter, PaperIndexAdapter,
    RetrievalAdapter, StoredBlock,
};
use memory_augment_schemas::{
    generate_request_id, AgentScope, AugmentReport, BlockId, BlockLabel, CategoryOutcome,
    CategoryStage, MemoryBlock, RetrievalSource, TriggerDecision, WebhookPayload,
};
use memory_augment_triggers::classify_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::assembler::ContextAssembler;
use crate::config::AugmentConfig;
use crate::error::{AssemblyError, AugmentError};

/// Classify -> retrieve (concurrently per source) -> assemble -> persist.
pub struct AugmentPipeline {
    adapters: HashMap<RetrievalSource, Box<dyn RetrievalAdapter>>,
    store: Arc<dyn BlockStore>,
    assembler: ContextAssembler,
    max_block_length: usize,
    result_limit: usize,
}

impl AugmentPipeline {
    pub fn new(
        adapters: Vec<Box<dyn RetrievalAdapter>>,
        store: Arc<dyn BlockStore>,
        max_block_length: usize,
        result_limit: usize,
    ) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.source(), adapter))
            .collect();

        Self {
            adapters,
            store,
            assembler: ContextAssembler::new(),
            max_block_length,
            result_limit,
        }
    }

    /// HTTP adapters and store for every collaborator in `config`.
    pub fn from_config(config: &AugmentConfig) -> Result<Self, AugmentError> {
        let adapters: Vec<Box<dyn RetrievalAdapter>> = vec![
            Box::new(KnowledgeGraphAdapter::new(
                config.graph.clone(),
                config.retry.clone(),
                config.group_filter.clone(),
            )?),
            Box::new(EventDataAdapter::new(
                config.events.clone(),
                config.retry.clone(),
            )?),
            Box::new(PaperIndexAdapter::new(
                config.papers.clone(),
                config.retry.clone(),
            )?),
        ];
        let store = HttpBlockStore::new(
            config.store.clone(),
            config.retry.clone(),
            config.max_block_length,
        )?;

        Ok(Self::new(
            adapters,
            Arc::new(store),
            config.max_block_length,
            config.result_limit,
        ))
    }

    /// Run a webhook payload. A payload without user text produces a
    /// report in which nothing triggered.
    pub async fn process_payload(&self, payload: &WebhookPayload) -> AugmentReport {
        match payload.user_text() {
            Some(text) => self.process(payload.scope(), &text).await,
            None => {
                warn!("Payload for agent {} has no user message", payload.scope());
                self.process(payload.scope(), "").await
            }
        }
    }

    /// Process one message. Never fails: every category reports its own
    /// success flag and reason, and one category's failure does not
    /// affect another's.
    ///
    /// Retrieval and block lookup run concurrently per category. Block ids
    /// found by the lookups are claimed in source order before anything is
    /// written, so a category whose lookup returned another category's block
    /// never writes to it.
    pub async fn process(&self, scope: &AgentScope, message: &str) -> AugmentReport {
        let request_id = generate_request_id();
        let decisions = classify_all(message);

        info!(
            "{}: agent={} graph={} events={}({}) papers={}",
            request_id,
            scope,
            decisions.knowledge_graph.triggered,
            decisions.event_data.triggered,
            decisions.event_data.category_label(),
            decisions.paper_index.triggered
        );

        let (graph, events, papers) = tokio::join!(
            self.prepare_category(
                RetrievalSource::KnowledgeGraph,
                &decisions.knowledge_graph,
                scope,
                message
            ),
            self.prepare_category(
                RetrievalSource::EventData,
                &decisions.event_data,
                scope,
                message
            ),
            self.prepare_category(
                RetrievalSource::PaperIndex,
                &decisions.paper_index,
                scope,
                message
            ),
        );

        let mut prepared = [graph, events, papers];
        let mut claims = BlockClaims::default();
        for category in prepared.iter_mut() {
            category.claim_existing(&mut claims);
        }

        let mut outcomes = Vec::with_capacity(prepared.len());
        for category in prepared {
            outcomes.push(self.persist(scope, category, &mut claims).await);
        }

        let report = AugmentReport {
            request_id,
            agent_id: scope.clone(),
            outcomes,
        };

        info!(
            "{}: done, {} of {} categories succeeded",
            report.request_id,
            report.outcomes.iter().filter(|o| o.success).count(),
            report.outcomes.len()
        );
        report
    }

    /// Classification, retrieval, lookup and assembly for one category.
    /// Nothing is written here.
    async fn prepare_category(
        &self,
        source: RetrievalSource,
        decision: &TriggerDecision,
        scope: &AgentScope,
        message: &str,
    ) -> PreparedCategory {
        let label = source.block_label();
        let mut outcome = CategoryOutcome {
            source,
            label: label.clone(),
            triggered: decision.triggered,
            category: decision.category,
            success: true,
            snippet_count: 0,
            updated: false,
            block_id: None,
            reason: String::new(),
            final_stage: CategoryStage::NotTriggered,
        };

        if !decision.triggered {
            outcome.reason = "not triggered".to_string();
            return PreparedCategory::finished(outcome);
        }

        let mut stage = CategoryStage::NotTriggered.advance();
        let Some(adapter) = self.adapters.get(&source) else {
            let err = AugmentError::MissingAdapter(source.to_string());
            return PreparedCategory::finished(fail(outcome, stage.finish(), err));
        };

        stage = stage.advance();
        debug!("{}: {}", source, stage.as_str());

        let snippets = match adapter
            .fetch(message, decision.category, self.result_limit)
            .await
        {
            Ok(snippets) => snippets,
            Err(e) => {
                warn!("{}: retrieval failed, continuing without it: {}", source, e);
                return PreparedCategory::finished(fail(outcome, stage.finish(), e.into()));
            }
        };
        outcome.snippet_count = snippets.len();

        stage = stage.advance();
        outcome.final_stage = stage;
        debug!("{}: {} with {} snippets", source, stage.as_str(), snippets.len());

        if snippets.is_empty() {
            outcome.reason = "no results".to_string();
            outcome.final_stage = stage.finish();
            return PreparedCategory::finished(outcome);
        }

        let recovered = match self.store.get_block(scope, &label).await {
            Ok(Some(stored)) => recover_existing(stored, &label),
            Ok(None) => Recovered::default(),
            Err(e) => {
                error!("{}: could not read block '{}': {}", source, label, e);
                return PreparedCategory::finished(fail(outcome, stage.finish(), e.into()));
            }
        };
        let issue = recovered.issue.map(AugmentError::from);
        let existing = recovered.block;

        let assembled = self.assembler.assemble(
            existing.as_ref(),
            &snippets,
            &label,
            self.max_block_length,
        );
        outcome.block_id = assembled.id.clone();

        if let Some(ref existing) = existing {
            if existing.value == assembled.value {
                outcome.reason = with_issue("content unchanged".to_string(), issue.as_ref());
                outcome.final_stage = stage.finish();
                return PreparedCategory::finished(outcome);
            }
        }

        PreparedCategory {
            outcome,
            write: Some(assembled),
            issue,
        }
    }

    /// Write a prepared block and claim the id storage reports for it.
    async fn persist(
        &self,
        scope: &AgentScope,
        prepared: PreparedCategory,
        claims: &mut BlockClaims,
    ) -> CategoryOutcome {
        let PreparedCategory {
            mut outcome,
            write,
            issue,
        } = prepared;
        let Some(block) = write else {
            return outcome;
        };

        let source = outcome.source;
        let stage = outcome.final_stage;
        let persisted = match block.id {
            Some(ref id) => self.store.update_block(scope, id, &block.value).await,
            None => self.store.create_block(scope, &block.label, &block.value).await,
        };

        let stored = match persisted {
            Ok(stored) => stored,
            Err(e) => {
                error!("{}: could not write block '{}': {}", source, block.label, e);
                return fail(outcome, stage.finish(), e.into());
            }
        };

        outcome.block_id = Some(stored.id.clone());
        if let Err(e) = claims.claim(&stored.id, &outcome.label) {
            error!("{}: storage returned a block already in use: {}", source, e);
            return fail(outcome, stage.finish(), e);
        }

        info!("{}: block '{}' ({}) updated", source, block.label, stored.id);
        outcome.updated = true;
        outcome.reason = with_issue(
            format!("stored {} snippets", outcome.snippet_count),
            issue.as_ref(),
        );
        outcome.final_stage = stage.finish();
        outcome
    }
}

/// A category after retrieval and assembly, before its block is written.
struct PreparedCategory {
    outcome: CategoryOutcome,
    /// Assembled block still to be persisted
    write: Option<MemoryBlock>,
    /// Recovered problem with the stored block, reported with the outcome
    issue: Option<AugmentError>,
}

impl PreparedCategory {
    fn finished(outcome: CategoryOutcome) -> Self {
        Self {
            outcome,
            write: None,
            issue: None,
        }
    }

    /// Claim the looked-up block id. On a collision the pending write is
    /// dropped and the category fails.
    fn claim_existing(&mut self, claims: &mut BlockClaims) {
        let Some(id) = self.outcome.block_id.clone() else {
            return;
        };

        if let Err(e) = claims.claim(&id, &self.outcome.label) {
            error!("{}: {}; not writing", self.outcome.source, e);
            self.write = None;
            let stage = self.outcome.final_stage.finish();
            mark_failed(&mut self.outcome, stage, e);
        }
    }
}

/// Block ids in use by this request, keyed to the label that claimed them
/// first.
#[derive(Debug, Default)]
struct BlockClaims {
    owners: HashMap<BlockId, BlockLabel>,
}

impl BlockClaims {
    /// Two labels must never share a block. Reclaiming an id for the same
    /// label is allowed.
    fn claim(&mut self, id: &BlockId, label: &BlockLabel) -> Result<(), AugmentError> {
        match self.owners.get(id) {
            Some(owner) if owner != label => Err(AugmentError::BlockCollision {
                label: label.clone(),
                other_label: owner.clone(),
                id: id.clone(),
            }),
            Some(_) => Ok(()),
            None => {
                self.owners.insert(id.clone(), label.clone());
                Ok(())
            }
        }
    }
}

fn fail(
    mut outcome: CategoryOutcome,
    stage: CategoryStage,
    error: AugmentError,
) -> CategoryOutcome {
    mark_failed(&mut outcome, stage, error);
    outcome
}

fn mark_failed(outcome: &mut CategoryOutcome, stage: CategoryStage, error: AugmentError) {
    outcome.success = false;
    outcome.updated = false;
    outcome.reason = error.to_string();
    outcome.final_stage = stage;
}

fn with_issue(reason: String, issue: Option<&AugmentError>) -> String {
    match issue {
        Some(issue) => format!("{} ({})", reason, issue),
        None => reason,
    }
}

/// A stored record turned into the block to assemble against, plus what
/// was wrong with it.
#[derive(Debug, Default)]
pub struct Recovered {
    pub block: Option<MemoryBlock>,
    pub issue: Option<AssemblyError>,
}

/// Turn a stored record into the block to assemble against.
///
/// A record with another label is discarded (assembling against it would
/// write this category's content into another category's block). A record
/// without a value is used with empty content.
pub fn recover_existing(stored: StoredBlock, requested: &BlockLabel) -> Recovered {
    if &stored.label != requested {
        let issue = AssemblyError::LabelMismatch {
            requested: requested.clone(),
            found: stored.label,
            id: stored.id,
        };
        warn!("{}; creating a new block instead", issue);
        return Recovered {
            block: None,
            issue: Some(issue),
        };
    }

    let (value, issue) = match stored.value {
        Some(value) => (value, None),
        None => {
            let issue = AssemblyError::MissingValue {
                label: stored.label.clone(),
            };
            warn!("{}; treating it as empty", issue);
            (String::new(), Some(issue))
        }
    };

    Recovered {
        block: Some(MemoryBlock {
            label: stored.label,
            value,
            id: Some(stored.id),
        }),
        issue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recover_existing_missing_value() {
        let label = BlockLabel::new("bigquery");
        let recovered = recover_existing(
            StoredBlock {
                id: BlockId("b1".to_string()),
                label: label.clone(),
                value: None,
            },
            &label,
        );

        let block = recovered.block.unwrap();
        assert_eq!(block.value, "");
        assert_eq!(block.id, Some(BlockId("b1".to_string())));
        assert!(matches!(
            recovered.issue,
            Some(AssemblyError::MissingValue { .. })
        ));
    }

    #[test]
    fn test_recover_existing_label_mismatch() {
        let recovered = recover_existing(
            StoredBlock {
                id: BlockId("b1".to_string()),
                label: BlockLabel::new("graphiti_context"),
                value: Some("graph facts".to_string()),
            },
            &BlockLabel::new("bigquery"),
        );
        assert!(recovered.block.is_none());
        assert!(matches!(
            recovered.issue,
            Some(AssemblyError::LabelMismatch { .. })
        ));
    }

    #[test]
    fn test_recover_existing_clean_record() {
        let label = BlockLabel::new("arxiv");
        let recovered = recover_existing(
            StoredBlock {
                id: BlockId("b2".to_string()),
                label: label.clone(),
                value: Some("papers".to_string()),
            },
            &label,
        );
        assert_eq!(recovered.block.unwrap().value, "papers");
        assert!(recovered.issue.is_none());
    }

    #[test]
    fn test_block_claims_reject_second_label() {
        let mut claims = BlockClaims::default();
        let shared = BlockId("shared".to_string());
        let graph = RetrievalSource::KnowledgeGraph.block_label();
        let events = RetrievalSource::EventData.block_label();

        assert!(claims.claim(&shared, &graph).is_ok());
        assert!(claims.claim(&shared, &graph).is_ok());

        let err = claims.claim(&shared, &events).unwrap_err();
        assert!(matches!(err, AugmentError::BlockCollision { .. }));
        assert!(err.to_string().contains("graphiti_context"));

        assert!(claims
            .claim(&BlockId("own".to_string()), &events)
            .is_ok());
    }

    #[test]
    fn test_colliding_claim_drops_pending_write() {
        let mut claims = BlockClaims::default();
        let shared = BlockId("shared".to_string());
        claims
            .claim(&shared, &RetrievalSource::KnowledgeGraph.block_label())
            .unwrap();

        let label = RetrievalSource::EventData.block_label();
        let mut prepared = PreparedCategory {
            outcome: CategoryOutcome {
                source: RetrievalSource::EventData,
                label: label.clone(),
                triggered: true,
                category: None,
                success: true,
                snippet_count: 1,
                updated: false,
                block_id: Some(shared.clone()),
                reason: String::new(),
                final_stage: CategoryStage::Assembling,
            },
            write: Some(MemoryBlock {
                label,
                value: "events".to_string(),
                id: Some(shared),
            }),
            issue: None,
        };

        prepared.claim_existing(&mut claims);

        assert!(prepared.write.is_none());
        assert!(!prepared.outcome.success);
        assert!(!prepared.outcome.updated);
        assert_eq!(prepared.outcome.final_stage, CategoryStage::Done);
    }

    #[test]
    fn test_with_issue_appends_recovered_problem() {
        let issue = AugmentError::from(AssemblyError::MissingValue {
            label: BlockLabel::new("arxiv"),
        });
        let reason = with_issue("stored 2 snippets".to_string(), Some(&issue));
        assert!(reason.starts_with("stored 2 snippets ("));
        assert!(reason.contains("has no value"));
        assert_eq!(with_issue("no results".to_string(), None), "no results");
    }
}
