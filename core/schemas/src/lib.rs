use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ULID and ID Types
// ============================================================================

/// Identifier assigned to a memory block by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub String);

/// Opaque per-agent / per-conversation identifier that scopes block lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentScope(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AgentScope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Retrieval Sources and Block Labels
// ============================================================================

pub const GRAPH_CONTEXT_LABEL: &str = "graphiti_context";
pub const EVENT_DATA_LABEL: &str = "bigquery";
pub const PAPER_INDEX_LABEL: &str = "arxiv";

/// The external retrieval integrations a message can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetrievalSource {
    #[serde(rename = "knowledge_graph")]
    KnowledgeGraph,
    #[serde(rename = "event_data")]
    EventData,
    #[serde(rename = "paper_index")]
    PaperIndex,
}

impl RetrievalSource {
    pub const ALL: [RetrievalSource; 3] = [
        RetrievalSource::KnowledgeGraph,
        RetrievalSource::EventData,
        RetrievalSource::PaperIndex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalSource::KnowledgeGraph => "knowledge_graph",
            RetrievalSource::EventData => "event_data",
            RetrievalSource::PaperIndex => "paper_index",
        }
    }

    /// Each source owns exactly one block label per agent.
    pub fn block_label(&self) -> BlockLabel {
        let label = match self {
            RetrievalSource::KnowledgeGraph => GRAPH_CONTEXT_LABEL,
            RetrievalSource::EventData => EVENT_DATA_LABEL,
            RetrievalSource::PaperIndex => PAPER_INDEX_LABEL,
        };
        BlockLabel(label.to_string())
    }
}

impl fmt::Display for RetrievalSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identifier of a memory block within an agent's memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockLabel(pub String);

impl BlockLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Trigger Decisions
// ============================================================================

/// Refinement of an event-data trigger, used to shape the downstream query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    #[serde(rename = "global_news")]
    GlobalNews,
    #[serde(rename = "crisis_events")]
    CrisisEvents,
    #[serde(rename = "general_news")]
    GeneralNews,
    #[serde(rename = "global_events")]
    GlobalEvents,
    #[serde(rename = "economic_events")]
    EconomicEvents,
    #[serde(rename = "general_events")]
    GeneralEvents,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::GlobalNews => "global_news",
            EventCategory::CrisisEvents => "crisis_events",
            EventCategory::GeneralNews => "general_news",
            EventCategory::GlobalEvents => "global_events",
            EventCategory::EconomicEvents => "economic_events",
            EventCategory::GeneralEvents => "general_events",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one classifier for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDecision {
    pub triggered: bool,
    pub category: Option<EventCategory>,
}

impl TriggerDecision {
    pub fn not_triggered() -> Self {
        Self {
            triggered: false,
            category: None,
        }
    }

    pub fn triggered() -> Self {
        Self {
            triggered: true,
            category: None,
        }
    }

    pub fn with_category(category: EventCategory) -> Self {
        Self {
            triggered: true,
            category: Some(category),
        }
    }

    /// Category as a query hint; empty when no category applies.
    pub fn category_label(&self) -> &'static str {
        self.category.map(|c| c.as_str()).unwrap_or("")
    }
}

// ============================================================================
// Snippets and Memory Blocks
// ============================================================================

/// One normalized retrieval result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub title: String,
    pub body: String,
    pub source_url: Option<String>,
    pub score: Option<f32>,
}

impl Snippet {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            source_url: None,
            score: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBlock {
    pub label: BlockLabel,
    pub value: String,
    pub id: Option<BlockId>,
}

impl MemoryBlock {
    pub fn new(label: BlockLabel, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            id: None,
        }
    }

    /// Length in characters, the unit block limits are expressed in.
    pub fn char_len(&self) -> usize {
        self.value.chars().count()
    }
}

// ============================================================================
// Inbound Webhook Payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "tool")]
    Tool,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPart {
    pub r#type: String,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter(|p| p.r#type == "text")
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeMessage {
    pub role: MessageRole,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectMessage {
    pub agent_id: AgentScope,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEnvelope {
    pub agent_id: AgentScope,
    pub messages: Vec<EnvelopeMessage>,
}

/// Body accepted by the webhook receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WebhookPayload {
    Direct(DirectMessage),
    Envelope(ChatEnvelope),
}

impl WebhookPayload {
    pub fn scope(&self) -> &AgentScope {
        match self {
            WebhookPayload::Direct(direct) => &direct.agent_id,
            WebhookPayload::Envelope(envelope) => &envelope.agent_id,
        }
    }

    /// The user utterance to classify; for envelopes, the last user message.
    pub fn user_text(&self) -> Option<String> {
        match self {
            WebhookPayload::Direct(direct) => Some(direct.message.clone()),
            WebhookPayload::Envelope(envelope) => envelope
                .messages
                .iter()
                .rev()
                .find(|m| m.role == MessageRole::User)
                .map(|m| m.content.text()),
        }
    }
}

// ============================================================================
// Pipeline Results
// ============================================================================

/// Per-category progress through one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryStage {
    #[serde(rename = "not_triggered")]
    NotTriggered,
    #[serde(rename = "triggered")]
    Triggered,
    #[serde(rename = "retrieving")]
    Retrieving,
    #[serde(rename = "assembling")]
    Assembling,
    #[serde(rename = "done")]
    Done,
}

impl CategoryStage {
    /// Next stage on the success path. A failed retrieval jumps straight to
    /// `Done` via [`CategoryStage::finish`].
    pub fn advance(self) -> Self {
        match self {
            CategoryStage::NotTriggered => CategoryStage::Triggered,
            CategoryStage::Triggered => CategoryStage::Retrieving,
            CategoryStage::Retrieving => CategoryStage::Assembling,
            CategoryStage::Assembling | CategoryStage::Done => CategoryStage::Done,
        }
    }

    pub fn finish(self) -> Self {
        CategoryStage::Done
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryStage::NotTriggered => "not_triggered",
            CategoryStage::Triggered => "triggered",
            CategoryStage::Retrieving => "retrieving",
            CategoryStage::Assembling => "assembling",
            CategoryStage::Done => "done",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryOutcome {
    pub source: RetrievalSource,
    pub label: BlockLabel,
    pub triggered: bool,
    pub category: Option<EventCategory>,
    pub success: bool,
    pub snippet_count: usize,
    pub updated: bool,
    pub block_id: Option<BlockId>,
    pub reason: String,
    pub final_stage: CategoryStage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentReport {
    pub request_id: RequestId,
    pub agent_id: AgentScope,
    pub outcomes: Vec<CategoryOutcome>,
}

impl AugmentReport {
    pub fn outcome(&self, source: RetrievalSource) -> Option<&CategoryOutcome> {
        self.outcomes.iter().find(|o| o.source == source)
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub knowledge_graph: TriggerDecision,
    pub event_data: TriggerDecision,
    pub paper_index: TriggerDecision,
}

impl ClassificationReport {
    pub fn decision(&self, source: RetrievalSource) -> &TriggerDecision {
        match source {
            RetrievalSource::KnowledgeGraph => &self.knowledge_graph,
            RetrievalSource::EventData => &self.event_data,
            RetrievalSource::PaperIndex => &self.paper_index,
        }
    }
}

// ============================================================================
// ID Generation
// ============================================================================

pub fn generate_request_id() -> RequestId {
    RequestId(format!("req_{}", ulid::Ulid::new()))
}

pub fn generate_block_id() -> BlockId {
    BlockId(format!("block_{}", ulid::Ulid::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_have_distinct_labels() {
        let labels: std::collections::HashSet<_> = RetrievalSource::ALL
            .iter()
            .map(|s| s.block_label())
            .collect();
        assert_eq!(labels.len(), 3);
        assert_eq!(
            RetrievalSource::KnowledgeGraph.block_label().as_str(),
            "graphiti_context"
        );
    }

    #[test]
    fn test_direct_payload() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "agent_id": "agent-1",
            "message": "What is new in AI?"
        }))
        .unwrap();

        assert_eq!(payload.scope().0, "agent-1");
        assert_eq!(payload.user_text().as_deref(), Some("What is new in AI?"));
    }

    #[test]
    fn test_envelope_payload_uses_last_user_message() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "agent_id": "agent-2",
            "messages": [
                { "role": "user", "content": "first question" },
                { "role": "assistant", "content": "an answer" },
                { "role": "user", "content": [
                    { "type": "text", "text": "latest" },
                    { "type": "image", "text": null },
                    { "type": "text", "text": "question" }
                ]},
                { "role": "reasoning", "content": "internal" }
            ]
        }))
        .unwrap();

        assert_eq!(payload.user_text().as_deref(), Some("latest\nquestion"));
    }

    #[test]
    fn test_envelope_without_user_message() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "agent_id": "agent-3",
            "messages": [{ "role": "system", "content": "boot" }]
        }))
        .unwrap();

        assert!(payload.user_text().is_none());
    }

    #[test]
    fn test_stage_transitions() {
        let stage = CategoryStage::NotTriggered;
        assert_eq!(stage.advance(), CategoryStage::Triggered);
        assert_eq!(stage.advance().advance(), CategoryStage::Retrieving);
        assert_eq!(CategoryStage::Retrieving.finish(), CategoryStage::Done);
        assert_eq!(CategoryStage::Done.advance(), CategoryStage::Done);
    }

    #[test]
    fn test_category_label_empty_when_absent() {
        assert_eq!(TriggerDecision::not_triggered().category_label(), "");
        assert_eq!(
            TriggerDecision::with_category(EventCategory::GlobalNews).category_label(),
            "global_news"
        );
    }
}
