use memory_augment_schemas::{ClassificationReport, EventCategory, RetrievalSource, TriggerDecision};
use tracing::debug;

use crate::keywords::{
    first_match, CRISIS_KEYWORDS, ECONOMIC_KEYWORDS, EVENT_TRIGGER_PHRASES, GLOBAL_KEYWORDS,
    NEWS_KEYWORDS, PAPER_KEYWORDS, PAPER_TRIGGER_PHRASES,
};

/// A trigger classifier: total over all inputs, no side effects beyond logging.
pub type Classifier = fn(&str) -> TriggerDecision;

/// One classifier per retrieval source.
pub const CLASSIFIERS: [(RetrievalSource, Classifier); 3] = [
    (RetrievalSource::KnowledgeGraph, classify_knowledge_graph),
    (RetrievalSource::EventData, classify_event_data),
    (RetrievalSource::PaperIndex, classify_paper_index),
];

pub fn classifier_for(source: RetrievalSource) -> Classifier {
    match source {
        RetrievalSource::KnowledgeGraph => classify_knowledge_graph,
        RetrievalSource::EventData => classify_event_data,
        RetrievalSource::PaperIndex => classify_paper_index,
    }
}

pub fn classify(source: RetrievalSource, message: &str) -> TriggerDecision {
    classifier_for(source)(message)
}

/// Run every classifier against one message.
pub fn classify_all(message: &str) -> ClassificationReport {
    ClassificationReport {
        knowledge_graph: classify_knowledge_graph(message),
        event_data: classify_event_data(message),
        paper_index: classify_paper_index(message),
    }
}

/// Lowercased message, or `None` for empty / whitespace-only input.
fn normalize(message: &str) -> Option<String> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Every non-empty message is looked up against the knowledge graph so the
/// agent always has entity and relationship context. This is not keyword
/// gated.
pub fn classify_knowledge_graph(message: &str) -> TriggerDecision {
    match normalize(message) {
        Some(_) => TriggerDecision::triggered(),
        None => TriggerDecision::not_triggered(),
    }
}

/// Route a message to the event-data search, picking the category that
/// shapes the query. Priority:
///
/// 1. news + global -> `global_news`
/// 2. news + crisis -> `crisis_events`
/// 3. news -> `general_news`
/// 4. global -> `global_events`
/// 5. crisis -> `crisis_events`
/// 6. economic -> `economic_events`
/// 7. fixed trigger phrase -> `general_events`
pub fn classify_event_data(message: &str) -> TriggerDecision {
    let Some(lowered) = normalize(message) else {
        return TriggerDecision::not_triggered();
    };

    let news = first_match(&lowered, NEWS_KEYWORDS);
    let global = first_match(&lowered, GLOBAL_KEYWORDS);
    let crisis = first_match(&lowered, CRISIS_KEYWORDS);

    let category = match (news, global, crisis) {
        (Some(_), Some(_), _) => Some(EventCategory::GlobalNews),
        (Some(_), None, Some(_)) => Some(EventCategory::CrisisEvents),
        (Some(_), None, None) => Some(EventCategory::GeneralNews),
        (None, Some(_), _) => Some(EventCategory::GlobalEvents),
        (None, None, Some(_)) => Some(EventCategory::CrisisEvents),
        (None, None, None) => {
            if first_match(&lowered, ECONOMIC_KEYWORDS).is_some() {
                Some(EventCategory::EconomicEvents)
            } else if first_match(&lowered, EVENT_TRIGGER_PHRASES).is_some() {
                Some(EventCategory::GeneralEvents)
            } else {
                None
            }
        }
    };

    match category {
        Some(category) => {
            debug!(
                "Event-data trigger: category={}, news={:?}, global={:?}, crisis={:?}",
                category, news, global, crisis
            );
            TriggerDecision::with_category(category)
        }
        None => TriggerDecision::not_triggered(),
    }
}

/// Route a message to the paper index. No category: the query is the
/// message itself.
pub fn classify_paper_index(message: &str) -> TriggerDecision {
    let Some(lowered) = normalize(message) else {
        return TriggerDecision::not_triggered();
    };

    let matched = first_match(&lowered, PAPER_KEYWORDS)
        .or_else(|| first_match(&lowered, PAPER_TRIGGER_PHRASES));

    match matched {
        Some(keyword) => {
            debug!("Paper-index trigger on '{}'", keyword);
            TriggerDecision::triggered()
        }
        None => TriggerDecision::not_triggered(),
    }
}
