pub mod classifier;
pub mod keywords;

pub use classifier::{
    classifier_for, classify, classify_all, classify_event_data, classify_knowledge_graph,
    classify_paper_index, Classifier, CLASSIFIERS,
};
