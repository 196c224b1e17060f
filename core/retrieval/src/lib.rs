pub mod adapter;
pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod http;
pub mod normalize;
pub mod papers;
pub mod store;

pub use adapter::RetrievalAdapter;
pub use config::{RetryPolicy, ServiceConfig};
pub use error::{RetrievalError, StoreError};
pub use events::EventDataAdapter;
pub use graph::KnowledgeGraphAdapter;
pub use http::RetryingClient;
pub use papers::PaperIndexAdapter;
pub use store::{BlockStore, HttpBlockStore, InMemoryBlockStore, StoredBlock};
