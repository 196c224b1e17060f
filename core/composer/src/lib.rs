pub mod assembler;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod server;
pub mod similarity;
pub mod templates;

pub use assembler::{assemble, ContextAssembler, TRUNCATION_MARKER};
pub use config::AugmentConfig;
pub use error::{AssemblyError, AugmentError, ConfigError};
pub use pipeline::AugmentPipeline;
pub use server::{router, AppState};
pub use similarity::{char_overlap, is_similar};
pub use templates::EntryTemplate;
