use memory_augment_retrieval::{RetrievalError, StoreError};
use memory_augment_schemas::{BlockId, BlockLabel};
use thiserror::Error;

/// A stored block that cannot be used as-is. Recovered by treating the
/// existing content as empty.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("stored block '{label}' has no value")]
    MissingValue { label: BlockLabel },

    #[error("lookup for '{requested}' returned block {id} labelled '{found}'")]
    LabelMismatch {
        requested: BlockLabel,
        found: BlockLabel,
        id: BlockId,
    },
}

/// Per-category failure, reported in that category's outcome only.
#[derive(Debug, Error)]
pub enum AugmentError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    /// Recovered; reported next to a successful outcome.
    #[error("recovered unusable stored block: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("block storage failed: {0}")]
    Storage(#[from] StoreError),

    #[error("block {id} for '{label}' is already used by '{other_label}'")]
    BlockCollision {
        label: BlockLabel,
        other_label: BlockLabel,
        id: BlockId,
    },

    #[error("no adapter configured for {0}")]
    MissingAdapter(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{0} base URL is empty")]
    EmptyUrl(&'static str),
}
