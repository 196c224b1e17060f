use thiserror::Error;

/// Failure of one call to a retrieval collaborator.
///
/// The pipeline never propagates these; a failed adapter contributes no
/// snippets and its category reports the error text.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("{service}: request timed out")]
    Timeout { service: String },

    #[error("{service}: transport error: {message}")]
    Transport { service: String, message: String },

    #[error("{service}: upstream returned HTTP {status}: {body}")]
    Status {
        service: String,
        status: u16,
        body: String,
    },

    #[error("{service}: could not decode response: {message}")]
    Decode { service: String, message: String },

    #[error("{service}: gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        service: String,
        attempts: u32,
        last: Box<RetrievalError>,
    },

    #[error("{service}: invalid configuration: {message}")]
    Config { service: String, message: String },
}

impl RetrievalError {
    /// Upstream HTTP status, looking through retry exhaustion.
    pub fn status(&self) -> Option<u16> {
        match self {
            RetrievalError::Status { status, .. } => Some(*status),
            RetrievalError::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            RetrievalError::Timeout { .. } => true,
            RetrievalError::RetriesExhausted { last, .. } => last.is_timeout(),
            _ => false,
        }
    }
}

/// Failure talking to the memory-storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Request(#[from] RetrievalError),

    #[error("block store returned a malformed block: {0}")]
    Malformed(String),

    #[error("block {0} not found")]
    NotFound(String),

    /// The block was created but could not be attached to the agent. It is
    /// deleted again before this is returned.
    #[error("block {id} could not be attached: {reason}")]
    AttachFailed { id: String, reason: String },
}
