use thiserror::Error;

/// Errors produced while decoding metahub types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("unknown event kind: {0}")]
    UnknownEventKind(String),

    #[error("invalid peer address: {0}")]
    InvalidPeer(String),
}
