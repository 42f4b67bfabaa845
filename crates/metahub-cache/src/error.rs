use metahub_store::StoreError;
use metahub_types::EntityType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The stored entity does not carry the name it is stored under.
    #[error("{entity_type} resource {path} names {found:?}, expected {expected:?}")]
    NameMismatch {
        entity_type: EntityType,
        path: String,
        expected: String,
        found: String,
    },
}

pub type CacheResult<T> = Result<T, CacheError>;
