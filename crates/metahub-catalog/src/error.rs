use thiserror::Error;

use metahub_types::EntityType;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{entity_type} {name} already exists")]
    AlreadyExists { entity_type: EntityType, name: String },

    #[error("{entity_type} {name} not found")]
    NotFound { entity_type: EntityType, name: String },

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("store error: {0}")]
    Store(#[from] metahub_store::StoreError),
}

impl CatalogError {
    pub(crate) fn not_found(entity_type: EntityType, name: &str) -> Self {
        Self::NotFound {
            entity_type,
            name: name.to_string(),
        }
    }

    pub(crate) fn already_exists(entity_type: EntityType, name: &str) -> Self {
        Self::AlreadyExists {
            entity_type,
            name: name.to_string(),
        }
    }

    /// Returns `true` if a compare-and-swap write lost to a concurrent writer.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_conflict())
    }
}


pub type CatalogResult<T> = Result<T, CatalogError>;
