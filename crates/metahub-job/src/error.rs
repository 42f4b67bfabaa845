use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("catalog error: {0}")]
    Catalog(#[from] metahub_catalog::CatalogError),

    #[error("cube {0} not found")]
    CubeNotFound(String),

    #[error("segment {segment} not found in cube {cube}")]
    SegmentNotFound { cube: String, segment: String },

    #[error("invalid job: {0}")]
    Invalid(String),
}

pub type JobResult<T> = Result<T, JobError>;
