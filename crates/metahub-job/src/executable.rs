use std::sync::Arc;

use serde::{Deserialize, Serialize};

use metahub_catalog::Catalog;

/// Outcome of one executable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecuteResult {
    Succeed(String),
    Error(String),
}

impl ExecuteResult {
    pub fn succeed() -> Self {
        Self::Succeed("succeed".into())
    }

    pub fn is_succeed(&self) -> bool {
        matches!(self, Self::Succeed(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Succeed(m) | Self::Error(m) => m,
        }
    }
}

/// Everything a step can reach while it runs.
#[derive(Clone, Debug)]
pub struct ExecutableContext {
    pub catalog: Arc<Catalog>,
}

impl ExecutableContext {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

/// A unit of job work.
///
/// Steps read and write metadata only through the catalog, so their commits
/// are versioned and announced like any other mutation.
pub trait Executable: Send + Sync {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn execute(&self, ctx: &ExecutableContext) -> ExecuteResult;
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
