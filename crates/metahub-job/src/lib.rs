//! Job steps for metahub.
//!
//! Build and merge jobs run as ordered chains of [`Executable`] steps. A
//! step reports [`ExecuteResult::Succeed`] or [`ExecuteResult::Error`]; a
//! [`ChainedExecutable`] stops at the first error. Steps touch metadata only
//! through the catalog, so their writes are compare-and-swap guarded and
//! announced to peers like any other mutation.

pub mod chained;
pub mod error;
pub mod executable;
pub mod merge;

#[cfg(test)]
mod test_support;

pub use chained::{ChainReport, ChainedExecutable, StepRecord};
pub use error::{JobError, JobResult};
pub use executable::{Executable, ExecutableContext, ExecuteResult};
pub use merge::MergeSegmentsStep;
