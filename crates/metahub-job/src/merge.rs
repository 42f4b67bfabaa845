use tracing::{error, info};

use metahub_cache::CubeInstance;

use crate::error::{JobError, JobResult};
use crate::executable::{new_id, Executable, ExecutableContext, ExecuteResult};

/// Finalizes a segment merge in cube metadata.
///
/// The new segment already exists in the cube. It inherits the dictionary
/// and snapshot resource paths of the first merging segment, the merging
/// segments are removed, and the cube is committed through
/// [`metahub_catalog::Catalog::update_cube`], which announces the change.
#[derive(Clone, Debug)]
pub struct MergeSegmentsStep {
    id: String,
    cube_name: String,
    segment_id: String,
    merging_segment_ids: Vec<String>,
}

impl MergeSegmentsStep {
    pub fn new(
        cube_name: impl Into<String>,
        segment_id: impl Into<String>,
        merging_segment_ids: Vec<String>,
    ) -> Self {
        Self {
            id: new_id(),
            cube_name: cube_name.into(),
            segment_id: segment_id.into(),
            merging_segment_ids,
        }
    }

    fn merge(&self, ctx: &ExecutableContext) -> JobResult<()> {
        if self.merging_segment_ids.is_empty() {
            return Err(JobError::Invalid("no merging segments given".into()));
        }
        if self.merging_segment_ids.contains(&self.segment_id) {
            return Err(JobError::Invalid(format!(
                "segment {} cannot merge into itself",
                self.segment_id
            )));
        }

        let mut cube: CubeInstance = ctx
            .catalog
            .load(&self.cube_name)?
            .ok_or_else(|| JobError::CubeNotFound(self.cube_name.clone()))?;

        for id in &self.merging_segment_ids {
            if cube.segment_by_id(id).is_none() {
                return Err(self.segment_missing(id));
            }
        }
        let first = cube
            .segment_by_id(&self.merging_segment_ids[0])
            .cloned()
            .ok_or_else(|| self.segment_missing(&self.merging_segment_ids[0]))?;

        let target = cube
            .segment_by_id_mut(&self.segment_id)
            .ok_or_else(|| self.segment_missing(&self.segment_id))?;
        target.dictionaries.extend(first.dictionaries);
        target.snapshots.extend(first.snapshots);

        let removed = cube.remove_segments(&self.merging_segment_ids);
        ctx.catalog.update_cube(&mut cube)?;
        info!(cube = %self.cube_name, segment = %self.segment_id, removed, "segments merged");
        Ok(())
    }

    fn segment_missing(&self, segment: &str) -> JobError {
        JobError::SegmentNotFound {
            cube: self.cube_name.clone(),
            segment: segment.to_string(),
        }
    }
}

impl Executable for MergeSegmentsStep {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "merge segments"
    }

    fn execute(&self, ctx: &ExecutableContext) -> ExecuteResult {
        match self.merge(ctx) {
            Ok(()) => ExecuteResult::succeed(),
            Err(e) => {
                error!(cube = %self.cube_name, error = %e, "failed to merge segment metadata");
                ExecuteResult::Error(e.to_string())
            }
        }
    }
}
