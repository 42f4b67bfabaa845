use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::executable::{new_id, Executable, ExecutableContext, ExecuteResult};

/// What happened to one step of a chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step_id: String,
    pub step_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub result: ExecuteResult,
}

/// The outcome of running a whole chain.
#[derive(Clone, Debug)]
pub struct ChainReport {
    pub result: ExecuteResult,
    /// Records of the steps that ran, in order.
    pub steps: Vec<StepRecord>,
    pub elapsed: Duration,
}

/// Runs its tasks in order and stops at the first error.
///
/// A chain is itself an [`Executable`], so chains nest.
pub struct ChainedExecutable {
    id: String,
    name: String,
    tasks: Vec<Box<dyn Executable>>,
    last_report: Mutex<Vec<StepRecord>>,
}

impl ChainedExecutable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            tasks: Vec::new(),
            last_report: Mutex::new(Vec::new()),
        }
    }

    /// Append a task to the end of the chain.
    pub fn add_task(&mut self, task: Box<dyn Executable>) {
        self.tasks.push(task);
    }

    pub fn tasks(&self) -> &[Box<dyn Executable>] {
        &self.tasks
    }

    /// Step records of the most recent run.
    pub fn step_records(&self) -> Vec<StepRecord> {
        self.last_report.lock().expect("job lock poisoned").clone()
    }

    pub fn run(&self, ctx: &ExecutableContext) -> ChainReport {
        let chain_start = Instant::now();
        let mut steps = Vec::with_capacity(self.tasks.len());
        let mut result = ExecuteResult::succeed();

        for task in &self.tasks {
            let started_at = Utc::now();
            let step_result = task.execute(ctx);
            let record = StepRecord {
                step_id: task.id().to_string(),
                step_name: task.name().to_string(),
                started_at,
                finished_at: Utc::now(),
                result: step_result.clone(),
            };
            steps.push(record);

            if let ExecuteResult::Error(message) = step_result {
                error!(job = %self.name, step = task.name(), %message, "job step failed");
                result = ExecuteResult::Error(format!("{}: {message}", task.name()));
                break;
            }
            info!(job = %self.name, step = task.name(), "job step succeeded");
        }

        *self.last_report.lock().expect("job lock poisoned") = steps.clone();
        ChainReport {
            result,
            steps,
            elapsed: chain_start.elapsed(),
        }
    }
}

impl Executable for ChainedExecutable {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, ctx: &ExecutableContext) -> ExecuteResult {
        self.run(ctx).result
    }
}

impl std::fmt::Debug for ChainedExecutable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainedExecutable")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}
