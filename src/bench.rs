/*!
Corpus benchmarking: task partitioning across worker threads,
per-task deadlines, and deterministic result aggregation.
*/

use std::{fmt::Display, time::Duration};

use crate::formula::{Cnf, Model};
use crate::prelude::*;
use crate::solver::Algorithm;

mod aggregate;
mod dispatch;

pub use aggregate::aggregate;

/// Identifies one submitted task. Doubles as the index into the
/// task list, so aggregation can account for every submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TaskId(usize);

impl From<usize> for TaskId {
    fn from(index: usize) -> Self {
        TaskId(index)
    }
}

impl From<TaskId> for usize {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One unit of benchmark work, owned by exactly one worker for its
/// whole duration.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub formula: Cnf,
    pub algorithm: Algorithm,
    pub budget: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Sat,
    Unsat,
    Timeout,
    Error,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Verdict::Sat => "SAT",
            Verdict::Unsat => "UNSAT",
            Verdict::Timeout => "TIMEOUT",
            Verdict::Error => "ERROR",
        })
    }
}

/// Outcome record for one task.
///
/// `model` is present only for a SAT verdict from a witnessing engine;
/// `diagnostic` only for an ERROR verdict.
#[derive(Debug)]
pub struct TaskResult {
    pub id: TaskId,
    pub verdict: Verdict,
    pub elapsed: Duration,
    pub model: Option<Model>,
    pub diagnostic: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct BenchConfig {
    pub workers: usize,
    /// Extra wait beyond the largest chunk's summed budgets before
    /// a silent worker's tasks are written off as errors.
    pub fault_grace: Duration,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            workers: std::thread::available_parallelism()
                .map(|value| value.get())
                .unwrap_or(2),
            fault_grace: Duration::from_secs(5),
        }
    }
}

/// Coordination failures. These mean the harness itself is broken,
/// unlike per-task TIMEOUT/ERROR verdicts.
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Benchmark requires at least one worker"))]
    NoWorkers,
    #[snafu(display("No result returned for task {}", id))]
    MissingResult { id: TaskId },
    #[snafu(display("Duplicate result for task {}", id))]
    DuplicateResult { id: TaskId },
    #[snafu(display("Result for unknown task {}", id))]
    UnknownTask { id: TaskId },
}

/// Runs every task across `config.workers` worker threads and returns
/// one result per task, ordered by task id regardless of which worker
/// finished first.
pub fn run_benchmark(tasks: Vec<Task>, config: BenchConfig) -> Result<Vec<TaskResult>, Error> {
    ensure!(config.workers >= 1, NoWorkers);

    let num_tasks = tasks.len();
    let collected = dispatch::scatter_gather(tasks, &config);
    aggregate(num_tasks, collected)
}
