use std::{
    panic::{self, AssertUnwindSafe},
    sync::mpsc::{channel, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use super::{BenchConfig, Task, TaskId, TaskResult, Verdict};
use crate::solver::{self, Deadline, Outcome};

/// Statically assigns task at position `i` to worker `i mod workers`.
/// The split depends only on position and worker count, so a fixed
/// corpus and worker count always yield the same chunks.
pub(super) fn partition(tasks: Vec<Task>, workers: usize) -> Vec<Vec<Task>> {
    let mut chunks: Vec<Vec<Task>> = (0..workers).map(|_| Vec::new()).collect();
    for (position, task) in tasks.into_iter().enumerate() {
        chunks[position % workers].push(task);
    }
    chunks
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "engine panicked".to_owned()
    }
}

/// Runs one task under its own deadline. An engine panic is an
/// invariant violation inside that engine; it poisons the task's
/// result only, never the worker.
pub(super) fn run_task(task: Task) -> TaskResult {
    let Task {
        id,
        formula,
        algorithm,
        budget,
    } = task;

    let deadline = Deadline::new(budget);
    let solved =
        panic::catch_unwind(AssertUnwindSafe(|| solver::solve(formula, algorithm, &deadline)));

    match solved {
        Ok(Ok(Outcome::Sat(model))) => TaskResult {
            id,
            verdict: Verdict::Sat,
            elapsed: deadline.elapsed(),
            model,
            diagnostic: None,
        },
        Ok(Ok(Outcome::Unsat)) => TaskResult {
            id,
            verdict: Verdict::Unsat,
            elapsed: deadline.elapsed(),
            model: None,
            diagnostic: None,
        },
        // The engine observed its deadline and unwound cooperatively.
        Ok(Err(_interrupted)) => TaskResult {
            id,
            verdict: Verdict::Timeout,
            elapsed: deadline.budget(),
            model: None,
            diagnostic: None,
        },
        Err(payload) => {
            let message = panic_message(payload);
            warn!("task {} failed: {}", id, message);
            TaskResult {
                id,
                verdict: Verdict::Error,
                elapsed: deadline.elapsed(),
                model: None,
                diagnostic: Some(message),
            }
        }
    }
}

/// Scatters the chunks to one thread per worker, then gathers one
/// result batch per worker.
///
/// The gather is bounded: after the largest chunk's summed budgets
/// plus the configured grace, tasks of any worker that has not
/// reported are recorded as errors so every submitted task still
/// gets exactly one result.
pub(super) fn scatter_gather(tasks: Vec<Task>, config: &BenchConfig) -> Vec<TaskResult> {
    let num_tasks = tasks.len();
    let chunks = partition(tasks, config.workers);

    let fault_budget = chunks
        .iter()
        .map(|chunk| chunk.iter().map(|task| task.budget).sum::<Duration>())
        .max()
        .unwrap_or(Duration::from_secs(0))
        + config.fault_grace;

    // Ids are remembered per worker so a silent worker's tasks can be
    // written off without hearing from it.
    let mut outstanding: Vec<Option<Vec<TaskId>>> = Vec::with_capacity(chunks.len());

    let (tx, rx) = channel::<(usize, Vec<TaskResult>)>();

    for (worker, chunk) in chunks.into_iter().enumerate() {
        if chunk.is_empty() {
            outstanding.push(None);
            continue;
        }
        outstanding.push(Some(chunk.iter().map(|task| task.id).collect()));

        let worker_tx = tx.clone();
        thread::spawn(move || {
            debug!("worker {} starts {} tasks", worker, chunk.len());
            let results: Vec<TaskResult> = chunk.into_iter().map(run_task).collect();
            // The coordinator may have already given up on us.
            let _ = worker_tx.send((worker, results));
        });
    }

    // receiver blocks as long as some transmitter is alive
    drop(tx);

    let gather_deadline = Instant::now() + fault_budget;
    let mut results: Vec<TaskResult> = Vec::with_capacity(num_tasks);

    while outstanding.iter().any(Option::is_some) {
        let remaining = gather_deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((worker, batch)) => {
                debug!("worker {} returned {} results", worker, batch.len());
                outstanding[worker] = None;
                results.extend(batch);
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Whatever is still outstanding belongs to a faulted worker.
    for (worker, ids) in outstanding.into_iter().enumerate() {
        if let Some(ids) = ids {
            warn!("worker {} never reported; failing {} tasks", worker, ids.len());
            for id in ids {
                results.push(TaskResult {
                    id,
                    verdict: Verdict::Error,
                    elapsed: Duration::from_secs(0),
                    model: None,
                    diagnostic: Some(format!("worker {} did not return a result", worker)),
                });
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::Algorithm;
    use crate::tests::cnf;

    fn task(id: usize, budget: Duration) -> Task {
        Task {
            id: TaskId::from(id),
            formula: cnf(2, &[&[1, 2], &[-1, 2]]),
            algorithm: Algorithm::Dpll,
            budget,
        }
    }

    #[test]
    fn round_robin_partition() {
        let tasks: Vec<Task> = (0..7).map(|id| task(id, Duration::from_secs(1))).collect();
        let chunks = partition(tasks, 3);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 3);
        assert_eq!(chunks[1].len(), 2);
        assert_eq!(chunks[2].len(), 2);
        assert_eq!(usize::from(chunks[1][1].id), 4);
    }

    #[test]
    fn more_workers_than_tasks() {
        let tasks: Vec<Task> = (0..2).map(|id| task(id, Duration::from_secs(1))).collect();
        let chunks = partition(tasks, 5);
        assert_eq!(chunks.iter().filter(|chunk| chunk.is_empty()).count(), 3);
    }

    #[test]
    fn zero_budget_times_out() {
        let result = run_task(task(0, Duration::from_secs(0)));
        assert_eq!(result.verdict, Verdict::Timeout);
        assert_eq!(result.elapsed, Duration::from_secs(0));
        assert!(result.model.is_none());
    }

    #[test]
    fn completed_task_records_verdict() {
        let result = run_task(task(3, Duration::from_secs(10)));
        assert_eq!(result.verdict, Verdict::Sat);
        assert_eq!(usize::from(result.id), 3);
        assert!(result.model.is_some());
        assert!(result.elapsed <= Duration::from_secs(10));
    }
}
