//! Batch execution utilities for parallel task processing

use anyhow::{anyhow, Result};
use futures::{stream::FuturesUnordered, Future, StreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Context provided to each task in a batch
#[derive(Debug, Clone, Copy)]
pub struct TaskContext {
    /// Task number (1-indexed for display)
    pub task_number: usize,
    /// Total number of tasks in this batch
    pub total_tasks: usize,
}

/// Execute items concurrently with failure isolation
///
/// # Arguments
/// - `items`: Items to process
/// - `concurrency`: Maximum concurrent tasks (clamped to at least 1)
/// - `task_executor`: Function that processes each item, receives (item, context)
///
/// # Returns
/// One result per item, in input order
///
/// # Error Handling
/// A failing task never stops the others; its error is returned in its slot.
///
/// # Example
/// ```ignore
/// let results = execute_batch_isolated(agents, 4, |agent, ctx| async move {
///     summarize_agent(agent, ctx).await
/// })
/// .await;
/// ```
pub async fn execute_batch_isolated<T, F, Fut, R>(
    items: Vec<T>,
    concurrency: usize,
    task_executor: F,
) -> Vec<Result<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T, TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let total = items.len();
    let sem = Arc::new(Semaphore::new(concurrency.max(1)));
    let executor = Arc::new(task_executor);
    let mut tasks = FuturesUnordered::new();

    for (idx, item) in items.into_iter().enumerate() {
        let sem = sem.clone();
        let executor = executor.clone();

        let ctx = TaskContext {
            task_number: idx + 1,
            total_tasks: total,
        };

        tasks.push(async move {
            // Acquire permit (waits while `concurrency` tasks are running)
            let result = match sem.acquire().await {
                Ok(_permit) => executor(item, ctx).await,
                Err(_) => Err(anyhow!("Semaphore closed")),
            };
            (idx, result)
        });
    }

    // Collect in completion order, then restore input order
    let mut slots: Vec<Option<Result<R>>> = (0..total).map(|_| None).collect();
    while let Some((idx, result)) = tasks.next().await {
        slots[idx] = Some(result);
    }

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err(anyhow!("Task did not complete"))))
        .collect()
}

/// Split `items` into at most `parts` contiguous, near-equal chunks
///
/// Chunk `i` covers `[i * len / n, (i + 1) * len / n)` with `n = min(parts, len)`,
/// so no chunk is empty and sizes differ by at most one.
pub fn split_evenly<T: Clone>(items: &[T], parts: usize) -> Vec<Vec<T>> {
    let len = items.len();
    let n = parts.min(len);
    if n == 0 {
        return Vec::new();
    }

    (0..n)
        .map(|i| items[i * len / n..(i + 1) * len / n].to_vec())
        .collect()
}
