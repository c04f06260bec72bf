//! Bounded-concurrency map over independent fetch tasks.

use std::future::Future;
use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::error::ScrapeError;

/// Effective worker count: caller's override, or the host's logical core
/// count. Zero disables concurrency (strictly sequential execution).
fn effective_workers(concurrency: Option<usize>) -> usize {
    concurrency.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    })
}

/// Apply `f` to every item with at most `concurrency` tasks in flight.
///
/// Failure policy, by contract and not by accident: the first error aborts
/// the whole batch and surfaces to the caller. Partial results are
/// discarded and there is no per-item retry. Output order follows input
/// order on success; on failure nothing is returned, so ordering is moot.
pub async fn map_concurrent<I, T, F, Fut>(
    items: I,
    concurrency: Option<usize>,
    f: F,
) -> Result<Vec<T>, ScrapeError>
where
    I: IntoIterator,
    I::Item: Send + 'static,
    T: Send + 'static,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = Result<T, ScrapeError>> + Send + 'static,
{
    let workers = effective_workers(concurrency);

    if workers <= 1 {
        let mut results = Vec::new();
        for item in items {
            results.push(f(item).await?);
        }
        return Ok(results);
    }

    let semaphore = Arc::new(Semaphore::new(workers));
    let mut tasks = Vec::new();
    for item in items {
        let semaphore = Arc::clone(&semaphore);
        let fut = f(item);
        tasks.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|e| ScrapeError::TaskFailed(e.to_string()))?;
            fut.await
        }));
    }
    debug!(tasks = tasks.len(), workers, "dispatched concurrent batch");

    // Flatten the join layer so the first task error (not only a panic)
    // fails the whole batch.
    let outcomes = tasks.into_iter().map(|handle| async move {
        handle
            .await
            .map_err(|e| ScrapeError::TaskFailed(e.to_string()))?
    });
    try_join_all(outcomes).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn maps_all_items() {
        let results = map_concurrent(vec![1u32, 2, 3], Some(2), |n| async move { Ok(n * 10) })
            .await
            .unwrap();
        assert_eq!(results, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn zero_concurrency_runs_sequentially() {
        let high_water = Arc::new(AtomicUsize::new(0));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let results = map_concurrent(0..8u32, Some(0), |n| {
            let high_water = Arc::clone(&high_water);
            let in_flight = Arc::clone(&in_flight);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                high_water.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(n)
            }
        })
        .await
        .unwrap();
        assert_eq!(results.len(), 8);
        assert_eq!(high_water.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn one_failure_aborts_the_batch() {
        let result = map_concurrent(0..5u32, Some(4), |n| async move {
            if n == 3 {
                Err(ScrapeError::DeniedRequest {
                    url: format!("file-{n}"),
                })
            } else {
                Ok(n)
            }
        })
        .await;
        assert!(matches!(result, Err(ScrapeError::DeniedRequest { .. })));
    }
}
