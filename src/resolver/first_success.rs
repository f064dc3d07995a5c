//! First-success-wins combination of racing fetches

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FirstSuccessError<E> {
    #[error("No operations to wait for")]
    NoOperations,

    /// Every operation failed. Holds one error per operation in completion order;
    /// never empty.
    #[error("All {} operations failed", .0.len())]
    AllFailed(Vec<E>),
}

/// Polls all `operations` concurrently and resolves with the first `Ok`.
///
/// Operations still pending when a winner is found are dropped without being
/// waited for. When the futures are task handles this detaches the tasks, so
/// they run to completion and their results are discarded.
pub async fn first_success<I, F, T, E>(operations: I) -> Result<T, FirstSuccessError<E>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let mut pending: FuturesUnordered<F> = operations.into_iter().collect();
    if pending.is_empty() {
        return Err(FirstSuccessError::NoOperations);
    }

    let mut failures = Vec::with_capacity(pending.len());
    while let Some(outcome) = pending.next().await {
        match outcome {
            Ok(value) => return Ok(value),
            Err(e) => failures.push(e),
        }
    }

    Err(FirstSuccessError::AllFailed(failures))
}
