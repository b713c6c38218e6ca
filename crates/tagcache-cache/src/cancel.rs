//! Cooperative cancellation for cache calls.
//!
//! Every operation in this crate can also be abandoned by dropping its
//! future; no local state needs to be rolled back.

use crate::CacheError;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Runs `operation` until it completes or `token` is cancelled, whichever
/// comes first. A cancelled operation resolves to [`CacheError::Cancelled`].
///
/// Store calls already issued may or may not have reached the store.
pub async fn with_cancellation<T, F>(
    token: &CancellationToken,
    operation: F,
) -> Result<T, CacheError>
where
    F: Future<Output = Result<T, CacheError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(CacheError::Cancelled),
        result = operation => result,
    }
}
