use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use super::SyncError;
use crate::ports::spotify::{Item, Page, SpotifyError};

/// Attempts per remote call, first try included.
pub const MAX_ATTEMPTS: usize = 5;

const MIN_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// The one retry policy for every remote call, collection and mutation alike:
/// exponential backoff from 1s capped at 30s, five attempts total.
fn backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(MIN_BACKOFF)
        .with_max_delay(MAX_BACKOFF)
        .with_max_times(MAX_ATTEMPTS - 1)
}

/// Runs `op` under the retry policy. Only transient failures are retried;
/// anything the API rejected outright surfaces immediately.
pub(crate) async fn with_retries<T, F, Fut>(what: &'static str, op: F) -> Result<T, SyncError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SpotifyError>>,
{
    op.retry(backoff())
        .when(SpotifyError::is_transient)
        .notify(|err, delay| {
            tracing::warn!("{what} failed ({err}), retrying in {delay:?}");
        })
        .await
        .map_err(|source| {
            if source.is_transient() {
                SyncError::RetryExhausted {
                    what,
                    attempts: MAX_ATTEMPTS,
                    source,
                }
            } else {
                SyncError::Api { what, source }
            }
        })
}

/// Drains a paged remote listing into a flat ordered sequence. `fetch` is
/// called once per page offset (plus retries); a `next` of `None` is the
/// normal terminus, never an error.
pub(crate) async fn collect_pages<F, Fut>(
    what: &'static str,
    mut fetch: F,
) -> Result<Vec<Item>, SyncError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page, SpotifyError>>,
{
    let mut items = Vec::new();
    let mut offset = Some(0u32);
    while let Some(current) = offset {
        let page = with_retries(what, || fetch(current)).await?;
        items.extend(page.items);
        offset = page.next;
    }
    Ok(items)
}
