use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at, sleep};

use crate::error::SearchError;
use crate::es::engine::SearchEngine;

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Checks once whether a document is visible in the index.
pub async fn doc_exists<E: SearchEngine + ?Sized>(
    engine: &E,
    index: &str,
    id: &str,
) -> Result<bool, SearchError> {
    let exists = engine
        .document_exists(index, id)
        .await
        .map_err(|source| SearchError::Exists {
            index: index.to_string(),
            id: id.to_string(),
            source,
        })?;
    tracing::debug!("Document '{id}' in '{index}' exists: {exists}");
    Ok(exists)
}

/// Polls until the document is visible or `timeout` elapses.
///
/// The receiver yields exactly one result: `Ok(())` once the document is seen,
/// the first failed check, or [`SearchError::AwaitExistsTimeout`].
pub fn await_doc_exists<E: SearchEngine>(
    engine: Arc<E>,
    index: &str,
    id: &str,
    timeout: Duration,
) -> oneshot::Receiver<Result<(), SearchError>> {
    let (tx, rx) = oneshot::channel();
    let index = index.to_string();
    let id = id.to_string();

    tokio::spawn(async move {
        let result = poll(engine.as_ref(), &index, &id, timeout).await;
        // receiver may have been dropped
        let _ = tx.send(result);
    });
    rx
}

async fn poll<E: SearchEngine>(
    engine: &E,
    index: &str,
    id: &str,
    timeout: Duration,
) -> Result<(), SearchError> {
    let deadline = sleep(timeout);
    tokio::pin!(deadline);
    let mut tick = interval_at(Instant::now() + POLL_INTERVAL, POLL_INTERVAL);
    // a slow check must not be followed by a burst of catch-up checks
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                tracing::debug!("Timed out waiting for '{id}' in '{index}'");
                return Err(SearchError::AwaitExistsTimeout {
                    index: index.to_string(),
                    id: id.to_string(),
                });
            }
            _ = tick.tick() => {
                if doc_exists(engine, index, id).await? {
                    return Ok(());
                }
            }
        }
    }
}
