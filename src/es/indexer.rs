use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::error::{EngineError, SearchError};
use crate::es::engine::{BulkItemFailure, SearchEngine};

/// Result of a bulk request the engine accepted as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub indexed: usize,
    pub failed: Vec<BulkItemFailure>,
}

/// Writes documents into named indices.
///
/// The `*_async` variants run on a spawned task and log failures. Their
/// handle can be dropped for fire-and-forget use or awaited to observe the
/// same result.
pub struct DocumentIndexer<E> {
    engine: Arc<E>,
}

impl<E> Clone for DocumentIndexer<E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<E: SearchEngine> DocumentIndexer<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    pub async fn index<T: Serialize + ?Sized>(
        &self,
        index: &str,
        id: &str,
        doc: &T,
    ) -> Result<(), SearchError> {
        tracing::debug!("Indexing document '{id}' into '{index}'");
        let result = match serde_json::to_value(doc) {
            Ok(body) => self.engine.index_document(index, id, body).await,
            Err(e) => Err(EngineError::from(e)),
        };
        result.map_err(|source| SearchError::Idx {
            index: index.to_string(),
            id: id.to_string(),
            source,
        })
    }

    pub fn index_async<T: Serialize + ?Sized>(
        &self,
        index: &str,
        id: &str,
        doc: &T,
    ) -> JoinHandle<Result<(), SearchError>> {
        let body = serde_json::to_value(doc);
        let engine = self.engine.clone();
        let index = index.to_string();
        let id = id.to_string();

        tokio::spawn(async move {
            tracing::debug!("Indexing document '{id}' into '{index}' (async)");
            let result = match body {
                Ok(body) => engine.index_document(&index, &id, body).await,
                Err(e) => Err(EngineError::from(e)),
            };
            result.map_err(|source| {
                let err = SearchError::IdxAsync { index, id, source };
                tracing::error!("{err}");
                err
            })
        })
    }

    /// Sends all documents in one bulk request. An empty map sends nothing.
    pub fn bulk_index_async<T: Serialize>(
        &self,
        index: &str,
        docs: &HashMap<String, T>,
    ) -> JoinHandle<Result<BulkOutcome, SearchError>> {
        let body: Result<Vec<(String, Value)>, serde_json::Error> = docs
            .iter()
            .map(|(id, doc)| serde_json::to_value(doc).map(|v| (id.clone(), v)))
            .collect();
        let engine = self.engine.clone();
        let index = index.to_string();

        tokio::spawn(async move { bulk_index(engine.as_ref(), &index, body).await })
    }
}

async fn bulk_index<E: SearchEngine>(
    engine: &E,
    index: &str,
    body: Result<Vec<(String, Value)>, serde_json::Error>,
) -> Result<BulkOutcome, SearchError> {
    let fail = |source: EngineError| {
        let err = SearchError::BulkIdxAsync {
            index: index.to_string(),
            source,
        };
        tracing::error!("{err}");
        err
    };

    let docs = body.map_err(|e| fail(e.into()))?;
    if docs.is_empty() {
        return Ok(BulkOutcome::default());
    }

    let count = docs.len();
    tracing::debug!("Bulk indexing {count} documents into '{index}'");
    let response = engine.bulk_index(index, docs).await.map_err(fail)?;

    if !response.failed.is_empty() {
        tracing::warn!(
            "Bulk index into '{index}' had {} errors out of {count}",
            response.failed.len()
        );
        for item in &response.failed {
            tracing::debug!("Document '{}' rejected: {}", item.id, item.reason);
        }
    }
    Ok(BulkOutcome {
        indexed: response.items.saturating_sub(response.failed.len()),
        failed: response.failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::es::mock::{Call, MockEngine};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Serialize)]
    struct Doc {
        title: &'static str,
    }

    fn indexer(engine: MockEngine) -> (Arc<MockEngine>, DocumentIndexer<MockEngine>) {
        let engine = Arc::new(engine);
        (engine.clone(), DocumentIndexer::new(engine))
    }

    #[tokio::test]
    async fn index_sync_stores_document() {
        let (engine, indexer) = indexer(MockEngine::default());
        indexer.index("books", "1", &Doc { title: "Dune" }).await.unwrap();
        assert_eq!(engine.document("books", "1"), Some(json!({"title": "Dune"})));
    }

    #[tokio::test]
    async fn index_sync_reports_engine_failure() {
        let (_, indexer) = indexer(MockEngine::default().failing("index_document"));
        let err = indexer.index("books", "1", &Doc { title: "Dune" }).await.unwrap_err();
        assert!(matches!(err, SearchError::Idx { ref index, ref id, .. } if index == "books" && id == "1"));
    }

    #[tokio::test]
    async fn index_async_can_be_awaited() {
        let (engine, indexer) = indexer(MockEngine::default());
        indexer
            .index_async("books", "2", &json!({"title": "Emma"}))
            .await
            .unwrap()
            .unwrap();
        assert!(engine.document("books", "2").is_some());
    }

    #[tokio::test]
    async fn index_async_failure_is_returned_through_handle() {
        let (_, indexer) = indexer(MockEngine::default().failing("index_document"));
        let err = indexer
            .index_async("books", "2", &json!({}))
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(err.code(), "ES-004");
    }

    #[tokio::test]
    async fn bulk_with_no_documents_sends_nothing() {
        let (engine, indexer) = indexer(MockEngine::default());
        let docs: HashMap<String, Doc> = HashMap::new();

        let outcome = indexer.bulk_index_async("books", &docs).await.unwrap().unwrap();

        assert_eq!(outcome, BulkOutcome::default());
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn bulk_sends_one_request() {
        let (engine, indexer) = indexer(MockEngine::default());
        let docs = HashMap::from([
            ("1".to_string(), Doc { title: "a" }),
            ("2".to_string(), Doc { title: "b" }),
            ("3".to_string(), Doc { title: "c" }),
        ]);

        let outcome = indexer.bulk_index_async("books", &docs).await.unwrap().unwrap();

        assert_eq!(outcome.indexed, 3);
        assert_eq!(engine.calls(), vec![Call::Bulk("books".into(), 3)]);
        assert_eq!(engine.document("books", "3"), Some(json!({"title": "c"})));
    }

    #[tokio::test]
    async fn bulk_reports_rejected_items() {
        let (_, indexer) = indexer(MockEngine::default().rejecting("2"));
        let docs = HashMap::from([
            ("1".to_string(), json!({"n": 1})),
            ("2".to_string(), json!({"n": 2})),
        ]);

        let outcome = indexer.bulk_index_async("nums", &docs).await.unwrap().unwrap();

        assert_eq!(outcome.indexed, 1);
        assert_eq!(
            outcome.failed,
            vec![BulkItemFailure {
                id: "2".into(),
                reason: "rejected".into()
            }]
        );
    }

    #[tokio::test]
    async fn bulk_request_failure() {
        let (_, indexer) = indexer(MockEngine::default().failing("bulk_index"));
        let docs = HashMap::from([("1".to_string(), json!({}))]);
        let err = indexer.bulk_index_async("nums", &docs).await.unwrap().unwrap_err();
        assert!(matches!(err, SearchError::BulkIdxAsync { ref index, .. } if index == "nums"));
    }
}
