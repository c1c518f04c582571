use async_trait::async_trait;
use serde_json::Value;

use crate::error::EngineError;

/// A document the engine refused inside an otherwise accepted bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemFailure {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkResponse {
    pub items: usize,
    pub failed: Vec<BulkItemFailure>,
}

/// Requests this crate issues against the search engine.
///
/// Implementations own connection handling; callers share one instance
/// behind an `Arc`.
#[async_trait]
pub trait SearchEngine: Send + Sync + 'static {
    async fn index_exists(&self, index: &str) -> Result<bool, EngineError>;

    /// Raw get-mapping response, keyed by concrete index name.
    async fn get_mapping(&self, index: &str) -> Result<Value, EngineError>;

    async fn create_index(&self, index: &str, body: Value) -> Result<(), EngineError>;

    async fn put_mapping(&self, index: &str, body: Value) -> Result<(), EngineError>;

    async fn index_document(&self, index: &str, id: &str, body: Value) -> Result<(), EngineError>;

    async fn bulk_index(
        &self,
        index: &str,
        docs: Vec<(String, Value)>,
    ) -> Result<BulkResponse, EngineError>;

    async fn document_exists(&self, index: &str, id: &str) -> Result<bool, EngineError>;
}
