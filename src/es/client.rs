use async_trait::async_trait;
use elasticsearch::Elasticsearch;
use elasticsearch::http::request::JsonBody;
use elasticsearch::http::response::Response;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::indices::{
    IndicesCreateParts, IndicesExistsParts, IndicesGetMappingParts, IndicesPutMappingParts,
};
use elasticsearch::{BulkParts, ExistsParts, IndexParts};
use serde_json::{Value, json};
use std::sync::Arc;
use url::Url;

use crate::config::EsConfig;
use crate::error::{EngineError, SearchError};
use crate::es::engine::{BulkItemFailure, BulkResponse, SearchEngine};

/// [`SearchEngine`] backed by the official Elasticsearch client.
pub struct EsEngine {
    client: Elasticsearch,
    trace: bool,
}

pub fn create_client(config: &EsConfig) -> Result<Arc<EsEngine>, SearchError> {
    let new_client_err = |reason: String| SearchError::NewClient { reason };

    let url = Url::parse(&config.url()).map_err(|e| new_client_err(e.to_string()))?;
    if config.sniff {
        tracing::warn!("Sniffing requested but the single node pool cannot sniff, using {url}");
    }
    let pool = SingleNodeConnectionPool::new(url);
    let transport = TransportBuilder::new(pool)
        .disable_proxy()
        .build()
        .map_err(|e| new_client_err(e.to_string()))?;

    tracing::info!("Elasticsearch client ready (host: {}, sniff: {})", config.host, config.sniff);
    Ok(Arc::new(EsEngine {
        client: Elasticsearch::new(transport),
        trace: config.trace,
    }))
}

impl EsEngine {
    pub fn client(&self) -> &Elasticsearch {
        &self.client
    }

    fn trace(&self, op: &str, target: &str, response: &Response) {
        if self.trace {
            tracing::trace!("{op} {target} -> {}", response.status_code());
        }
    }
}

/// Turns a non-success status into an error carrying the response body.
async fn check_status(response: Response) -> Result<Response, EngineError> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await?;
    Err(EngineError::Status {
        status: status.as_u16(),
        body,
    })
}

/// HEAD requests answer 200 or 404; anything else is a failure.
async fn presence(response: Response) -> Result<bool, EngineError> {
    if response.status_code().as_u16() == 404 {
        return Ok(false);
    }
    check_status(response).await.map(|_| true)
}

#[async_trait]
impl SearchEngine for EsEngine {
    async fn index_exists(&self, index: &str) -> Result<bool, EngineError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await?;
        self.trace("index-exists", index, &response);
        presence(response).await
    }

    async fn get_mapping(&self, index: &str) -> Result<Value, EngineError> {
        let response = self
            .client
            .indices()
            .get_mapping(IndicesGetMappingParts::Index(&[index]))
            .send()
            .await?;
        self.trace("get-mapping", index, &response);
        Ok(check_status(response).await?.json().await?)
    }

    async fn create_index(&self, index: &str, body: Value) -> Result<(), EngineError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(body)
            .send()
            .await?;
        self.trace("create-index", index, &response);
        check_status(response).await.map(|_| ())
    }

    async fn put_mapping(&self, index: &str, body: Value) -> Result<(), EngineError> {
        let response = self
            .client
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&[index]))
            .body(body)
            .send()
            .await?;
        self.trace("put-mapping", index, &response);
        check_status(response).await.map(|_| ())
    }

    async fn index_document(&self, index: &str, id: &str, body: Value) -> Result<(), EngineError> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .body(body)
            .send()
            .await?;
        self.trace("index", &format!("{index}/{id}"), &response);
        check_status(response).await.map(|_| ())
    }

    async fn bulk_index(
        &self,
        index: &str,
        docs: Vec<(String, Value)>,
    ) -> Result<BulkResponse, EngineError> {
        let count = docs.len();
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(count * 2);
        for (id, doc) in docs {
            // Action line
            body.push(json!({"index": {"_id": id}}).into());
            // Document line
            body.push(doc.into());
        }

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(body)
            .send()
            .await?;
        self.trace("bulk", index, &response);

        let body: Value = check_status(response).await?.json().await?;
        Ok(parse_bulk_response(&body, count))
    }

    async fn document_exists(&self, index: &str, id: &str) -> Result<bool, EngineError> {
        let response = self
            .client
            .exists(ExistsParts::IndexId(index, id))
            .send()
            .await?;
        self.trace("exists", &format!("{index}/{id}"), &response);
        presence(response).await
    }
}

fn parse_bulk_response(body: &Value, count: usize) -> BulkResponse {
    if !body["errors"].as_bool().unwrap_or(false) {
        return BulkResponse {
            items: count,
            failed: Vec::new(),
        };
    }

    let failed = body["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter(|item| item["index"]["error"].is_object())
                .map(|item| BulkItemFailure {
                    id: item["index"]["_id"].as_str().unwrap_or_default().to_string(),
                    reason: item["index"]["error"]["reason"]
                        .as_str()
                        .unwrap_or("unknown")
                        .to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    BulkResponse {
        items: count,
        failed,
    }
}
