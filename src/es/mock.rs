//! In-memory [`SearchEngine`] used by the unit tests.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tokio::time::{Duration, Instant, sleep};

use crate::error::EngineError;
use crate::es::engine::{BulkItemFailure, BulkResponse, SearchEngine};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    IndexExists(String),
    GetMapping(String),
    CreateIndex(String, Value),
    PutMapping(String, Value),
    IndexDocument(String, String),
    Bulk(String, usize),
    DocumentExists(String, String),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::CreateIndex(..) | Self::PutMapping(..) | Self::IndexDocument(..) | Self::Bulk(..)
        )
    }
}

#[derive(Default)]
struct State {
    /// index name -> `{"mappings": {"properties": {...}}}`
    indices: BTreeMap<String, Value>,
    docs: BTreeMap<(String, String), Value>,
    calls: Vec<Call>,
    failing: HashSet<&'static str>,
    rejected_ids: HashSet<String>,
    hide_mappings: bool,
    /// document becomes visible after this many existence checks
    visible_after: usize,
    slow_first_check: Option<Duration>,
    check_times: Vec<Instant>,
}

#[derive(Default)]
pub struct MockEngine {
    state: Mutex<State>,
}

impl MockEngine {
    pub fn with_index(self, index: &str, mapping: Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .indices
            .insert(index.to_string(), mapping);
        self
    }

    /// Makes every call of the named operation fail with a 500.
    pub fn failing(self, op: &'static str) -> Self {
        self.state.lock().unwrap().failing.insert(op);
        self
    }

    /// Get-mapping answers without an entry for the index.
    pub fn hiding_mappings(self) -> Self {
        self.state.lock().unwrap().hide_mappings = true;
        self
    }

    pub fn rejecting(self, id: &str) -> Self {
        self.state.lock().unwrap().rejected_ids.insert(id.to_string());
        self
    }

    pub fn visible_after(self, checks: usize) -> Self {
        self.state.lock().unwrap().visible_after = checks;
        self
    }

    /// The first existence check takes `delay` before answering.
    pub fn slow_first_check(self, delay: Duration) -> Self {
        self.state.lock().unwrap().slow_first_check = Some(delay);
        self
    }

    /// When each existence check started.
    pub fn check_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().check_times.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn mapping(&self, index: &str) -> Option<Value> {
        self.state.lock().unwrap().indices.get(index).cloned()
    }

    pub fn document(&self, index: &str, id: &str) -> Option<Value> {
        self.state
            .lock()
            .unwrap()
            .docs
            .get(&(index.to_string(), id.to_string()))
            .cloned()
    }

    fn enter(&self, op: &'static str, call: Call) -> Result<MutexGuard<'_, State>, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.failing.contains(op) {
            return Err(EngineError::Status {
                status: 500,
                body: format!("{op} failed"),
            });
        }
        Ok(state)
    }
}

#[async_trait]
impl SearchEngine for MockEngine {
    async fn index_exists(&self, index: &str) -> Result<bool, EngineError> {
        let state = self.enter("index_exists", Call::IndexExists(index.into()))?;
        Ok(state.indices.contains_key(index))
    }

    async fn get_mapping(&self, index: &str) -> Result<Value, EngineError> {
        let state = self.enter("get_mapping", Call::GetMapping(index.into()))?;
        let mut response = serde_json::Map::new();
        if !state.hide_mappings {
            if let Some(mapping) = state.indices.get(index) {
                response.insert(index.to_string(), mapping.clone());
            }
        }
        Ok(Value::Object(response))
    }

    async fn create_index(&self, index: &str, body: Value) -> Result<(), EngineError> {
        let mut state = self.enter("create_index", Call::CreateIndex(index.into(), body.clone()))?;
        state
            .indices
            .insert(index.into(), json!({ "mappings": body["mappings"].clone() }));
        Ok(())
    }

    async fn put_mapping(&self, index: &str, body: Value) -> Result<(), EngineError> {
        let mut state = self.enter("put_mapping", Call::PutMapping(index.into(), body.clone()))?;
        let mapping = state
            .indices
            .entry(index.into())
            .or_insert_with(|| json!({"mappings": {"properties": {}}}));
        if !mapping["mappings"]["properties"].is_object() {
            mapping["mappings"]["properties"] = json!({});
        }
        if let (Some(props), Some(added)) = (
            mapping["mappings"]["properties"].as_object_mut(),
            body["properties"].as_object(),
        ) {
            props.extend(added.clone());
        }
        Ok(())
    }

    async fn index_document(&self, index: &str, id: &str, body: Value) -> Result<(), EngineError> {
        let mut state = self.enter("index_document", Call::IndexDocument(index.into(), id.into()))?;
        state.docs.insert((index.into(), id.into()), body);
        Ok(())
    }

    async fn bulk_index(
        &self,
        index: &str,
        docs: Vec<(String, Value)>,
    ) -> Result<BulkResponse, EngineError> {
        let mut state = self.enter("bulk_index", Call::Bulk(index.into(), docs.len()))?;
        let items = docs.len();
        let mut failed = Vec::new();
        for (id, doc) in docs {
            if state.rejected_ids.contains(&id) {
                failed.push(BulkItemFailure {
                    id,
                    reason: "rejected".into(),
                });
            } else {
                state.docs.insert((index.into(), id), doc);
            }
        }
        Ok(BulkResponse { items, failed })
    }

    async fn document_exists(&self, index: &str, id: &str) -> Result<bool, EngineError> {
        let delay = {
            let mut state =
                self.enter("document_exists", Call::DocumentExists(index.into(), id.into()))?;
            state.check_times.push(Instant::now());
            state.slow_first_check.take()
        };
        if let Some(delay) = delay {
            sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        if state.visible_after > 0 {
            state.visible_after -= 1;
            return Ok(false);
        }
        Ok(state.docs.contains_key(&(index.to_string(), id.to_string())))
    }
}
