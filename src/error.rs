use thiserror::Error;

/// Failure reported by the search engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Elasticsearch error: {0}")]
    Transport(#[from] elasticsearch::Error),

    #[error("Elasticsearch returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("[ES-001] failed to build Elasticsearch client: {reason}")]
    NewClient { reason: String },

    #[error("[ES-002] index existence check failed (idx: {index}): {source}")]
    IdxExists {
        index: String,
        #[source]
        source: EngineError,
    },

    #[error("[ES-003] indexation failed (idx: {index}, id: {id}): {source}")]
    Idx {
        index: String,
        id: String,
        #[source]
        source: EngineError,
    },

    #[error("[ES-004] async indexation failed (idx: {index}, id: {id}): {source}")]
    IdxAsync {
        index: String,
        id: String,
        #[source]
        source: EngineError,
    },

    #[error("[ES-007] index creation failed (idx: {index}): {source}")]
    IdxCreate {
        index: String,
        #[source]
        source: EngineError,
    },

    #[error("[ES-008] async bulk indexation failed (idx: {index}): {source}")]
    BulkIdxAsync {
        index: String,
        #[source]
        source: EngineError,
    },

    #[error("[ES-009] document existence check failed (idx: {index}, id: {id}): {source}")]
    Exists {
        index: String,
        id: String,
        #[source]
        source: EngineError,
    },

    #[error("[ES-010] await timeout (idx: {index}, id: {id})")]
    AwaitExistsTimeout { index: String, id: String },

    #[error("[ES-011] invalid model, check tags: {reason}")]
    InvalidModel { reason: String },

    #[error("[ES-012] model must be a record type, got {model}")]
    InvalidModelType { model: String },

    #[error("[ES-013] get mapping failed (idx: {index}): {source}")]
    GetMapping {
        index: String,
        #[source]
        source: EngineError,
    },

    #[error("[ES-014] no mapping found (idx: {index})")]
    NoMappingFound { index: String },

    #[error("[ES-015] mapping schema not expected (idx: {index}): {source}")]
    MappingSchemaNotExpected {
        index: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "[ES-016] Elasticsearch doesn't allow changing mapping for existent fields (idx: {index}, fields: {fields:?})"
    )]
    MappingExistentFieldsModified { index: String, fields: Vec<String> },

    #[error("[ES-017] put mapping failed (idx: {index}): {source}")]
    PutMapping {
        index: String,
        #[source]
        source: EngineError,
    },
}

impl SearchError {
    pub(crate) fn invalid_model(reason: impl Into<String>) -> Self {
        Self::InvalidModel {
            reason: reason.into(),
        }
    }

    /// Stable error code, usable by callers that branch on error kind across process boundaries.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NewClient { .. } => "ES-001",
            Self::IdxExists { .. } => "ES-002",
            Self::Idx { .. } => "ES-003",
            Self::IdxAsync { .. } => "ES-004",
            Self::IdxCreate { .. } => "ES-007",
            Self::BulkIdxAsync { .. } => "ES-008",
            Self::Exists { .. } => "ES-009",
            Self::AwaitExistsTimeout { .. } => "ES-010",
            Self::InvalidModel { .. } => "ES-011",
            Self::InvalidModelType { .. } => "ES-012",
            Self::GetMapping { .. } => "ES-013",
            Self::NoMappingFound { .. } => "ES-014",
            Self::MappingSchemaNotExpected { .. } => "ES-015",
            Self::MappingExistentFieldsModified { .. } => "ES-016",
            Self::PutMapping { .. } => "ES-017",
        }
    }
}
