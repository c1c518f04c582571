//! Schema-governed Elasticsearch index management.
//!
//! Derives mappings from record descriptions or explicit mapping documents,
//! creates indices or evolves them additively, and indexes documents with an
//! existence poller for near-real-time visibility.

pub mod config;
pub mod error;
pub mod es;

pub use config::{AppConfig, EsConfig};
pub use error::{EngineError, SearchError};
pub use es::client::{EsEngine, create_client};
pub use es::engine::SearchEngine;
pub use es::indexer::{BulkOutcome, DocumentIndexer};
pub use es::lifecycle::{IndexManager, MappingSource};
pub use es::mapping::{FieldSpec, FieldType, MappingDescriptor};
pub use es::model::{ModelField, ModelSchema, SearchModel};
