use std::sync::Arc;

use crate::config::EsConfig;
use crate::error::SearchError;
use crate::es::diff::{Evolution, plan_evolution};
use crate::es::engine::SearchEngine;
use crate::es::mapping::MappingDescriptor;
use crate::es::model::{ModelSchema, SearchModel, model_to_mapping};

/// Where the desired schema of an index comes from.
#[derive(Debug, Clone, Copy)]
pub enum MappingSource<'a> {
    /// A JSON mapping document with `settings` and `mappings.properties`
    Explicit(&'a str),
    Model(&'a ModelSchema),
}

/// Creates indices and evolves their mappings additively.
///
/// Every call re-reads the live index, so repeating [`IndexManager::ensure`]
/// with an unchanged schema performs no mutation.
pub struct IndexManager<E> {
    engine: Arc<E>,
    default_shards: u32,
    default_replicas: u32,
}

impl<E: SearchEngine> IndexManager<E> {
    pub fn new(engine: Arc<E>, config: &EsConfig) -> Self {
        Self {
            engine,
            default_shards: config.shards,
            default_replicas: config.replicas,
        }
    }

    pub async fn build_index_with_explicit_mapping(
        &self,
        index: &str,
        mapping: &str,
    ) -> Result<(), SearchError> {
        self.ensure(index, MappingSource::Explicit(mapping)).await
    }

    pub async fn build_index_with_model<M: SearchModel>(&self, index: &str) -> Result<(), SearchError> {
        let schema = M::schema();
        self.ensure(index, MappingSource::Model(&schema)).await
    }

    pub async fn ensure(&self, index: &str, source: MappingSource<'_>) -> Result<(), SearchError> {
        let exists = self
            .engine
            .index_exists(index)
            .await
            .map_err(|source| SearchError::IdxExists {
                index: index.to_string(),
                source,
            })?;

        if exists {
            tracing::debug!("Index '{index}' exists, checking mapping");
            self.evolve(index, source).await
        } else {
            self.create(index, source).await
        }
    }

    async fn create(&self, index: &str, source: MappingSource<'_>) -> Result<(), SearchError> {
        let mut desired = desired_mapping(index, source)?;
        desired
            .settings
            .apply_defaults(self.default_shards, self.default_replicas);

        self.engine
            .create_index(index, desired.create_index_body())
            .await
            .map_err(|source| SearchError::IdxCreate {
                index: index.to_string(),
                source,
            })?;

        tracing::info!(
            "Created index '{index}' ({} shards, {} replicas, {} fields)",
            desired.settings.number_of_shards,
            desired.settings.number_of_replicas,
            desired.properties().len()
        );
        Ok(())
    }

    async fn evolve(&self, index: &str, source: MappingSource<'_>) -> Result<(), SearchError> {
        let current = self.live_mapping(index).await?;
        let desired = desired_mapping(index, source)?;

        match plan_evolution(index, &current, &desired)? {
            Evolution::Unchanged => {
                tracing::debug!("Mapping of '{index}' is up to date");
                Ok(())
            }
            Evolution::AddFields(added) => {
                self.engine
                    .put_mapping(index, added.put_mapping_body())
                    .await
                    .map_err(|source| SearchError::PutMapping {
                        index: index.to_string(),
                        source,
                    })?;

                let names: Vec<&str> = added.properties().keys().map(String::as_str).collect();
                tracing::info!("Added fields to '{index}': {names:?}");
                Ok(())
            }
        }
    }

    async fn live_mapping(&self, index: &str) -> Result<MappingDescriptor, SearchError> {
        let mut payload = self
            .engine
            .get_mapping(index)
            .await
            .map_err(|source| SearchError::GetMapping {
                index: index.to_string(),
                source,
            })?;

        let entry = payload
            .get_mut(index)
            .map(serde_json::Value::take)
            .ok_or_else(|| SearchError::NoMappingFound {
                index: index.to_string(),
            })?;

        MappingDescriptor::from_live(&entry).map_err(|source| SearchError::MappingSchemaNotExpected {
            index: index.to_string(),
            source,
        })
    }
}

fn desired_mapping(index: &str, source: MappingSource<'_>) -> Result<MappingDescriptor, SearchError> {
    match source {
        MappingSource::Explicit(text) => {
            MappingDescriptor::from_explicit(text).map_err(|source| {
                SearchError::MappingSchemaNotExpected {
                    index: index.to_string(),
                    source,
                }
            })
        }
        MappingSource::Model(schema) => model_to_mapping(Some(schema))?.ok_or_else(|| {
            SearchError::invalid_model(format!("model '{}' yields no mapping", schema.name))
        }),
    }
}
