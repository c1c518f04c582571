//! Derives index mappings from declarative record descriptions.
//!
//! A record describes each of its fields with two annotations:
//!
//! - `json`: the serialization annotation, `name[,options]`. The name is the
//!   field name inside the index.
//! - `es`: the index annotation, a `;`-separated list of `key:value` or bare
//!   `key` entries. `type:<tag>` sets the datatype, a bare `-` disables
//!   indexing. Other keys are ignored.
//!
//! ```
//! use search_index_rs::es::model::{ModelField, ModelSchema, SearchModel};
//!
//! struct Article;
//!
//! impl SearchModel for Article {
//!     fn schema() -> ModelSchema {
//!         ModelSchema::record("Article")
//!             .field(ModelField::new("title").json("title").es("type:text"))
//!             .field(ModelField::new("slug").json("slug").es("type:keyword"))
//!             .field(ModelField::new("raw").json("raw,omitempty").es("type:text;-"))
//!             .field(ModelField::new("cache").json("cache"))
//!     }
//! }
//! ```

use crate::error::SearchError;
use crate::es::mapping::{FieldSpec, FieldType, MappingDescriptor, Properties};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// A structured record with named fields
    Record,
    /// A scalar or otherwise field-less value
    Primitive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelField {
    pub ident: String,
    pub json: Option<String>,
    pub es: Option<String>,
}

impl ModelField {
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            json: None,
            es: None,
        }
    }

    pub fn json(mut self, annotation: impl Into<String>) -> Self {
        self.json = Some(annotation.into());
        self
    }

    pub fn es(mut self, annotation: impl Into<String>) -> Self {
        self.es = Some(annotation.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSchema {
    pub name: String,
    pub kind: ModelKind,
    pub fields: Vec<ModelField>,
}

impl ModelSchema {
    pub fn record(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ModelKind::Record,
            fields: Vec::new(),
        }
    }

    pub fn primitive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ModelKind::Primitive,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: ModelField) -> Self {
        self.fields.push(field);
        self
    }
}

/// Types whose documents are stored in a governed index.
pub trait SearchModel {
    fn schema() -> ModelSchema;
}

/// Builds a mapping from a record description.
///
/// `None` yields `Ok(None)`. Otherwise every governed field is captured or the
/// whole derivation fails; a record with no governed field is invalid.
pub fn model_to_mapping(
    model: Option<&ModelSchema>,
) -> Result<Option<MappingDescriptor>, SearchError> {
    let Some(model) = model else {
        return Ok(None);
    };

    if model.kind != ModelKind::Record {
        return Err(SearchError::InvalidModelType {
            model: model.name.clone(),
        });
    }

    let mut properties = Properties::new();
    for field in &model.fields {
        let Some(name) = serialization_name(field)? else {
            continue;
        };
        let Some(tag) = field.es.as_deref().filter(|tag| !tag.is_empty()) else {
            continue;
        };
        let spec = parse_es_tag(&field.ident, tag)?;
        properties.insert(name.to_string(), spec);
    }

    if properties.is_empty() {
        return Err(SearchError::invalid_model(format!(
            "model '{}' declares no indexed fields",
            model.name
        )));
    }

    tracing::debug!(
        "Derived mapping for model '{}' with {} fields",
        model.name,
        properties.len()
    );
    Ok(Some(MappingDescriptor::from_properties(properties)))
}

fn serialization_name(field: &ModelField) -> Result<Option<&str>, SearchError> {
    let Some(annotation) = field.json.as_deref() else {
        return Ok(None);
    };
    let name = annotation.split(',').next().unwrap_or_default().trim();
    match name {
        "" => Err(SearchError::invalid_model(format!(
            "field '{}' has an empty serialization name",
            field.ident
        ))),
        // never serialized
        "-" => Ok(None),
        name => Ok(Some(name)),
    }
}

fn parse_es_tag(ident: &str, tag: &str) -> Result<FieldSpec, SearchError> {
    let mut spec = FieldSpec::default();
    for param in tag.split(';') {
        let (key, value) = param.split_once(':').unwrap_or((param, ""));
        match key.trim() {
            "type" => {
                let field_type: FieldType = value.trim().parse().map_err(|e| {
                    SearchError::invalid_model(format!("field '{ident}': {e}"))
                })?;
                spec.field_type = Some(field_type);
            }
            "-" => spec.index = Some(false),
            _ => {}
        }
    }

    if spec.field_type.is_none() {
        return Err(SearchError::invalid_model(format!(
            "field '{ident}' has no type"
        )));
    }
    Ok(spec)
}
