use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Field datatypes this crate knows how to govern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Keyword,
    Text,
    Date,
    Boolean,
    SearchAsYouType,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Text => "text",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::SearchAsYouType => "search_as_you_type",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown field type '{0}'")]
pub struct UnknownFieldType(pub String);

impl FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keyword" => Ok(Self::Keyword),
            "text" => Ok(Self::Text),
            "date" => Ok(Self::Date),
            "boolean" => Ok(Self::Boolean),
            "search_as_you_type" => Ok(Self::SearchAsYouType),
            other => Err(UnknownFieldType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    /// `Some(false)` keeps the field stored but not searchable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<bool>,
}

impl FieldSpec {
    pub fn typed(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            index: None,
        }
    }

    pub fn not_indexed(mut self) -> Self {
        self.index = Some(false);
        self
    }

    pub fn is_indexed(&self) -> bool {
        self.index.unwrap_or(true)
    }
}

pub type Properties = BTreeMap<String, FieldSpec>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSettings {
    #[serde(default)]
    pub number_of_shards: u32,
    #[serde(default)]
    pub number_of_replicas: u32,
}

impl IndexSettings {
    /// Fills unset (zero) counts from the configured defaults, falling back to 1.
    pub fn apply_defaults(&mut self, shards: u32, replicas: u32) {
        if self.number_of_replicas == 0 {
            self.number_of_replicas = if replicas == 0 { 1 } else { replicas };
        }
        if self.number_of_shards == 0 {
            self.number_of_shards = if shards == 0 { 1 } else { shards };
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mappings {
    #[serde(default)]
    pub properties: Properties,
}

/// Normalized view of an index schema: creation settings plus field properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDescriptor {
    #[serde(default)]
    pub settings: IndexSettings,
    #[serde(default)]
    pub mappings: Mappings,
    /// Live fields whose engine type is outside [`FieldType`], with the raw tag
    #[serde(skip)]
    pub ungoverned_types: BTreeMap<String, String>,
}

impl MappingDescriptor {
    pub fn from_properties(properties: Properties) -> Self {
        Self {
            settings: IndexSettings::default(),
            mappings: Mappings { properties },
            ungoverned_types: BTreeMap::new(),
        }
    }

    /// Parses an explicit mapping document of the form
    /// `{"settings": {...}, "mappings": {"properties": {...}}}`.
    ///
    /// Field types outside [`FieldType`] are rejected.
    pub fn from_explicit(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Parses the per-index entry of a get-mapping response
    /// (`{"mappings": {"properties": {...}}}`).
    ///
    /// Live indices may hold fields of types this crate does not govern
    /// (dynamically mapped numbers). Those are kept with no [`FieldType`] and
    /// their raw tag is remembered in `ungoverned_types`, so [`Self::type_tag`]
    /// still tells them apart from an untyped field.
    pub fn from_live(payload: &Value) -> Result<Self, serde_json::Error> {
        let live = LiveMapping::deserialize(payload)?;
        let mut properties = Properties::new();
        let mut ungoverned_types = BTreeMap::new();
        for (name, field) in live.mappings.properties {
            let field_type = match field.field_type {
                Some(tag) => match tag.parse::<FieldType>() {
                    Ok(field_type) => Some(field_type),
                    Err(_) => {
                        ungoverned_types.insert(name.clone(), tag);
                        None
                    }
                },
                None => None,
            };
            let spec = FieldSpec {
                field_type,
                index: field.index,
            };
            properties.insert(name, spec);
        }

        let mut mapping = Self::from_properties(properties);
        mapping.ungoverned_types = ungoverned_types;
        Ok(mapping)
    }

    /// Type tag of a field as the engine names it, including ungoverned types.
    pub fn type_tag(&self, name: &str) -> Option<&str> {
        if let Some(raw) = self.ungoverned_types.get(name) {
            return Some(raw.as_str());
        }
        self.field(name)?.field_type.map(|t| t.as_str())
    }

    pub fn properties(&self) -> &Properties {
        &self.mappings.properties
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.mappings.properties.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.properties.is_empty()
    }

    /// Body of a create-index request: settings and mappings.
    pub fn create_index_body(&self) -> Value {
        json!({
            "settings": self.settings,
            "mappings": self.mappings,
        })
    }

    /// Body of a put-mapping request: properties only, settings never travel.
    pub fn put_mapping_body(&self) -> Value {
        json!({ "properties": self.mappings.properties })
    }
}

#[derive(Deserialize)]
struct LiveMapping {
    #[serde(default)]
    mappings: LiveMappings,
}

#[derive(Default, Deserialize)]
struct LiveMappings {
    #[serde(default)]
    properties: BTreeMap<String, LiveField>,
}

#[derive(Deserialize)]
struct LiveField {
    #[serde(rename = "type", default)]
    field_type: Option<String>,
    #[serde(default)]
    index: Option<bool>,
}
