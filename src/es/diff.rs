use crate::error::SearchError;
use crate::es::mapping::{MappingDescriptor, Properties};

/// Outcome of comparing a live mapping with the desired one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evolution {
    Unchanged,
    /// Only these new properties need to be put
    AddFields(MappingDescriptor),
}

/// Names of fields present in both mappings whose type differs.
///
/// Only the type tag is compared, ungoverned live types included: a change
/// limited to the `index` flag is not reported.
pub fn modified_fields(current: &MappingDescriptor, desired: &MappingDescriptor) -> Vec<String> {
    current
        .properties()
        .keys()
        .filter(|name| {
            desired.field(name).is_some() && current.type_tag(name) != desired.type_tag(name)
        })
        .cloned()
        .collect()
}

/// Fields of `desired` that `current` does not have yet.
pub fn added_fields(current: &MappingDescriptor, desired: &MappingDescriptor) -> MappingDescriptor {
    let properties: Properties = desired
        .properties()
        .iter()
        .filter(|(name, _)| current.field(name).is_none())
        .map(|(name, spec)| (name.clone(), spec.clone()))
        .collect();
    MappingDescriptor::from_properties(properties)
}

/// Applies the additive-only policy: any modified existing field rejects the
/// whole change.
pub fn plan_evolution(
    index: &str,
    current: &MappingDescriptor,
    desired: &MappingDescriptor,
) -> Result<Evolution, SearchError> {
    let modified = modified_fields(current, desired);
    if !modified.is_empty() {
        return Err(SearchError::MappingExistentFieldsModified {
            index: index.to_string(),
            fields: modified,
        });
    }

    let added = added_fields(current, desired);
    if added.is_empty() {
        Ok(Evolution::Unchanged)
    } else {
        Ok(Evolution::AddFields(added))
    }
}
