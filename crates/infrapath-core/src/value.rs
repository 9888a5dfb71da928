// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tagged property values and the property bag carried by resources.
//!
//! Property access goes through [`Properties::get`] and friends, which fail
//! with a typed [`PropertyError`] instead of silently coercing values.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ident::ResourceId;

/// Scalar leaf value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// UTF-8 string.
    Str(String),
}

/// A single property value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    /// Plain scalar.
    Scalar(Scalar),
    /// Reference to another resource.
    Id(ResourceId),
    /// Ordered references to other resources.
    IdList(Vec<ResourceId>),
    /// Nested property map, addressed with dotted paths.
    Map(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Convenience constructor for string scalars.
    pub fn str(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Str(value.into()))
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Id(_) => "id",
            Self::IdList(_) => "id_list",
            Self::Map(_) => "map",
        }
    }

    /// Resource ids referenced by this value; empty for scalars and maps.
    pub fn referenced_ids(&self) -> Vec<&ResourceId> {
        match self {
            Self::Id(id) => vec![id],
            Self::IdList(ids) => ids.iter().collect(),
            Self::Scalar(_) | Self::Map(_) => Vec::new(),
        }
    }

    /// True when this value references `id`. Stored ids act as patterns, so a
    /// stored type pattern references every instance of that type.
    pub fn references(&self, id: &ResourceId) -> bool {
        self.referenced_ids().into_iter().any(|r| r.matches(id))
    }
}

impl From<ResourceId> for PropertyValue {
    fn from(id: ResourceId) -> Self {
        Self::Id(id)
    }
}

impl From<Vec<ResourceId>> for PropertyValue {
    fn from(ids: Vec<ResourceId>) -> Self {
        Self::IdList(ids)
    }
}

/// Errors raised by typed property access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    /// No value is stored at the path.
    #[error("property '{0}' is not set")]
    NotSet(String),
    /// A path segment traversed through a non-map value.
    #[error("property '{path}' cannot be traversed: '{segment}' holds a {found}")]
    NotAMap {
        /// Full path being accessed.
        path: String,
        /// Segment that held the non-map value.
        segment: String,
        /// Variant found at `segment`.
        found: &'static str,
    },
    /// The stored value has a different variant than the operation needs.
    #[error("property '{path}' holds a {found}, expected {expected}")]
    TypeMismatch {
        /// Full path being accessed.
        path: String,
        /// Variant the operation requires.
        expected: &'static str,
        /// Variant actually stored.
        found: &'static str,
    },
    /// The path was empty or had an empty segment.
    #[error("invalid property path '{0}'")]
    InvalidPath(String),
}

/// Ordered bag of named property values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, PropertyValue>);

fn segments(path: &str) -> Result<Vec<&str>, PropertyError> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(PropertyError::InvalidPath(path.to_string()));
    }
    Ok(parts)
}

impl Properties {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no properties are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates top-level entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }

    /// Looks up a dotted path. `Ok(None)` means the path is simply unset.
    pub fn get(&self, path: &str) -> Result<Option<&PropertyValue>, PropertyError> {
        let parts = segments(path)?;
        let mut current = &self.0;
        let last = parts.len() - 1;
        for (i, part) in parts.iter().enumerate() {
            let Some(value) = current.get(*part) else {
                return Ok(None);
            };
            if i == last {
                return Ok(Some(value));
            }
            match value {
                PropertyValue::Map(inner) => current = inner,
                other => {
                    return Err(PropertyError::NotAMap {
                        path: path.to_string(),
                        segment: (*part).to_string(),
                        found: other.kind_name(),
                    })
                }
            }
        }
        Ok(None)
    }

    /// Like [`Properties::get`] but treats an unset path as an error.
    pub fn require(&self, path: &str) -> Result<&PropertyValue, PropertyError> {
        self.get(path)?
            .ok_or_else(|| PropertyError::NotSet(path.to_string()))
    }

    fn slot_mut(
        &mut self,
        path: &str,
    ) -> Result<(&mut BTreeMap<String, PropertyValue>, String), PropertyError> {
        let parts = segments(path)?;
        let (leaf, parents) = parts
            .split_last()
            .ok_or_else(|| PropertyError::InvalidPath(path.to_string()))?;
        let mut current = &mut self.0;
        for part in parents {
            let entry = current
                .entry((*part).to_string())
                .or_insert_with(|| PropertyValue::Map(BTreeMap::new()));
            match entry {
                PropertyValue::Map(inner) => current = inner,
                other => {
                    return Err(PropertyError::NotAMap {
                        path: path.to_string(),
                        segment: (*part).to_string(),
                        found: other.kind_name(),
                    })
                }
            }
        }
        Ok((current, (*leaf).to_string()))
    }

    /// Sets the value at a dotted path, creating intermediate maps.
    pub fn set(&mut self, path: &str, value: PropertyValue) -> Result<(), PropertyError> {
        let (map, leaf) = self.slot_mut(path)?;
        map.insert(leaf, value);
        Ok(())
    }

    /// Appends `id` to the id list at `path`, creating the list when unset.
    /// Appending an id that is already present is a no-op.
    pub fn push_id(&mut self, path: &str, id: ResourceId) -> Result<(), PropertyError> {
        let (map, leaf) = self.slot_mut(path)?;
        match map
            .entry(leaf)
            .or_insert_with(|| PropertyValue::IdList(Vec::new()))
        {
            PropertyValue::IdList(ids) => {
                if !ids.contains(&id) {
                    ids.push(id);
                }
                Ok(())
            }
            other => Err(PropertyError::TypeMismatch {
                path: path.to_string(),
                expected: "id_list",
                found: other.kind_name(),
            }),
        }
    }

    /// Removes and returns the value at a dotted path.
    pub fn remove(&mut self, path: &str) -> Result<Option<PropertyValue>, PropertyError> {
        let (map, leaf) = self.slot_mut(path)?;
        Ok(map.remove(&leaf))
    }
}

impl FromIterator<(String, PropertyValue)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn id(name: &str) -> ResourceId {
        ResourceId::new("aws", "subnet", name)
    }

    #[test]
    fn dotted_paths_create_and_read_nested_maps() {
        let mut props = Properties::new();
        props
            .set("network.subnet", PropertyValue::Id(id("a")))
            .unwrap();
        assert_eq!(
            props.get("network.subnet").unwrap(),
            Some(&PropertyValue::Id(id("a")))
        );
        assert_eq!(props.get("network.missing").unwrap(), None);
        assert!(matches!(
            props.get("network").unwrap(),
            Some(PropertyValue::Map(_))
        ));
    }

    #[test]
    fn traversing_through_scalar_is_typed_error() {
        let mut props = Properties::new();
        props.set("name", PropertyValue::str("db")).unwrap();
        let err = props.get("name.inner").unwrap_err();
        assert!(matches!(err, PropertyError::NotAMap { found: "scalar", .. }));
    }

    #[test]
    fn push_id_appends_once() {
        let mut props = Properties::new();
        props.push_id("subnets", id("a")).unwrap();
        props.push_id("subnets", id("b")).unwrap();
        props.push_id("subnets", id("a")).unwrap();
        assert_eq!(
            props.require("subnets").unwrap(),
            &PropertyValue::IdList(vec![id("a"), id("b")])
        );
    }

    #[test]
    fn push_id_onto_single_id_is_mismatch() {
        let mut props = Properties::new();
        props.set("subnet", PropertyValue::Id(id("a"))).unwrap();
        let err = props.push_id("subnet", id("b")).unwrap_err();
        assert!(matches!(
            err,
            PropertyError::TypeMismatch { expected: "id_list", found: "id", .. }
        ));
    }

    #[test]
    fn references_uses_pattern_matching() {
        let value = PropertyValue::IdList(vec![id("a"), ResourceId::of_type("aws", "vpc")]);
        assert!(value.references(&id("a")));
        assert!(value.references(&ResourceId::new("aws", "vpc", "main")));
        assert!(!value.references(&id("z")));
        assert!(!PropertyValue::str("a").references(&id("a")));
    }

    #[test]
    fn empty_segments_are_rejected() {
        let props = Properties::new();
        assert!(matches!(
            props.get("a..b"),
            Err(PropertyError::InvalidPath(_))
        ));
    }
}
