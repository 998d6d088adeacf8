//! Typed attribute keys and their containers
//!
//! Attributes describe what a consumer requires and what a producer offers.
//! A key is a name plus a type tag; two keys with the same name but different
//! types are a user error. Containers come in a mutable form owned by a
//! configuration and an immutable snapshot form shared with resolution
//! results and transform registrations.

use crate::error::{ConfigResult, ConfigurationError};
use lazy_static::lazy_static;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Runtime type of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    String,
    Boolean,
    Integer,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "String",
            TypeTag::Boolean => "Boolean",
            TypeTag::Integer => "Integer",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value stored against an attribute key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeValue {
    String(String),
    Boolean(bool),
    Integer(i64),
}

impl AttributeValue {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            AttributeValue::String(_) => TypeTag::String,
            AttributeValue::Boolean(_) => TypeTag::Boolean,
            AttributeValue::Integer(_) => TypeTag::Integer,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(v) => write!(f, "{}", v),
            AttributeValue::Boolean(v) => write!(f, "{}", v),
            AttributeValue::Integer(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Boolean(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

/// A typed attribute key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    type_tag: TypeTag,
}

impl Attribute {
    pub fn of(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            type_tag,
        }
    }

    /// Shorthand for the common string-typed key.
    pub fn string(name: impl Into<String>) -> Self {
        Self::of(name, TypeTag::String)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Mutable attribute container. Storage is lazily allocated on first insert.
#[derive(Debug, Clone, Default)]
pub struct AttributeContainer {
    attributes: Option<FxHashMap<Attribute, AttributeValue>>,
}

impl AttributeContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value for `key`. Rejects a value whose runtime type does not
    /// match the key, and a key whose name collides with an existing key of a
    /// different type.
    pub fn insert(&mut self, key: Attribute, value: AttributeValue) -> ConfigResult<()> {
        if value.type_tag() != key.type_tag() {
            return Err(ConfigurationError::AttributeTypeMismatch {
                name: key.name().to_string(),
                expected: key.type_tag(),
                actual: value.type_tag(),
            });
        }
        if let Some(attributes) = &self.attributes {
            for existing in attributes.keys() {
                if existing.name() == key.name() && existing.type_tag() != key.type_tag() {
                    return Err(ConfigurationError::AttributeNameCollision {
                        name: key.name().to_string(),
                        existing: existing.type_tag(),
                        requested: key.type_tag(),
                    });
                }
            }
        }
        self.attributes
            .get_or_insert_with(FxHashMap::default)
            .insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &Attribute) -> Option<&AttributeValue> {
        self.attributes.as_ref().and_then(|a| a.get(key))
    }

    pub fn contains(&self, key: &Attribute) -> bool {
        self.attributes
            .as_ref()
            .map_or(false, |a| a.contains_key(key))
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.as_ref().map_or(true, |a| a.is_empty())
    }

    pub fn keys(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().flat_map(|a| a.keys())
    }

    /// Snapshot the current contents. An empty container yields the shared
    /// process-wide empty snapshot.
    pub fn as_immutable(&self) -> ImmutableAttributes {
        match &self.attributes {
            None => ImmutableAttributes::empty(),
            Some(map) if map.is_empty() => ImmutableAttributes::empty(),
            Some(map) => ImmutableAttributes {
                attributes: Arc::new(map.clone()),
            },
        }
    }
}

lazy_static! {
    static ref EMPTY: ImmutableAttributes = ImmutableAttributes {
        attributes: Arc::new(FxHashMap::default()),
    };
}

/// Immutable snapshot of an attribute container.
#[derive(Debug, Clone)]
pub struct ImmutableAttributes {
    attributes: Arc<FxHashMap<Attribute, AttributeValue>>,
}

impl ImmutableAttributes {
    pub fn empty() -> Self {
        EMPTY.clone()
    }

    /// Convenience constructor running each entry through the mutable
    /// container's validation.
    pub fn of<I>(entries: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (Attribute, AttributeValue)>,
    {
        let mut container = AttributeContainer::new();
        for (key, value) in entries {
            container.insert(key, value)?;
        }
        Ok(container.as_immutable())
    }

    pub fn get(&self, key: &Attribute) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn contains(&self, key: &Attribute) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.keys()
    }

    /// Snapshots of a snapshot are the snapshot itself.
    pub fn as_immutable(&self) -> ImmutableAttributes {
        self.clone()
    }

    /// The snapshot cannot be written to.
    pub fn insert(&self, _key: Attribute, _value: AttributeValue) -> ConfigResult<()> {
        Err(ConfigurationError::ImmutableAttributes)
    }
}

impl PartialEq for ImmutableAttributes {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
    }
}

impl Eq for ImmutableAttributes {}

impl fmt::Display for ImmutableAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.attributes.iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.name().cmp(b.name()));
        write!(f, "{{")?;
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key.name(), value)?;
        }
        write!(f, "}}")
    }
}
