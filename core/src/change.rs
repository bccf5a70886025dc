//! Change events and their type-tagged attribute images.
//!
//! # Overview
//!
//! A [`ChangeEvent`] describes one insert, modify or remove on a primary-store
//! item. It carries the item's id and, depending on the capture mode, the
//! item's state after the mutation (`after_image`) and before it
//! (`before_image`).
//!
//! Images use the primary store's native encoding: every value is a
//! single-entry object whose key is a type tag.
//!
//! ```text
//! { "id": { "S": "s1" }, "seats": { "N": "42" }, "tags": { "SS": ["a", "b"] } }
//! ```
//!
//! Unrecognized tags are kept as [`AttributeValue::Unrecognized`] instead of
//! failing deserialization, so one bad record cannot poison the batch that
//! carries it. The decoder rejects them when the record is handled.

use crate::error::DecodeError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Field name to type-tagged raw value.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// One type-tagged value from a change image.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum AttributeValue {
    /// `S`: string
    S(String),
    /// `N`: number, as a decimal string
    N(String),
    /// `B`: binary, base64 encoded
    B(String),
    /// `BOOL`: boolean
    Bool(bool),
    /// `NULL`: explicit null
    Null,
    /// `M`: nested map
    M(AttributeMap),
    /// `L`: heterogeneous list
    L(Vec<AttributeValue>),
    /// `SS`: string set
    Ss(Vec<String>),
    /// `NS`: number set
    Ns(Vec<String>),
    /// `BS`: binary set
    Bs(Vec<String>),
    /// Anything that is not a well-formed tagged value
    Unrecognized(String),
}

impl AttributeValue {
    /// The wire tag for this value.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
            Self::B(_) => "B",
            Self::Bool(_) => "BOOL",
            Self::Null => "NULL",
            Self::M(_) => "M",
            Self::L(_) => "L",
            Self::Ss(_) => "SS",
            Self::Ns(_) => "NS",
            Self::Bs(_) => "BS",
            Self::Unrecognized(_) => "unrecognized",
        }
    }

    /// Shorthand for a string value.
    pub fn s(value: impl Into<String>) -> Self {
        Self::S(value.into())
    }

    /// Shorthand for a number value.
    pub fn n(value: impl ToString) -> Self {
        Self::N(value.to_string())
    }
}

fn string_list(items: &[Value]) -> Option<Vec<String>> {
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

impl From<Value> for AttributeValue {
    fn from(raw: Value) -> Self {
        let Value::Object(object) = raw else {
            return Self::Unrecognized(raw.to_string());
        };
        if object.len() != 1 {
            return Self::Unrecognized(Value::Object(object).to_string());
        }
        let Some((tag, value)) = object.into_iter().next() else {
            return Self::Unrecognized("{}".to_string());
        };

        match (tag.as_str(), value) {
            ("S", Value::String(s)) => Self::S(s),
            ("N", Value::String(n)) => Self::N(n),
            ("B", Value::String(b)) => Self::B(b),
            ("BOOL", Value::Bool(b)) => Self::Bool(b),
            ("NULL", Value::Bool(true)) => Self::Null,
            ("M", Value::Object(entries)) => Self::M(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
            ("L", Value::Array(items)) => Self::L(items.into_iter().map(Self::from).collect()),
            ("SS", Value::Array(items)) => string_list(&items)
                .map_or_else(|| Self::Unrecognized(format!("SS{items:?}")), Self::Ss),
            ("NS", Value::Array(items)) => string_list(&items)
                .map_or_else(|| Self::Unrecognized(format!("NS{items:?}")), Self::Ns),
            ("BS", Value::Array(items)) => string_list(&items)
                .map_or_else(|| Self::Unrecognized(format!("BS{items:?}")), Self::Bs),
            (tag, value) => Self::Unrecognized(format!("{tag}:{value}")),
        }
    }
}

/// Kind of mutation a change event describes.
///
/// Anything other than `INSERT`, `MODIFY` or `REMOVE` is preserved as
/// [`EventKind::Unsupported`] so handlers can reject it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Item created
    Insert,
    /// Item updated
    Modify,
    /// Item deleted
    Remove,
    /// Any other event name
    Unsupported(String),
}

impl EventKind {
    /// Wire name of this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Insert => "INSERT",
            Self::Modify => "MODIFY",
            Self::Remove => "REMOVE",
            Self::Unsupported(name) => name,
        }
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        match name {
            "INSERT" => Self::Insert,
            "MODIFY" => Self::Modify,
            "REMOVE" => Self::Remove,
            other => Self::Unsupported(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mutation on a primary-store item.
///
/// # Example
///
/// ```
/// use listing_sync_core::change::{AttributeMap, AttributeValue, ChangeEvent, EventKind};
///
/// let mut image = AttributeMap::new();
/// image.insert("id".to_string(), AttributeValue::s("a1"));
///
/// let event = ChangeEvent::insert("a1", image);
/// assert_eq!(event.kind, EventKind::Insert);
/// assert!(event.after_image().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Mutation kind
    pub kind: EventKind,
    /// Id of the mutated item
    pub entity_id: String,
    /// Item state after the mutation
    pub after_image: Option<AttributeMap>,
    /// Item state before the mutation
    pub before_image: Option<AttributeMap>,
}

impl ChangeEvent {
    /// Create an event without images.
    pub fn new(kind: EventKind, entity_id: impl Into<String>) -> Self {
        Self {
            kind,
            entity_id: entity_id.into(),
            after_image: None,
            before_image: None,
        }
    }

    /// Create an `INSERT` event carrying the new image.
    pub fn insert(entity_id: impl Into<String>, after_image: AttributeMap) -> Self {
        Self::new(EventKind::Insert, entity_id).with_after_image(after_image)
    }

    /// Create a `MODIFY` event carrying the new image.
    pub fn modify(entity_id: impl Into<String>, after_image: AttributeMap) -> Self {
        Self::new(EventKind::Modify, entity_id).with_after_image(after_image)
    }

    /// Create a `REMOVE` event.
    pub fn remove(entity_id: impl Into<String>) -> Self {
        Self::new(EventKind::Remove, entity_id)
    }

    /// Attach the post-mutation image.
    #[must_use]
    pub fn with_after_image(mut self, image: AttributeMap) -> Self {
        self.after_image = Some(image);
        self
    }

    /// Attach the pre-mutation image.
    #[must_use]
    pub fn with_before_image(mut self, image: AttributeMap) -> Self {
        self.before_image = Some(image);
        self
    }

    /// The post-mutation image, required for inserts and modifications.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MissingImage`] if the event carries no after image.
    pub fn after_image(&self) -> Result<&AttributeMap, DecodeError> {
        self.after_image
            .as_ref()
            .ok_or_else(|| DecodeError::MissingImage {
                kind: self.kind.to_string(),
                image: "after",
            })
    }

    /// The entity id, rejecting events that do not carry one.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MissingEntityId`] if the id is empty.
    pub fn require_entity_id(&self) -> Result<&str, DecodeError> {
        if self.entity_id.is_empty() {
            Err(DecodeError::MissingEntityId)
        } else {
            Ok(&self.entity_id)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> AttributeValue {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_scalar_tags() {
        assert_eq!(parse(json!({"S": "x"})), AttributeValue::s("x"));
        assert_eq!(parse(json!({"N": "1.5"})), AttributeValue::N("1.5".into()));
        assert_eq!(parse(json!({"BOOL": false})), AttributeValue::Bool(false));
        assert_eq!(parse(json!({"NULL": true})), AttributeValue::Null);
    }

    #[test]
    fn test_nested_tags() {
        let value = parse(json!({"M": {"tags": {"SS": ["a", "b"]}, "list": {"L": [{"N": "1"}]}}}));
        let AttributeValue::M(map) = value else {
            unreachable!("expected a map");
        };
        assert_eq!(map["tags"], AttributeValue::Ss(vec!["a".into(), "b".into()]));
        assert_eq!(map["list"], AttributeValue::L(vec![AttributeValue::n(1)]));
    }

    #[test]
    fn test_malformed_values_are_kept_as_unrecognized() {
        assert_eq!(parse(json!({"X": "?"})).tag(), "unrecognized");
        assert_eq!(parse(json!({"N": 5})).tag(), "unrecognized");
        assert_eq!(parse(json!({"S": "a", "N": "1"})).tag(), "unrecognized");
        assert_eq!(parse(json!("plain")).tag(), "unrecognized");
        assert_eq!(parse(json!({"SS": [1, 2]})).tag(), "unrecognized");
    }

    #[test]
    fn test_event_kind_names() {
        assert_eq!(EventKind::from("INSERT"), EventKind::Insert);
        assert_eq!(EventKind::from("MODIFY"), EventKind::Modify);
        assert_eq!(EventKind::from("REMOVE"), EventKind::Remove);
        assert_eq!(
            EventKind::from("REPLACE"),
            EventKind::Unsupported("REPLACE".to_string())
        );
        assert_eq!(EventKind::from("insert").to_string(), "insert");
    }

    #[test]
    fn test_after_image_required() {
        let err = ChangeEvent::new(EventKind::Modify, "a1")
            .after_image()
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingImage {
                kind: "MODIFY".to_string(),
                image: "after"
            }
        );
    }

    #[test]
    fn test_empty_entity_id_rejected() {
        assert_eq!(
            ChangeEvent::remove("").require_entity_id(),
            Err(DecodeError::MissingEntityId)
        );
        assert_eq!(ChangeEvent::remove("s1").require_entity_id(), Ok("s1"));
    }
}
