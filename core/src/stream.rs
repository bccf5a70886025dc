//! Change stream envelope.
//!
//! The transport hands over batches in the primary store's stream record shape
//! (DynamoDB Streams):
//!
//! ```text
//! {
//!   "Records": [
//!     {
//!       "eventID": "1",
//!       "eventName": "INSERT",
//!       "dynamodb": {
//!         "Keys":     { "id": { "S": "s1" } },
//!         "NewImage": { "id": { "S": "s1" }, "title": { "S": "x" } },
//!         "OldImage": null
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! Only a malformed envelope fails [`ChangeBatch::from_json`]. Individual
//! records always convert into a [`ChangeEvent`]; their problems (unknown event
//! names, missing ids, bad attribute values) surface when the record is handled.

use crate::change::{AttributeMap, AttributeValue, ChangeEvent, EventKind};
use crate::decode::ID_FIELD;
use serde::{Deserialize, Deserializer};

/// One batch of change stream records, in delivery order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeBatch {
    /// Records in delivery order
    #[serde(rename = "Records", default, deserialize_with = "null_as_default")]
    pub records: Vec<StreamRecord>,
}

/// One change stream record.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamRecord {
    /// Transport-assigned record id
    #[serde(rename = "eventID", default)]
    pub event_id: Option<String>,
    /// `INSERT`, `MODIFY`, `REMOVE`, or anything else the transport sends
    #[serde(rename = "eventName", default, deserialize_with = "null_as_default")]
    pub event_name: String,
    /// Keys and images
    #[serde(rename = "dynamodb", default, deserialize_with = "null_as_default")]
    pub change: StreamChange,
}

/// Keys and images of a stream record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamChange {
    /// Primary key attributes
    #[serde(default, deserialize_with = "null_as_default")]
    pub keys: AttributeMap,
    /// Item state after the mutation
    #[serde(default)]
    pub new_image: Option<AttributeMap>,
    /// Item state before the mutation
    #[serde(default)]
    pub old_image: Option<AttributeMap>,
}

/// Absent and `null` both read as the default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_id(attributes: Option<&AttributeMap>) -> Option<&str> {
    match attributes?.get(ID_FIELD)? {
        AttributeValue::S(id) if !id.is_empty() => Some(id.as_str()),
        _ => None,
    }
}

impl StreamRecord {
    /// Convert into a change event.
    ///
    /// The entity id is the `id` key, falling back to the `id` of the new image
    /// and then of the old image. It is empty when none of them carry one.
    #[must_use]
    pub fn into_event(self) -> ChangeEvent {
        let StreamChange {
            keys,
            new_image,
            old_image,
        } = self.change;

        let entity_id = string_id(Some(&keys))
            .or_else(|| string_id(new_image.as_ref()))
            .or_else(|| string_id(old_image.as_ref()))
            .unwrap_or_default()
            .to_string();

        ChangeEvent {
            kind: EventKind::from(self.event_name.as_str()),
            entity_id,
            after_image: new_image,
            before_image: old_image,
        }
    }
}

impl ChangeBatch {
    /// Parse a batch envelope.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the payload is not a valid envelope.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Convert every record into a change event, preserving delivery order.
    #[must_use]
    pub fn into_events(self) -> Vec<ChangeEvent> {
        self.records.into_iter().map(StreamRecord::into_event).collect()
    }
}
