//! Change image fixtures.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use listing_sync_core::change::AttributeMap;
use serde_json::{json, Value};

/// Parse a type-tagged JSON object into an attribute map.
///
/// Panics if `value` is not an object.
#[must_use]
pub fn image(value: Value) -> AttributeMap {
    serde_json::from_value(value).unwrap()
}

/// Image of a screening with the given timestamps.
#[must_use]
pub fn screening_image(id: &str, created_at: &str, updated_at: &str, title: &str) -> AttributeMap {
    image(json!({
        "id": {"S": id},
        "createdAt": {"S": created_at},
        "updatedAt": {"S": updated_at},
        "title": {"S": title}
    }))
}

/// Image of an article belonging to a screening.
#[must_use]
pub fn article_image(id: &str, screening_id: &str, title: &str) -> AttributeMap {
    image(json!({
        "id": {"S": id},
        "screeningId": {"S": screening_id},
        "title": {"S": title}
    }))
}
