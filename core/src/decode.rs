//! Decoding of type-tagged change images into normalized entities.
//!
//! [`decode`] is a pure function: it turns an [`AttributeMap`] into a plain JSON
//! object, which is the shape documents take in the search index. [`Article`] and
//! [`Screening`] layer the per-entity field requirements on top of it.

use crate::change::{AttributeMap, AttributeValue};
use crate::error::DecodeError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Number, Value};

/// A decoded entity: field name to plain JSON value.
pub type NormalizedEntity = Map<String, Value>;

/// Field holding an entity's id.
pub const ID_FIELD: &str = "id";
/// Screening creation timestamp field.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Screening last-update timestamp field.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Decode a raw attribute map into a normalized entity.
///
/// # Errors
///
/// Returns [`DecodeError`] if any value, at any nesting depth, is unrecognized
/// or is a number that is not a finite decimal.
pub fn decode(raw: &AttributeMap) -> Result<NormalizedEntity, DecodeError> {
    raw.iter()
        .map(|(field, value)| Ok::<_, DecodeError>((field.clone(), decode_value(field, value)?)))
        .collect()
}

fn decode_value(field: &str, value: &AttributeValue) -> Result<Value, DecodeError> {
    Ok(match value {
        AttributeValue::S(s) | AttributeValue::B(s) => Value::String(s.clone()),
        AttributeValue::N(n) => Value::Number(decode_number(field, n)?),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null => Value::Null,
        AttributeValue::M(map) => Value::Object(decode(map)?),
        AttributeValue::L(items) => Value::Array(
            items
                .iter()
                .map(|item| decode_value(field, item))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::Ss(items) | AttributeValue::Bs(items) => {
            Value::Array(items.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(items) => Value::Array(
            items
                .iter()
                .map(|n| decode_number(field, n).map(Value::Number))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::Unrecognized(raw) => {
            return Err(DecodeError::Unrecognized {
                field: field.to_string(),
                raw: raw.clone(),
            });
        }
    })
}

fn decode_number(field: &str, raw: &str) -> Result<Number, DecodeError> {
    let trimmed = raw.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Ok(Number::from(int));
    }
    if let Ok(int) = trimmed.parse::<u64>() {
        return Ok(Number::from(int));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| DecodeError::InvalidNumber {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

const fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "NULL",
        Value::Bool(_) => "BOOL",
        Value::Number(_) => "N",
        Value::String(_) => "S",
        Value::Array(_) => "L",
        Value::Object(_) => "M",
    }
}

/// Look up a required string field of a decoded entity.
///
/// # Errors
///
/// Returns [`DecodeError::MissingField`] if the field is absent and
/// [`DecodeError::TypeMismatch`] if it is not a string.
pub fn require_str<'a>(entity: &'a NormalizedEntity, field: &str) -> Result<&'a str, DecodeError> {
    match entity.get(field) {
        None => Err(DecodeError::missing(field)),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(DecodeError::TypeMismatch {
            field: field.to_string(),
            expected: "S",
            found: shape(other),
        }),
    }
}

/// Parse an ISO-8601 datetime string.
///
/// Accepts RFC 3339 (`2024-01-01T00:00:00Z`, with offset or fractional
/// seconds), a datetime without offset (read as UTC), or a bare date
/// (midnight UTC).
///
/// # Errors
///
/// Returns [`DecodeError::InvalidTimestamp`] if none of the forms match.
pub fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, DecodeError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| DecodeError::InvalidTimestamp {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

/// A normalized article.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Article id
    pub id: String,
    /// All decoded fields, `id` included
    pub fields: NormalizedEntity,
}

impl Article {
    /// Decode an article from its change image.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the image cannot be decoded or has no string `id`.
    pub fn decode(raw: &AttributeMap) -> Result<Self, DecodeError> {
        let fields = decode(raw)?;
        let id = require_str(&fields, ID_FIELD)?.to_string();
        Ok(Self { id, fields })
    }
}

/// A normalized screening.
#[derive(Debug, Clone, PartialEq)]
pub struct Screening {
    /// Screening id (the change event's entity id)
    pub id: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
    /// All decoded fields, timestamps still in their ISO form
    pub fields: NormalizedEntity,
}

impl Screening {
    /// Decode the screening identified by `id` from its change image.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the image cannot be decoded, or if `createdAt`
    /// or `updatedAt` is missing, not a string, or not a datetime.
    pub fn decode(id: &str, raw: &AttributeMap) -> Result<Self, DecodeError> {
        let fields = decode(raw)?;
        let created_at = parse_timestamp(CREATED_AT_FIELD, require_str(&fields, CREATED_AT_FIELD)?)?;
        let updated_at = parse_timestamp(UPDATED_AT_FIELD, require_str(&fields, UPDATED_AT_FIELD)?)?;
        Ok(Self {
            id: id.to_string(),
            created_at,
            updated_at,
            fields,
        })
    }

    /// Index body: all fields, `id` set to the screening id and timestamps as
    /// epoch milliseconds.
    #[must_use]
    pub fn into_document_body(self) -> NormalizedEntity {
        let mut body = self.fields;
        body.insert(ID_FIELD.to_string(), Value::String(self.id));
        body.insert(
            CREATED_AT_FIELD.to_string(),
            Value::from(self.created_at.timestamp_millis()),
        );
        body.insert(
            UPDATED_AT_FIELD.to_string(),
            Value::from(self.updated_at.timestamp_millis()),
        );
        body
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn image(value: Value) -> AttributeMap {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_decode_all_tags() {
        let raw = image(json!({
            "id": {"S": "a1"},
            "count": {"N": "3"},
            "ratio": {"N": "0.25"},
            "blob": {"B": "AAE="},
            "draft": {"BOOL": true},
            "deleted": {"NULL": true},
            "meta": {"M": {"lang": {"S": "en"}}},
            "mixed": {"L": [{"S": "x"}, {"N": "1"}]},
            "tags": {"SS": ["a", "b"]},
            "scores": {"NS": ["1", "2.5"]},
            "blobs": {"BS": ["AA=="]}
        }));

        let entity = decode(&raw).unwrap();
        assert_eq!(
            Value::Object(entity),
            json!({
                "id": "a1",
                "count": 3,
                "ratio": 0.25,
                "blob": "AAE=",
                "draft": true,
                "deleted": null,
                "meta": {"lang": "en"},
                "mixed": ["x", 1],
                "tags": ["a", "b"],
                "scores": [1, 2.5],
                "blobs": ["AA=="]
            })
        );
    }

    #[test]
    fn test_decode_keeps_large_unsigned_exact() {
        let raw = image(json!({"views": {"N": "18446744073709551615"}, "delta": {"N": "-9223372036854775808"}}));
        let entity = decode(&raw).unwrap();

        assert_eq!(entity["views"].as_u64(), Some(u64::MAX));
        assert_eq!(entity["delta"].as_i64(), Some(i64::MIN));
    }

    #[test]
    fn test_decode_rejects_bad_number() {
        let raw = image(json!({"count": {"N": "three"}}));
        assert_eq!(
            decode(&raw),
            Err(DecodeError::InvalidNumber {
                field: "count".into(),
                value: "three".into()
            })
        );

        let raw = image(json!({"scores": {"NS": ["1", "NaN"]}}));
        assert!(matches!(decode(&raw), Err(DecodeError::InvalidNumber { .. })));
    }

    #[test]
    fn test_decode_rejects_nested_unrecognized_value() {
        let raw = image(json!({"meta": {"M": {"bad": {"Q": "?"}}}}));
        assert!(matches!(
            decode(&raw),
            Err(DecodeError::Unrecognized { field, .. }) if field == "bad"
        ));
    }

    #[test]
    fn test_article_requires_string_id() {
        let missing = image(json!({"title": {"S": "t"}}));
        assert_eq!(Article::decode(&missing), Err(DecodeError::missing("id")));

        let numeric = image(json!({"id": {"N": "7"}}));
        assert_eq!(
            Article::decode(&numeric),
            Err(DecodeError::TypeMismatch {
                field: "id".into(),
                expected: "S",
                found: "N"
            })
        );

        let article = Article::decode(&image(json!({"id": {"S": "a1"}}))).unwrap();
        assert_eq!(article.id, "a1");
    }

    #[test]
    fn test_screening_body_converts_timestamps() {
        let raw = image(json!({
            "id": {"S": "s1"},
            "createdAt": {"S": "2024-01-01T00:00:00Z"},
            "updatedAt": {"S": "2024-01-01T00:00:00.500+01:00"},
            "title": {"S": "x"}
        }));

        let body = Screening::decode("s1", &raw).unwrap().into_document_body();
        assert_eq!(
            Value::Object(body),
            json!({
                "id": "s1",
                "createdAt": 1_704_067_200_000_i64,
                "updatedAt": 1_704_063_600_500_i64,
                "title": "x"
            })
        );
    }

    #[test]
    fn test_screening_id_comes_from_event() {
        let raw = image(json!({
            "createdAt": {"S": "2024-01-01"},
            "updatedAt": {"S": "2024-01-01T12:00:00"}
        }));

        let body = Screening::decode("s9", &raw).unwrap().into_document_body();
        assert_eq!(body["id"], json!("s9"));
        assert_eq!(body["createdAt"], json!(1_704_067_200_000_i64));
        assert_eq!(body["updatedAt"], json!(1_704_110_400_000_i64));
    }

    #[test]
    fn test_screening_rejects_bad_timestamps() {
        let missing = image(json!({"createdAt": {"S": "2024-01-01T00:00:00Z"}}));
        assert_eq!(
            Screening::decode("s1", &missing),
            Err(DecodeError::missing("updatedAt"))
        );

        let garbage = image(json!({
            "createdAt": {"S": "yesterday"},
            "updatedAt": {"S": "2024-01-01T00:00:00Z"}
        }));
        assert_eq!(
            Screening::decode("s1", &garbage),
            Err(DecodeError::InvalidTimestamp {
                field: "createdAt".into(),
                value: "yesterday".into()
            })
        );
    }
}
