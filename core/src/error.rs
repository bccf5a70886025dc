//! Error types for index synchronization.
//!
//! Every failure a handler can produce falls into one of three kinds:
//!
//! - [`SyncError::Decode`]: the change image is malformed or incomplete
//! - [`SyncError::UnsupportedEventKind`]: the event kind is not insert/modify/remove
//! - [`SyncError::StoreOperation`]: a document store or index admin call failed
//!
//! The batch processor catches all three per record, so none of them abort a batch.

/// Error raised while decoding a change image into a normalized entity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A required field is absent
    #[error("missing required field '{field}'")]
    MissingField {
        /// Field name
        field: String,
    },

    /// A field carries a different type tag than expected
    #[error("field '{field}' has type {found}, expected {expected}")]
    TypeMismatch {
        /// Field name
        field: String,
        /// Expected type tag or shape
        expected: &'static str,
        /// Type tag actually present
        found: &'static str,
    },

    /// A value is not a well-formed type-tagged value
    #[error("field '{field}' holds an unrecognized value {raw}")]
    Unrecognized {
        /// Field name
        field: String,
        /// Raw value as received
        raw: String,
    },

    /// A number-tagged value is not a finite decimal
    #[error("field '{field}' holds an invalid number '{value}'")]
    InvalidNumber {
        /// Field name
        field: String,
        /// Raw decimal string
        value: String,
    },

    /// A timestamp field could not be parsed as an ISO-8601 datetime
    #[error("field '{field}' holds an invalid timestamp '{value}'")]
    InvalidTimestamp {
        /// Field name
        field: String,
        /// Raw timestamp string
        value: String,
    },

    /// The event kind requires an image the event does not carry
    #[error("{kind} event carries no {image} image")]
    MissingImage {
        /// Event kind name
        kind: String,
        /// Which image was expected ("after" or "before")
        image: &'static str,
    },

    /// The event does not identify the entity it describes
    #[error("event carries no entity id")]
    MissingEntityId,

    /// An id cannot be embedded in an index name
    #[error("id '{id}' cannot be used in an index name: {reason}")]
    InvalidIndexId {
        /// Offending id
        id: String,
        /// Rule it breaks
        reason: &'static str,
    },
}

impl DecodeError {
    /// Build a [`DecodeError::MissingField`].
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

/// Error type for handling a single change event.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Malformed or missing fields in a change image
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Event kind outside insert/modify/remove
    #[error("Unsupported event kind: {0}")]
    UnsupportedEventKind(String),

    /// Downstream document store or index admin call failed
    #[error("Store operation error: {0}")]
    StoreOperation(String),
}

impl SyncError {
    /// Short, stable label for this error's kind.
    ///
    /// Used as a log field and as the `outcome` label on record metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode_error",
            Self::UnsupportedEventKind(_) => "unsupported_event_kind",
            Self::StoreOperation(_) => "store_operation_error",
        }
    }
}

/// Result type for index synchronization.
pub type Result<T> = std::result::Result<T, SyncError>;
