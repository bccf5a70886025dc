//! In-memory search store for fast, deterministic handler tests.
//!
//! [`InMemoryDocumentStore`] implements both [`DocumentStore`] and [`IndexAdmin`]
//! with the same idempotent semantics the real search client has, records
//! every call it receives, and can be told to fail chosen operations.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only happens after a test already panicked

use listing_sync_core::decode::NormalizedEntity;
use listing_sync_core::error::{Result, SyncError};
use listing_sync_core::store::{DocumentStore, IndexAdmin, IndexDocument};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// [`DocumentStore::create_document`]
    CreateDocument,
    /// [`DocumentStore::overwrite_document`]
    OverwriteDocument,
    /// [`DocumentStore::delete_document`]
    DeleteDocument,
    /// [`IndexAdmin::delete_index`]
    DeleteIndex,
}

/// A call received by the store, recorded whether or not it succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    /// `create_document`
    CreateDocument {
        /// Target index
        index_name: String,
        /// Document id
        document_id: String,
        /// Document body
        body: NormalizedEntity,
    },
    /// `overwrite_document`
    OverwriteDocument {
        /// Target index
        index_name: String,
        /// Document id
        document_id: String,
        /// Document body
        body: NormalizedEntity,
    },
    /// `delete_document`
    DeleteDocument {
        /// Target index
        index_name: String,
        /// Document id
        document_id: String,
    },
    /// `delete_index`
    DeleteIndex {
        /// Index name
        index_name: String,
    },
}

impl StoreCall {
    /// The operation this call invoked.
    #[must_use]
    pub const fn operation(&self) -> StoreOperation {
        match self {
            Self::CreateDocument { .. } => StoreOperation::CreateDocument,
            Self::OverwriteDocument { .. } => StoreOperation::OverwriteDocument,
            Self::DeleteDocument { .. } => StoreOperation::DeleteDocument,
            Self::DeleteIndex { .. } => StoreOperation::DeleteIndex,
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    indices: HashMap<String, HashMap<String, NormalizedEntity>>,
    calls: Vec<StoreCall>,
    failing: HashSet<StoreOperation>,
}

/// In-memory document store and index admin.
///
/// Clones share state, so a test can hand one clone to a handler and inspect
/// another.
///
/// # Example
///
/// ```
/// use listing_sync_core::store::{DocumentStore, IndexDocument};
/// use listing_sync_testing::InMemoryDocumentStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryDocumentStore::new();
/// let document = IndexDocument::new("screenings", "s1", serde_json::Map::new());
///
/// store.overwrite_document(&document).await?;
/// assert!(store.document("screenings", "s1").is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryDocumentStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call of `operation` fail with a store operation error.
    pub fn fail_on(&self, operation: StoreOperation) {
        self.state.write().unwrap().failing.insert(operation);
    }

    /// Stop failing `operation`.
    pub fn recover(&self, operation: StoreOperation) {
        self.state.write().unwrap().failing.remove(&operation);
    }

    /// Insert a document without recording a call.
    pub fn seed(&self, document: IndexDocument) {
        self.state
            .write()
            .unwrap()
            .indices
            .entry(document.index_name)
            .or_default()
            .insert(document.document_id, document.body);
    }

    /// All calls received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.read().unwrap().calls.clone()
    }

    /// Calls of one operation received so far, in order.
    #[must_use]
    pub fn calls_of(&self, operation: StoreOperation) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.operation() == operation)
            .collect()
    }

    /// Forget recorded calls, keeping stored documents.
    pub fn clear_calls(&self) {
        self.state.write().unwrap().calls.clear();
    }

    /// A stored document.
    #[must_use]
    pub fn document(&self, index_name: &str, document_id: &str) -> Option<NormalizedEntity> {
        self.state
            .read()
            .unwrap()
            .indices
            .get(index_name)
            .and_then(|documents| documents.get(document_id))
            .cloned()
    }

    /// Number of documents in an index (zero if it does not exist).
    #[must_use]
    pub fn document_count(&self, index_name: &str) -> usize {
        self.state
            .read()
            .unwrap()
            .indices
            .get(index_name)
            .map_or(0, HashMap::len)
    }

    /// Whether an index exists.
    #[must_use]
    pub fn index_exists(&self, index_name: &str) -> bool {
        self.state.read().unwrap().indices.contains_key(index_name)
    }

    /// Names of all existing indices, sorted.
    #[must_use]
    pub fn index_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.state.read().unwrap().indices.keys().cloned().collect();
        names.sort();
        names
    }

    /// Record a call and report whether it should fail.
    fn record(&self, call: StoreCall) -> Result<()> {
        let operation = call.operation();
        let mut state = self.state.write().unwrap();
        state.calls.push(call);
        if state.failing.contains(&operation) {
            return Err(SyncError::StoreOperation(format!(
                "injected {operation:?} failure"
            )));
        }
        Ok(())
    }
}

impl DocumentStore for InMemoryDocumentStore {
    async fn create_document(&self, document: &IndexDocument) -> Result<()> {
        self.record(StoreCall::CreateDocument {
            index_name: document.index_name.clone(),
            document_id: document.document_id.clone(),
            body: document.body.clone(),
        })?;
        self.state
            .write()
            .unwrap()
            .indices
            .entry(document.index_name.clone())
            .or_default()
            .entry(document.document_id.clone())
            .or_insert_with(|| document.body.clone());
        Ok(())
    }

    async fn overwrite_document(&self, document: &IndexDocument) -> Result<()> {
        self.record(StoreCall::OverwriteDocument {
            index_name: document.index_name.clone(),
            document_id: document.document_id.clone(),
            body: document.body.clone(),
        })?;
        self.state
            .write()
            .unwrap()
            .indices
            .entry(document.index_name.clone())
            .or_default()
            .insert(document.document_id.clone(), document.body.clone());
        Ok(())
    }

    async fn delete_document(&self, index_name: &str, document_id: &str) -> Result<()> {
        self.record(StoreCall::DeleteDocument {
            index_name: index_name.to_string(),
            document_id: document_id.to_string(),
        })?;
        if let Some(documents) = self.state.write().unwrap().indices.get_mut(index_name) {
            documents.remove(document_id);
        }
        Ok(())
    }
}

impl IndexAdmin for InMemoryDocumentStore {
    async fn delete_index(&self, index_name: &str) -> Result<()> {
        self.record(StoreCall::DeleteIndex {
            index_name: index_name.to_string(),
        })?;
        self.state.write().unwrap().indices.remove(index_name);
        Ok(())
    }
}
