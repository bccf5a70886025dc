//! A handler with scripted outcomes, for testing batch processing in isolation.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity

use listing_sync_core::change::{ChangeEvent, EventKind};
use listing_sync_core::error::{Result, SyncError};
use listing_sync_core::handler::EntityChangeHandler;
use std::collections::HashSet;
use std::sync::Mutex;

/// Handler that fails for chosen entity ids and records what it saw.
///
/// Events of an unsupported kind fail with
/// [`SyncError::UnsupportedEventKind`]; events whose entity id is scripted to
/// fail return a store operation error; everything else is applied.
///
/// # Example
///
/// ```
/// use listing_sync_core::change::ChangeEvent;
/// use listing_sync_core::handler::EntityChangeHandler;
/// use listing_sync_testing::ScriptedHandler;
///
/// # async fn example() {
/// let handler = ScriptedHandler::failing_for(["bad"]);
/// assert!(handler.handle(&ChangeEvent::remove("bad")).await.is_err());
/// assert!(handler.handle(&ChangeEvent::remove("good")).await.is_ok());
/// assert_eq!(handler.applied(), vec!["good"]);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ScriptedHandler {
    failing: HashSet<String>,
    attempts: Mutex<Vec<String>>,
    applied: Mutex<Vec<String>>,
}

impl ScriptedHandler {
    /// Create a handler that fails for the given entity ids.
    pub fn failing_for<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            failing: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Entity ids of every handled event, in order.
    #[must_use]
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    /// Entity ids of successfully applied events, in order.
    #[must_use]
    pub fn applied(&self) -> Vec<String> {
        self.applied.lock().unwrap().clone()
    }
}

impl EntityChangeHandler for ScriptedHandler {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn handle(&self, event: &ChangeEvent) -> Result<()> {
        self.attempts.lock().unwrap().push(event.entity_id.clone());

        if let EventKind::Unsupported(kind) = &event.kind {
            return Err(SyncError::UnsupportedEventKind(kind.clone()));
        }
        if self.failing.contains(&event.entity_id) {
            return Err(SyncError::StoreOperation(format!(
                "scripted failure for {}",
                event.entity_id
            )));
        }

        self.applied.lock().unwrap().push(event.entity_id.clone());
        Ok(())
    }
}
