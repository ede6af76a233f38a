//! Per-user dialogue state for the conversation front-end.

use crate::model::Kind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::trace;

/// What the conversation is waiting for from a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "await", rename_all = "snake_case")]
pub enum SessionState {
    /// The user chose expense or income and must now name a category.
    AwaitCategory { kind: Kind },
    /// The user named a category and must now type an amount.
    AwaitAmount { kind: Kind, category: String },
    /// The user asked for a custom report and must now type two dates.
    AwaitCustomRange,
}

/// Storage for `SessionState` keyed by user id. A user has at most one state at a time.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, user_id: i64) -> Option<SessionState>;

    /// Replaces any previous state of `user_id`.
    async fn set(&self, user_id: i64, state: SessionState);

    async fn clear(&self, user_id: i64);
}

/// A `SessionStore` that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessions {
    states: Mutex<HashMap<i64, SessionState>>,
}

impl MemorySessions {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessions {
    async fn get(&self, user_id: i64) -> Option<SessionState> {
        self.states.lock().await.get(&user_id).cloned()
    }

    async fn set(&self, user_id: i64, state: SessionState) {
        trace!("Session of user {user_id} is now {state:?}");
        self.states.lock().await.insert(user_id, state);
    }

    async fn clear(&self, user_id: i64) {
        if self.states.lock().await.remove(&user_id).is_some() {
            trace!("Session of user {user_id} cleared");
        }
    }
}
