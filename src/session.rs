//! Per-session search and navigation state.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LecternError, Result};
use crate::navigation::NavigationContext;
use crate::query::SearchQuery;

/// Opaque session handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = LecternError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(SessionId)
            .map_err(|e| LecternError::invalid_query(format!("bad session id {s:?}: {e}")))
    }
}

/// What a session remembers between requests.
///
/// Values are never mutated once stored; updates produce a new state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub last_search: Option<SearchQuery>,
    pub navigation: Option<NavigationContext>,
}

impl SessionState {
    pub fn with_search(&self, query: SearchQuery) -> Self {
        SessionState {
            last_search: Some(query),
            navigation: self.navigation.clone(),
        }
    }

    pub fn with_navigation(&self, context: NavigationContext) -> Self {
        SessionState {
            last_search: self.last_search.clone(),
            navigation: Some(context),
        }
    }
}

/// Session states keyed by id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<SessionState>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<SessionState>> {
        self.sessions.read().get(id).cloned()
    }

    /// Replace the state of a session and return the stored value.
    pub fn put(&self, id: SessionId, state: SessionState) -> Arc<SessionState> {
        let state = Arc::new(state);
        self.sessions.write().insert(id, state.clone());
        state
    }

    /// Build a new state from the current one (or the default) and store it.
    pub fn update<F>(&self, id: SessionId, f: F) -> Arc<SessionState>
    where
        F: FnOnce(&SessionState) -> SessionState,
    {
        let mut sessions = self.sessions.write();
        let next = match sessions.get(&id) {
            Some(current) => f(current),
            None => f(&SessionState::default()),
        };
        let next = Arc::new(next);
        sessions.insert(id, next.clone());
        next
    }

    pub fn remove(&self, id: &SessionId) -> Option<Arc<SessionState>> {
        self.sessions.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
