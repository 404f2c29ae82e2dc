//! Session state
//!
//! The access token and broadcaster id are the only state that outlives a
//! run. [`Session`] is the single way to reach them; it is built once at
//! startup and shared by the session manager and the poll publisher.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::store::{KeyValueStore, StoreError};

/// Storage key for the OAuth access token
pub const ACCESS_TOKEN_KEY: &str = "twitchAccessToken";
/// Storage key for the authenticated broadcaster id
pub const BROADCASTER_ID_KEY: &str = "broadcasterId";

/// Authenticated Twitch user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcasterIdentity {
    pub id: String,
    pub display_name: String,
    pub profile_image_url: String,
}

/// Where the session currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No token, or the stored token no longer validates
    NoSession,
    /// A valid token is stored but the identity has not been fetched
    Authenticated,
    /// Token valid and broadcaster identity known
    Ready(BroadcasterIdentity),
}

impl SessionState {
    /// Whether polls can be created in this state
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready(_))
    }
}

/// Shared handle over the persisted session values
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored access token; empty strings count as absent
    pub fn access_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.store.get(ACCESS_TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    pub fn set_access_token(&self, token: &str) -> Result<(), StoreError> {
        self.store.set(ACCESS_TOKEN_KEY, token)
    }

    /// Stored broadcaster id; empty strings count as absent
    pub fn broadcaster_id(&self) -> Result<Option<String>, StoreError> {
        Ok(self.store.get(BROADCASTER_ID_KEY)?.filter(|id| !id.is_empty()))
    }

    pub fn set_broadcaster_id(&self, id: &str) -> Result<(), StoreError> {
        self.store.set(BROADCASTER_ID_KEY, id)
    }

    /// Drop both values (explicit logout)
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(ACCESS_TOKEN_KEY)?;
        self.store.remove(BROADCASTER_ID_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_session_accessors_use_storage_keys() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone());

        session.set_access_token("tok").unwrap();
        session.set_broadcaster_id("1234").unwrap();

        assert_eq!(store.get("twitchAccessToken").unwrap().as_deref(), Some("tok"));
        assert_eq!(store.get("broadcasterId").unwrap().as_deref(), Some("1234"));
        assert_eq!(session.access_token().unwrap().as_deref(), Some("tok"));
        assert_eq!(session.broadcaster_id().unwrap().as_deref(), Some("1234"));
    }

    #[test]
    fn test_empty_values_are_absent() {
        let session = Session::new(Arc::new(MemoryStore::new()));
        session.set_access_token("").unwrap();
        assert_eq!(session.access_token().unwrap(), None);
    }

    #[test]
    fn test_clear() {
        let session = Session::new(Arc::new(MemoryStore::new()));
        session.set_access_token("tok").unwrap();
        session.set_broadcaster_id("1").unwrap();
        session.clear().unwrap();
        assert_eq!(session.access_token().unwrap(), None);
        assert_eq!(session.broadcaster_id().unwrap(), None);
    }

    #[test]
    fn test_state_is_ready() {
        assert!(!SessionState::NoSession.is_ready());
        assert!(!SessionState::Authenticated.is_ready());
        assert!(SessionState::Ready(BroadcasterIdentity {
            id: "1".into(),
            display_name: "d".into(),
            profile_image_url: "u".into(),
        })
        .is_ready());
    }
}
