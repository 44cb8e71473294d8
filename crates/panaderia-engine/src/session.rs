//! # Session Store
//!
//! Opaque server-side sessions. The token handed to the client is 32 bytes
//! of OS randomness, base64url-encoded; it carries no claims and means
//! nothing outside the store, so logout is a plain removal.
//!
//! Sessions are deliberately not persisted: a process restart logs everyone
//! out, and remember-me tokens exist for re-establishing sessions across
//! restarts.

use std::collections::HashMap;
use std::sync::Mutex;

use rand::RngCore;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use panaderia_core::Session;

/// Generates an opaque session token: 32 random bytes, base64url without
/// padding (43 characters).
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Storage for active sessions, keyed by token.
///
/// Sync and object-safe so the auth manager can hold a `Box<dyn
/// SessionStore>`; the in-memory map never blocks long enough to need an
/// async lock.
pub trait SessionStore: Send + Sync {
    fn insert(&self, session: Session);
    fn get(&self, token: &str) -> Option<Session>;
    /// Removes a session, returning it if it existed.
    fn remove(&self, token: &str) -> Option<Session>;
    /// Removes every session belonging to a user (password change, account
    /// disable). Returns how many were removed.
    fn remove_for_user(&self, user_id: &str) -> usize;
}

/// Session store backed by a mutex-guarded HashMap.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session: Session) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.token.clone(), session);
    }

    fn get(&self, token: &str) -> Option<Session> {
        self.sessions.lock().unwrap().get(token).cloned()
    }

    fn remove(&self, token: &str) -> Option<Session> {
        self.sessions.lock().unwrap().remove(token)
    }

    fn remove_for_user(&self, user_id: &str) -> usize {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|_, session| session.user_id != user_id);
        before - sessions.len()
    }
}
