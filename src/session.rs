//! Ambient authenticated session and its token store
//!
//! The session is created on login (credential exchange or guest mode) and
//! destroyed on logout or on an authentication failure detected anywhere in
//! the system. The token store is read once at construction and written on
//! login/logout.

use serde::{Deserialize, Serialize};

/// Token used by guest mode, which skips the credential exchange
pub const GUEST_TOKEN: &str = "guest_mode";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn guest() -> Self {
        Self::new(GUEST_TOKEN)
    }

    pub fn is_guest(&self) -> bool {
        self.token == GUEST_TOKEN
    }
}

/// Where the login token survives between runs
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

/// Token store with no persistence; used by tests and the demo binary
#[derive(Default)]
pub struct InMemoryTokenStore {
    token: parking_lot::Mutex<Option<String>>,
}

impl InMemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: parking_lot::Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().clone()
    }

    fn save(&self, token: &str) {
        *self.token.lock() = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.lock() = None;
    }
}
