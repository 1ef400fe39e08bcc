/*
[INPUT]:  Session tokens accepted or rejected by the server
[OUTPUT]: The connection's current token copy and its metadata
[POS]:    Auth layer - in-memory token lifecycle (never persisted)
[UPDATE]: When token metadata or clearing rules change
*/

use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

/// Stored token with metadata
#[derive(Debug, Clone)]
pub struct TokenData {
    pub token: String,
    /// Account the server bound the token to, once authorized
    pub loginid: Option<String>,
    pub stored_at: DateTime<Utc>,
}

/// Thread-safe holder of the token used for the authorize handshake
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    data: Arc<RwLock<Option<TokenData>>>,
}

impl TokenStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a token, replacing any previous one
    pub fn set_token(&self, token: impl Into<String>) {
        let token_data = TokenData {
            token: token.into(),
            loginid: None,
            stored_at: Utc::now(),
        };

        let mut guard = self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(token_data);
    }

    /// Record the account the current token authorized
    pub fn set_loginid(&self, loginid: impl Into<String>) {
        let mut guard = self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(data) = guard.as_mut() {
            data.loginid = Some(loginid.into());
        }
    }

    /// Get the current token if available
    pub fn get_token(&self) -> Option<String> {
        let guard = self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.as_ref().map(|data| data.token.clone())
    }

    /// Get token data if available
    pub fn token_data(&self) -> Option<TokenData> {
        let guard = self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.clone()
    }

    pub fn has_token(&self) -> bool {
        let guard = self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.is_some()
    }

    /// Clear the stored token
    pub fn clear(&self) {
        let mut guard = self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = None;
    }
}
