/*
[INPUT]:  Host application's session storage
[OUTPUT]: Token for the authorize handshake on (re)connect
[POS]:    Auth layer - external session collaborator abstraction
[UPDATE]: When the handshake needs more session data than a token
*/

use std::fmt;

/// Supplies the session token on demand.
///
/// Implement this for whatever owns the user's session (local storage,
/// keychain, a login flow). The connection only reads from it.
pub trait SessionProvider: Send + Sync {
    /// Current session token, if the user is logged in
    fn token(&self) -> Option<String>;
}

/// Session provider with a fixed token, for tools and tests
#[derive(Clone, Default)]
pub struct StaticSession {
    token: Option<String>,
}

impl StaticSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Provider that never has a token
    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

impl fmt::Debug for StaticSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticSession")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl SessionProvider for StaticSession {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_session() {
        let session = StaticSession::new("a1-token");
        assert_eq!(session.token(), Some("a1-token".to_string()));
        assert!(StaticSession::anonymous().token().is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", StaticSession::new("secret"));
        assert!(!rendered.contains("secret"));
    }
}
