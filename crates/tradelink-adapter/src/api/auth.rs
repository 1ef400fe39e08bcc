/*
[INPUT]:  Session token
[OUTPUT]: Authorized account details; token bookkeeping on the manager
[POS]:    API layer - authorize / logout endpoints
[UPDATE]: When the authorize handshake or logout semantics change
*/

use serde_json::json;
use tracing::{info, warn};

use super::base::BaseApi;
use crate::error::{Result, TradelinkError};
use crate::types::{Authorize, AuthorizeRequest};
use crate::ws::ConnectionManager;

#[derive(Debug, Clone)]
pub struct AuthApi {
    base: BaseApi,
}

impl AuthApi {
    pub fn new(manager: ConnectionManager) -> Self {
        Self {
            base: BaseApi::new(manager),
        }
    }

    /// Authorize the connection with `token`
    ///
    /// WS authorize. On success the token and login id are kept for
    /// re-authorization after reconnects. Any server error reply drops the
    /// stored token; transport failures leave it untouched.
    pub async fn authorize(&self, token: &str) -> Result<Authorize> {
        let params = AuthorizeRequest::new(token);
        params.validate()?;
        let request = self.base.build_request("authorize", &params)?;
        let manager = self.base.manager();
        let account: Authorize = match self.base.call_field("authorize", request, "authorize").await {
            Ok(account) => account,
            Err(err) => {
                if matches!(
                    err,
                    TradelinkError::Api { .. } | TradelinkError::Authorization { .. }
                ) {
                    warn!(code = err.code(), "authorize rejected; clearing token");
                    manager.clear_token();
                }
                return Err(err);
            }
        };

        manager.set_token(token);
        manager.tokens().set_loginid(account.loginid.clone());
        info!(loginid = %account.loginid, "authorized");
        Ok(account)
    }

    /// End the session
    ///
    /// WS logout. The local token is dropped even when the server call fails.
    pub async fn logout(&self) -> Result<()> {
        let request = self.base.build_request("logout", &json!({}));
        let result = match request {
            Ok(request) => self.base.call("logout", request).await.map(|_| ()),
            Err(err) => Err(err),
        };
        self.base.manager().clear_token();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TradelinkError;
    use crate::ws::ClientConfig;

    #[tokio::test]
    async fn test_authorize_rejects_empty_token() {
        let api = AuthApi::new(ConnectionManager::new(ClientConfig::default()));
        let err = api.authorize("  ").await.unwrap_err();
        assert!(matches!(err, TradelinkError::InvalidParams(_)));
    }
}
