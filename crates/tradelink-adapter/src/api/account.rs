/*
[INPUT]:  Statement paging parameters
[OUTPUT]: Balance (one-shot and streamed), account settings, statement
[POS]:    API layer - account endpoints
[UPDATE]: When adding account endpoints
*/

use super::base::{BaseApi, StreamHandle};
use crate::error::Result;
use crate::types::{AccountSettings, Balance, BalanceRequest, Statement, StatementRequest};
use crate::ws::ConnectionManager;

#[derive(Debug, Clone)]
pub struct AccountApi {
    base: BaseApi,
}

impl AccountApi {
    pub fn new(manager: ConnectionManager) -> Self {
        Self {
            base: BaseApi::new(manager),
        }
    }

    /// WS balance
    pub async fn balance(&self) -> Result<Balance> {
        let request = self.base.build_request("balance", &BalanceRequest::default())?;
        self.base.call_field("balance", request, "balance").await
    }

    /// WS balance {subscribe: 1}
    pub async fn subscribe_balance<F>(&self, callback: F) -> Result<StreamHandle>
    where
        F: Fn(Result<Balance>) + Send + Sync + 'static,
    {
        let request = self.base.build_request("balance", &BalanceRequest::default())?;
        self.base
            .stream("balance", request, Some("balance"), callback)
            .await
    }

    /// WS get_settings
    pub async fn settings(&self) -> Result<AccountSettings> {
        let request = self
            .base
            .build_request("get_settings", &serde_json::json!({}))?;
        self.base
            .call_field("get_settings", request, "get_settings")
            .await
    }

    /// Transaction history
    ///
    /// WS statement
    pub async fn statement(&self, params: &StatementRequest) -> Result<Statement> {
        params.validate()?;
        let request = self.base.build_request("statement", params)?;
        self.base.call_field("statement", request, "statement").await
    }
}
