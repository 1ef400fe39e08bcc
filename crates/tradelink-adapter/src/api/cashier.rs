/*
[INPUT]:  Cashier action and provider options
[OUTPUT]: Hosted cashier URL or provider details
[POS]:    API layer - cashier endpoint
[UPDATE]: When cashier providers or response shapes change
*/

use super::base::BaseApi;
use crate::error::Result;
use crate::types::{CashierAction, CashierRequest, CashierResponse};
use crate::ws::ConnectionManager;

#[derive(Debug, Clone)]
pub struct CashierApi {
    base: BaseApi,
}

impl CashierApi {
    pub fn new(manager: ConnectionManager) -> Self {
        Self {
            base: BaseApi::new(manager),
        }
    }

    /// WS cashier
    pub async fn cashier(&self, params: &CashierRequest) -> Result<CashierResponse> {
        params.validate()?;
        let request = self.base.build_request("cashier", params)?;
        self.base.call_field("cashier", request, "cashier").await
    }

    /// Hosted deposit page
    pub async fn deposit(&self) -> Result<CashierResponse> {
        self.cashier(&CashierRequest::new(CashierAction::Deposit))
            .await
    }
}
