/*
[INPUT]:  Profit table paging parameters
[OUTPUT]: Open positions and settled contract history
[POS]:    API layer - positions endpoints
[UPDATE]: When adding position queries
*/

use super::base::BaseApi;
use crate::error::Result;
use crate::types::{Portfolio, PortfolioRequest, ProfitTable, ProfitTableRequest};
use crate::ws::ConnectionManager;

#[derive(Debug, Clone)]
pub struct PositionsApi {
    base: BaseApi,
}

impl PositionsApi {
    pub fn new(manager: ConnectionManager) -> Self {
        Self {
            base: BaseApi::new(manager),
        }
    }

    /// Open contracts
    ///
    /// WS portfolio
    pub async fn portfolio(&self) -> Result<Portfolio> {
        let request = self
            .base
            .build_request("portfolio", &PortfolioRequest::default())?;
        self.base.call_field("portfolio", request, "portfolio").await
    }

    /// Settled contracts with buy and sell prices
    ///
    /// WS profit_table
    pub async fn profit_table(&self, params: &ProfitTableRequest) -> Result<ProfitTable> {
        params.validate()?;
        let request = self.base.build_request("profit_table", params)?;
        self.base
            .call_field("profit_table", request, "profit_table")
            .await
    }
}
