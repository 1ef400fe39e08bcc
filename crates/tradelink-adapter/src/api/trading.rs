/*
[INPUT]:  Contract parameters, proposal ids, contract ids, prices
[OUTPUT]: Price proposals, purchase/sale receipts, open contract updates
[POS]:    API layer - trading endpoints
[UPDATE]: When adding trading endpoints or contract parameters
*/

use rust_decimal::Decimal;

use super::base::{BaseApi, StreamHandle};
use crate::error::{Result, TradelinkError};
use crate::types::{
    BuyReceipt, BuyRequest, OpenContract, OpenContractRequest, Proposal, ProposalRequest,
    SellReceipt, SellRequest,
};
use crate::ws::ConnectionManager;

#[derive(Debug, Clone)]
pub struct TradingApi {
    base: BaseApi,
}

impl TradingApi {
    pub fn new(manager: ConnectionManager) -> Self {
        Self {
            base: BaseApi::new(manager),
        }
    }

    /// Price a contract once
    ///
    /// WS proposal
    pub async fn proposal(&self, params: &ProposalRequest) -> Result<Proposal> {
        params.validate()?;
        let request = self.base.build_request("proposal", params)?;
        self.base.call_field("proposal", request, "proposal").await
    }

    /// Re-priced proposals as the market moves
    ///
    /// WS proposal {subscribe: 1}
    pub async fn subscribe_proposal<F>(&self, params: &ProposalRequest, callback: F) -> Result<StreamHandle>
    where
        F: Fn(Result<Proposal>) + Send + Sync + 'static,
    {
        params.validate()?;
        let request = self.base.build_request("proposal", params)?;
        self.base
            .stream("proposal", request, Some("proposal"), callback)
            .await
    }

    /// Buy the contract priced by `proposal_id`, paying at most `price`
    ///
    /// WS buy
    pub async fn buy(&self, proposal_id: &str, price: Decimal) -> Result<BuyReceipt> {
        let params = BuyRequest {
            proposal_id: proposal_id.to_string(),
            price,
        };
        params.validate()?;
        let request = self.base.build_request("buy", &params)?;
        self.base.call_field("buy", request, "buy").await
    }

    /// Sell `contract_id` for at least `price` (zero sells at market)
    ///
    /// WS sell
    pub async fn sell(&self, contract_id: u64, price: Decimal) -> Result<SellReceipt> {
        let params = SellRequest { contract_id, price };
        params.validate()?;
        let request = self.base.build_request("sell", &params)?;
        self.base.call_field("sell", request, "sell").await
    }

    /// Current state of a bought contract
    ///
    /// WS proposal_open_contract
    pub async fn open_contract(&self, contract_id: u64) -> Result<OpenContract> {
        let request = self.open_contract_request(contract_id)?;
        self.base
            .call_field("proposal_open_contract", request, "proposal_open_contract")
            .await
    }

    /// Follow a bought contract until it settles
    ///
    /// WS proposal_open_contract {subscribe: 1}
    pub async fn subscribe_open_contract<F>(&self, contract_id: u64, callback: F) -> Result<StreamHandle>
    where
        F: Fn(Result<OpenContract>) + Send + Sync + 'static,
    {
        let request = self.open_contract_request(contract_id)?;
        self.base
            .stream(
                "proposal_open_contract",
                request,
                Some("proposal_open_contract"),
                callback,
            )
            .await
    }

    fn open_contract_request(&self, contract_id: u64) -> Result<serde_json::Value> {
        if contract_id == 0 {
            return Err(TradelinkError::InvalidParams(
                "contract_id must be positive".to_string(),
            ));
        }
        let params = OpenContractRequest {
            contract_id: Some(contract_id),
        };
        self.base.build_request("proposal_open_contract", &params)
    }
}
