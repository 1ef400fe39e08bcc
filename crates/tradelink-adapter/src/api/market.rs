/*
[INPUT]:  Symbols and history parameters
[OUTPUT]: Symbol lists, tick streams, history snapshots and contract offerings
[POS]:    API layer - market data endpoints
[UPDATE]: When adding market endpoints or changing stream decoding
*/

use super::base::{BaseApi, StreamHandle};
use crate::error::Result;
use crate::types::{
    ActiveSymbol, ActiveSymbolsMode, ActiveSymbolsRequest, ContractsFor, ContractsForRequest, Tick,
    TicksHistoryRequest, TicksHistoryUpdate, TicksRequest,
};
use crate::ws::ConnectionManager;

#[derive(Debug, Clone)]
pub struct MarketApi {
    base: BaseApi,
}

impl MarketApi {
    pub fn new(manager: ConnectionManager) -> Self {
        Self {
            base: BaseApi::new(manager),
        }
    }

    /// List tradable symbols
    ///
    /// WS active_symbols
    pub async fn active_symbols(&self, mode: ActiveSymbolsMode) -> Result<Vec<ActiveSymbol>> {
        let params = ActiveSymbolsRequest {
            mode,
            ..Default::default()
        };
        let request = self.base.build_request("active_symbols", &params)?;
        self.base
            .call_field("active_symbols", request, "active_symbols")
            .await
    }

    /// Stream live ticks for `symbol`
    ///
    /// WS ticks {subscribe: 1}
    pub async fn ticks<F>(&self, symbol: &str, callback: F) -> Result<StreamHandle>
    where
        F: Fn(Result<Tick>) + Send + Sync + 'static,
    {
        let params = TicksRequest::new(symbol);
        params.validate()?;
        let request = self.base.build_request("ticks", &params)?;
        self.base.stream("ticks", request, Some("tick"), callback).await
    }

    /// One-shot history snapshot (`history` or `candles`)
    ///
    /// WS ticks_history
    pub async fn ticks_history(&self, params: &TicksHistoryRequest) -> Result<TicksHistoryUpdate> {
        params.validate()?;
        let request = self.base.build_request("ticks_history", params)?;
        let response = self.base.call("ticks_history", request).await?;
        Ok(serde_json::from_value(response)?)
    }

    /// History snapshot followed by live updates, all delivered to `callback`
    ///
    /// WS ticks_history {subscribe: 1}
    pub async fn subscribe_ticks_history<F>(
        &self,
        params: &TicksHistoryRequest,
        callback: F,
    ) -> Result<StreamHandle>
    where
        F: Fn(Result<TicksHistoryUpdate>) + Send + Sync + 'static,
    {
        params.validate()?;
        let request = self.base.build_request("ticks_history", params)?;
        self.base
            .stream("ticks_history", request, None, callback)
            .await
    }

    /// Contract types offered on `symbol`
    ///
    /// WS contracts_for
    pub async fn contracts_for(&self, symbol: &str) -> Result<ContractsFor> {
        let params = ContractsForRequest::new(symbol);
        params.validate()?;
        let request = self.base.build_request("contracts_for", &params)?;
        self.base
            .call_field("contracts_for", request, "contracts_for")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TradelinkError;
    use crate::ws::ClientConfig;

    #[tokio::test]
    async fn test_preconditions_fail_before_io() {
        let manager = ConnectionManager::new(ClientConfig::default());
        let api = MarketApi::new(manager.clone());

        let err = api.ticks("", |_| {}).await.unwrap_err();
        assert!(matches!(err, TradelinkError::InvalidParams(_)));

        let err = api
            .ticks_history(&TicksHistoryRequest::new("R_100").count(0))
            .await
            .unwrap_err();
        assert!(matches!(err, TradelinkError::InvalidParams(_)));

        let err = api.contracts_for(" ").await.unwrap_err();
        assert!(matches!(err, TradelinkError::InvalidParams(_)));

        let stats = manager.stats().await.unwrap();
        assert_eq!(stats.queued, 0);
        assert_eq!(stats.topics, 0);
    }
}
