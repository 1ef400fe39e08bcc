/*
[INPUT]:  Caller parameters for API wrapper operations
[OUTPUT]: Typed request structs that serialize to wire request objects
[POS]:    Data layer - request definitions and their preconditions
[UPDATE]: When an endpoint gains parameters or preconditions change
*/

use rust_decimal::Decimal;
use serde::Serialize;

use super::enums::{
    ActionType, ActiveSymbolsMode, Basis, CashierAction, CashierProvider, CashierType,
    DurationUnit, SortOrder, TicksStyle,
};
use super::serde_helpers;
use crate::error::{Result, TradelinkError};

/// Largest page size accepted by paged account queries
pub const MAX_PAGE_LIMIT: u32 = 999;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorizeRequest {
    #[serde(rename = "authorize")]
    pub token: String,
}

impl AuthorizeRequest {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("token", &self.token)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ActiveSymbolsRequest {
    #[serde(rename = "active_symbols")]
    pub mode: ActiveSymbolsMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing_company: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicksRequest {
    #[serde(rename = "ticks")]
    pub symbol: String,
}

impl TicksRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("symbol", &self.symbol)
    }
}

/// Tick or candle history, optionally followed by live updates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicksHistoryRequest {
    #[serde(rename = "ticks_history")]
    pub symbol: String,
    /// Epoch seconds or `"latest"`
    pub end: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<TicksStyle>,
    /// Candle width in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granularity: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serde_helpers::flag_option::serialize"
    )]
    pub adjust_start_time: Option<bool>,
}

impl TicksHistoryRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            end: "latest".to_string(),
            start: None,
            count: None,
            style: None,
            granularity: None,
            adjust_start_time: None,
        }
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn start(mut self, start: i64) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: impl Into<String>) -> Self {
        self.end = end.into();
        self
    }

    pub fn candles(mut self, granularity: u32) -> Self {
        self.style = Some(TicksStyle::Candles);
        self.granularity = Some(granularity);
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("symbol", &self.symbol)?;
        require_non_empty("end", &self.end)?;
        if self.count == Some(0) {
            return Err(invalid("count must be positive"));
        }
        if self.granularity.is_some() && self.style != Some(TicksStyle::Candles) {
            return Err(invalid("granularity requires style \"candles\""));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractsForRequest {
    #[serde(rename = "contracts_for")]
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing_company: Option<String>,
}

impl ContractsForRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            currency: None,
            landing_company: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("symbol", &self.symbol)?;
        if let Some(currency) = &self.currency {
            require_currency(currency)?;
        }
        Ok(())
    }
}

/// Price quote parameters. Needs either `duration` or `date_expiry`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposalRequest {
    #[serde(with = "serde_helpers::decimal")]
    pub amount: Decimal,
    pub basis: Basis,
    pub contract_type: String,
    pub currency: String,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_unit: Option<DurationUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_expiry: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barrier: Option<String>,
}

impl ProposalRequest {
    pub fn new(
        contract_type: impl Into<String>,
        symbol: impl Into<String>,
        amount: Decimal,
        basis: Basis,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            basis,
            contract_type: contract_type.into(),
            currency: currency.into(),
            symbol: symbol.into(),
            duration: None,
            duration_unit: None,
            date_expiry: None,
            barrier: None,
        }
    }

    pub fn duration(mut self, duration: u32, unit: DurationUnit) -> Self {
        self.duration = Some(duration);
        self.duration_unit = Some(unit);
        self
    }

    pub fn barrier(mut self, barrier: impl Into<String>) -> Self {
        self.barrier = Some(barrier.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("contract_type", &self.contract_type)?;
        require_non_empty("symbol", &self.symbol)?;
        require_currency(&self.currency)?;
        if self.amount <= Decimal::ZERO {
            return Err(invalid("amount must be greater than zero"));
        }
        match (self.duration, self.date_expiry) {
            (Some(0), _) => Err(invalid("duration must be positive")),
            (Some(_), _) | (None, Some(_)) => Ok(()),
            (None, None) => Err(invalid("either duration or date_expiry is required")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyRequest {
    #[serde(rename = "buy")]
    pub proposal_id: String,
    /// Highest price the caller accepts
    #[serde(with = "serde_helpers::decimal")]
    pub price: Decimal,
}

impl BuyRequest {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("proposal_id", &self.proposal_id)?;
        require_non_negative("price", self.price)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellRequest {
    #[serde(rename = "sell")]
    pub contract_id: u64,
    /// Lowest price the caller accepts; zero sells at market
    #[serde(with = "serde_helpers::decimal")]
    pub price: Decimal,
}

impl SellRequest {
    pub fn validate(&self) -> Result<()> {
        if self.contract_id == 0 {
            return Err(invalid("contract_id must be positive"));
        }
        require_non_negative("price", self.price)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OpenContractRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BalanceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StatementRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serde_helpers::flag_option::serialize"
    )]
    pub description: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_type: Option<ActionType>,
}

impl StatementRequest {
    pub fn validate(&self) -> Result<()> {
        validate_paging(self.limit, self.date_from, self.date_to)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProfitTableRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serde_helpers::flag_option::serialize"
    )]
    pub description: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
}

impl ProfitTableRequest {
    pub fn validate(&self) -> Result<()> {
        validate_paging(self.limit, self.date_from, self.date_to)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashierRequest {
    #[serde(rename = "cashier")]
    pub action: CashierAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<CashierProvider>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub cashier_type: Option<CashierType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,
}

impl CashierRequest {
    pub fn new(action: CashierAction) -> Self {
        Self {
            action,
            provider: None,
            cashier_type: None,
            verification_code: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(code) = &self.verification_code {
            require_non_empty("verification_code", code)?;
        }
        if self.action == CashierAction::Withdraw && self.verification_code.is_none() {
            return Err(invalid("withdraw requires a verification_code"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PortfolioRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<Vec<String>>,
}

fn invalid(message: impl Into<String>) -> TradelinkError {
    TradelinkError::InvalidParams(message.into())
}

fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{name} must be a non-empty string")));
    }
    Ok(())
}

fn require_non_negative(name: &str, value: Decimal) -> Result<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(invalid(format!("{name} must not be negative")));
    }
    Ok(())
}

/// ISO-4217 style code: exactly three ASCII uppercase letters
fn require_currency(currency: &str) -> Result<()> {
    if currency.len() == 3 && currency.bytes().all(|byte| byte.is_ascii_uppercase()) {
        return Ok(());
    }
    Err(invalid(format!(
        "currency must be three uppercase letters, got {currency:?}"
    )))
}

fn validate_paging(limit: Option<u32>, date_from: Option<i64>, date_to: Option<i64>) -> Result<()> {
    if let Some(limit) = limit {
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(invalid(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}, got {limit}"
            )));
        }
    }
    if let (Some(from), Some(to)) = (date_from, date_to) {
        if from > to {
            return Err(invalid("date_from must not be after date_to"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn proposal() -> ProposalRequest {
        ProposalRequest::new("CALL", "R_100", Decimal::from(10), Basis::Stake, "USD")
            .duration(5, DurationUnit::Ticks)
    }

    #[test]
    fn test_proposal_serializes_wire_fields() {
        let value = serde_json::to_value(proposal()).unwrap();
        assert_eq!(
            value,
            json!({
                "amount": 10.0,
                "basis": "stake",
                "contract_type": "CALL",
                "currency": "USD",
                "symbol": "R_100",
                "duration": 5,
                "duration_unit": "t"
            })
        );
    }

    #[rstest]
    #[case("usd")]
    #[case("US")]
    #[case("USDT")]
    #[case("U$D")]
    fn test_proposal_rejects_bad_currency(#[case] currency: &str) {
        let mut request = proposal();
        request.currency = currency.to_string();
        assert!(matches!(request.validate(), Err(TradelinkError::InvalidParams(_))));
    }

    #[rstest]
    #[case(Decimal::ZERO)]
    #[case(Decimal::from(-5))]
    fn test_proposal_rejects_non_positive_amount(#[case] amount: Decimal) {
        let mut request = proposal();
        request.amount = amount;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_proposal_requires_duration_or_expiry() {
        let mut request = proposal();
        request.duration = None;
        assert!(request.validate().is_err());
        request.date_expiry = Some(1_700_000_000);
        assert!(request.validate().is_ok());
        request.duration = Some(0);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_ticks_history_defaults_to_latest() {
        let request = TicksHistoryRequest::new("R_50").count(10);
        assert!(request.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"ticks_history": "R_50", "end": "latest", "count": 10})
        );
        assert!(TicksHistoryRequest::new("R_50").count(0).validate().is_err());
        assert!(TicksHistoryRequest::new("").validate().is_err());
    }

    #[test]
    fn test_candles_set_style_and_granularity() {
        let request = TicksHistoryRequest::new("R_50").candles(60);
        assert!(request.validate().is_ok());
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["style"], "candles");
        assert_eq!(value["granularity"], 60);
    }

    #[rstest]
    #[case(Some(0), false)]
    #[case(Some(1), true)]
    #[case(Some(999), true)]
    #[case(Some(1000), false)]
    #[case(None, true)]
    fn test_statement_limit_bounds(#[case] limit: Option<u32>, #[case] ok: bool) {
        let request = StatementRequest {
            limit,
            ..Default::default()
        };
        assert_eq!(request.validate().is_ok(), ok);
    }

    #[test]
    fn test_paging_flags_serialize_as_numbers() {
        let request = ProfitTableRequest {
            description: Some(true),
            sort: Some(SortOrder::Desc),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"description": 1, "sort": "DESC"})
        );
    }

    #[test]
    fn test_buy_and_sell_preconditions() {
        let buy = BuyRequest {
            proposal_id: " ".to_string(),
            price: Decimal::from(10),
        };
        assert!(buy.validate().is_err());

        let sell = SellRequest {
            contract_id: 42,
            price: Decimal::ZERO,
        };
        assert!(sell.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&sell).unwrap(),
            json!({"sell": 42, "price": 0.0})
        );
    }

    #[test]
    fn test_withdraw_requires_verification_code() {
        assert!(CashierRequest::new(CashierAction::Deposit).validate().is_ok());
        let mut withdraw = CashierRequest::new(CashierAction::Withdraw);
        assert!(withdraw.validate().is_err());
        withdraw.verification_code = Some("abc123".to_string());
        assert!(withdraw.validate().is_ok());
    }
}
