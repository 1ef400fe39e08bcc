/*
[INPUT]:  Validated server responses and stream pushes
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When a response shape changes or a wrapper exposes new fields
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::serde_helpers;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub loginid: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, with = "serde_helpers::flag")]
    pub is_virtual: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authorize {
    pub loginid: String,
    pub currency: String,
    #[serde(with = "serde_helpers::decimal")]
    pub balance: Decimal,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default, with = "serde_helpers::flag")]
    pub is_virtual: bool,
    #[serde(default)]
    pub landing_company_name: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub account_list: Vec<AccountSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSymbol {
    pub symbol: String,
    pub display_name: String,
    pub market: String,
    #[serde(default)]
    pub market_display_name: Option<String>,
    #[serde(default)]
    pub submarket: Option<String>,
    #[serde(with = "serde_helpers::flag")]
    pub exchange_is_open: bool,
    #[serde(with = "serde_helpers::flag")]
    pub is_trading_suspended: bool,
    #[serde(with = "serde_helpers::decimal")]
    pub pip: Decimal,
    #[serde(default)]
    pub symbol_type: Option<String>,
    #[serde(default, with = "serde_helpers::decimal_option")]
    pub spot: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    #[serde(with = "serde_helpers::decimal")]
    pub quote: Decimal,
    pub epoch: i64,
    #[serde(default, with = "serde_helpers::decimal_option")]
    pub ask: Option<Decimal>,
    #[serde(default, with = "serde_helpers::decimal_option")]
    pub bid: Option<Decimal>,
    /// Stream id when the tick is a subscription push
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, with = "serde_helpers::decimal_option")]
    pub pip_size: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    #[serde(with = "serde_helpers::decimal_vec")]
    pub prices: Vec<Decimal>,
    pub times: Vec<i64>,
}

impl History {
    /// `(epoch, price)` pairs in server order
    pub fn points(&self) -> impl Iterator<Item = (i64, Decimal)> + '_ {
        self.times.iter().copied().zip(self.prices.iter().copied())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub epoch: i64,
    #[serde(with = "serde_helpers::decimal")]
    pub open: Decimal,
    #[serde(with = "serde_helpers::decimal")]
    pub high: Decimal,
    #[serde(with = "serde_helpers::decimal")]
    pub low: Decimal,
    #[serde(with = "serde_helpers::decimal")]
    pub close: Decimal,
}

/// Live candle update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ohlc {
    pub symbol: String,
    pub epoch: i64,
    pub open_time: i64,
    pub granularity: u32,
    #[serde(with = "serde_helpers::decimal")]
    pub open: Decimal,
    #[serde(with = "serde_helpers::decimal")]
    pub high: Decimal,
    #[serde(with = "serde_helpers::decimal")]
    pub low: Decimal,
    #[serde(with = "serde_helpers::decimal")]
    pub close: Decimal,
}

/// Every message a history subscription delivers: the initial snapshot
/// (`history` or `candles`) followed by live `tick` or `ohlc` updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msg_type", rename_all = "lowercase")]
pub enum TicksHistoryUpdate {
    History {
        history: History,
        #[serde(default, with = "serde_helpers::decimal_option")]
        pip_size: Option<Decimal>,
    },
    Candles {
        candles: Vec<Candle>,
    },
    Tick {
        tick: Tick,
    },
    Ohlc {
        ohlc: Ohlc,
    },
}

impl TicksHistoryUpdate {
    /// Latest price carried by the update
    pub fn last_price(&self) -> Option<Decimal> {
        match self {
            TicksHistoryUpdate::History { history, .. } => history.prices.last().copied(),
            TicksHistoryUpdate::Candles { candles } => candles.last().map(|candle| candle.close),
            TicksHistoryUpdate::Tick { tick } => Some(tick.quote),
            TicksHistoryUpdate::Ohlc { ohlc } => Some(ohlc.close),
        }
    }

    pub fn is_snapshot(&self) -> bool {
        matches!(
            self,
            TicksHistoryUpdate::History { .. } | TicksHistoryUpdate::Candles { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractAvailability {
    pub contract_type: String,
    #[serde(default)]
    pub contract_category: Option<String>,
    #[serde(default)]
    pub contract_display: Option<String>,
    #[serde(default)]
    pub min_contract_duration: Option<String>,
    #[serde(default)]
    pub max_contract_duration: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub barriers: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractsFor {
    pub available: Vec<ContractAvailability>,
    #[serde(default, with = "serde_helpers::decimal_option")]
    pub spot: Option<Decimal>,
    #[serde(default)]
    pub open: Option<i64>,
    #[serde(default)]
    pub close: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    #[serde(with = "serde_helpers::decimal")]
    pub ask_price: Decimal,
    #[serde(with = "serde_helpers::decimal")]
    pub payout: Decimal,
    #[serde(with = "serde_helpers::decimal")]
    pub spot: Decimal,
    pub spot_time: i64,
    pub date_start: i64,
    pub longcode: String,
    #[serde(default)]
    pub display_value: Option<String>,
    #[serde(default)]
    pub date_expiry: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyReceipt {
    pub contract_id: u64,
    pub transaction_id: u64,
    #[serde(with = "serde_helpers::decimal")]
    pub buy_price: Decimal,
    #[serde(with = "serde_helpers::decimal")]
    pub balance_after: Decimal,
    pub start_time: i64,
    pub longcode: String,
    #[serde(default, with = "serde_helpers::decimal_option")]
    pub payout: Option<Decimal>,
    #[serde(default)]
    pub shortcode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellReceipt {
    pub contract_id: u64,
    pub transaction_id: u64,
    #[serde(with = "serde_helpers::decimal")]
    pub sold_for: Decimal,
    #[serde(with = "serde_helpers::decimal")]
    pub balance_after: Decimal,
    #[serde(default)]
    pub reference_id: Option<u64>,
}

/// Snapshot of a bought contract; every field is optional because the
/// server sends an empty object once the contract is gone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OpenContract {
    #[serde(default)]
    pub contract_id: Option<u64>,
    #[serde(default)]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub underlying: Option<String>,
    #[serde(default, with = "serde_helpers::decimal_option")]
    pub buy_price: Option<Decimal>,
    #[serde(default, with = "serde_helpers::decimal_option")]
    pub bid_price: Option<Decimal>,
    #[serde(default, with = "serde_helpers::decimal_option")]
    pub profit: Option<Decimal>,
    #[serde(default, with = "serde_helpers::decimal_option")]
    pub current_spot: Option<Decimal>,
    #[serde(default, with = "serde_helpers::decimal_option")]
    pub entry_spot: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, with = "serde_helpers::flag")]
    pub is_sold: bool,
    #[serde(default, with = "serde_helpers::flag")]
    pub is_expired: bool,
}

impl OpenContract {
    pub fn is_settled(&self) -> bool {
        self.is_sold || self.is_expired
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    #[serde(with = "serde_helpers::decimal")]
    pub balance: Decimal,
    pub currency: String,
    pub loginid: String,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountSettings {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub residence: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub preferred_language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementTransaction {
    pub transaction_id: u64,
    pub action_type: String,
    #[serde(with = "serde_helpers::decimal")]
    pub amount: Decimal,
    #[serde(with = "serde_helpers::decimal")]
    pub balance_after: Decimal,
    pub transaction_time: i64,
    #[serde(default)]
    pub contract_id: Option<u64>,
    #[serde(default)]
    pub reference_id: Option<u64>,
    #[serde(default)]
    pub longcode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub count: u32,
    pub transactions: Vec<StatementTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitTableEntry {
    pub contract_id: u64,
    #[serde(with = "serde_helpers::decimal")]
    pub buy_price: Decimal,
    #[serde(with = "serde_helpers::decimal")]
    pub sell_price: Decimal,
    pub purchase_time: i64,
    #[serde(default)]
    pub sell_time: Option<i64>,
    #[serde(default)]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub longcode: Option<String>,
    #[serde(default)]
    pub shortcode: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<u64>,
}

impl ProfitTableEntry {
    pub fn profit(&self) -> Decimal {
        self.sell_price - self.buy_price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitTable {
    pub count: u32,
    pub transactions: Vec<ProfitTableEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioContract {
    pub contract_id: u64,
    pub contract_type: String,
    pub currency: String,
    pub symbol: String,
    #[serde(with = "serde_helpers::decimal")]
    pub buy_price: Decimal,
    #[serde(default, with = "serde_helpers::decimal_option")]
    pub payout: Option<Decimal>,
    #[serde(default)]
    pub date_start: Option<i64>,
    #[serde(default)]
    pub expiry_time: Option<i64>,
    #[serde(default)]
    pub longcode: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub contracts: Vec<PortfolioContract>,
}

/// `cashier` answers with a hosted page URL or, for `type: api`, a details object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CashierResponse {
    Url(String),
    Details(Value),
}

impl CashierResponse {
    pub fn url(&self) -> Option<&str> {
        match self {
            CashierResponse::Url(url) => Some(url),
            CashierResponse::Details(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn ticks_history_snapshot_and_push_share_one_type() {
        let snapshot: TicksHistoryUpdate = serde_json::from_value(json!({
            "msg_type": "history",
            "echo_req": {"ticks_history": "R_100"},
            "history": {"prices": [100.5, 100.75], "times": [1700000000, 1700000002]},
            "pip_size": 2
        }))
        .unwrap();
        assert!(snapshot.is_snapshot());
        assert_eq!(snapshot.last_price(), Some(Decimal::from_str("100.75").unwrap()));

        let push: TicksHistoryUpdate = serde_json::from_value(json!({
            "msg_type": "tick",
            "subscription": {"id": "abc"},
            "tick": {"symbol": "R_100", "quote": 101.25, "epoch": 1700000004}
        }))
        .unwrap();
        assert!(!push.is_snapshot());
        assert_eq!(push.last_price(), Some(Decimal::from_str("101.25").unwrap()));
    }

    #[test]
    fn ohlc_accepts_string_prices() {
        let update: TicksHistoryUpdate = serde_json::from_value(json!({
            "msg_type": "ohlc",
            "ohlc": {
                "symbol": "R_100", "epoch": 1700000060, "open_time": 1700000040,
                "granularity": 60, "open": "100.1", "high": "100.9",
                "low": "99.8", "close": "100.4"
            }
        }))
        .unwrap();
        assert_eq!(update.last_price(), Some(Decimal::from_str("100.4").unwrap()));
    }

    #[test]
    fn history_points_pair_times_with_prices() {
        let history = History {
            prices: vec![Decimal::ONE, Decimal::TWO],
            times: vec![10, 11],
        };
        let points: Vec<_> = history.points().collect();
        assert_eq!(points, vec![(10, Decimal::ONE), (11, Decimal::TWO)]);
    }

    #[test]
    fn open_contract_tolerates_empty_object() {
        let contract: OpenContract = serde_json::from_value(json!({})).unwrap();
        assert_eq!(contract, OpenContract::default());
        assert!(!contract.is_settled());

        let sold: OpenContract =
            serde_json::from_value(json!({"contract_id": 7, "is_sold": 1, "entry_spot": null}))
                .unwrap();
        assert!(sold.is_settled());
        assert_eq!(sold.entry_spot, None);
    }

    #[test]
    fn cashier_response_is_url_or_details() {
        let url: CashierResponse = serde_json::from_value(json!("https://cashier.example/x")).unwrap();
        assert_eq!(url.url(), Some("https://cashier.example/x"));

        let details: CashierResponse =
            serde_json::from_value(json!({"action": "deposit", "deposit": {"address": "x"}}))
                .unwrap();
        assert!(details.url().is_none());
    }

    #[test]
    fn profit_is_sell_minus_buy() {
        let entry: ProfitTableEntry = serde_json::from_value(json!({
            "contract_id": 1, "buy_price": 10, "sell_price": 19.5, "purchase_time": 1
        }))
        .unwrap();
        assert_eq!(entry.profit(), Decimal::from_str("9.5").unwrap());
    }
}
