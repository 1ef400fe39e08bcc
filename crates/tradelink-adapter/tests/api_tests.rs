/*
[INPUT]:  Endpoint wrappers driven against a scripted socket
[OUTPUT]: Test results for request shapes, reply decoding and error mapping
[POS]:    Integration tests - API layer over the connection manager
[UPDATE]: When endpoint wrappers change
*/

mod common;

use std::future::Future;
use std::str::FromStr;

use common::{authorize_reply, connected, error_reply, req_id_of, test_config, MockSocket};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tradelink_adapter::{
    ApiManager, ApiRef, ProfitTableRequest, Result, StatementRequest, TicksHistoryRequest,
    TicksHistoryUpdate, TradelinkError,
};

/// Run `call`, answer its request with `reply(req_id)` and return the
/// request that went out together with the result.
async fn answer<T, Fut>(
    socket: &mut MockSocket,
    call: Fut,
    reply: impl FnOnce(u64) -> Value,
) -> (Value, Result<T>)
where
    T: Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let task = tokio::spawn(call);
    let request = socket.next_sent().await;
    socket.push(reply(req_id_of(&request)));
    (request, task.await.unwrap())
}

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

#[tokio::test]
async fn authorize_keeps_token_and_loginid() {
    let (manager, mut socket, _connector) = connected(test_config()).await;
    let apis = ApiManager::new(manager.clone());
    let auth = apis.auth().clone();

    let (request, result) = answer(
        &mut socket,
        async move { auth.authorize("a1-token").await },
        |req_id| authorize_reply(req_id, "VRTC100"),
    )
    .await;

    assert_eq!(request["authorize"], "a1-token");
    let account = result.unwrap();
    assert_eq!(account.loginid, "VRTC100");
    assert_eq!(account.balance, dec("10000"));
    assert!(account.is_virtual);
    assert_eq!(manager.token().as_deref(), Some("a1-token"));
    assert_eq!(
        manager.tokens().token_data().unwrap().loginid.as_deref(),
        Some("VRTC100")
    );
}

#[tokio::test]
async fn rejected_authorize_surfaces_auth_error_and_clears_token() {
    let (manager, mut socket, _connector) = connected(test_config()).await;
    manager.set_token("previous-token");
    let apis = ApiManager::new(manager.clone());
    let auth = apis.auth().clone();

    let (_, result) = answer(
        &mut socket,
        async move { auth.authorize("bad-token").await },
        |req_id| error_reply("authorize", req_id, "InvalidToken", "The token is invalid."),
    )
    .await;

    let err = result.unwrap_err();
    assert!(err.is_auth_error());
    assert_eq!(err.code(), "InvalidToken");
    assert_eq!(manager.token(), None);
}

#[tokio::test]
async fn any_authorize_error_reply_clears_the_token() {
    let (manager, mut socket, _connector) = connected(test_config()).await;
    manager.set_token("previous-token");
    let apis = ApiManager::new(manager.clone());
    let auth = apis.auth().clone();

    let (_, result) = answer(
        &mut socket,
        async move { auth.authorize("malformed-token").await },
        |req_id| {
            error_reply(
                "authorize",
                req_id,
                "InputValidationFailed",
                "Input validation failed: authorize.",
            )
        },
    )
    .await;

    let err = result.unwrap_err();
    assert!(!err.is_auth_error());
    assert!(matches!(
        &err,
        TradelinkError::Api { code, .. } if code == "InputValidationFailed"
    ));
    assert_eq!(manager.token(), None);
    assert!(manager.tokens().token_data().is_none());
}

#[tokio::test]
async fn business_errors_keep_the_token() {
    let (manager, mut socket, _connector) = connected(test_config()).await;
    manager.set_token("live-token");
    let apis = ApiManager::new(manager.clone());
    let trading = apis.trading().clone();

    let (_, result) = answer(
        &mut socket,
        async move { trading.buy("prop-1", dec("10")).await },
        |req_id| error_reply("buy", req_id, "InsufficientBalance", "Your balance is too low."),
    )
    .await;

    let err = result.unwrap_err();
    assert!(matches!(
        &err,
        TradelinkError::Api { code, .. } if code == "InsufficientBalance"
    ));
    assert_eq!(manager.token().as_deref(), Some("live-token"));
}

#[tokio::test]
async fn buy_sends_price_and_decodes_receipt() {
    let (manager, mut socket, _connector) = connected(test_config()).await;
    let apis = ApiManager::new(manager);
    let trading = apis.trading().clone();

    let (request, result) = answer(
        &mut socket,
        async move { trading.buy("prop-42", dec("10.5")).await },
        |req_id| {
            json!({
                "msg_type": "buy",
                "req_id": req_id,
                "buy": {
                    "contract_id": 9001,
                    "transaction_id": 7001,
                    "buy_price": 10.5,
                    "balance_after": 9989.5,
                    "start_time": 1700000000,
                    "longcode": "Win payout if Volatility 100 Index is strictly higher than entry spot.",
                    "payout": 19.55
                }
            })
        },
    )
    .await;

    assert_eq!(request["buy"], "prop-42");
    assert_eq!(request["price"].as_f64(), Some(10.5));
    let receipt = result.unwrap();
    assert_eq!(receipt.contract_id, 9001);
    assert_eq!(receipt.balance_after, dec("9989.5"));
    assert_eq!(receipt.payout, Some(dec("19.55")));
}

#[tokio::test]
async fn malformed_reply_is_a_validation_error() {
    let (manager, mut socket, _connector) = connected(test_config()).await;
    let apis = ApiManager::new(manager);
    let trading = apis.trading().clone();

    let (_, result) = answer(
        &mut socket,
        async move { trading.buy("prop-42", dec("10.5")).await },
        |req_id| json!({"msg_type": "buy", "req_id": req_id, "buy": {"contract_id": "x"}}),
    )
    .await;

    assert!(matches!(result.unwrap_err(), TradelinkError::Validation(_)));
}

#[tokio::test]
async fn balance_uses_sentinel_and_decodes() {
    let (manager, mut socket, _connector) = connected(test_config()).await;
    let apis = ApiManager::new(manager);
    let account = apis.account().clone();

    let (request, result) = answer(
        &mut socket,
        async move { account.balance().await },
        |req_id| {
            json!({
                "msg_type": "balance",
                "req_id": req_id,
                "balance": {"balance": 1234.56, "currency": "USD", "loginid": "CR900"}
            })
        },
    )
    .await;

    assert_eq!(request["balance"], 1);
    let balance = result.unwrap();
    assert_eq!(balance.balance, dec("1234.56"));
    assert_eq!(balance.loginid, "CR900");
}

#[tokio::test]
async fn statement_and_profit_table_carry_paging() {
    let (manager, mut socket, _connector) = connected(test_config()).await;
    let apis = ApiManager::new(manager);

    let account = apis.account().clone();
    let params = StatementRequest {
        limit: Some(5),
        ..Default::default()
    };
    let (request, result) = answer(
        &mut socket,
        async move { account.statement(&params).await },
        |req_id| {
            json!({
                "msg_type": "statement",
                "req_id": req_id,
                "statement": {"count": 0, "transactions": []}
            })
        },
    )
    .await;
    assert_eq!(request["statement"], 1);
    assert_eq!(request["limit"], 5);
    assert_eq!(result.unwrap().count, 0);

    let positions = apis.positions().clone();
    let err = positions
        .profit_table(&ProfitTableRequest {
            limit: Some(0),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, TradelinkError::InvalidParams(_)));
    socket.assert_idle();
}

#[tokio::test]
async fn ticks_history_stream_delivers_snapshot_then_ticks() {
    let (manager, mut socket, _connector) = connected(test_config()).await;
    let apis = ApiManager::new(manager.clone());
    let (updates_tx, mut updates) = mpsc::unbounded_channel();

    let handle = apis
        .market()
        .subscribe_ticks_history(&TicksHistoryRequest::new("R_100").count(2), move |update| {
            let _ = updates_tx.send(update);
        })
        .await
        .unwrap();

    let request = socket.next_sent().await;
    assert_eq!(request["ticks_history"], "R_100");
    assert_eq!(request["end"], "latest");
    assert_eq!(request["count"], 2);
    assert_eq!(request["subscribe"], 1);
    assert_eq!(req_id_of(&request), handle.req_id());

    socket.push(json!({
        "msg_type": "history",
        "req_id": handle.req_id(),
        "subscription": {"id": "hist-1"},
        "pip_size": 2,
        "history": {"prices": [100.25, 100.5], "times": [1700000000, 1700000002]}
    }));
    socket.push(json!({
        "msg_type": "tick",
        "subscription": {"id": "hist-1"},
        "tick": {"symbol": "R_100", "quote": 100.75, "epoch": 1700000004, "id": "hist-1"}
    }));

    let snapshot = updates.recv().await.unwrap().unwrap();
    assert!(snapshot.is_snapshot());
    assert_eq!(snapshot.last_price(), Some(dec("100.5")));
    match snapshot {
        TicksHistoryUpdate::History { history, .. } => {
            let points: Vec<_> = history.points().collect();
            assert_eq!(points, vec![(1700000000, dec("100.25")), (1700000002, dec("100.5"))]);
        }
        other => panic!("unexpected update {other:?}"),
    }

    let live = updates.recv().await.unwrap().unwrap();
    assert!(!live.is_snapshot());
    assert_eq!(live.last_price(), Some(dec("100.75")));

    handle.unsubscribe();
    assert_eq!(socket.next_sent().await, json!({"forget": "hist-1"}));
}

#[tokio::test]
async fn stream_errors_reach_the_callback() {
    let (manager, mut socket, _connector) = connected(test_config()).await;
    let apis = ApiManager::new(manager);
    let (updates_tx, mut updates) = mpsc::unbounded_channel();

    let handle = apis
        .market()
        .ticks("R_25", move |update| {
            let _ = updates_tx.send(update);
        })
        .await
        .unwrap();
    let _ = socket.next_sent().await;

    // Fails validation: dropped.
    socket.push(json!({"msg_type": "tick", "req_id": handle.req_id(), "tick": {"quote": "high"}}));
    socket.push(error_reply("tick", handle.req_id(), "MarketIsClosed", "This market is presently closed."));

    let err = updates.recv().await.unwrap().unwrap_err();
    assert_eq!(err.code(), "MarketIsClosed");
}

#[tokio::test]
async fn identical_streams_share_one_wire_subscription() {
    let (manager, mut socket, _connector) = connected(test_config()).await;
    let apis = ApiManager::new(manager.clone());

    let first = apis.market().ticks("R_75", |_| {}).await.unwrap();
    let second = apis.market().ticks("R_75", |_| {}).await.unwrap();
    assert_eq!(first.topic(), second.topic());
    assert_eq!(first.req_id(), second.req_id());

    let _ = socket.next_sent().await;
    let stats = manager.stats().await.unwrap();
    assert_eq!((stats.topics, stats.listeners), (1, 2));
    socket.assert_idle();
}

#[tokio::test]
async fn manager_lookup_by_name_shares_the_connection() {
    let (manager, mut socket, _connector) = connected(test_config()).await;
    let apis = ApiManager::new(manager);

    let Ok(ApiRef::Positions(positions)) = apis.get("positions") else {
        panic!("positions api missing");
    };
    let positions = positions.clone();
    let (request, result) = answer(
        &mut socket,
        async move { positions.portfolio().await },
        |req_id| {
            json!({
                "msg_type": "portfolio",
                "req_id": req_id,
                "portfolio": {"contracts": []}
            })
        },
    )
    .await;
    assert_eq!(request["portfolio"], 1);
    assert!(result.unwrap().contracts.is_empty());

    assert!(matches!(apis.get("staking"), Err(TradelinkError::UnknownApi(_))));
}
