/*
[INPUT]:  Test configuration and scripted connection behaviour
[OUTPUT]: In-memory connector, socket handles and fixtures
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for tradelink-adapter tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tradelink_adapter::{
    ClientConfig, ConnectionEvent, ConnectionManager, Connector, SessionProvider, TradelinkError,
    TransportEvent, TransportLink,
};
use url::Url;

pub const MOCK_URL: &str = "ws://mock.local/websockets/v3";

/// What the next connect attempt does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Accept,
    Refuse,
    /// Never completes; exercises the connection timeout
    Hang,
}

/// Server side of one accepted connection
pub struct MockSocket {
    pub sent: mpsc::UnboundedReceiver<String>,
    pub inbound: mpsc::UnboundedSender<TransportEvent>,
}

impl MockSocket {
    /// Next message the client wrote, parsed
    pub async fn next_sent(&mut self) -> Value {
        let text = self.sent.recv().await.expect("client socket closed");
        serde_json::from_str(&text).expect("client sent invalid json")
    }

    /// Nothing further written by the client so far
    pub fn assert_idle(&mut self) {
        if let Ok(text) = self.sent.try_recv() {
            panic!("unexpected client message {text}");
        }
    }

    pub fn push(&self, message: Value) {
        self.push_raw(&message.to_string());
    }

    pub fn push_raw(&self, text: &str) {
        let _ = self.inbound.send(TransportEvent::Message(text.to_string()));
    }

    pub fn close(&self, reason: &str) {
        let _ = self.inbound.send(TransportEvent::Closed(Some(reason.to_string())));
    }

    /// Report a transport failure, as a broken socket would
    pub fn fail(&self, message: &str) {
        let _ = self.inbound.send(TransportEvent::Error(message.to_string()));
    }
}

/// Connector that hands every accepted socket to the test
pub struct MockConnector {
    plan: Mutex<VecDeque<Behavior>>,
    fallback: Behavior,
    attempts: Mutex<Vec<Instant>>,
    sockets: mpsc::UnboundedSender<MockSocket>,
}

impl MockConnector {
    pub fn new(fallback: Behavior) -> (Arc<Self>, mpsc::UnboundedReceiver<MockSocket>) {
        Self::scripted(Vec::new(), fallback)
    }

    /// `plan` drives the first attempts in order, `fallback` the rest
    pub fn scripted(
        plan: Vec<Behavior>,
        fallback: Behavior,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<MockSocket>) {
        let (sockets, sockets_rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            plan: Mutex::new(plan.into()),
            fallback,
            attempts: Mutex::new(Vec::new()),
            sockets,
        });
        (connector, sockets_rx)
    }

    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _url: &Url) -> tradelink_adapter::Result<TransportLink> {
        self.attempts.lock().unwrap().push(Instant::now());
        let behavior = self.plan.lock().unwrap().pop_front().unwrap_or(self.fallback);
        match behavior {
            Behavior::Refuse => Err(TradelinkError::WebSocket("connection refused".to_string())),
            Behavior::Hang => std::future::pending().await,
            Behavior::Accept => {
                let (outbound, sent) = mpsc::unbounded_channel();
                let (inbound_tx, inbound) = mpsc::unbounded_channel();
                let _ = self.sockets.send(MockSocket {
                    sent,
                    inbound: inbound_tx,
                });
                Ok(TransportLink { outbound, inbound })
            }
        }
    }
}

/// Fast timings for tests
pub fn test_config() -> ClientConfig {
    ClientConfig {
        websocket_url: MOCK_URL.to_string(),
        max_reconnect_attempts: 3,
        reconnect_base_delay_ms: 50,
        heartbeat_interval_ms: 60_000,
        connection_timeout_ms: 1_000,
        request_timeout_ms: 2_000,
        is_production: false,
    }
}

pub fn manager_with(
    config: ClientConfig,
    connector: Arc<MockConnector>,
    session: Option<Arc<dyn SessionProvider>>,
) -> ConnectionManager {
    let mut builder = ConnectionManager::builder(config).connector(connector);
    if let Some(session) = session {
        builder = builder.session(session);
    }
    builder.build()
}

/// Manager already connected to an accepting mock
pub async fn connected(config: ClientConfig) -> (ConnectionManager, MockSocket, Arc<MockConnector>) {
    let (connector, mut sockets) = MockConnector::new(Behavior::Accept);
    let manager = manager_with(config, Arc::clone(&connector), None);
    manager.connect(MOCK_URL).await.expect("mock connect");
    let socket = sockets.recv().await.expect("socket");
    (manager, socket, connector)
}

/// Wait for the first event matching `predicate`
pub async fn next_event<F>(events: &mut broadcast::Receiver<ConnectionEvent>, predicate: F) -> ConnectionEvent
where
    F: Fn(&ConnectionEvent) -> bool,
{
    loop {
        let event = events.recv().await.expect("event channel closed");
        if predicate(&event) {
            return event;
        }
    }
}

pub fn authorize_reply(req_id: u64, loginid: &str) -> Value {
    json!({
        "msg_type": "authorize",
        "req_id": req_id,
        "echo_req": {"authorize": "<redacted>"},
        "authorize": {
            "loginid": loginid,
            "currency": "USD",
            "balance": 10000,
            "is_virtual": 1,
            "scopes": ["read", "trade"]
        }
    })
}

pub fn error_reply(msg_type: &str, req_id: u64, code: &str, message: &str) -> Value {
    json!({
        "msg_type": msg_type,
        "req_id": req_id,
        "error": {"code": code, "message": message}
    })
}

pub fn req_id_of(message: &Value) -> u64 {
    message["req_id"].as_u64().expect("message carries req_id")
}
