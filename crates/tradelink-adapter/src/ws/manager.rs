/*
[INPUT]:  Connect/send/subscribe calls from the API wrappers
[OUTPUT]: Correlated replies, topic pushes, connection state and events
[POS]:    WebSocket layer - public handle of the connection manager
[UPDATE]: When adding manager operations or connection events
*/

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::debug;
use uuid::Uuid;

use super::actor::{Command, ConnectionActor};
use super::config::{ClientConfig, check_transport_url};
use super::transport::{Connector, TungsteniteConnector};
use crate::auth::{SessionProvider, TokenStore};
use crate::error::{Result, TradelinkError};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Callback invoked for every push on a topic
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Lifecycle state of the single logical connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closing,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

/// State published to observers; `reconnecting` gates re-entrant connects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StateSnapshot {
    pub state: ConnectionState,
    pub reconnecting: bool,
}

/// Observable connection events
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    StateChanged(ConnectionState),
    Opened { connection_id: Uuid },
    Closed { reason: Option<String> },
    TransportError { message: String },
    Reconnecting { attempt: u32, delay: Duration },
    /// Terminal: reconnection stopped after the configured attempts
    ReconnectFailed { attempts: u32 },
    Authorized { loginid: Option<String> },
    /// The server rejected the session token; the manager cleared its copy
    AuthorizationFailed { code: String, message: String },
}

/// Bookkeeping counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionStats {
    pub queued: usize,
    pub pending: usize,
    pub topics: usize,
    pub listeners: usize,
    pub reconnect_attempts: u32,
}

/// Reply to a subscribe command
#[derive(Debug, Clone, Copy)]
pub(crate) struct SubscribeAck {
    pub listener_id: u64,
    pub req_id: u64,
    pub first: bool,
}

/// Owner of the single multiplexed connection.
///
/// Cheap to clone; all clones drive the same background task, which owns the
/// outbound queue, pending requests and the subscription registry. The task
/// stops once every handle is dropped.
#[derive(Clone)]
pub struct ConnectionManager {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<StateSnapshot>,
    events_tx: broadcast::Sender<ConnectionEvent>,
    tokens: TokenStore,
    config: Arc<ClientConfig>,
}

/// Builder for [`ConnectionManager`]
pub struct ConnectionManagerBuilder {
    config: ClientConfig,
    connector: Arc<dyn Connector>,
    session: Option<Arc<dyn SessionProvider>>,
    tokens: TokenStore,
}

impl ConnectionManagerBuilder {
    /// Use a custom socket connector
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    /// Source of the token for the authorize handshake
    pub fn session(mut self, session: Arc<dyn SessionProvider>) -> Self {
        self.session = Some(session);
        self
    }

    /// Share an existing token store
    pub fn tokens(mut self, tokens: TokenStore) -> Self {
        self.tokens = tokens;
        self
    }

    /// Spawn the connection task. Must be called inside a tokio runtime.
    pub fn build(self) -> ConnectionManager {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(StateSnapshot {
            state: ConnectionState::Disconnected,
            reconnecting: false,
        });
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let config = Arc::new(self.config);

        let actor = ConnectionActor::new(
            Arc::clone(&config),
            self.connector,
            self.session,
            self.tokens.clone(),
            cmd_rx,
            state_tx,
            events_tx.clone(),
        );
        tokio::spawn(actor.run());

        ConnectionManager {
            cmd_tx,
            state_rx,
            events_tx,
            tokens: self.tokens,
            config,
        }
    }
}

impl ConnectionManager {
    /// Manager using the tokio-tungstenite connector
    pub fn new(config: ClientConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: ClientConfig) -> ConnectionManagerBuilder {
        ConnectionManagerBuilder {
            config,
            connector: Arc::new(TungsteniteConnector),
            session: None,
            tokens: TokenStore::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Open the connection and wait for the handshake.
    ///
    /// No-op when already open. Insecure or malformed URLs fail with
    /// [`TradelinkError::Config`] and are not retried. A failed first attempt
    /// is returned here while reconnection continues in the background.
    pub async fn connect(&self, url: &str) -> Result<()> {
        let url = check_transport_url(url, self.config.is_production)?;
        let (reply, reply_rx) = oneshot::channel();
        self.command(Command::Connect { url, reply })?;
        reply_rx.await.map_err(|_| TradelinkError::Disconnected)?
    }

    /// Connect to the configured `websocket_url`
    pub async fn connect_default(&self) -> Result<()> {
        let url = self.config.websocket_url.clone();
        self.connect(&url).await
    }

    /// Fire-and-forget: written now when open, queued otherwise.
    pub fn send(&self, message: Value) -> Result<()> {
        require_object(&message)?;
        self.command(Command::Send { payload: message })
    }

    /// Send with a fresh `req_id` and wait for the matching reply.
    ///
    /// Resolves with the whole reply envelope, including any server `error`
    /// object. Rejects with [`TradelinkError::Timeout`] when no reply arrives
    /// within `timeout` (config default when `None`).
    pub async fn send_with_response(
        &self,
        message: Value,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        require_object(&message)?;
        let timeout = timeout.unwrap_or_else(|| self.config.request_timeout());
        let (reply, reply_rx) = oneshot::channel();
        self.command(Command::Request {
            payload: message,
            timeout,
            reply,
        })?;
        reply_rx.await.map_err(|_| TradelinkError::Disconnected)?
    }

    /// Register `listener` on `topic`.
    ///
    /// Only the first listener of a topic puts `request` (with `subscribe: 1`)
    /// on the wire. Dropping or unsubscribing the returned handle removes the
    /// listener; the last one out sends the wire unsubscribe.
    pub async fn subscribe<F>(&self, topic: &str, request: Value, listener: F) -> Result<Subscription>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        if topic.trim().is_empty() {
            return Err(TradelinkError::InvalidParams(
                "subscription topic must be a non-empty string".to_string(),
            ));
        }
        require_object(&request)?;

        let (reply, reply_rx) = oneshot::channel();
        self.command(Command::Subscribe {
            topic: topic.to_string(),
            payload: request,
            listener: Arc::new(listener),
            reply,
        })?;
        let ack: SubscribeAck = reply_rx.await.map_err(|_| TradelinkError::Disconnected)?;
        debug!(topic, req_id = ack.req_id, first = ack.first, "ws listener registered");

        Ok(Subscription {
            topic: topic.to_string(),
            listener_id: ack.listener_id,
            req_id: ack.req_id,
            cmd_tx: Some(self.cmd_tx.downgrade()),
        })
    }

    /// Close the connection, reject pending requests, drop the queue and stop
    /// reconnecting. A later `connect` starts over.
    pub async fn disconnect(&self) {
        let (reply, reply_rx) = oneshot::channel();
        if self.command(Command::Disconnect { reply }).is_ok() {
            let _ = reply_rx.await;
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state_rx.borrow().state
    }

    pub fn is_reconnecting(&self) -> bool {
        self.state_rx.borrow().reconnecting
    }

    /// Wait until the connection reaches `target`.
    pub async fn wait_for_state(&self, target: ConnectionState) -> Result<()> {
        let mut state_rx = self.state_rx.clone();
        state_rx
            .wait_for(|snapshot| snapshot.state == target)
            .await
            .map(|_| ())
            .map_err(|_| TradelinkError::Disconnected)
    }

    /// Subscribe to connection events
    pub fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events_tx.subscribe()
    }

    /// Token used by the next authorize handshake
    pub fn set_token(&self, token: impl Into<String>) {
        self.tokens.set_token(token);
    }

    pub fn clear_token(&self) {
        self.tokens.clear();
    }

    pub fn token(&self) -> Option<String> {
        self.tokens.get_token()
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub async fn stats(&self) -> Result<ConnectionStats> {
        let (reply, reply_rx) = oneshot::channel();
        self.command(Command::Stats { reply })?;
        reply_rx.await.map_err(|_| TradelinkError::Disconnected)
    }

    fn command(&self, command: Command) -> Result<()> {
        self.cmd_tx
            .send(command)
            .map_err(|_| TradelinkError::Disconnected)
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .field("reconnecting", &self.is_reconnecting())
            .field("websocket_url", &self.config.websocket_url)
            .finish()
    }
}

fn require_object(message: &Value) -> Result<()> {
    if message.is_object() {
        Ok(())
    } else {
        Err(TradelinkError::InvalidParams(
            "outbound message must be a JSON object".to_string(),
        ))
    }
}

/// Capability to remove one listener from a topic.
///
/// Unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    listener_id: u64,
    req_id: u64,
    cmd_tx: Option<mpsc::WeakUnboundedSender<Command>>,
}

impl Subscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Correlation id carried by the topic's wire subscribe and its pushes
    pub fn req_id(&self) -> u64 {
        self.req_id
    }

    pub fn listener_id(&self) -> u64 {
        self.listener_id
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(cmd_tx) = self.cmd_tx.take().and_then(|weak| weak.upgrade()) else {
            return;
        };
        let _ = cmd_tx.send(Command::Unsubscribe {
            topic: std::mem::take(&mut self.topic),
            listener_id: self.listener_id,
        });
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
