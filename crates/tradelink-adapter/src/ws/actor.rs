/*
[INPUT]:  Commands from ConnectionManager handles, socket events, timers
[OUTPUT]: Socket writes, resolved requests, listener callbacks, state and events
[POS]:    WebSocket layer - background task owning all connection state
[UPDATE]: When changing queueing, correlation, reconnect or dispatch rules
*/

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep, interval_at, sleep};
use tokio_util::time::{DelayQueue, delay_queue};
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use super::config::ClientConfig;
use super::manager::{
    ConnectionEvent, ConnectionState, ConnectionStats, Listener, StateSnapshot, SubscribeAck,
};
use super::message::{
    InboundEnvelope, OutboundMessage, heartbeat_request, stream_type_of, wire_method_of,
    with_req_id,
};
use super::transport::{Connector, TransportEvent, TransportLink};
use crate::auth::{SessionProvider, TokenStore};
use crate::error::{Result, TradelinkError};

const DISCARD_LOG_LIMIT: usize = 5;
const RAW_LOG_MAX_BYTES: usize = 512;

static DISCARD_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);

pub(crate) enum Command {
    Connect {
        url: Url,
        reply: oneshot::Sender<Result<()>>,
    },
    Send {
        payload: Value,
    },
    Request {
        payload: Value,
        timeout: Duration,
        reply: oneshot::Sender<Result<Value>>,
    },
    Subscribe {
        topic: String,
        payload: Value,
        listener: Listener,
        reply: oneshot::Sender<SubscribeAck>,
    },
    Unsubscribe {
        topic: String,
        listener_id: u64,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
    Stats {
        reply: oneshot::Sender<ConnectionStats>,
    },
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::Connect { .. } => "Connect",
            Command::Send { .. } => "Send",
            Command::Request { .. } => "Request",
            Command::Subscribe { .. } => "Subscribe",
            Command::Unsubscribe { .. } => "Unsubscribe",
            Command::Disconnect { .. } => "Disconnect",
            Command::Stats { .. } => "Stats",
        };
        f.write_str(name)
    }
}

struct ActiveLink {
    id: Uuid,
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

struct ConnectAttempt {
    result_rx: oneshot::Receiver<Result<TransportLink>>,
    task: JoinHandle<()>,
    deadline: Pin<Box<Sleep>>,
}

enum AttemptOutcome {
    Finished(Result<TransportLink>),
    TimedOut,
}

struct PendingRequest {
    reply: oneshot::Sender<Result<Value>>,
    expiry: delay_queue::Key,
    timeout: Duration,
    transmitted: bool,
}

struct Topic {
    /// Subscribe request without `req_id`
    request: Value,
    /// Correlation id reused for every (re)subscribe of this topic
    req_id: u64,
    server_id: Option<String>,
    listeners: Vec<(u64, Listener)>,
}

pub(crate) struct ConnectionActor {
    config: Arc<ClientConfig>,
    connector: Arc<dyn Connector>,
    session: Option<Arc<dyn SessionProvider>>,
    tokens: TokenStore,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    state_tx: watch::Sender<StateSnapshot>,
    events_tx: broadcast::Sender<ConnectionEvent>,

    url: Option<Url>,
    state: ConnectionState,
    link: Option<ActiveLink>,
    attempt: Option<ConnectAttempt>,
    connect_waiter: Option<oneshot::Sender<Result<()>>>,
    reconnect_delay: Option<Pin<Box<Sleep>>>,
    reconnecting: bool,
    reconnect_attempts: u32,
    /// Set by disconnect or after the last reconnect attempt; cleared by connect
    stopped: bool,
    heartbeat: Option<Interval>,

    queue: VecDeque<OutboundMessage>,
    pending: HashMap<u64, PendingRequest>,
    expirations: DelayQueue<u64>,
    topics: HashMap<String, Topic>,
    routes: HashMap<u64, String>,
    auth_req_id: Option<u64>,
    next_req_id: u64,
    next_listener_id: u64,
}

impl ConnectionActor {
    pub(crate) fn new(
        config: Arc<ClientConfig>,
        connector: Arc<dyn Connector>,
        session: Option<Arc<dyn SessionProvider>>,
        tokens: TokenStore,
        cmd_rx: mpsc::UnboundedReceiver<Command>,
        state_tx: watch::Sender<StateSnapshot>,
        events_tx: broadcast::Sender<ConnectionEvent>,
    ) -> Self {
        Self {
            config,
            connector,
            session,
            tokens,
            cmd_rx,
            state_tx,
            events_tx,
            url: None,
            state: ConnectionState::Disconnected,
            link: None,
            attempt: None,
            connect_waiter: None,
            reconnect_delay: None,
            reconnecting: false,
            reconnect_attempts: 0,
            stopped: false,
            heartbeat: None,
            queue: VecDeque::new(),
            pending: HashMap::new(),
            expirations: DelayQueue::new(),
            topics: HashMap::new(),
            routes: HashMap::new(),
            auth_req_id: None,
            next_req_id: 1,
            next_listener_id: 1,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.cmd_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                event = next_link_event(&mut self.link) => self.handle_link_event(event),
                outcome = attempt_outcome(&mut self.attempt) => self.handle_attempt_outcome(outcome),
                () = sleep_or_pending(&mut self.reconnect_delay) => {
                    self.reconnect_delay = None;
                    self.begin_attempt();
                }
                () = tick_or_pending(&mut self.heartbeat) => self.send_heartbeat(),
                Some(expired) = std::future::poll_fn(|cx| self.expirations.poll_expired(cx)) => {
                    self.expire_request(expired.into_inner());
                }
            }
        }
        self.shutdown();
    }

    // ---------------------------------------------------------------------
    // Commands
    // ---------------------------------------------------------------------

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect { url, reply } => self.connect(url, reply),
            Command::Send { payload } => {
                self.enqueue_or_transmit(OutboundMessage::new(payload));
            }
            Command::Request {
                payload,
                timeout,
                reply,
            } => self.request(payload, timeout, reply),
            Command::Subscribe {
                topic,
                payload,
                listener,
                reply,
            } => {
                let ack = self.subscribe(topic, payload, listener);
                let _ = reply.send(ack);
            }
            Command::Unsubscribe { topic, listener_id } => self.unsubscribe(&topic, listener_id),
            Command::Disconnect { reply } => {
                self.disconnect();
                let _ = reply.send(());
            }
            Command::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
        }
    }

    fn connect(&mut self, url: Url, reply: oneshot::Sender<Result<()>>) {
        if self.state.is_open() {
            debug!(url = %url, "ws already open");
            let _ = reply.send(Ok(()));
            return;
        }
        if self.attempt.is_some() || self.reconnecting {
            let _ = reply.send(Err(TradelinkError::ConnectInProgress));
            return;
        }
        self.url = Some(url);
        self.stopped = false;
        self.reconnect_attempts = 0;
        self.connect_waiter = Some(reply);
        self.begin_attempt();
    }

    fn request(&mut self, payload: Value, timeout: Duration, reply: oneshot::Sender<Result<Value>>) {
        let req_id = self.allocate_req_id();
        let expiry = self.expirations.insert(req_id, timeout);
        let transmitted = self.enqueue_or_transmit(OutboundMessage::new(with_req_id(payload, req_id)));
        self.pending.insert(
            req_id,
            PendingRequest {
                reply,
                expiry,
                timeout,
                transmitted,
            },
        );
    }

    fn subscribe(&mut self, topic: String, payload: Value, listener: Listener) -> SubscribeAck {
        let listener_id = self.next_listener_id;
        self.next_listener_id += 1;

        if let Some(entry) = self.topics.get_mut(&topic) {
            entry.listeners.push((listener_id, listener));
            return SubscribeAck {
                listener_id,
                req_id: entry.req_id,
                first: false,
            };
        }

        let req_id = self.allocate_req_id();
        self.topics.insert(
            topic.clone(),
            Topic {
                request: payload,
                req_id,
                server_id: None,
                listeners: vec![(listener_id, listener)],
            },
        );
        self.routes.insert(req_id, topic.clone());
        // While closed the topic is picked up by the resubscribe on open.
        if self.link.is_some() {
            self.issue_subscribe(&topic);
        }
        SubscribeAck {
            listener_id,
            req_id,
            first: true,
        }
    }

    fn unsubscribe(&mut self, topic: &str, listener_id: u64) {
        let Some(entry) = self.topics.get_mut(topic) else {
            return;
        };
        entry.listeners.retain(|(id, _)| *id != listener_id);
        if !entry.listeners.is_empty() {
            debug!(topic, remaining = entry.listeners.len(), "ws listener removed");
            return;
        }

        let Some(entry) = self.topics.remove(topic) else {
            return;
        };
        self.routes.remove(&entry.req_id);
        if self.link.is_none() {
            return;
        }
        let forget = match &entry.server_id {
            Some(id) => json!({ "forget": id }),
            None => match stream_type_of(&entry.request) {
                Some(stream) => json!({ "forget_all": stream }),
                None => return,
            },
        };
        info!(topic, server_id = ?entry.server_id, "ws unsubscribe sent");
        self.enqueue_or_transmit(OutboundMessage::new(forget));
    }

    fn disconnect(&mut self) {
        self.stopped = true;
        self.reconnecting = false;
        self.reconnect_delay = None;
        if let Some(attempt) = self.attempt.take() {
            attempt.task.abort();
        }
        if let Some(waiter) = self.connect_waiter.take() {
            let _ = waiter.send(Err(TradelinkError::Disconnected));
        }
        self.heartbeat = None;
        self.auth_req_id = None;
        self.queue.clear();
        self.expirations.clear();
        for (_, pending) in self.pending.drain() {
            let _ = pending.reply.send(Err(TradelinkError::Disconnected));
        }
        for topic in self.topics.values_mut() {
            topic.server_id = None;
        }

        let reason = if self.link.is_some() {
            self.set_state(ConnectionState::Closing);
            self.link = None;
            Some("client disconnect".to_string())
        } else {
            None
        };
        self.set_state(ConnectionState::Disconnected);
        // set_state skips publishing when already Disconnected
        self.publish_snapshot();
        if reason.is_some() {
            self.emit(ConnectionEvent::Closed { reason });
        }
        info!("ws disconnected by client");
    }

    fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            queued: self.queue.len(),
            pending: self.pending.len(),
            topics: self.topics.len(),
            listeners: self.topics.values().map(|topic| topic.listeners.len()).sum(),
            reconnect_attempts: self.reconnect_attempts,
        }
    }

    // ---------------------------------------------------------------------
    // Connection lifecycle
    // ---------------------------------------------------------------------

    fn begin_attempt(&mut self) {
        let Some(url) = self.url.clone() else {
            return;
        };
        info!(url = %url, attempt = self.reconnect_attempts, "ws connecting");
        let connector = Arc::clone(&self.connector);
        let (result_tx, result_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let _ = result_tx.send(connector.connect(&url).await);
        });
        self.attempt = Some(ConnectAttempt {
            result_rx,
            task,
            deadline: Box::pin(sleep(self.config.connection_timeout())),
        });
        self.set_state(ConnectionState::Connecting);
    }

    fn handle_attempt_outcome(&mut self, outcome: AttemptOutcome) {
        match outcome {
            AttemptOutcome::Finished(Ok(link)) => self.on_open(link),
            AttemptOutcome::Finished(Err(err)) => self.on_attempt_failed(err),
            AttemptOutcome::TimedOut => {
                if let Some(attempt) = self.attempt.take() {
                    attempt.task.abort();
                }
                self.on_attempt_failed(TradelinkError::WebSocket(format!(
                    "connection timed out after {}ms",
                    self.config.connection_timeout_ms
                )));
            }
        }
    }

    fn on_open(&mut self, link: TransportLink) {
        self.attempt = None;
        let id = Uuid::new_v4();
        self.link = Some(ActiveLink {
            id,
            outbound: link.outbound,
            inbound: link.inbound,
        });
        self.reconnecting = false;
        self.reconnect_attempts = 0;
        self.set_state(ConnectionState::Open);
        info!(connection_id = %id, "ws connected");
        self.emit(ConnectionEvent::Opened { connection_id: id });
        if let Some(waiter) = self.connect_waiter.take() {
            let _ = waiter.send(Ok(()));
        }

        self.send_authorize();
        self.start_heartbeat();
        let topics: Vec<String> = self.topics.keys().cloned().collect();
        for topic in topics {
            self.issue_subscribe(&topic);
        }
        self.flush_queue();
    }

    fn on_attempt_failed(&mut self, err: TradelinkError) {
        self.attempt = None;
        warn!(error = %err, "ws connect failed");
        self.emit(ConnectionEvent::TransportError {
            message: err.to_string(),
        });
        self.reconnecting = false;
        self.set_state(ConnectionState::Disconnected);
        self.schedule_reconnect();
        if let Some(waiter) = self.connect_waiter.take() {
            let _ = waiter.send(Err(err));
        }
    }

    fn handle_link_event(&mut self, event: Option<TransportEvent>) {
        match event {
            Some(TransportEvent::Message(text)) => self.handle_frame(&text),
            Some(TransportEvent::Closed(reason)) => self.on_link_lost(reason),
            Some(TransportEvent::Error(message)) => {
                warn!(error = %message, "ws transport error");
                self.emit(ConnectionEvent::TransportError {
                    message: message.clone(),
                });
                self.on_link_lost(Some(message));
            }
            None => self.on_link_lost(None),
        }
    }

    fn on_link_lost(&mut self, reason: Option<String>) {
        let connection_id = self.link.take().map(|link| link.id);
        self.heartbeat = None;
        self.auth_req_id = None;
        for topic in self.topics.values_mut() {
            topic.server_id = None;
        }

        let lost: Vec<u64> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.transmitted)
            .map(|(req_id, _)| *req_id)
            .collect();
        for req_id in lost {
            if let Some(pending) = self.pending.remove(&req_id) {
                self.expirations.remove(&pending.expiry);
                let _ = pending.reply.send(Err(TradelinkError::ConnectionLost { req_id }));
            }
        }

        warn!(connection_id = ?connection_id, reason = ?reason, "ws closed");
        self.set_state(ConnectionState::Disconnected);
        self.emit(ConnectionEvent::Closed { reason });
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        if self.stopped || self.url.is_none() {
            return;
        }
        if self.reconnecting {
            debug!("ws reconnect already scheduled");
            return;
        }
        if self.reconnect_attempts >= self.config.max_reconnect_attempts {
            let attempts = self.reconnect_attempts;
            error!(attempts, "ws reconnect failed; giving up");
            self.stopped = true;
            self.publish_snapshot();
            self.emit(ConnectionEvent::ReconnectFailed { attempts });
            return;
        }

        self.reconnect_attempts += 1;
        let attempt = self.reconnect_attempts;
        let delay = self.config.backoff_delay(attempt);
        self.reconnecting = true;
        self.reconnect_delay = Some(Box::pin(sleep(delay)));
        self.publish_snapshot();
        info!(attempt, delay_ms = delay.as_millis() as u64, "ws reconnect scheduled");
        self.emit(ConnectionEvent::Reconnecting { attempt, delay });
    }

    fn shutdown(&mut self) {
        if let Some(attempt) = self.attempt.take() {
            attempt.task.abort();
        }
        for (_, pending) in self.pending.drain() {
            let _ = pending.reply.send(Err(TradelinkError::Disconnected));
        }
        self.link = None;
        debug!("ws connection task stopped");
    }

    // ---------------------------------------------------------------------
    // Outbound
    // ---------------------------------------------------------------------

    /// Write `message` now when the socket is open, else queue it.
    /// Returns whether it was written.
    fn enqueue_or_transmit(&mut self, message: OutboundMessage) -> bool {
        if !self.queue.is_empty() {
            self.queue.push_back(message);
            return false;
        }
        if self.write(&message) {
            return true;
        }
        debug!(method = %message.method, req_id = ?message.req_id, "ws message queued");
        self.queue.push_back(message);
        false
    }

    fn write(&self, message: &OutboundMessage) -> bool {
        let Some(link) = &self.link else {
            return false;
        };
        if link.outbound.send(message.to_text()).is_err() {
            return false;
        }
        debug!(method = %message.method, req_id = ?message.req_id, "ws message sent");
        true
    }

    fn flush_queue(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        let count = self.queue.len();
        if let Some(oldest) = self.queue.front() {
            let waited_ms = (Utc::now() - oldest.queued_at).num_milliseconds();
            info!(count, waited_ms, "ws flushing queued messages");
        }
        while let Some(message) = self.queue.pop_front() {
            if !self.write(&message) {
                self.queue.push_front(message);
                break;
            }
            if let Some(pending) = message.req_id.and_then(|id| self.pending.get_mut(&id)) {
                pending.transmitted = true;
            }
        }
    }

    fn issue_subscribe(&mut self, topic: &str) {
        let Some(entry) = self.topics.get(topic) else {
            return;
        };
        let mut request = with_req_id(entry.request.clone(), entry.req_id);
        if let Some(object) = request.as_object_mut() {
            object.insert("subscribe".to_string(), Value::from(1));
        }
        let req_id = entry.req_id;
        let method = wire_method_of(&request).unwrap_or(topic).to_string();
        if self.write(&OutboundMessage::new(request)) {
            info!(topic, method = %method, req_id, "ws subscribe sent");
        }
    }

    fn send_authorize(&mut self) {
        let token = self.tokens.get_token().or_else(|| {
            let token = self.session.as_ref()?.token()?;
            self.tokens.set_token(token.clone());
            Some(token)
        });
        let Some(token) = token else {
            debug!("ws no session token; skipping authorize");
            return;
        };
        let req_id = self.allocate_req_id();
        if self.write(&OutboundMessage::new(json!({ "authorize": token, "req_id": req_id }))) {
            self.auth_req_id = Some(req_id);
        }
    }

    fn start_heartbeat(&mut self) {
        let period = self.config.heartbeat_interval();
        if period.is_zero() {
            self.heartbeat = None;
            return;
        }
        let mut heartbeat = interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.heartbeat = Some(heartbeat);
    }

    fn send_heartbeat(&mut self) {
        if !self.write(&OutboundMessage::new(heartbeat_request())) {
            debug!("ws heartbeat skipped; socket not open");
        }
    }

    // ---------------------------------------------------------------------
    // Inbound
    // ---------------------------------------------------------------------

    fn handle_frame(&mut self, text: &str) {
        let envelope = match InboundEnvelope::parse(text) {
            Ok(envelope) => envelope,
            Err(rejection) => {
                log_discarded_once(&format!("{rejection:?}"), text);
                return;
            }
        };

        if let Some(req_id) = envelope.req_id() {
            if self.auth_req_id == Some(req_id) {
                self.handle_authorize_reply(&envelope);
                return;
            }
            if let Some(pending) = self.pending.remove(&req_id) {
                self.expirations.remove(&pending.expiry);
                let _ = pending.reply.send(Ok(envelope.into_body()));
                return;
            }
        }
        if envelope.is_heartbeat() {
            return;
        }
        self.dispatch(&envelope);
    }

    fn handle_authorize_reply(&mut self, envelope: &InboundEnvelope) {
        self.auth_req_id = None;
        if let Some(error) = envelope.error() {
            let code = error.get("code").and_then(Value::as_str).unwrap_or("").to_string();
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            warn!(code = %code, message = %message, "ws authorize rejected; token cleared");
            self.tokens.clear();
            self.emit(ConnectionEvent::AuthorizationFailed { code, message });
            return;
        }

        let loginid = envelope
            .body()
            .get("authorize")
            .and_then(|authorize| authorize.get("loginid"))
            .and_then(Value::as_str)
            .map(str::to_string);
        if let Some(loginid) = &loginid {
            self.tokens.set_loginid(loginid.clone());
        }
        info!(loginid = ?loginid, "ws authorized");
        self.emit(ConnectionEvent::Authorized { loginid });
    }

    fn dispatch(&mut self, envelope: &InboundEnvelope) {
        let topic_name = envelope
            .req_id()
            .and_then(|req_id| self.routes.get(&req_id).cloned())
            .or_else(|| {
                let server_id = envelope.subscription_id()?;
                self.topics
                    .iter()
                    .find(|(_, topic)| topic.server_id.as_deref() == Some(server_id))
                    .map(|(name, _)| name.clone())
            })
            .unwrap_or_else(|| envelope.msg_type().to_string());

        let Some(topic) = self.topics.get_mut(&topic_name) else {
            debug!(msg_type = envelope.msg_type(), "ws message has no listeners");
            return;
        };
        if let Some(server_id) = envelope.subscription_id() {
            if topic.server_id.as_deref() != Some(server_id) {
                topic.server_id = Some(server_id.to_string());
            }
        }

        let listeners: Vec<Listener> = topic
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        let payload = envelope.body();
        for listener in listeners {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| listener(payload))) {
                error!(
                    topic = %topic_name,
                    panic = %panic_message(panic.as_ref()),
                    "ws listener panicked"
                );
            }
        }
    }

    fn expire_request(&mut self, req_id: u64) {
        let Some(pending) = self.pending.remove(&req_id) else {
            return;
        };
        let duration_ms = pending.timeout.as_millis() as u64;
        warn!(req_id, duration_ms, "ws request timed out");
        let _ = pending.reply.send(Err(TradelinkError::Timeout {
            req_id,
            duration_ms,
        }));
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    fn allocate_req_id(&mut self) -> u64 {
        let req_id = self.next_req_id;
        self.next_req_id += 1;
        req_id
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state == state {
            return;
        }
        self.state = state;
        self.publish_snapshot();
        self.emit(ConnectionEvent::StateChanged(state));
    }

    fn publish_snapshot(&self) {
        self.state_tx.send_replace(StateSnapshot {
            state: self.state,
            reconnecting: self.reconnecting,
        });
    }

    fn emit(&self, event: ConnectionEvent) {
        let _ = self.events_tx.send(event);
    }
}

async fn next_link_event(link: &mut Option<ActiveLink>) -> Option<TransportEvent> {
    match link {
        Some(link) => link.inbound.recv().await,
        None => std::future::pending().await,
    }
}

async fn attempt_outcome(attempt: &mut Option<ConnectAttempt>) -> AttemptOutcome {
    let Some(attempt) = attempt else {
        return std::future::pending().await;
    };
    tokio::select! {
        result = &mut attempt.result_rx => AttemptOutcome::Finished(result.unwrap_or_else(|_| {
            Err(TradelinkError::WebSocket("connect task aborted".to_string()))
        })),
        () = &mut attempt.deadline => AttemptOutcome::TimedOut,
    }
}

async fn sleep_or_pending(delay: &mut Option<Pin<Box<Sleep>>>) {
    match delay {
        Some(delay) => delay.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn tick_or_pending(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(heartbeat) => {
            heartbeat.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn log_discarded_once(reason: &str, raw: &str) {
    let count = DISCARD_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < DISCARD_LOG_LIMIT {
        info!(
            sample_index = count + 1,
            sample_limit = DISCARD_LOG_LIMIT,
            reason,
            bytes = raw.len(),
            "ws message discarded"
        );
    }
    debug!(
        reason,
        message = %truncate_for_log(raw, RAW_LOG_MAX_BYTES),
        "ws message discarded"
    );
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}
