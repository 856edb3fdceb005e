/*
[INPUT]:  Stream topics and per-key handler callbacks
[OUTPUT]: Inbound stream events routed to matching handlers
[POS]:    WebSocket layer - subscription manager owning the single stream connection
[UPDATE]: When changing subscribe protocol, routing or reconnection
*/

use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::AbortHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use crate::ws::message::{ALL_TICKERS_TOPIC, StreamEvent, kline_topic, subscribe_frame};

const STREAM_URL: &str = "wss://stream.binance.com:9443/stream?streams=";

/// Handler key shared by every kline subscription
pub const KLINE_HANDLER_KEY: &str = "kline";

const SUBSCRIPTION_LOG_LIMIT: usize = 10;
const PARSE_FAIL_LOG_LIMIT: usize = 3;
const RAW_LOG_MAX_BYTES: usize = 1024;

static SUBSCRIBE_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);
static PARSE_FAIL_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Callback invoked for every inbound event whose stream contains the handler key
pub type StreamHandler = Arc<dyn Fn(StreamEvent) + Send + Sync>;

/// WebSocket configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Combined-stream URL prefix; topics are appended joined by `/`
    pub stream_url: String,
    /// Pause before reopening a closed connection. Zero reconnects immediately.
    pub reconnect_delay: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            stream_url: STREAM_URL.to_string(),
            reconnect_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Absent,
    Connecting,
    Open,
    Closed,
}

/// Connection state and subscription registry, mutated only by [`SpotWebSocket`]
/// and its connection task.
struct Subscriptions {
    connection: ConnectionState,
    topics: Vec<String>,
    handlers: HashMap<String, StreamHandler>,
    deferred: Vec<Vec<String>>,
    outbound: Option<mpsc::UnboundedSender<WsMessage>>,
    next_request_id: u64,
}

impl Subscriptions {
    fn new() -> Self {
        Self {
            connection: ConnectionState::Absent,
            topics: Vec::new(),
            handlers: HashMap::new(),
            deferred: Vec::new(),
            outbound: None,
            next_request_id: 1,
        }
    }

    /// Track topics not yet active and return them
    fn track(&mut self, topics: Vec<String>) -> Vec<String> {
        let mut added = Vec::new();
        for topic in topics {
            if !self.topics.contains(&topic) && !added.contains(&topic) {
                added.push(topic);
            }
        }
        self.topics.extend(added.iter().cloned());
        added
    }

    /// Subscribe on the open connection and extend the tracked set
    fn subscribe_open(&mut self, topics: Vec<String>) {
        let mut requested: Vec<String> = Vec::with_capacity(topics.len());
        for topic in topics {
            if !requested.contains(&topic) {
                requested.push(topic);
            }
        }
        if requested.is_empty() {
            return;
        }
        self.track(requested.clone());
        self.send_subscribe(&requested);
    }

    fn send_subscribe(&mut self, topics: &[String]) {
        let Some(outbound) = self.outbound.as_ref() else {
            return;
        };

        let id = self.next_request_id;
        let frame = subscribe_frame(topics, id);
        if outbound.send(WsMessage::Text(frame.to_string().into())).is_err() {
            warn!(id, "ws subscribe dropped, connection task gone");
            return;
        }
        self.next_request_id += 1;
        log_subscription_sent(id, topics);
    }

    fn matching_handlers(&self, stream: &str) -> Vec<StreamHandler> {
        self.handlers
            .iter()
            .filter(|(key, _)| stream.contains(key.as_str()))
            .map(|(_, handler)| handler.clone())
            .collect()
    }
}

/// Subscription manager for the combined spot stream.
///
/// Owns one connection, opened lazily by the first subscription and reopened
/// with every tracked topic whenever it closes. Connection failures are never
/// surfaced to callers or handlers.
pub struct SpotWebSocket {
    config: WsConfig,
    state: Arc<Mutex<Subscriptions>>,
    worker: OnceLock<AbortHandle>,
}

impl std::fmt::Debug for SpotWebSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotWebSocket")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SpotWebSocket {
    /// Create a new WebSocket client
    pub fn new() -> Self {
        Self::with_config(WsConfig::default())
    }

    pub fn with_config(config: WsConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(Subscriptions::new())),
            worker: OnceLock::new(),
        }
    }

    /// Register `handler` under `handler_key` and subscribe to `topics`.
    ///
    /// The first registration of a key wins; later calls with the same key do
    /// nothing. Subscriptions made while the connection is still opening are
    /// sent as soon as it is open.
    pub async fn subscribe<F>(&self, topics: Vec<String>, handler_key: &str, handler: F)
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        let mut state = self.state.lock().await;
        if state.handlers.contains_key(handler_key) {
            debug!(handler_key, "handler already registered, ignoring subscribe");
            return;
        }
        state
            .handlers
            .insert(handler_key.to_string(), Arc::new(handler));

        match state.connection {
            ConnectionState::Absent => {
                state.track(topics);
                state.connection = ConnectionState::Connecting;
                let task = tokio::spawn(run_connection(self.config.clone(), self.state.clone()));
                let _ = self.worker.set(task.abort_handle());
            }
            ConnectionState::Open => state.subscribe_open(topics),
            ConnectionState::Connecting | ConnectionState::Closed => {
                debug!(handler_key, "connection not open yet, deferring subscribe");
                state.deferred.push(topics);
            }
        }
    }

    /// Subscribe to kline streams for `(symbol, interval)` pairs
    pub async fn candlesticks<F>(&self, streams: &[(&str, &str)], handler: F)
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        let topics = streams
            .iter()
            .map(|(symbol, interval)| kline_topic(symbol, interval))
            .collect();
        self.subscribe(topics, KLINE_HANDLER_KEY, handler).await;
    }

    /// Subscribe to the all-market 24h ticker array
    pub async fn all_tickers<F>(&self, handler: F)
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        self.subscribe(vec![ALL_TICKERS_TOPIC.to_string()], ALL_TICKERS_TOPIC, handler)
            .await;
    }

    /// Number of registered handlers
    pub async fn handler_count(&self) -> usize {
        self.state.lock().await.handlers.len()
    }

    /// Topics replayed on every reconnect
    pub async fn active_topics(&self) -> Vec<String> {
        self.state.lock().await.topics.clone()
    }
}

impl Default for SpotWebSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SpotWebSocket {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get() {
            worker.abort();
        }
    }
}

fn stream_url(prefix: &str, topics: &[String]) -> String {
    format!("{prefix}{}", topics.join("/"))
}

/// Connection task: open, serve, and reopen forever.
async fn run_connection(config: WsConfig, state: Arc<Mutex<Subscriptions>>) {
    loop {
        let topics = {
            let mut guard = state.lock().await;
            guard.connection = ConnectionState::Connecting;
            guard.topics.clone()
        };

        match connect_async(stream_url(&config.stream_url, &topics)).await {
            Ok((ws_stream, _response)) => {
                let (mut write, mut read) = ws_stream.split();
                let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();

                {
                    let mut guard = state.lock().await;
                    guard.outbound = Some(outbound_tx);
                    guard.connection = ConnectionState::Open;
                    let tracked = guard.topics.clone();
                    if !tracked.is_empty() {
                        guard.send_subscribe(&tracked);
                    }
                    for topics in std::mem::take(&mut guard.deferred) {
                        guard.subscribe_open(topics);
                    }
                    info!(streams = %guard.topics.join(", "), "listening to streams");
                }

                loop {
                    tokio::select! {
                        outbound = outbound_rx.recv() => {
                            match outbound {
                                Some(message) => {
                                    if write.send(message).await.is_err() {
                                        break;
                                    }
                                }
                                None => {
                                    let _ = write.send(WsMessage::Close(None)).await;
                                    break;
                                }
                            }
                        }
                        incoming = read.next() => {
                            match incoming {
                                Some(Ok(WsMessage::Close(_))) => {
                                    let _ = write.send(WsMessage::Close(None)).await;
                                    break;
                                }
                                Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => {}
                                Some(Ok(message)) => {
                                    if let Some(event) = parse_message(message) {
                                        dispatch(&state, event).await;
                                    }
                                }
                                Some(Err(err)) => {
                                    warn!(error = %err, "ws read failed");
                                    break;
                                }
                                None => break,
                            }
                        }
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "ws connect failed");
            }
        }

        {
            let mut guard = state.lock().await;
            guard.connection = ConnectionState::Closed;
            guard.outbound = None;
        }
        warn!("ws connection closed, reconnecting");

        if config.reconnect_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(config.reconnect_delay).await;
        }
    }
}

async fn dispatch(state: &Mutex<Subscriptions>, event: StreamEvent) {
    let handlers = state.lock().await.matching_handlers(&event.stream);
    for handler in handlers {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(event.clone())));
        if outcome.is_err() {
            warn!(stream = %event.stream, "stream handler panicked");
        }
    }
}

fn parse_message(message: WsMessage) -> Option<StreamEvent> {
    let text: String = match message {
        WsMessage::Text(text) => text.as_str().to_string(),
        WsMessage::Binary(bytes) => String::from_utf8(bytes.to_vec()).ok()?,
        _ => return None,
    };

    match StreamEvent::parse(&text) {
        Ok(event) => event,
        Err(err) => {
            log_parse_fail_once(&err, &text);
            None
        }
    }
}

fn log_subscription_sent(id: u64, topics: &[String]) {
    let count = SUBSCRIBE_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count >= SUBSCRIPTION_LOG_LIMIT {
        return;
    }

    info!(
        sample_index = count + 1,
        sample_limit = SUBSCRIPTION_LOG_LIMIT,
        id,
        streams = %topics.join(", "),
        "ws subscription sent"
    );
}

fn log_parse_fail_once(err: &serde_json::Error, raw: &str) {
    let count = PARSE_FAIL_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < PARSE_FAIL_LOG_LIMIT {
        let preview = truncate_for_log(raw, RAW_LOG_MAX_BYTES);
        debug!(
            sample_index = count + 1,
            sample_limit = PARSE_FAIL_LOG_LIMIT,
            error = %err,
            bytes = raw.len(),
            raw = %preview,
            "ws message parse failed"
        );
    }
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
