/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for binance-spot-adapter tests

#![allow(dead_code)]

use binance_spot_adapter::{ClientConfig, Credentials, SpotClient};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request as WsRequest, Response as WsResponse,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_API_SECRET: &str = "test-api-secret";

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn test_credentials() -> Credentials {
    Credentials::new(TEST_API_KEY, TEST_API_SECRET)
}

/// Client pointed at the mock server
pub fn client_for(server: &MockServer, credentials: Option<Credentials>) -> SpotClient {
    SpotClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
        .expect("client init")
        .with_credentials(credentials)
}

/// Serve `/api/v3/time`, expecting exactly `calls` requests
pub async fn mount_server_time(server: &MockServer, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/api/v3/time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "serverTime": chrono::Utc::now().timestamp_millis(),
        })))
        .expect(calls)
        .mount(server)
        .await;
}

/// Klines endpoint backed by a fixed one-minute candle history.
///
/// Honors `endTime` and `limit` the way the exchange does: the newest
/// `limit` candles opening at or before `endTime`, oldest first.
pub struct KlineHistory {
    open_times: Vec<i64>,
}

pub const HISTORY_START_MS: i64 = 1_600_000_000_000;
pub const MINUTE_MS: i64 = 60_000;

impl KlineHistory {
    pub fn new(candles: usize) -> Self {
        Self {
            open_times: (0..candles as i64)
                .map(|i| HISTORY_START_MS + i * MINUTE_MS)
                .collect(),
        }
    }

    pub fn newest_open_time(&self) -> i64 {
        *self.open_times.last().expect("non-empty history")
    }
}

impl Respond for KlineHistory {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut end_time = i64::MAX;
        let mut limit = 500usize;
        for (key, value) in request.url.query_pairs() {
            match key.as_ref() {
                "endTime" => end_time = value.parse().expect("endTime"),
                "limit" => limit = value.parse().expect("limit"),
                _ => {}
            }
        }

        let eligible: Vec<i64> = self
            .open_times
            .iter()
            .copied()
            .filter(|open_time| *open_time <= end_time)
            .collect();
        let page = &eligible[eligible.len().saturating_sub(limit)..];

        let rows: Vec<Value> = page.iter().map(|open_time| kline_row(*open_time)).collect();
        ResponseTemplate::new(200).set_body_json(rows)
    }
}

fn kline_row(open_time: i64) -> Value {
    json!([
        open_time,
        "100.00",
        "101.00",
        "99.00",
        "100.50",
        "12.5",
        open_time + MINUTE_MS - 1,
        "1256.25",
        42,
        "6.0",
        "603.0",
        "0"
    ])
}

/// Something the stream server observed
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A client connected with this request path and query
    Connected(String),
    /// A text frame arrived from the client
    Frame(Value),
}

enum ServerCommand {
    Send(String),
    Close,
}

/// Local combined-stream server: records connections and inbound frames, and
/// lets a test push frames to or close the current connection.
pub struct StreamServer {
    pub stream_url: String,
    events: mpsc::UnboundedReceiver<ServerEvent>,
    current: Arc<Mutex<Option<mpsc::UnboundedSender<ServerCommand>>>>,
}

impl StreamServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let (events_tx, events) = mpsc::unbounded_channel();
        let current = Arc::new(Mutex::new(None));

        tokio::spawn(serve(listener, events_tx, current.clone()));

        Self {
            stream_url: format!("ws://{addr}/stream?streams="),
            events,
            current,
        }
    }

    pub async fn next_event(&mut self) -> ServerEvent {
        tokio::time::timeout(EVENT_TIMEOUT, self.events.recv())
            .await
            .expect("timed out waiting for stream server event")
            .expect("stream server stopped")
    }

    /// Wait for a connection and return its request path and query
    pub async fn expect_connected(&mut self) -> String {
        match self.next_event().await {
            ServerEvent::Connected(uri) => uri,
            other => panic!("expected connection, got {other:?}"),
        }
    }

    pub async fn expect_frame(&mut self) -> Value {
        match self.next_event().await {
            ServerEvent::Frame(frame) => frame,
            other => panic!("expected frame, got {other:?}"),
        }
    }

    /// Assert nothing arrives for a short while
    pub async fn expect_quiet(&mut self) {
        let outcome = tokio::time::timeout(Duration::from_millis(200), self.events.recv()).await;
        assert!(outcome.is_err(), "unexpected stream server event: {outcome:?}");
    }

    pub fn send(&self, frame: Value) {
        self.command(ServerCommand::Send(frame.to_string()));
    }

    pub fn close(&self) {
        self.command(ServerCommand::Close);
    }

    fn command(&self, command: ServerCommand) {
        let guard = self.current.lock().expect("server lock");
        guard
            .as_ref()
            .expect("no client connected")
            .send(command)
            .unwrap_or_else(|_| panic!("connection already gone"));
    }
}

async fn serve(
    listener: TcpListener,
    events: mpsc::UnboundedSender<ServerEvent>,
    current: Arc<Mutex<Option<mpsc::UnboundedSender<ServerCommand>>>>,
) {
    while let Ok((stream, _)) = listener.accept().await {
        let mut uri = String::new();
        let callback = |request: &WsRequest, response: WsResponse| -> Result<WsResponse, ErrorResponse> {
            uri = request.uri().to_string();
            Ok(response)
        };
        let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
            continue;
        };

        let (commands_tx, mut commands) = mpsc::unbounded_channel();
        *current.lock().expect("server lock") = Some(commands_tx);
        let _ = events.send(ServerEvent::Connected(uri));

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(ServerCommand::Send(text)) => {
                        if ws.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Some(ServerCommand::Close) | None => {
                        let _ = ws.close(None).await;
                        break;
                    }
                },
                incoming = ws.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let frame = serde_json::from_str(text.as_str()).expect("client frame is JSON");
                        let _ = events.send(ServerEvent::Frame(frame));
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
            }
        }
    }
}

/// Combined-stream kline frame
pub fn kline_frame(symbol: &str, interval: &str, open_time: i64) -> Value {
    json!({
        "stream": format!("{}@kline_{interval}", symbol.to_lowercase()),
        "data": {
            "e": "kline", "E": open_time + 1, "s": symbol,
            "k": {
                "t": open_time, "T": open_time + MINUTE_MS - 1, "s": symbol, "i": interval,
                "f": 1, "L": 2, "o": "1.0", "c": "2.0", "h": "2.5", "l": "0.5",
                "v": "10", "n": 2, "x": false, "q": "15", "V": "5", "Q": "7.5", "B": "0"
            }
        }
    })
}

/// Combined-stream all-market ticker frame with one entry
pub fn ticker_frame(symbol: &str) -> Value {
    json!({
        "stream": "!ticker@arr",
        "data": [{
            "e": "24hrTicker", "E": 1, "s": symbol,
            "p": "0.1", "P": "1.0", "w": "10.0", "x": "9.9", "c": "10.0",
            "Q": "1", "b": "9.9", "B": "3", "a": "10.1", "A": "4",
            "o": "9.9", "h": "10.2", "l": "9.8", "v": "1000", "q": "10000",
            "O": 0, "C": 86400000, "F": 0, "L": 99, "n": 100
        }]
    })
}
