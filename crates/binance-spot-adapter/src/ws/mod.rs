/*
[INPUT]:  Stream topics and handler callbacks
[OUTPUT]: Real-time kline and ticker events routed to handlers
[POS]:    WebSocket layer - real-time data streams
[UPDATE]: When adding new streams or changing connection logic
*/

pub mod client;
pub mod message;

pub use client::{KLINE_HANDLER_KEY, SpotWebSocket, StreamHandler, WsConfig};
pub use message::{
    ALL_TICKERS_TOPIC, Kline, KlineEvent, StreamEvent, TickerEvent, kline_topic, subscribe_frame,
};
