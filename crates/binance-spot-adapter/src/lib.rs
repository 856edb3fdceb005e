/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Binance spot adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod client;
pub mod http;
pub mod types;
pub mod ws;

pub use client::BinanceClient;

// Re-export commonly used types from http
pub use http::{
    BinanceError,
    ClientConfig,
    ClockSync,
    Credentials,
    RequestSigner,
    RequestSpec,
    Result,
    SpotClient,
};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{
    KlineEvent,
    SpotWebSocket,
    StreamEvent,
    TickerEvent,
    WsConfig,
};
