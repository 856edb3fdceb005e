/*
[INPUT]:  Raw combined-stream frames
[OUTPUT]: Stream events, typed kline/ticker payloads and control frames
[POS]:    WebSocket layer - message parsing and validation
[UPDATE]: When adding new message types or changing format
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Candlestick;

/// Topic of the all-market 24h ticker array feed
pub const ALL_TICKERS_TOPIC: &str = "!ticker@arr";

/// Topic of a kline feed, e.g. `btcusdt@kline_1m`
pub fn kline_topic(symbol: &str, interval: &str) -> String {
    format!("{}@kline_{}", symbol.to_lowercase(), interval)
}

/// `{"method":"SUBSCRIBE","params":[...],"id":n}`
pub fn subscribe_frame(topics: &[String], id: u64) -> Value {
    serde_json::json!({
        "method": "SUBSCRIBE",
        "params": topics,
        "id": id,
    })
}

/// Inbound combined-stream frame: `{stream, data}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub stream: String,
    #[serde(default)]
    pub data: Value,
}

impl StreamEvent {
    /// Parse a frame; `None` for anything without a `stream` (e.g. subscribe acks)
    pub fn parse(text: &str) -> Result<Option<Self>, serde_json::Error> {
        let mut value: Value = serde_json::from_str(text)?;
        let Some(stream) = value.get("stream").and_then(Value::as_str).map(str::to_string) else {
            return Ok(None);
        };
        let data = value.get_mut("data").map(Value::take).unwrap_or(Value::Null);
        Ok(Some(Self { stream, data }))
    }

    /// Payload as a kline event
    pub fn kline(&self) -> Option<KlineEvent> {
        serde_json::from_value(self.data.clone()).ok()
    }

    /// Payload as a ticker array
    pub fn tickers(&self) -> Option<Vec<TickerEvent>> {
        serde_json::from_value(self.data.clone()).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KlineEvent {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "k")]
    pub kline: Kline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    #[serde(rename = "t")]
    pub open_time: i64,
    #[serde(rename = "T")]
    pub close_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "i")]
    pub interval: String,
    #[serde(rename = "f")]
    pub first_trade_id: i64,
    #[serde(rename = "L")]
    pub last_trade_id: i64,
    #[serde(rename = "o", with = "rust_decimal::serde::str")]
    pub open: Decimal,
    #[serde(rename = "c", with = "rust_decimal::serde::str")]
    pub close: Decimal,
    #[serde(rename = "h", with = "rust_decimal::serde::str")]
    pub high: Decimal,
    #[serde(rename = "l", with = "rust_decimal::serde::str")]
    pub low: Decimal,
    #[serde(rename = "v", with = "rust_decimal::serde::str")]
    pub volume: Decimal,
    #[serde(rename = "n")]
    pub number_of_trades: u64,
    #[serde(rename = "x")]
    pub is_closed: bool,
    #[serde(rename = "q", with = "rust_decimal::serde::str")]
    pub quote_volume: Decimal,
    #[serde(rename = "V", with = "rust_decimal::serde::str")]
    pub taker_buy_volume: Decimal,
    #[serde(rename = "Q", with = "rust_decimal::serde::str")]
    pub taker_buy_quote_volume: Decimal,
}

impl Kline {
    pub fn to_candlestick(&self) -> Candlestick {
        Candlestick {
            open_time: self.open_time,
            close_time: self.close_time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            quote_volume: self.quote_volume,
            number_of_trades: self.number_of_trades,
            taker_buy_volume: self.taker_buy_volume,
            taker_buy_quote_volume: self.taker_buy_quote_volume,
        }
    }
}

/// 24h rolling ticker, one element of the `!ticker@arr` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerEvent {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    pub price_change: Decimal,
    #[serde(rename = "P", with = "rust_decimal::serde::str")]
    pub price_change_percent: Decimal,
    #[serde(rename = "w", with = "rust_decimal::serde::str")]
    pub weighted_avg_price: Decimal,
    #[serde(rename = "x", with = "rust_decimal::serde::str")]
    pub prev_close_price: Decimal,
    #[serde(rename = "c", with = "rust_decimal::serde::str")]
    pub last_price: Decimal,
    #[serde(rename = "Q", with = "rust_decimal::serde::str")]
    pub last_qty: Decimal,
    #[serde(rename = "b", with = "rust_decimal::serde::str")]
    pub best_bid_price: Decimal,
    #[serde(rename = "B", with = "rust_decimal::serde::str")]
    pub best_bid_qty: Decimal,
    #[serde(rename = "a", with = "rust_decimal::serde::str")]
    pub best_ask_price: Decimal,
    #[serde(rename = "A", with = "rust_decimal::serde::str")]
    pub best_ask_qty: Decimal,
    #[serde(rename = "o", with = "rust_decimal::serde::str")]
    pub open_price: Decimal,
    #[serde(rename = "h", with = "rust_decimal::serde::str")]
    pub high_price: Decimal,
    #[serde(rename = "l", with = "rust_decimal::serde::str")]
    pub low_price: Decimal,
    #[serde(rename = "v", with = "rust_decimal::serde::str")]
    pub volume: Decimal,
    #[serde(rename = "q", with = "rust_decimal::serde::str")]
    pub quote_volume: Decimal,
    #[serde(rename = "O")]
    pub open_time: i64,
    #[serde(rename = "C")]
    pub close_time: i64,
    #[serde(rename = "F")]
    pub first_trade_id: i64,
    #[serde(rename = "L")]
    pub last_trade_id: i64,
    #[serde(rename = "n")]
    pub number_of_trades: u64,
}
