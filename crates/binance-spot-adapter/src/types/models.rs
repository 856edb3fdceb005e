/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::enums::{OrderSide, OrderStatus, OrderType, TimeInForce};

/// One candle from the klines endpoint.
///
/// The wire form is a positional array whose numeric fields arrive as a mix
/// of JSON strings and numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>")]
#[serde(rename_all = "camelCase")]
pub struct Candlestick {
    pub open_time: i64,
    pub close_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub quote_volume: Decimal,
    pub number_of_trades: u64,
    pub taker_buy_volume: Decimal,
    pub taker_buy_quote_volume: Decimal,
}

const KLINE_FIELDS: usize = 11;

impl TryFrom<Vec<Value>> for Candlestick {
    type Error = String;

    fn try_from(row: Vec<Value>) -> Result<Self, Self::Error> {
        if row.len() < KLINE_FIELDS {
            return Err(format!(
                "kline row has {} fields, expected at least {KLINE_FIELDS}",
                row.len()
            ));
        }

        Ok(Candlestick {
            open_time: serde_helpers::value_to_i64(&row[0])?,
            open: serde_helpers::value_to_decimal(&row[1])?,
            high: serde_helpers::value_to_decimal(&row[2])?,
            low: serde_helpers::value_to_decimal(&row[3])?,
            close: serde_helpers::value_to_decimal(&row[4])?,
            volume: serde_helpers::value_to_decimal(&row[5])?,
            close_time: serde_helpers::value_to_i64(&row[6])?,
            quote_volume: serde_helpers::value_to_decimal(&row[7])?,
            number_of_trades: serde_helpers::value_to_u64(&row[8])?,
            taker_buy_volume: serde_helpers::value_to_decimal(&row[9])?,
            taker_buy_quote_volume: serde_helpers::value_to_decimal(&row[10])?,
        })
    }
}

/// Spot balance, renamed from the exchange's `free`/`locked`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub asset: String,
    #[serde(alias = "free", with = "rust_decimal::serde::str")]
    pub available: Decimal,
    #[serde(rename = "inOrder", alias = "locked", with = "rust_decimal::serde::str")]
    pub in_order: Decimal,
}

/// A single exchange filter; everything but `filterType` is kept as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolFilter {
    #[serde(rename = "filterType")]
    pub filter_type: String,
    #[serde(flatten)]
    pub params: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub base_asset: Option<String>,
    #[serde(default)]
    pub quote_asset: Option<String>,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
}

/// Filter parameters keyed by filter type (e.g. `LOT_SIZE`)
pub type FilterSet = BTreeMap<String, serde_json::Map<String, Value>>;

/// Filter sets keyed by symbol
pub type SymbolFilters = BTreeMap<String, FilterSet>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrder {
    pub symbol: String,
    pub order_id: i64,
    #[serde(default)]
    pub order_list_id: i64,
    pub client_order_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub orig_qty: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub executed_qty: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub cummulative_quote_qty: Decimal,
    pub status: OrderStatus,
    pub time_in_force: TimeInForce,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub side: OrderSide,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub stop_price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub iceberg_qty: Option<Decimal>,
    pub time: i64,
    pub update_time: i64,
    pub is_working: bool,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub orig_quote_order_qty: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFill {
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub qty: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub commission: Decimal,
    pub commission_asset: String,
}

pub(crate) mod serde_helpers {
    use super::Decimal;
    use serde_json::Value;
    use std::str::FromStr;

    pub fn value_to_decimal(value: &Value) -> Result<Decimal, String> {
        match value {
            Value::String(raw) => Decimal::from_str(raw).map_err(|e| e.to_string()),
            Value::Number(number) => {
                let raw = number.to_string();
                Decimal::from_str(&raw)
                    .or_else(|_| Decimal::from_scientific(&raw))
                    .map_err(|e| e.to_string())
            }
            other => Err(format!("expected decimal string or number, got {other}")),
        }
    }

    pub fn value_to_i64(value: &Value) -> Result<i64, String> {
        match value {
            Value::Number(number) => number
                .as_i64()
                .ok_or_else(|| format!("expected integer, got {number}")),
            Value::String(raw) => raw.parse().map_err(|e| format!("invalid integer {raw}: {e}")),
            other => Err(format!("expected integer, got {other}")),
        }
    }

    pub fn value_to_u64(value: &Value) -> Result<u64, String> {
        match value {
            Value::Number(number) => number
                .as_u64()
                .ok_or_else(|| format!("expected unsigned integer, got {number}")),
            Value::String(raw) => raw.parse().map_err(|e| format!("invalid integer {raw}: {e}")),
            other => Err(format!("expected unsigned integer, got {other}")),
        }
    }
}
