/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{OrderSide, OrderStatus, OrderType, TimeInForce};
use super::models::{AccountBalance, FilterSet, OrderFill, SymbolFilters, SymbolInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTime {
    #[serde(rename = "serverTime")]
    pub server_time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub balances: Vec<AccountBalance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeInfo {
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

impl ExchangeInfo {
    /// Filters of every symbol, keyed by symbol then by filter type
    pub fn filters_by_symbol(&self) -> SymbolFilters {
        self.symbols
            .iter()
            .map(|info| {
                let filters: FilterSet = info
                    .filters
                    .iter()
                    .map(|filter| (filter.filter_type.clone(), filter.params.clone()))
                    .collect();
                (info.symbol.clone(), filters)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderResponse {
    pub symbol: String,
    pub order_id: i64,
    #[serde(default)]
    pub order_list_id: i64,
    pub client_order_id: String,
    pub transact_time: i64,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub orig_qty: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub executed_qty: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub cummulative_quote_qty: Option<Decimal>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub time_in_force: Option<TimeInForce>,
    #[serde(rename = "type", default)]
    pub order_type: Option<OrderType>,
    #[serde(default)]
    pub side: Option<OrderSide>,
    #[serde(default)]
    pub fills: Vec<OrderFill>,
}
