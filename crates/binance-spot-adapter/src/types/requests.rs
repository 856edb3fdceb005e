/*
[INPUT]:  API schema definitions and caller options
[OUTPUT]: Typed request structs flattened into ordered query parameters
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use rust_decimal::Decimal;

use super::enums::{OrderSide, OrderType, TimeInForce};

/// Optional window and size for the klines endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandlesticksQuery {
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<u32>,
}

impl CandlesticksQuery {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOrdersQuery {
    pub symbol: Option<String>,
    pub recv_window: Option<u64>,
}

/// New order parameters, sent flat in the signed query string
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub time_in_force: Option<TimeInForce>,
    pub price: Option<Decimal>,
    pub new_client_order_id: Option<String>,
    pub stop_price: Option<Decimal>,
    pub iceberg_qty: Option<Decimal>,
    pub quote_order_qty: Option<Decimal>,
    pub recv_window: Option<u64>,
}

impl NewOrderRequest {
    pub fn new(
        symbol: impl Into<String>,
        side: OrderSide,
        order_type: OrderType,
        quantity: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type,
            quantity,
            time_in_force: None,
            price: None,
            new_client_order_id: None,
            stop_price: None,
            iceberg_qty: None,
            quote_order_qty: None,
            recv_window: None,
        }
    }

    /// Parameters in wire order: symbol, side, type, quantity, then the set options
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("symbol".to_string(), self.symbol.clone()),
            ("side".to_string(), self.side.as_str().to_string()),
            ("type".to_string(), self.order_type.as_str().to_string()),
            ("quantity".to_string(), self.quantity.to_string()),
        ];

        let options = [
            ("timeInForce", self.time_in_force.map(|tif| tif.as_str().to_string())),
            ("price", self.price.map(|price| price.to_string())),
            ("newClientOrderId", self.new_client_order_id.clone()),
            ("stopPrice", self.stop_price.map(|price| price.to_string())),
            ("icebergQty", self.iceberg_qty.map(|qty| qty.to_string())),
            ("quoteOrderQty", self.quote_order_qty.map(|qty| qty.to_string())),
            ("recvWindow", self.recv_window.map(|window| window.to_string())),
        ];
        params.extend(
            options
                .into_iter()
                .filter_map(|(key, value)| value.map(|value| (key.to_string(), value))),
        );

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_order_params_are_flat_and_ordered() {
        let mut request = NewOrderRequest::new(
            "LTCBTC",
            OrderSide::Buy,
            OrderType::Limit,
            Decimal::from_str("1").unwrap(),
        );
        request.time_in_force = Some(TimeInForce::Gtc);
        request.price = Some(Decimal::from_str("0.1").unwrap());
        request.recv_window = Some(5000);

        let params = request.to_params();
        let rendered: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        assert_eq!(
            rendered.join("&"),
            "symbol=LTCBTC&side=BUY&type=LIMIT&quantity=1&timeInForce=GTC&price=0.1&recvWindow=5000"
        );
    }

    #[test]
    fn test_market_order_has_only_required_params() {
        let request = NewOrderRequest::new(
            "ETHUSDT",
            OrderSide::Sell,
            OrderType::Market,
            Decimal::from_str("0.001").unwrap(),
        );
        let params = request.to_params();
        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["symbol", "side", "type", "quantity"]);
    }

    #[test]
    fn test_every_option_follows_required_params_in_fixed_order() {
        let mut request = NewOrderRequest::new(
            "BNBUSDT",
            OrderSide::Sell,
            OrderType::StopLossLimit,
            Decimal::from_str("2").unwrap(),
        );
        request.recv_window = Some(6000);
        request.quote_order_qty = Some(Decimal::from_str("10").unwrap());
        request.iceberg_qty = Some(Decimal::from_str("0.5").unwrap());
        request.stop_price = Some(Decimal::from_str("299.5").unwrap());
        request.new_client_order_id = Some("stop-1".to_string());

        let params = request.to_params();
        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            [
                "symbol",
                "side",
                "type",
                "quantity",
                "newClientOrderId",
                "stopPrice",
                "icebergQty",
                "quoteOrderQty",
                "recvWindow",
            ]
        );
        assert_eq!(params[2].1, "STOP_LOSS_LIMIT");
        assert_eq!(params[5].1, "299.5");
    }
}
