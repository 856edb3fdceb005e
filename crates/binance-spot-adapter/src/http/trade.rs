/*
[INPUT]:  Order requests and signed-request credentials
[OUTPUT]: Created-order confirmations
[POS]:    HTTP layer - trading endpoints (require signature)
[UPDATE]: When adding new trading endpoints or changing order flow
*/

use rust_decimal::Decimal;

use crate::http::client::RequestSpec;
use crate::http::{Result, SpotClient};
use crate::types::{NewOrderRequest, NewOrderResponse, OrderSide, OrderType};

const ORDER_ENDPOINT: &str = "/api/v3/order";

impl SpotClient {
    /// Create a new order
    ///
    /// POST /api/v3/order (signed)
    /// Parameters travel flat in the signed query string.
    pub async fn new_order(&self, req: NewOrderRequest) -> Result<NewOrderResponse> {
        let spec = req
            .to_params()
            .into_iter()
            .fold(RequestSpec::post(ORDER_ENDPOINT), |spec, (key, value)| {
                spec.param(key, value)
            })
            .signed();
        self.execute_json(spec).await
    }

    /// Send an order from its required fields, with options applied by `configure`
    pub async fn send_order(
        &self,
        symbol: &str,
        side: OrderSide,
        order_type: OrderType,
        quantity: Decimal,
        configure: impl FnOnce(&mut NewOrderRequest),
    ) -> Result<NewOrderResponse> {
        let mut req = NewOrderRequest::new(symbol, side, order_type, quantity);
        configure(&mut req);
        self.new_order(req).await
    }
}
