/*
[INPUT]:  Query options and signed-request credentials
[OUTPUT]: Account data (balances, open orders)
[POS]:    HTTP layer - account endpoints (require signature)
[UPDATE]: When adding new account endpoints or changing query parameters
*/

use crate::http::client::RequestSpec;
use crate::http::{Result, SpotClient};
use crate::types::{AccountBalance, AccountInfo, OpenOrder, OpenOrdersQuery};

const ACCOUNT_ENDPOINT: &str = "/api/v3/account";
const OPEN_ORDERS_ENDPOINT: &str = "/api/v3/openOrders";

impl SpotClient {
    /// Query account information
    ///
    /// GET /api/v3/account (signed)
    pub async fn account_info(&self) -> Result<AccountInfo> {
        self.execute_json(RequestSpec::get(ACCOUNT_ENDPOINT).signed())
            .await
    }

    /// Query spot balances as `{asset, available, in_order}`
    ///
    /// GET /api/v3/account (signed)
    pub async fn account_balances(&self) -> Result<Vec<AccountBalance>> {
        Ok(self.account_info().await?.balances)
    }

    /// Query open orders, optionally for one symbol
    ///
    /// GET /api/v3/openOrders?symbol={symbol}&recvWindow={recv_window} (signed)
    pub async fn open_orders(&self, query: OpenOrdersQuery) -> Result<Vec<OpenOrder>> {
        let spec = RequestSpec::get(OPEN_ORDERS_ENDPOINT)
            .param_opt("symbol", query.symbol)
            .param_opt("recvWindow", query.recv_window)
            .signed();
        self.execute_json(spec).await
    }
}
