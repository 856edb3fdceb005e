/*
[INPUT]:  Symbol identifiers, intervals and query windows
[OUTPUT]: Market data (candlestick series, exchange filters)
[POS]:    HTTP layer - public market data endpoints (no auth required)
[UPDATE]: When adding new public endpoints or changing pagination
*/

use tracing::debug;

use crate::http::client::RequestSpec;
use crate::http::{Result, SpotClient};
use crate::types::{Candlestick, CandlesticksQuery, ExchangeInfo, SymbolFilters};

const KLINES_ENDPOINT: &str = "/api/v3/klines";
const EXCHANGE_INFO_ENDPOINT: &str = "/api/v3/exchangeInfo";

/// Most candles the klines endpoint returns for one call
pub const KLINES_LIMIT_CAP: u32 = 1000;

/// Subtracted from the earliest open time when walking backward so the
/// boundary candle is not fetched twice
const PAGINATION_PAD_MS: i64 = 1000;

impl SpotClient {
    /// Fetch one page of candlesticks
    ///
    /// GET /api/v3/klines?symbol={symbol}&interval={interval}&startTime&endTime&limit
    pub async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        query: CandlesticksQuery,
    ) -> Result<Vec<Candlestick>> {
        let spec = RequestSpec::get(KLINES_ENDPOINT)
            .param("symbol", symbol)
            .param("interval", interval)
            .param_opt("startTime", query.start_time)
            .param_opt("endTime", query.end_time)
            .param_opt("limit", query.limit);
        self.execute_json(spec).await
    }

    /// Fetch a candlestick series of any length, oldest first.
    ///
    /// Up to [`KLINES_LIMIT_CAP`] candles take a single call. Larger limits
    /// fetch the newest page first and then walk backward in pages of at most
    /// the cap, each ending before the earliest candle held so far, until the
    /// limit is reached or the exchange runs out of history.
    pub async fn candlesticks(
        &self,
        symbol: &str,
        interval: &str,
        query: CandlesticksQuery,
    ) -> Result<Vec<Candlestick>> {
        let limit = match query.limit {
            Some(limit) if limit > KLINES_LIMIT_CAP => limit,
            _ => return self.klines(symbol, interval, query).await,
        };

        let first_page = CandlesticksQuery {
            limit: Some(KLINES_LIMIT_CAP),
            ..query
        };
        let mut series = self.klines(symbol, interval, first_page).await?;
        let mut remaining = limit - KLINES_LIMIT_CAP;

        while remaining > 0 {
            let Some(earliest) = series.first() else {
                break;
            };

            let page_limit = remaining.min(KLINES_LIMIT_CAP);
            let page_query = CandlesticksQuery {
                start_time: None,
                end_time: Some(earliest.open_time - PAGINATION_PAD_MS),
                limit: Some(page_limit),
            };
            let page = self.klines(symbol, interval, page_query).await?;
            let exhausted = page.len() < page_limit as usize;
            remaining -= page_limit;

            debug!(
                symbol,
                interval,
                fetched = page.len(),
                remaining,
                "candlestick page fetched"
            );

            series.splice(0..0, page);
            if exhausted {
                break;
            }
        }

        Ok(series)
    }

    /// Query exchange trading rules
    ///
    /// GET /api/v3/exchangeInfo
    pub async fn exchange_info(&self) -> Result<ExchangeInfo> {
        self.execute_json(RequestSpec::get(EXCHANGE_INFO_ENDPOINT)).await
    }

    /// Trading filters of every symbol, keyed by symbol then filter type
    pub async fn filters(&self) -> Result<SymbolFilters> {
        Ok(self.exchange_info().await?.filters_by_symbol())
    }
}
