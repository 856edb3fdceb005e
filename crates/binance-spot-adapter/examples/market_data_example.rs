/*
[INPUT]:  Symbol identifier (e.g., "BTCUSDT") and kline interval
[OUTPUT]: Market data (candlestick history, symbol filters)
[POS]:    Examples - public market data queries
[UPDATE]: When adding new market data endpoints
*/

use binance_spot_adapter::*;

/// Example: Query market data (no credentials required)
///
/// Requests more than one page of candles, so the client walks history backward.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Binance Spot Market Data Example ===\n");

    let client = match SpotClient::new() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };

    let symbol = "BTCUSDT";
    let interval = KlineInterval::OneHour;

    println!("Fetching 1500 {} candles for {}...", interval, symbol);
    match client
        .candlesticks(symbol, interval.as_str(), CandlesticksQuery::with_limit(1500))
        .await
    {
        Ok(candles) => {
            println!("✓ Received {} candles", candles.len());
            if let (Some(first), Some(last)) = (candles.first(), candles.last()) {
                println!("  first open: {}  last close price: {}", first.open_time, last.close);
            }
        }
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\nFetching trading filters...");
    match client.filters().await {
        Ok(filters) => match filters.get(symbol) {
            Some(set) => {
                for (filter_type, params) in set {
                    println!("  {}: {}", filter_type, serde_json::Value::Object(params.clone()));
                }
            }
            None => println!("✗ No filters for {}", symbol),
        },
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\n✓ Market data example complete");
}
