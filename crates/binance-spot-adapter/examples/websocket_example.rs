/*
[INPUT]:  Symbols and kline intervals to stream
[OUTPUT]: Real-time kline and ticker updates
[POS]:    Examples - WebSocket stream handling
[UPDATE]: When WebSocket API changes
*/

use binance_spot_adapter::*;
use tokio::time::{Duration, sleep};

/// Example: WebSocket real-time data streams
///
/// All subscriptions share one combined-stream connection that reopens
/// itself if the exchange drops it.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Binance Spot WebSocket Example ===\n");

    let ws = SpotWebSocket::new();

    ws.candlesticks(&[("BTCUSDT", "1m"), ("ETHUSDT", "1m")], |event| {
        if let Some(kline) = event.kline() {
            println!(
                "[{}] {} close={} closed={}",
                event.stream, kline.symbol, kline.kline.close, kline.kline.is_closed
            );
        }
    })
    .await;

    ws.all_tickers(|event| {
        if let Some(tickers) = event.tickers() {
            println!("[{}] {} tickers updated", event.stream, tickers.len());
        }
    })
    .await;

    println!("Streaming {:?} for 30 seconds...\n", ws.active_topics().await);
    sleep(Duration::from_secs(30)).await;

    println!("\n✓ WebSocket example complete");
}
