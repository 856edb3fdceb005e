/*
[INPUT]:  BINANCE_API_KEY / BINANCE_API_SECRET environment variables
[OUTPUT]: Balances, open orders and an order placement attempt
[POS]:    Examples - signed account and trading requests
[UPDATE]: When trading API changes
*/

use binance_spot_adapter::*;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Example: Signed requests
///
/// The clock is synchronized once in `init`; signed calls then refresh it
/// before each request.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Binance Spot Trading Example ===\n");

    let Some(credentials) = Credentials::from_default_env() else {
        eprintln!("Set BINANCE_API_KEY and BINANCE_API_SECRET to run this example");
        return;
    };

    let client = match BinanceClient::new(Some(credentials)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };

    if let Err(e) = client.init().await {
        eprintln!("Clock sync failed: {}", e);
        return;
    }
    println!("✓ Clock synchronized\n");

    match client.spot().account_balances().await {
        Ok(balances) => {
            for balance in balances.iter().filter(|b| !b.available.is_zero() || !b.in_order.is_zero()) {
                println!("  {}: available={} in_order={}", balance.asset, balance.available, balance.in_order);
            }
        }
        Err(e) => println!("✗ Error: {}", e),
    }

    match client.spot().open_orders(OpenOrdersQuery::default()).await {
        Ok(orders) => println!("\n✓ {} open orders", orders.len()),
        Err(e) => println!("✗ Error: {}", e),
    }

    // Far below market so it rests on the book
    let quantity = Decimal::from_str("0.001").unwrap_or(Decimal::ONE);
    let price = Decimal::from_str("1000").unwrap_or(Decimal::ONE);
    match client
        .spot()
        .send_order("BTCUSDT", OrderSide::Buy, OrderType::Limit, quantity, |order| {
            order.price = Some(price);
            order.time_in_force = Some(TimeInForce::Gtc);
        })
        .await
    {
        Ok(response) => println!("\n✓ Order placed: {}", response.order_id),
        Err(e) => match e.exchange_body() {
            Some(body) => println!("\n✗ Exchange rejected order: {} {}", body.code, body.msg),
            None => println!("\n✗ Error: {}", e),
        },
    }

    println!("\n✓ Trading example complete");
}
