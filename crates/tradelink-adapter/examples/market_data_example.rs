/*
[INPUT]:  Public WebSocket endpoint
[OUTPUT]: Symbol list and a few live ticks
[POS]:    Examples - market data
[UPDATE]: When market API changes
*/

use std::time::Duration;

use tradelink_adapter::*;

/// Example: public market data over one connection
///
/// No token is needed for symbols or ticks.
#[tokio::main]
async fn main() {
    println!("=== Tradelink Market Data Example ===\n");

    let connection = ConnectionManager::new(ClientConfig::default());
    if let Err(e) = connection.connect_default().await {
        eprintln!("Failed to connect: {}", e);
        return;
    }
    println!("✓ Connected");

    let apis = ApiManager::new(connection.clone());

    match apis.market().active_symbols(ActiveSymbolsMode::Brief).await {
        Ok(symbols) => {
            println!("✓ {} active symbols", symbols.len());
            for symbol in symbols.iter().take(5) {
                println!("  {} - {} (open: {})", symbol.symbol, symbol.display_name, symbol.exchange_is_open);
            }
        }
        Err(e) => eprintln!("active_symbols failed: {}", e),
    }

    let stream = apis
        .market()
        .ticks("R_100", |update| match update {
            Ok(tick) => println!("  tick {} @ {}", tick.quote, tick.epoch),
            Err(e) => eprintln!("  tick error: {}", e),
        })
        .await;
    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Failed to subscribe: {}", e);
            return;
        }
    };
    println!("\nStreaming R_100 for 5 seconds...");
    tokio::time::sleep(Duration::from_secs(5)).await;

    stream.unsubscribe();
    connection.disconnect().await;
    println!("\n✓ Market data example complete");
}
