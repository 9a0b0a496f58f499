//! Example: Streaming ticker data via WebSocket.
//!
//! Connects to the public KuCoin feed, subscribes to the ticker of one or
//! more symbols and prints 50 updates.
//!
//! Run with: cargo run --example ws_ticker -- BTC-USDT ETH-USDT

use kucoin_feed_client::rest::KucoinRestClient;
use kucoin_feed_client::ws::KucoinWsClient;
use kucoin_feed_client::ws::messages::{SubscribeMessage, TickerData, frame_types, topics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let symbols: Vec<String> = std::env::args().skip(1).collect();
    let symbols = if symbols.is_empty() {
        vec!["BTC-USDT".to_string(), "ETH-USDT".to_string()]
    } else {
        symbols
    };

    println!("Requesting a public WebSocket token...");
    let token = KucoinRestClient::new().get_public_ws_token().await?;

    let mut feed = KucoinWsClient::new().connect(&token).await?;
    println!("Connected! Subscribing to ticker...");

    let symbols: Vec<&str> = symbols.iter().map(String::as_str).collect();
    let topic = topics::with_symbols(topics::TICKER, &symbols);
    feed.handle
        .subscribe(&SubscribeMessage::new(topic, false))
        .await?;

    println!("Subscribed! Waiting for ticker updates...\n");

    let mut message_count = 0;
    loop {
        tokio::select! {
            Some(err) = feed.errors.recv() => {
                println!("[Error] {}", err);
                break;
            }
            msg = feed.messages.recv() => {
                let Some(msg) = msg else {
                    println!("[Disconnected] Connection closed");
                    break;
                };
                if msg.kind != frame_types::MESSAGE {
                    println!("[{}] {}", msg.kind, msg.to_json_string());
                    continue;
                }

                let symbol = msg
                    .topic
                    .as_deref()
                    .and_then(|t| t.rsplit(':').next())
                    .unwrap_or("?")
                    .to_string();
                match msg.decode_data::<TickerData>() {
                    Ok(ticker) => println!(
                        "[Ticker] {} | Bid: {} | Ask: {} | Last: {} | Size: {}",
                        symbol, ticker.best_bid, ticker.best_ask, ticker.price, ticker.size
                    ),
                    Err(e) => println!("[Unparsed] {}: {}", symbol, e),
                }

                message_count += 1;
                if message_count >= 50 {
                    println!("\nReceived 50 messages, closing...");
                    break;
                }
            }
        }
    }

    feed.handle.stop().await;
    println!("Connection closed.");

    Ok(())
}
