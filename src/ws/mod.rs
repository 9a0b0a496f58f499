//! KuCoin WebSocket feed client.
//!
//! A session is opened with a token from the REST bullet endpoints. The
//! connection yields two channels, one for inbound messages and one for
//! asynchronous errors, and a handle used to subscribe and to tear down.
//!
//! # Example
//!
//! ```rust,ignore
//! use kucoin_feed_client::rest::KucoinRestClient;
//! use kucoin_feed_client::ws::KucoinWsClient;
//! use kucoin_feed_client::ws::messages::{SubscribeMessage, topics};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let token = KucoinRestClient::new().get_public_ws_token().await?;
//!     let mut feed = KucoinWsClient::new().connect(&token).await?;
//!
//!     let topic = topics::with_symbols(topics::TICKER, &["BTC-USDT"]);
//!     feed.handle.subscribe(&SubscribeMessage::new(topic, false)).await?;
//!
//!     loop {
//!         tokio::select! {
//!             Some(err) = feed.errors.recv() => {
//!                 eprintln!("Error: {err}");
//!                 break;
//!             }
//!             Some(msg) = feed.messages.recv() => println!("{}", msg.to_json_string()),
//!             else => break,
//!         }
//!     }
//!
//!     feed.handle.stop().await;
//!     Ok(())
//! }
//! ```

mod client;
mod connection;
pub mod messages;
mod traits;

pub use client::{KucoinWsClient, WsConfig, WsConfigBuilder};
pub use connection::{Feed, WsConnection};
pub use traits::{FeedConnector, FeedHandle};
