//! KuCoin REST API client.
//!
//! Covers the endpoints a feed consumer needs: server time, level-1 ticker and
//! the WebSocket token ("bullet") endpoints.
//!
//! # Trait-based API
//!
//! The [`KucoinClient`] trait abstracts the REST operations so that callers
//! such as the subscription worker can be driven by fakes in tests.
//!
//! ```rust,ignore
//! use kucoin_feed_client::rest::{KucoinClient, KucoinRestClient};
//!
//! async fn print_time<C: KucoinClient>(client: &C) -> kucoin_feed_client::Result<()> {
//!     let time = client.get_server_time().await?;
//!     println!("Server time: {}", time.millis());
//!     Ok(())
//! }
//! ```

mod client;
mod endpoints;
pub mod private;
pub mod public;
mod traits;

pub use client::{KucoinRestClient, KucoinRestClientBuilder};
pub use endpoints::*;
pub use public::{InstanceServer, ServerTime, Ticker, WsToken};
pub use traits::KucoinClient;
