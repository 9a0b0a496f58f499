//! # KuCoin Feed Client
//!
//! An async Rust client for the KuCoin public REST API and WebSocket feed,
//! plus the runner behind the `kucoin-ticker` demo binary.
//!
//! ## Features
//!
//! - REST: server time, level-1 ticker, public and private WebSocket tokens
//! - WebSocket: welcome handshake, acknowledged subscriptions, heartbeat
//! - Request signing for private endpoints (API key version 2)
//! - A probe/worker/orchestrator runner with cooperative cancellation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kucoin_feed_client::rest::KucoinRestClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = KucoinRestClient::new();
//!     let time = client.get_server_time().await?;
//!     println!("Server time: {}", time.millis());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod rest;
pub mod runner;
pub mod ws;

pub use error::KucoinError;

/// Result type alias using KucoinError
pub type Result<T> = std::result::Result<T, KucoinError>;
