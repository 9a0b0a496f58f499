//! Trait definition for the KuCoin REST API client.
//!
//! The [`KucoinClient`] trait abstracts the REST operations this crate uses so
//! that code built on top of them can be tested with fake implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use kucoin_feed_client::rest::{KucoinClient, KucoinRestClient};
//!
//! async fn open_session<C: KucoinClient>(client: &C) -> kucoin_feed_client::Result<String> {
//!     Ok(client.get_public_ws_token().await?.token)
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::error::KucoinError;
use crate::rest::public::{ServerTime, Ticker, WsToken};

/// Trait defining the KuCoin REST API operations.
///
/// All methods are async and return `Result<T, KucoinError>`.
pub trait KucoinClient: Send + Sync {
    /// Get the server time.
    fn get_server_time(&self) -> impl Future<Output = Result<ServerTime, KucoinError>> + Send;

    /// Get the level-1 ticker for a symbol.
    fn get_ticker(&self, symbol: &str) -> impl Future<Output = Result<Ticker, KucoinError>> + Send;

    /// Apply for a public WebSocket token.
    fn get_public_ws_token(&self) -> impl Future<Output = Result<WsToken, KucoinError>> + Send;

    /// Apply for a private WebSocket token (requires credentials).
    fn get_private_ws_token(&self) -> impl Future<Output = Result<WsToken, KucoinError>> + Send;

    /// Apply for a WebSocket token of the requested scope.
    fn get_ws_token(
        &self,
        private: bool,
    ) -> impl Future<Output = Result<WsToken, KucoinError>> + Send {
        async move {
            if private {
                self.get_private_ws_token().await
            } else {
                self.get_public_ws_token().await
            }
        }
    }
}

impl<C: KucoinClient> KucoinClient for Arc<C> {
    fn get_server_time(&self) -> impl Future<Output = Result<ServerTime, KucoinError>> + Send {
        (**self).get_server_time()
    }

    fn get_ticker(&self, symbol: &str) -> impl Future<Output = Result<Ticker, KucoinError>> + Send {
        (**self).get_ticker(symbol)
    }

    fn get_public_ws_token(&self) -> impl Future<Output = Result<WsToken, KucoinError>> + Send {
        (**self).get_public_ws_token()
    }

    fn get_private_ws_token(&self) -> impl Future<Output = Result<WsToken, KucoinError>> + Send {
        (**self).get_private_ws_token()
    }
}
