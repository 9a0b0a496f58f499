//! Public REST API endpoints (no authentication required).

mod types;

pub use types::*;

use crate::error::KucoinError;
use crate::rest::KucoinRestClient;
use crate::rest::endpoints::public;

impl KucoinRestClient {
    /// Get the server time.
    ///
    /// Useful for checking API availability and clock skew before signing requests.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use kucoin_feed_client::rest::KucoinRestClient;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let client = KucoinRestClient::new();
    ///     let time = client.get_server_time().await?;
    ///     println!("Server time: {}", time.millis());
    ///     Ok(())
    /// }
    /// ```
    pub async fn get_server_time(&self) -> Result<ServerTime, KucoinError> {
        self.public_get(public::TIMESTAMP).await
    }

    /// Get the level-1 ticker for a symbol.
    ///
    /// # Arguments
    ///
    /// * `symbol` - Trading pair, e.g. "KCS-BTC".
    pub async fn get_ticker(&self, symbol: &str) -> Result<Ticker, KucoinError> {
        #[derive(serde::Serialize)]
        struct Params<'a> {
            symbol: &'a str,
        }
        self.public_get_with_params(public::TICKER, &Params { symbol })
            .await
    }

    /// Apply for a token to open a public WebSocket session.
    pub async fn get_public_ws_token(&self) -> Result<WsToken, KucoinError> {
        self.public_post(public::BULLET_PUBLIC).await
    }
}
