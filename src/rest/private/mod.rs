//! Private REST API endpoints (authentication required).

use crate::error::KucoinError;
use crate::rest::KucoinRestClient;
use crate::rest::endpoints::private;
use crate::rest::public::WsToken;

impl KucoinRestClient {
    /// Apply for a token to open a private WebSocket session.
    ///
    /// Private sessions can subscribe to both public and private topics.
    pub async fn get_private_ws_token(&self) -> Result<WsToken, KucoinError> {
        self.private_post(private::BULLET_PRIVATE, "").await
    }
}
