//! Seams between the subscription logic and the WebSocket transport.
//!
//! [`KucoinWsClient`](crate::ws::KucoinWsClient) and
//! [`WsConnection`](crate::ws::WsConnection) are the production
//! implementations; tests drive the same code with in-memory fakes.

use std::future::Future;

use crate::error::KucoinError;
use crate::rest::public::WsToken;
use crate::ws::connection::Feed;
use crate::ws::messages::SubscribeMessage;

/// Control side of an open feed connection.
pub trait FeedHandle: Send {
    /// Subscribe to a topic and wait for the server's acknowledgement.
    fn subscribe(
        &mut self,
        message: &SubscribeMessage,
    ) -> impl Future<Output = Result<(), KucoinError>> + Send;

    /// Tear the connection down. Calling it again is a no-op.
    fn stop(&mut self) -> impl Future<Output = ()> + Send;
}

/// Opens feed connections from a WebSocket token.
pub trait FeedConnector: Send + Sync {
    /// The connection handle type.
    type Handle: FeedHandle;

    /// Connect using the token and return the handle with its channels.
    fn connect(
        &self,
        token: &WsToken,
    ) -> impl Future<Output = Result<Feed<Self::Handle>, KucoinError>> + Send;
}
