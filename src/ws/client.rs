//! WebSocket client implementation.

use std::time::Duration;

use crate::error::KucoinError;
use crate::rest::public::WsToken;
use crate::ws::connection::{Feed, WsConnection};
use crate::ws::traits::FeedConnector;

/// Configuration for WebSocket connections.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// How long to wait for the server's `welcome` frame after connecting.
    pub welcome_timeout: Duration,
    /// How long to wait for the `ack` of a subscribe or unsubscribe request.
    pub ack_timeout: Duration,
    /// Ping interval override (None = use the interval from the token).
    pub ping_interval: Option<Duration>,
    /// Pong timeout override (None = use the timeout from the token).
    pub pong_timeout: Option<Duration>,
    /// Capacity of the message and error channels.
    pub channel_capacity: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            welcome_timeout: Duration::from_secs(10),
            ack_timeout: Duration::from_secs(5),
            ping_interval: None,
            pong_timeout: None,
            channel_capacity: 256,
        }
    }
}

impl WsConfig {
    /// Create a new configuration builder.
    pub fn builder() -> WsConfigBuilder {
        WsConfigBuilder::new()
    }
}

/// Builder for [`WsConfig`].
#[derive(Debug, Clone, Default)]
pub struct WsConfigBuilder {
    config: WsConfig,
}

impl WsConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: WsConfig::default(),
        }
    }

    /// Set the welcome timeout.
    pub fn welcome_timeout(mut self, timeout: Duration) -> Self {
        self.config.welcome_timeout = timeout;
        self
    }

    /// Set the subscription ack timeout.
    pub fn ack_timeout(mut self, timeout: Duration) -> Self {
        self.config.ack_timeout = timeout;
        self
    }

    /// Override the ping interval advertised by the token.
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.config.ping_interval = Some(interval);
        self
    }

    /// Override the pong timeout advertised by the token.
    pub fn pong_timeout(mut self, timeout: Duration) -> Self {
        self.config.pong_timeout = Some(timeout);
        self
    }

    /// Set the message and error channel capacity.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity.max(1);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> WsConfig {
        self.config
    }
}

/// KuCoin WebSocket client.
///
/// Opens sessions with a token obtained from the REST bullet endpoints.
///
/// # Example
///
/// ```rust,ignore
/// use kucoin_feed_client::rest::KucoinRestClient;
/// use kucoin_feed_client::ws::{FeedHandle, KucoinWsClient};
/// use kucoin_feed_client::ws::messages::SubscribeMessage;
///
/// let rest = KucoinRestClient::new();
/// let token = rest.get_public_ws_token().await?;
///
/// let mut feed = KucoinWsClient::new().connect(&token).await?;
/// feed.handle
///     .subscribe(&SubscribeMessage::new("/market/ticker:KCS-BTC", false))
///     .await?;
///
/// while let Some(msg) = feed.messages.recv().await {
///     println!("{}", msg.to_json_string());
/// }
/// feed.handle.stop().await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct KucoinWsClient {
    config: WsConfig,
}

impl KucoinWsClient {
    /// Create a new WebSocket client with default settings.
    pub fn new() -> Self {
        Self::with_config(WsConfig::default())
    }

    /// Create a new WebSocket client with custom configuration.
    pub fn with_config(config: WsConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    /// Open a session with the given token.
    ///
    /// Returns once the server has sent its `welcome` frame. The returned
    /// [`Feed`] holds the connection handle plus the message and error channels.
    pub async fn connect(&self, token: &WsToken) -> Result<Feed<WsConnection>, KucoinError> {
        WsConnection::open(token, &self.config).await
    }
}

impl FeedConnector for KucoinWsClient {
    type Handle = WsConnection;

    async fn connect(&self, token: &WsToken) -> Result<Feed<WsConnection>, KucoinError> {
        KucoinWsClient::connect(self, token).await
    }
}
