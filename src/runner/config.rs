//! Runner configuration.

use std::time::Duration;

use crate::rest::KUCOIN_BASE_URL;
use crate::ws::WsConfig;
use crate::ws::messages::{SubscribeMessage, topics};

/// Symbol subscribed to by default.
pub const DEFAULT_SYMBOL: &str = "KCS-BTC";

/// Time the orchestrator waits for the worker after cancelling it.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Settings for the probe, worker and orchestrator.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// REST base endpoint.
    pub base_url: String,
    /// Topic the worker subscribes to.
    pub topic: String,
    /// Subscribe on a private session (requires credentials).
    pub private_channel: bool,
    /// Upper bound on waiting for the worker after cancellation.
    pub grace_period: Duration,
    /// WebSocket connection settings.
    pub ws: WsConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: KUCOIN_BASE_URL.to_string(),
            topic: topics::with_symbols(topics::TICKER, &[DEFAULT_SYMBOL]),
            private_channel: false,
            grace_period: DEFAULT_GRACE_PERIOD,
            ws: WsConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Set the REST base endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the subscribed topic.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Use a private session.
    pub fn with_private_channel(mut self, private_channel: bool) -> Self {
        self.private_channel = private_channel;
        self
    }

    /// Set the shutdown grace period.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Set the WebSocket configuration.
    pub fn with_ws_config(mut self, ws: WsConfig) -> Self {
        self.ws = ws;
        self
    }

    /// The subscription request the worker sends.
    pub fn subscription(&self) -> SubscribeMessage {
        SubscribeMessage::new(&self.topic, self.private_channel)
    }
}
