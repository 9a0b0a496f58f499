//! Types for public REST API endpoints.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::KucoinError;

/// Server time response: milliseconds since the UNIX epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerTime {
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
}

impl ServerTime {
    /// Milliseconds since the UNIX epoch.
    pub fn millis(&self) -> i64 {
        self.timestamp
    }

    /// Convert to a UTC date-time, if the value is in range.
    pub fn to_datetime(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.timestamp) * 1_000_000).ok()
    }
}

/// Level-1 ticker (best bid/ask and last trade) for one symbol.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    /// Sequence number.
    pub sequence: String,
    /// Last traded price.
    pub price: Decimal,
    /// Last traded size.
    pub size: Decimal,
    /// Best bid price.
    pub best_bid: Decimal,
    /// Best bid size.
    pub best_bid_size: Decimal,
    /// Best ask price.
    pub best_ask: Decimal,
    /// Best ask size.
    pub best_ask_size: Decimal,
    /// Timestamp in milliseconds.
    pub time: i64,
}

/// Token returned by the bullet endpoints, required to open a WebSocket session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsToken {
    /// Short-lived session token.
    pub token: String,
    /// Servers the token may be used with.
    #[serde(default)]
    pub instance_servers: Vec<InstanceServer>,
}

impl WsToken {
    /// Select the server to connect to: the first one speaking the websocket protocol.
    pub fn server(&self) -> Result<&InstanceServer, KucoinError> {
        self.instance_servers
            .iter()
            .find(|s| s.protocol == "websocket")
            .ok_or_else(|| {
                KucoinError::InvalidResponse("WebSocket token has no websocket instance server".into())
            })
    }
}

/// A WebSocket server entry from the token response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceServer {
    /// WebSocket endpoint, e.g. `wss://ws-api-spot.kucoin.com/`.
    pub endpoint: String,
    /// Whether the endpoint uses TLS.
    #[serde(default)]
    pub encrypt: bool,
    /// Transport protocol, normally `websocket`.
    pub protocol: String,
    /// Recommended ping interval in milliseconds.
    pub ping_interval: u64,
    /// Time in milliseconds after which a missing pong means the session is dead.
    pub ping_timeout: u64,
}

impl InstanceServer {
    /// Recommended ping interval.
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval)
    }

    /// Pong timeout.
    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout)
    }
}
