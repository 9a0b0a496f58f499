//! WebSocket message types for the KuCoin feed.
//!
//! Every frame is a JSON object with a `type` field. Requests sent by the
//! client carry an `id` that the server echoes in the matching `ack`, `pong`
//! or `error` frame.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::KucoinError;

/// Frame types.
pub mod frame_types {
    pub const WELCOME: &str = "welcome";
    pub const PING: &str = "ping";
    pub const PONG: &str = "pong";
    pub const SUBSCRIBE: &str = "subscribe";
    pub const UNSUBSCRIBE: &str = "unsubscribe";
    pub const ACK: &str = "ack";
    pub const MESSAGE: &str = "message";
    pub const NOTICE: &str = "notice";
    pub const COMMAND: &str = "command";
    pub const ERROR: &str = "error";
}

/// Topic helpers.
pub mod topics {
    /// Ticker for one or more comma-separated symbols, or `all`.
    pub const TICKER: &str = "/market/ticker";

    /// Build a topic string: `prefix:symbol1,symbol2`.
    pub fn with_symbols(prefix: &str, symbols: &[&str]) -> String {
        format!("{}:{}", prefix, symbols.join(","))
    }
}

/// Subscribe or unsubscribe request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeMessage {
    /// Request id echoed in the server's `ack`.
    pub id: String,
    /// `subscribe` or `unsubscribe`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Topic, e.g. `/market/ticker:KCS-BTC`.
    pub topic: String,
    /// Whether only the subscribing session receives the data.
    pub private_channel: bool,
    /// Ask the server to acknowledge the request.
    pub response: bool,
}

impl SubscribeMessage {
    /// Create a subscribe request for a topic.
    ///
    /// The id is filled in by the connection when the request is sent.
    pub fn new(topic: impl Into<String>, private_channel: bool) -> Self {
        Self {
            id: String::new(),
            kind: frame_types::SUBSCRIBE.to_string(),
            topic: topic.into(),
            private_channel,
            response: true,
        }
    }

    /// Create the matching unsubscribe request.
    pub fn unsubscribe(&self) -> Self {
        Self {
            kind: frame_types::UNSUBSCRIBE.to_string(),
            ..self.clone()
        }
    }

    /// Set the request id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Ping request kept alive by the heartbeat task.
#[derive(Debug, Clone, Serialize)]
pub struct PingMessage {
    /// Request id echoed in the `pong`.
    pub id: String,
    /// Always `ping`.
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl PingMessage {
    /// Create a ping with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: frame_types::PING,
        }
    }
}

/// A frame received from the server.
///
/// Data messages carry `topic`, `subject` and `data`; control frames only
/// carry `id` and `type` (and `code`/`data` for errors).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownstreamMessage {
    /// Id of the request this frame answers, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Frame type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Sequence number of data messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sn: Option<i64>,
    /// Topic the message belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Message subject, e.g. `trade.ticker`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// `public` or `private`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<String>,
    /// Error code of `error` frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    /// Payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl DownstreamMessage {
    /// Parse a text frame.
    pub fn from_text(text: &str) -> Result<Self, KucoinError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize back to compact JSON for logging.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }

    /// Whether this frame carries topic data.
    pub fn is_data(&self) -> bool {
        self.kind == frame_types::MESSAGE
    }

    /// Decode the payload into a typed structure.
    pub fn decode_data<T: serde::de::DeserializeOwned>(&self) -> Result<T, KucoinError> {
        let data = self
            .data
            .clone()
            .ok_or_else(|| KucoinError::InvalidResponse("Message has no 'data' field".into()))?;
        Ok(serde_json::from_value(data)?)
    }

    /// Turn an `error` frame into an error value.
    pub fn to_error(&self) -> KucoinError {
        let message = match &self.data {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "Unknown error".to_string(),
        };
        KucoinError::Feed {
            code: self.code.unwrap_or_default(),
            message,
        }
    }
}

/// Payload of `/market/ticker` messages (subject `trade.ticker`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerData {
    /// Sequence number.
    pub sequence: String,
    /// Last traded price.
    pub price: Decimal,
    /// Last traded size.
    pub size: Decimal,
    /// Best ask price.
    pub best_ask: Decimal,
    /// Best ask size.
    pub best_ask_size: Decimal,
    /// Best bid price.
    pub best_bid: Decimal,
    /// Best bid size.
    pub best_bid_size: Decimal,
    /// Timestamp in milliseconds.
    pub time: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_message_wire_format() {
        let msg = SubscribeMessage::new("/market/ticker:KCS-BTC", false).with_id("42");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "42",
                "type": "subscribe",
                "topic": "/market/ticker:KCS-BTC",
                "privateChannel": false,
                "response": true
            })
        );
    }

    #[test]
    fn test_unsubscribe_keeps_topic() {
        let msg = SubscribeMessage::new("/market/ticker:ETH-BTC", false);
        let unsub = msg.unsubscribe();
        assert_eq!(unsub.kind, "unsubscribe");
        assert_eq!(unsub.topic, msg.topic);
    }

    #[test]
    fn test_topic_builder() {
        assert_eq!(
            topics::with_symbols(topics::TICKER, &["KCS-BTC", "ETH-BTC"]),
            "/market/ticker:KCS-BTC,ETH-BTC"
        );
    }

    #[test]
    fn test_ping_wire_format() {
        let value = serde_json::to_value(PingMessage::new("7")).unwrap();
        assert_eq!(value, serde_json::json!({ "id": "7", "type": "ping" }));
    }

    #[test]
    fn test_ticker_message_decode() {
        let text = r#"{
            "type": "message",
            "topic": "/market/ticker:KCS-BTC",
            "subject": "trade.ticker",
            "data": {
                "sequence": "1545896668986",
                "price": "0.08",
                "size": "0.011",
                "bestAsk": "0.08",
                "bestAskSize": "0.18",
                "bestBid": "0.049",
                "bestBidSize": "0.036",
                "time": 1704873323416
            }
        }"#;
        let msg = DownstreamMessage::from_text(text).unwrap();
        assert!(msg.is_data());
        assert_eq!(msg.subject.as_deref(), Some("trade.ticker"));

        let ticker: TickerData = msg.decode_data().unwrap();
        assert_eq!(ticker.price, "0.08".parse::<Decimal>().unwrap());
        assert_eq!(ticker.time, 1704873323416);
    }

    #[test]
    fn test_json_string_skips_absent_fields() {
        let msg = DownstreamMessage::from_text(r#"{"id":"1","type":"welcome"}"#).unwrap();
        assert_eq!(msg.to_json_string(), r#"{"id":"1","type":"welcome"}"#);
    }

    #[test]
    fn test_error_frame_conversion() {
        let msg = DownstreamMessage::from_text(
            r#"{"id":"9","type":"error","code":404,"data":"topic /market/ticker:NOPE is not found"}"#,
        )
        .unwrap();
        match msg.to_error() {
            KucoinError::Feed { code, message } => {
                assert_eq!(code, 404);
                assert_eq!(message, "topic /market/ticker:NOPE is not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_data_without_payload() {
        let msg = DownstreamMessage::from_text(r#"{"type":"ack","id":"3"}"#).unwrap();
        assert!(msg.decode_data::<TickerData>().is_err());
    }
}
