//! Error types for the KuCoin feed client.

use thiserror::Error;

/// The main error type for all KuCoin client operations.
#[derive(Error, Debug)]
pub enum KucoinError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP request with middleware failed
    #[error("HTTP request failed: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// WebSocket protocol error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// WebSocket communication error (with message)
    #[error("WebSocket error: {0}")]
    WebSocketMsg(String),

    /// Error frame pushed by the KuCoin feed
    #[error("Feed error {code}: {message}")]
    Feed {
        /// Numeric error code from the frame
        code: i64,
        /// Error description from the frame's `data` field
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// KuCoin API returned a non-success code
    #[error("KuCoin API error: {0}")]
    Api(ApiError),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Invalid response from the API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// WebSocket connection closed
    #[error("WebSocket connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for the closure
        reason: String,
    },

    /// Timed out waiting for the server
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    /// Missing required credentials
    #[error("Missing credentials: API key, secret and passphrase required for private endpoints")]
    MissingCredentials,
}

/// Error returned by the KuCoin REST API in the response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The KuCoin error code (e.g., "400100")
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl ApiError {
    /// Create a new API error from code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        self.code == error_codes::TOO_MANY_REQUESTS
    }

    /// Check if this is an invalid key or signature error.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self.code.as_str(),
            error_codes::INVALID_KEY
                | error_codes::INVALID_SIGNATURE
                | error_codes::INVALID_PASSPHRASE
                | error_codes::INVALID_TIMESTAMP
        )
    }

    /// Check if the service is under maintenance.
    pub fn is_service_unavailable(&self) -> bool {
        self.code == error_codes::SERVICE_UNAVAILABLE
    }
}

/// Known KuCoin response codes.
pub mod error_codes {
    /// Request succeeded.
    pub const SUCCESS: &str = "200000";

    pub const INVALID_TIMESTAMP: &str = "400002";
    pub const INVALID_KEY: &str = "400003";
    pub const INVALID_PASSPHRASE: &str = "400004";
    pub const INVALID_SIGNATURE: &str = "400005";
    pub const INVALID_PARAMETER: &str = "400100";
    pub const NOT_FOUND: &str = "404000";
    pub const TOO_MANY_REQUESTS: &str = "429000";
    pub const INTERNAL_ERROR: &str = "500000";
    pub const SERVICE_UNAVAILABLE: &str = "503000";
}
