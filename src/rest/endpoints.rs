//! KuCoin REST API endpoint constants.

/// Base URL for the KuCoin REST API.
pub const KUCOIN_BASE_URL: &str = "https://api.kucoin.com";

/// Public endpoints (no authentication required).
pub mod public {
    /// Get server time.
    pub const TIMESTAMP: &str = "/api/v1/timestamp";
    /// Get a level-1 ticker for one symbol.
    pub const TICKER: &str = "/api/v1/market/orderbook/level1";
    /// Apply for a public WebSocket token.
    pub const BULLET_PUBLIC: &str = "/api/v1/bullet-public";
}

/// Private endpoints (authentication required).
pub mod private {
    /// Apply for a private WebSocket token.
    pub const BULLET_PRIVATE: &str = "/api/v1/bullet-private";
}
