//! KuCoin REST API client implementation.

use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use reqwest_tracing::TracingMiddleware;

use crate::auth::{CredentialsProvider, IncreasingTimestamp, TimestampProvider, sign_request};
use crate::error::{ApiError, KucoinError, error_codes};
use crate::rest::endpoints::KUCOIN_BASE_URL;
use crate::rest::public::{ServerTime, Ticker, WsToken};
use crate::rest::traits::KucoinClient;

/// The KuCoin REST API client.
///
/// # Example
///
/// ```rust,no_run
/// use kucoin_feed_client::rest::KucoinRestClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = KucoinRestClient::builder()
///         .base_url("https://api.kucoin.com")
///         .build();
///
///     let token = client.get_public_ws_token().await?;
///     println!("Token for {} server(s)", token.instance_servers.len());
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct KucoinRestClient {
    http_client: ClientWithMiddleware,
    base_url: String,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    timestamp_provider: Arc<dyn TimestampProvider>,
}

impl KucoinRestClient {
    /// Create a new client with default settings.
    ///
    /// This client can only access public endpoints.
    /// Use [`KucoinRestClient::builder()`] to configure credentials for private endpoints.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new client builder.
    pub fn builder() -> KucoinRestClientBuilder {
        KucoinRestClientBuilder::new()
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a public GET request.
    pub(crate) async fn public_get<T>(&self, endpoint: &str) -> Result<T, KucoinError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.http_client.get(&url).send().await?;
        self.parse_response(response).await
    }

    /// Make a public GET request with query parameters.
    pub(crate) async fn public_get_with_params<T, Q>(
        &self,
        endpoint: &str,
        params: &Q,
    ) -> Result<T, KucoinError>
    where
        T: serde::de::DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let query_string = serde_urlencoded::to_string(params)
            .map_err(|e| KucoinError::InvalidResponse(e.to_string()))?;
        let url = if query_string.is_empty() {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}{}?{}", self.base_url, endpoint, query_string)
        };
        let response = self.http_client.get(&url).send().await?;
        self.parse_response(response).await
    }

    /// Make a public POST request with an empty body.
    pub(crate) async fn public_post<T>(&self, endpoint: &str) -> Result<T, KucoinError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.http_client.post(&url).send().await?;
        self.parse_response(response).await
    }

    /// Make an authenticated POST request with a JSON body.
    pub(crate) async fn private_post<T>(&self, endpoint: &str, body: &str) -> Result<T, KucoinError>
    where
        T: serde::de::DeserializeOwned,
    {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(KucoinError::MissingCredentials)?;

        let timestamp = self.timestamp_provider.next_timestamp();
        let signed = sign_request(credentials.get_credentials(), timestamp, "POST", endpoint, body)?;

        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http_client
            .post(&url)
            .header("KC-API-KEY", &signed.api_key)
            .header("KC-API-SIGN", &signed.signature)
            .header("KC-API-TIMESTAMP", &signed.timestamp)
            .header("KC-API-PASSPHRASE", &signed.passphrase)
            .header("KC-API-KEY-VERSION", signed.key_version)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await?;

        self.parse_response(response).await
    }

    /// Parse a response from the KuCoin API.
    async fn parse_response<T>(&self, response: reqwest::Response) -> Result<T, KucoinError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        let body = response.text().await?;

        let parsed: KucoinResponse = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                KucoinError::InvalidResponse(format!("Failed to parse response: {}. Body: {}", e, body))
            } else {
                KucoinError::InvalidResponse(format!("HTTP {}: {}", status, body))
            }
        })?;

        if parsed.code != error_codes::SUCCESS {
            let api_error = ApiError::new(parsed.code, parsed.msg.unwrap_or_default());
            if api_error.is_rate_limit() {
                return Err(KucoinError::RateLimitExceeded);
            }
            return Err(KucoinError::Api(api_error));
        }

        match parsed.data {
            Some(data) if !data.is_null() => serde_json::from_value(data).map_err(|e| {
                KucoinError::InvalidResponse(format!("Failed to decode 'data': {}. Body: {}", e, body))
            }),
            _ => Err(KucoinError::InvalidResponse(
                "Response missing 'data' field".to_string(),
            )),
        }
    }
}

impl Default for KucoinRestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KucoinRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KucoinRestClient")
            .field("base_url", &self.base_url)
            .field("has_credentials", &self.credentials.is_some())
            .finish()
    }
}

/// Builder for [`KucoinRestClient`].
pub struct KucoinRestClientBuilder {
    base_url: String,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    timestamp_provider: Option<Arc<dyn TimestampProvider>>,
    user_agent: Option<String>,
    max_retries: u32,
}

impl KucoinRestClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: KUCOIN_BASE_URL.to_string(),
            credentials: None,
            timestamp_provider: None,
            user_agent: None,
            max_retries: 0,
        }
    }

    /// Set the base URL (useful for testing with a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the credentials provider for authenticated requests.
    pub fn credentials(mut self, credentials: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set a custom timestamp provider for signed requests.
    pub fn timestamp_provider(mut self, provider: Arc<dyn TimestampProvider>) -> Self {
        self.timestamp_provider = Some(provider);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the maximum number of retries for transient failures (default: none).
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Build the client.
    pub fn build(self) -> KucoinRestClient {
        let mut headers = HeaderMap::new();
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("kucoin-feed-client/{}", env!("CARGO_PKG_VERSION")));
        let header_value = HeaderValue::from_str(&user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("kucoin-feed-client"));
        headers.insert(USER_AGENT, header_value);

        let reqwest_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(self.max_retries);

        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let timestamp_provider = self
            .timestamp_provider
            .unwrap_or_else(|| Arc::new(IncreasingTimestamp::new()));

        KucoinRestClient {
            http_client: client,
            base_url: self.base_url,
            credentials: self.credentials,
            timestamp_provider,
        }
    }
}

impl Default for KucoinRestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Response envelope shared by all KuCoin REST endpoints.
#[derive(Debug, serde::Deserialize)]
struct KucoinResponse {
    code: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    msg: Option<String>,
}

impl KucoinClient for KucoinRestClient {
    async fn get_server_time(&self) -> Result<ServerTime, KucoinError> {
        KucoinRestClient::get_server_time(self).await
    }

    async fn get_ticker(&self, symbol: &str) -> Result<Ticker, KucoinError> {
        KucoinRestClient::get_ticker(self, symbol).await
    }

    async fn get_public_ws_token(&self) -> Result<WsToken, KucoinError> {
        KucoinRestClient::get_public_ws_token(self).await
    }

    async fn get_private_ws_token(&self) -> Result<WsToken, KucoinError> {
        KucoinRestClient::get_private_ws_token(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_trims_trailing_slash() {
        let client = KucoinRestClient::builder()
            .base_url("http://127.0.0.1:8080/")
            .build();
        assert_eq!(client.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_debug_hides_credentials() {
        let client = KucoinRestClient::builder()
            .credentials(Arc::new(crate::auth::StaticCredentials::new("k", "s", "p")))
            .build();
        let debug = format!("{:?}", client);
        assert!(debug.contains("has_credentials: true"));
        assert!(!debug.contains("\"s\""));
    }

    #[test]
    fn test_default_base_url() {
        assert_eq!(KucoinRestClient::new().base_url(), KUCOIN_BASE_URL);
    }
}
