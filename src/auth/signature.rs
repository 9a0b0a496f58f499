//! HMAC-SHA256 signatures for KuCoin API authentication (API key version 2).
//!
//! ```text
//! KC-API-SIGN       = base64(HMAC-SHA256(secret, timestamp + METHOD + endpoint + body))
//! KC-API-PASSPHRASE = base64(HMAC-SHA256(secret, passphrase))
//! ```
//!
//! `endpoint` includes the query string for GET requests.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::auth::Credentials;
use crate::error::KucoinError;

type HmacSha256 = Hmac<Sha256>;

/// API key version sent in `KC-API-KEY-VERSION`.
pub const API_KEY_VERSION: &str = "2";

/// The header values a signed request carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// `KC-API-KEY`
    pub api_key: String,
    /// `KC-API-SIGN`
    pub signature: String,
    /// `KC-API-TIMESTAMP`
    pub timestamp: String,
    /// `KC-API-PASSPHRASE` (signed)
    pub passphrase: String,
    /// `KC-API-KEY-VERSION`
    pub key_version: &'static str,
}

fn hmac_base64(secret: &str, payload: &[u8]) -> Result<String, KucoinError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| KucoinError::Auth(format!("Invalid HMAC key: {e}")))?;
    mac.update(payload);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Sign the passphrase with the API secret, as required by key version 2.
pub fn sign_passphrase(credentials: &Credentials) -> Result<String, KucoinError> {
    hmac_base64(
        credentials.expose_secret(),
        credentials.expose_passphrase().as_bytes(),
    )
}

/// Sign a request for KuCoin's private API.
///
/// # Arguments
///
/// * `credentials` - API credentials containing the secret and passphrase
/// * `timestamp` - Milliseconds since the UNIX epoch
/// * `method` - HTTP method, upper case (e.g., "POST")
/// * `endpoint` - Path plus query string (e.g., "/api/v1/bullet-private")
/// * `body` - Request body, empty for GET requests
pub fn sign_request(
    credentials: &Credentials,
    timestamp: u64,
    method: &str,
    endpoint: &str,
    body: &str,
) -> Result<SignedHeaders, KucoinError> {
    if credentials.expose_secret().is_empty() {
        return Err(KucoinError::Auth("API secret must not be empty.".to_string()));
    }

    let timestamp = timestamp.to_string();
    let prehash = format!("{timestamp}{}{endpoint}{body}", method.to_uppercase());

    Ok(SignedHeaders {
        api_key: credentials.api_key.clone(),
        signature: hmac_base64(credentials.expose_secret(), prehash.as_bytes())?,
        timestamp,
        passphrase: sign_passphrase(credentials)?,
        key_version: API_KEY_VERSION,
    })
}
