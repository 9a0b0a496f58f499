//! Credential management for KuCoin API authentication.

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

/// Default environment variable holding the API key.
pub const ENV_API_KEY: &str = "KUCOIN_API_KEY";
/// Default environment variable holding the API secret.
pub const ENV_API_SECRET: &str = "KUCOIN_API_SECRET";
/// Default environment variable holding the API passphrase.
pub const ENV_API_PASSPHRASE: &str = "KUCOIN_API_PASSPHRASE";

/// API credentials: key, secret and the passphrase chosen when the key was created.
#[derive(Clone)]
pub struct Credentials {
    /// The API key (public identifier)
    pub api_key: String,
    api_secret: SecretString,
    api_passphrase: SecretString,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        api_passphrase: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
            api_passphrase: SecretString::from(api_passphrase.into()),
        }
    }

    /// Get the API secret for signing.
    ///
    /// This method exposes the secret - use carefully.
    pub fn expose_secret(&self) -> &str {
        self.api_secret.expose_secret()
    }

    /// Get the plain API passphrase.
    pub fn expose_passphrase(&self) -> &str {
        self.api_passphrase.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("api_passphrase", &"[REDACTED]")
            .finish()
    }
}

/// Trait for providing API credentials.
///
/// Implement this trait to customize how credentials are retrieved,
/// for example from a secrets manager.
pub trait CredentialsProvider: Send + Sync {
    /// Get the credentials.
    fn get_credentials(&self) -> &Credentials;
}

/// Static credentials provider that holds credentials directly.
#[derive(Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    /// Create a new static credentials provider.
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        api_passphrase: impl Into<String>,
    ) -> Self {
        Self {
            credentials: Credentials::new(api_key, api_secret, api_passphrase),
        }
    }
}

impl CredentialsProvider for StaticCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl CredentialsProvider for Arc<StaticCredentials> {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Credentials provider that reads from environment variables.
///
/// By default, reads `KUCOIN_API_KEY`, `KUCOIN_API_SECRET` and `KUCOIN_API_PASSPHRASE`.
pub struct EnvCredentials {
    credentials: Credentials,
}

impl EnvCredentials {
    /// Try to create credentials from the default environment variables.
    ///
    /// Returns `None` if any of them is not set.
    pub fn try_from_env() -> Option<Self> {
        Self::try_from_env_vars(ENV_API_KEY, ENV_API_SECRET, ENV_API_PASSPHRASE)
    }

    /// Try to create credentials from custom environment variable names.
    pub fn try_from_env_vars(key_var: &str, secret_var: &str, passphrase_var: &str) -> Option<Self> {
        let api_key = std::env::var(key_var).ok()?;
        let api_secret = std::env::var(secret_var).ok()?;
        let api_passphrase = std::env::var(passphrase_var).ok()?;

        Some(Self {
            credentials: Credentials::new(api_key, api_secret, api_passphrase),
        })
    }
}

impl CredentialsProvider for EnvCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}
