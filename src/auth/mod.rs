//! Authentication for KuCoin private endpoints.
//!
//! This module provides:
//! - Credential management with secure secret storage
//! - Millisecond request timestamps
//! - HMAC-SHA256 signing of requests and the API passphrase (key version 2)

mod credentials;
mod signature;
mod timestamp;

pub use credentials::{Credentials, CredentialsProvider, EnvCredentials, StaticCredentials};
pub use signature::{SignedHeaders, sign_passphrase, sign_request};
pub use timestamp::{FixedTimestamp, IncreasingTimestamp, TimestampProvider};
