//! One-shot server time check.

use tracing::{error, info};

use crate::rest::{KucoinClient, ServerTime};

/// Fetch and log the exchange clock.
///
/// Failures are logged and reported as `None`; they never abort startup.
pub async fn probe_server_time<C: KucoinClient>(client: &C) -> Option<ServerTime> {
    match client.get_server_time().await {
        Ok(time) => {
            match time.to_datetime() {
                Some(utc) => info!(utc = %utc, "The server time: {}", time.millis()),
                None => info!("The server time: {}", time.millis()),
            }
            Some(time)
        }
        Err(e) => {
            error!("Error: {}", e);
            None
        }
    }
}
