//! `kucoin-ticker`: logs the KuCoin server time, then streams one ticker topic
//! until SIGINT/SIGTERM.
//!
//! Log filtering follows `RUST_LOG` (default `info`).

use kucoin_feed_client::runner::{Orchestrator, RunnerConfig, shutdown_signal};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    Orchestrator::from_config(RunnerConfig::default())
        .run(shutdown_signal())
        .await;
}
