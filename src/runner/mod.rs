//! The ticker demo: a server time probe, one subscription worker and an
//! orchestrator tying them to OS signals.
//!
//! ```rust,no_run
//! use kucoin_feed_client::runner::{Orchestrator, RunnerConfig, shutdown_signal};
//!
//! #[tokio::main]
//! async fn main() {
//!     Orchestrator::from_config(RunnerConfig::default())
//!         .run(shutdown_signal())
//!         .await;
//! }
//! ```

mod config;
mod probe;
mod shutdown;
mod worker;

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub use config::{DEFAULT_GRACE_PERIOD, DEFAULT_SYMBOL, RunnerConfig};
pub use probe::probe_server_time;
pub use shutdown::shutdown_signal;
pub use worker::{SubscriptionWorker, WorkerExit, WorkerReport};

use crate::auth::EnvCredentials;
use crate::rest::{KucoinClient, KucoinRestClient, ServerTime};
use crate::ws::{FeedConnector, KucoinWsClient};

/// What happened during one orchestrated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Result of the startup probe.
    pub server_time: Option<ServerTime>,
    /// The worker's report, if it finished within the grace period.
    pub worker: Option<WorkerReport>,
}

/// Runs the probe, spawns the worker, and shuts it down on a signal.
pub struct Orchestrator<C, F> {
    config: RunnerConfig,
    client: Arc<C>,
    connector: F,
}

impl Orchestrator<KucoinRestClient, KucoinWsClient> {
    /// Build the production REST and WebSocket clients from the configuration.
    ///
    /// Credentials are picked up from the environment when present.
    pub fn from_config(config: RunnerConfig) -> Self {
        let mut builder = KucoinRestClient::builder().base_url(&config.base_url);
        if let Some(credentials) = EnvCredentials::try_from_env() {
            builder = builder.credentials(Arc::new(credentials));
        }
        let connector = KucoinWsClient::with_config(config.ws.clone());
        Self::new(config, builder.build(), connector)
    }
}

impl<C, F> Orchestrator<C, F>
where
    C: KucoinClient + 'static,
    F: FeedConnector + 'static,
{
    /// Create an orchestrator from explicit collaborators.
    pub fn new(config: RunnerConfig, client: C, connector: F) -> Self {
        Self {
            config,
            client: Arc::new(client),
            connector,
        }
    }

    /// Probe, start the worker, wait for `shutdown_signal`, then cancel the
    /// worker and wait for it, bounded by the grace period.
    pub async fn run<S>(self, shutdown_signal: S) -> RunOutcome
    where
        S: Future<Output = ()>,
    {
        let server_time = probe_server_time(self.client.as_ref()).await;

        let cancel = CancellationToken::new();
        let worker = SubscriptionWorker::new(
            self.client.clone(),
            self.connector,
            self.config.subscription(),
        );
        let mut handle = tokio::spawn(worker.run(cancel.clone()));

        shutdown_signal.await;
        info!("Shutting down gracefully...");
        cancel.cancel();

        let worker = match tokio::time::timeout(self.config.grace_period, &mut handle).await {
            Ok(Ok(report)) => Some(report),
            Ok(Err(e)) => {
                error!("Subscription worker failed: {}", e);
                None
            }
            Err(_) => {
                warn!(
                    "Subscription worker did not stop within {:?}",
                    self.config.grace_period
                );
                handle.abort();
                None
            }
        };

        RunOutcome {
            server_time,
            worker,
        }
    }
}
