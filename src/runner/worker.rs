//! Background subscription worker.

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::rest::KucoinClient;
use crate::ws::messages::SubscribeMessage;
use crate::ws::{Feed, FeedConnector, FeedHandle};

/// Why the worker returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The WebSocket token request failed. No connection was attempted.
    TokenFailed,
    /// Opening the connection failed.
    ConnectFailed,
    /// The subscribe request was rejected or not acknowledged.
    SubscribeFailed,
    /// An error arrived on the connection's error channel.
    StreamError,
    /// The connection closed its message channel.
    ConnectionClosed,
    /// The cancellation token fired.
    Cancelled,
}

/// Outcome of one worker run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    /// Terminal event.
    pub exit: WorkerExit,
    /// Number of messages logged.
    pub messages: u64,
}

impl WorkerReport {
    fn new(exit: WorkerExit, messages: u64) -> Self {
        Self { exit, messages }
    }
}

/// Obtains a token, opens one connection, subscribes to one topic and logs
/// every inbound message until an error, closure or cancellation.
///
/// Once connected, the connection is torn down exactly once on every path.
pub struct SubscriptionWorker<C, F> {
    client: C,
    connector: F,
    subscription: SubscribeMessage,
}

impl<C, F> SubscriptionWorker<C, F>
where
    C: KucoinClient,
    F: FeedConnector,
{
    /// Create a worker for one subscription.
    pub fn new(client: C, connector: F, subscription: SubscribeMessage) -> Self {
        Self {
            client,
            connector,
            subscription,
        }
    }

    /// Run until a terminal event.
    ///
    /// Cancellation is observed in every phase. A cancel that lands while
    /// subscribing still stops the connection.
    pub async fn run(self, shutdown: CancellationToken) -> WorkerReport {
        let token = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return cancelled_before_connect(),
            token = self.client.get_ws_token(self.subscription.private_channel) => token,
        };
        let token = match token {
            Ok(token) => token,
            Err(e) => {
                error!("Error: {}", e);
                return WorkerReport::new(WorkerExit::TokenFailed, 0);
            }
        };

        let feed = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return cancelled_before_connect(),
            feed = self.connector.connect(&token) => feed,
        };
        let Feed {
            mut handle,
            mut messages,
            mut errors,
        } = match feed {
            Ok(feed) => feed,
            Err(e) => {
                error!("Error: {}", e);
                return WorkerReport::new(WorkerExit::ConnectFailed, 0);
            }
        };
        drop(token);

        let subscribed = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            result = handle.subscribe(&self.subscription) => Some(result),
        };
        match subscribed {
            None => {
                info!("Exit subscription");
                handle.stop().await;
                return WorkerReport::new(WorkerExit::Cancelled, 0);
            }
            Some(Err(e)) => {
                handle.stop().await;
                error!("Error: {}", e);
                return WorkerReport::new(WorkerExit::SubscribeFailed, 0);
            }
            Some(Ok(())) => {}
        }
        info!(topic = %self.subscription.topic, "Subscribed");

        let mut received = 0u64;
        let exit = loop {
            tokio::select! {
                biased;
                Some(err) = errors.recv() => {
                    handle.stop().await;
                    error!("Error: {}", err);
                    break WorkerExit::StreamError;
                }
                _ = shutdown.cancelled() => {
                    info!("Exit subscription");
                    handle.stop().await;
                    break WorkerExit::Cancelled;
                }
                msg = messages.recv() => match msg {
                    Some(msg) => {
                        received += 1;
                        info!("Received: {}", msg.to_json_string());
                    }
                    None => {
                        handle.stop().await;
                        warn!("Connection closed");
                        break WorkerExit::ConnectionClosed;
                    }
                },
            }
        };

        WorkerReport::new(exit, received)
    }
}

fn cancelled_before_connect() -> WorkerReport {
    info!("Exit subscription");
    WorkerReport::new(WorkerExit::Cancelled, 0)
}
