//! WebSocket connection implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, Notify, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::KucoinError;
use crate::rest::public::WsToken;
use crate::ws::client::WsConfig;
use crate::ws::messages::{DownstreamMessage, PingMessage, SubscribeMessage, frame_types};
use crate::ws::traits::FeedHandle;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;
type WsReceiver = SplitStream<WsStream>;
type PendingAcks = Arc<Mutex<HashMap<String, oneshot::Sender<Result<(), KucoinError>>>>>;

/// Upper bound on locking the sink and sending the close frame during
/// [`WsConnection::stop`].
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// An open feed: the connection handle plus its two output channels.
///
/// `messages` yields data, notice and command frames. `errors` yields error
/// frames not tied to a request, transport failures and heartbeat timeouts.
/// Both channels close once the connection's reader task exits.
#[derive(Debug)]
pub struct Feed<H> {
    /// Control handle (subscribe, stop).
    pub handle: H,
    /// Inbound messages.
    pub messages: mpsc::Receiver<DownstreamMessage>,
    /// Asynchronous errors.
    pub errors: mpsc::Receiver<KucoinError>,
}

/// Request ids, unique per connection.
#[derive(Debug)]
struct RequestIds(AtomicU64);

impl RequestIds {
    fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self(AtomicU64::new(seed))
    }

    fn next(&self) -> String {
        (self.0.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }
}

/// A live KuCoin WebSocket session.
///
/// Two background tasks run for the lifetime of the connection: a reader that
/// dispatches inbound frames, and a heartbeat that sends pings and reports a
/// missing pong on the error channel.
pub struct WsConnection {
    sink: Arc<Mutex<WsSink>>,
    pending: PendingAcks,
    ids: Arc<RequestIds>,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    ack_timeout: Duration,
    endpoint: String,
    stopped: bool,
}

impl std::fmt::Debug for WsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsConnection")
            .field("endpoint", &self.endpoint)
            .field("stopped", &self.stopped)
            .finish()
    }
}

impl WsConnection {
    /// Connect with the token and wait for the server's welcome.
    pub(crate) async fn open(token: &WsToken, config: &WsConfig) -> Result<Feed<Self>, KucoinError> {
        let server = token.server()?;
        let ids = Arc::new(RequestIds::new());
        let url = connect_url(&server.endpoint, &token.token, &ids.next())?;

        let (ws_stream, _) = connect_async(url.as_str()).await.map_err(|e| {
            KucoinError::WebSocketMsg(format!("Failed to connect to {}: {}", server.endpoint, e))
        })?;
        let (sink, mut receiver) = ws_stream.split();

        tokio::time::timeout(config.welcome_timeout, wait_for_welcome(&mut receiver))
            .await
            .map_err(|_| KucoinError::Timeout("welcome message"))??;
        tracing::debug!(endpoint = %server.endpoint, "WebSocket session opened");

        let capacity = config.channel_capacity.max(1);
        let (messages_tx, messages_rx) = mpsc::channel(capacity);
        let (errors_tx, errors_rx) = mpsc::channel(capacity);

        let sink = Arc::new(Mutex::new(sink));
        let pending: PendingAcks = Arc::new(Mutex::new(HashMap::new()));
        let shutdown = CancellationToken::new();
        let pong = Arc::new(Notify::new());

        let reader = tokio::spawn(read_loop(
            receiver,
            messages_tx,
            errors_tx.clone(),
            pending.clone(),
            pong.clone(),
            shutdown.clone(),
        ));

        let heartbeat = tokio::spawn(heartbeat_loop(
            sink.clone(),
            ids.clone(),
            pong,
            errors_tx,
            config.ping_interval.unwrap_or_else(|| server.ping_interval()),
            config.pong_timeout.unwrap_or_else(|| server.ping_timeout()),
            shutdown.clone(),
        ));

        let handle = Self {
            sink,
            pending,
            ids,
            shutdown,
            tasks: vec![reader, heartbeat],
            ack_timeout: config.ack_timeout,
            endpoint: server.endpoint.clone(),
            stopped: false,
        };

        Ok(Feed {
            handle,
            messages: messages_rx,
            errors: errors_rx,
        })
    }

    /// Subscribe to a topic.
    ///
    /// When `response` is set, waits for the matching `ack` (or `error`) frame.
    pub async fn subscribe(&mut self, message: &SubscribeMessage) -> Result<(), KucoinError> {
        self.request(message.clone()).await
    }

    /// Unsubscribe from a topic previously subscribed with `message`.
    pub async fn unsubscribe(&mut self, message: &SubscribeMessage) -> Result<(), KucoinError> {
        self.request(message.unsubscribe()).await
    }

    /// Send a subscribe/unsubscribe request and wait for its acknowledgement.
    async fn request(&self, message: SubscribeMessage) -> Result<(), KucoinError> {
        if self.stopped {
            return Err(KucoinError::ConnectionClosed {
                reason: "connection stopped".into(),
            });
        }

        let message = message.with_id(self.ids.next());
        if !message.response {
            return self.send_json(&message).await;
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        self.pending.lock().await.insert(message.id.clone(), ack_tx);

        if let Err(e) = self.send_json(&message).await {
            self.pending.lock().await.remove(&message.id);
            return Err(e);
        }

        match tokio::time::timeout(self.ack_timeout, ack_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(KucoinError::ConnectionClosed {
                reason: "connection closed before acknowledgement".into(),
            }),
            Err(_) => {
                self.pending.lock().await.remove(&message.id);
                Err(KucoinError::Timeout("subscription acknowledgement"))
            }
        }
    }

    /// Send a JSON message.
    async fn send_json<T: serde::Serialize>(&self, msg: &T) -> Result<(), KucoinError> {
        send_json(&self.sink, msg).await
    }

    /// Stop the background tasks and close the socket.
    ///
    /// Idempotent: only the first call does anything.
    pub async fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.shutdown.cancel();

        let close = async {
            let mut sink = self.sink.lock().await;
            sink.send(WsMessage::Close(None)).await
        };
        let _ = tokio::time::timeout(CLOSE_TIMEOUT, close).await;

        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        self.pending.lock().await.clear();
        tracing::debug!(endpoint = %self.endpoint, "WebSocket connection stopped");
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl FeedHandle for WsConnection {
    async fn subscribe(&mut self, message: &SubscribeMessage) -> Result<(), KucoinError> {
        WsConnection::subscribe(self, message).await
    }

    async fn stop(&mut self) {
        WsConnection::stop(self).await
    }
}

/// Build `<endpoint>?token=<token>&connectId=<id>`.
fn connect_url(endpoint: &str, token: &str, connect_id: &str) -> Result<Url, KucoinError> {
    let mut url = Url::parse(endpoint)?;
    url.query_pairs_mut()
        .append_pair("token", token)
        .append_pair("connectId", connect_id);
    Ok(url)
}

async fn send_json<T: serde::Serialize>(sink: &Mutex<WsSink>, msg: &T) -> Result<(), KucoinError> {
    let json = serde_json::to_string(msg)
        .map_err(|e| KucoinError::WebSocketMsg(format!("Failed to serialize message: {}", e)))?;

    let mut sink = sink.lock().await;
    sink.send(WsMessage::Text(json.into()))
        .await
        .map_err(|e| KucoinError::WebSocketMsg(format!("Failed to send message: {}", e)))
}

fn frame_text(frame: WsMessage) -> Option<String> {
    match frame {
        WsMessage::Text(text) => Some(text.to_string()),
        WsMessage::Binary(data) => String::from_utf8(data.to_vec()).ok(),
        _ => None,
    }
}

/// Wait for the `welcome` frame that opens every session.
async fn wait_for_welcome(receiver: &mut WsReceiver) -> Result<(), KucoinError> {
    while let Some(frame) = receiver.next().await {
        let frame = frame?;
        if let WsMessage::Close(close) = &frame {
            return Err(KucoinError::ConnectionClosed {
                reason: close
                    .as_ref()
                    .map(|c| c.reason.to_string())
                    .unwrap_or_else(|| "closed before welcome".into()),
            });
        }
        let Some(text) = frame_text(frame) else {
            continue;
        };

        let msg = DownstreamMessage::from_text(&text)?;
        match msg.kind.as_str() {
            frame_types::WELCOME => return Ok(()),
            frame_types::ERROR => return Err(msg.to_error()),
            other => tracing::debug!("Ignoring '{}' frame before welcome", other),
        }
    }

    Err(KucoinError::ConnectionClosed {
        reason: "stream ended before welcome".into(),
    })
}

async fn read_loop(
    mut receiver: WsReceiver,
    messages: mpsc::Sender<DownstreamMessage>,
    errors: mpsc::Sender<KucoinError>,
    pending: PendingAcks,
    pong: Arc<Notify>,
    shutdown: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            frame = receiver.next() => frame,
        };

        let frame = match frame {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                tracing::warn!("WebSocket error: {}", e);
                forward(&errors, KucoinError::WebSocket(e), &shutdown).await;
                break;
            }
            None => {
                let reason = "stream ended".to_string();
                forward(&errors, KucoinError::ConnectionClosed { reason }, &shutdown).await;
                break;
            }
        };

        if let WsMessage::Close(close) = &frame {
            let reason = close
                .as_ref()
                .map(|c| c.reason.to_string())
                .unwrap_or_else(|| "closed by server".into());
            forward(&errors, KucoinError::ConnectionClosed { reason }, &shutdown).await;
            break;
        }

        // Ping/pong control frames are answered by tungstenite.
        let Some(text) = frame_text(frame) else {
            continue;
        };

        let msg = match DownstreamMessage::from_text(&text) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!("Failed to parse WebSocket message: {}", e);
                continue;
            }
        };

        match msg.kind.as_str() {
            frame_types::MESSAGE | frame_types::NOTICE | frame_types::COMMAND => {
                if !forward(&messages, msg, &shutdown).await {
                    break;
                }
            }
            frame_types::ACK => {
                if let Some(tx) = take_pending(&pending, msg.id.as_deref()).await {
                    let _ = tx.send(Ok(()));
                }
            }
            frame_types::PONG => pong.notify_one(),
            frame_types::ERROR => match take_pending(&pending, msg.id.as_deref()).await {
                Some(tx) => {
                    let _ = tx.send(Err(msg.to_error()));
                }
                None => {
                    if !forward(&errors, msg.to_error(), &shutdown).await {
                        break;
                    }
                }
            },
            frame_types::WELCOME => {}
            other => tracing::debug!("Unknown message type: {}", other),
        }
    }

    pending.lock().await.clear();
}

/// Send on a channel unless shutdown wins first. Returns false if the value
/// could not be delivered.
async fn forward<T>(tx: &mpsc::Sender<T>, value: T, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => false,
        sent = tx.send(value) => sent.is_ok(),
    }
}

async fn take_pending(
    pending: &PendingAcks,
    id: Option<&str>,
) -> Option<oneshot::Sender<Result<(), KucoinError>>> {
    let id = id?;
    pending.lock().await.remove(id)
}

async fn heartbeat_loop(
    sink: Arc<Mutex<WsSink>>,
    ids: Arc<RequestIds>,
    pong: Arc<Notify>,
    errors: mpsc::Sender<KucoinError>,
    ping_interval: Duration,
    pong_timeout: Duration,
    shutdown: CancellationToken,
) {
    let ping_interval = ping_interval.max(Duration::from_millis(10));
    let mut ticker = interval_at(Instant::now() + ping_interval, ping_interval);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let ping = PingMessage::new(ids.next());
        let sent = tokio::select! {
            _ = shutdown.cancelled() => return,
            sent = send_json(&sink, &ping) => sent,
        };
        if let Err(e) = sent {
            forward(&errors, e, &shutdown).await;
            return;
        }

        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = pong.notified() => {}
            _ = tokio::time::sleep(pong_timeout) => {
                tracing::warn!("No pong within {:?}", pong_timeout);
                forward(&errors, KucoinError::Timeout("pong message"), &shutdown).await;
                return;
            }
        }
    }
}
