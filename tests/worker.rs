use std::io;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::fmt::MakeWriter;

use kucoin_feed_client::error::KucoinError;
use kucoin_feed_client::rest::{InstanceServer, KucoinClient, ServerTime, Ticker, WsToken};
use kucoin_feed_client::runner::{Orchestrator, RunnerConfig, SubscriptionWorker, WorkerExit};
use kucoin_feed_client::ws::messages::{DownstreamMessage, SubscribeMessage};
use kucoin_feed_client::ws::{Feed, FeedConnector, FeedHandle};

const TOPIC: &str = "/market/ticker:KCS-BTC";

#[derive(Debug, Default)]
struct Calls {
    server_time: AtomicUsize,
    public_token: AtomicUsize,
    private_token: AtomicUsize,
    connect: AtomicUsize,
    subscribe: AtomicUsize,
    stop: AtomicUsize,
}

impl Calls {
    fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

struct FakeClient {
    calls: Arc<Calls>,
    fail_token: bool,
    hang_token: bool,
}

impl KucoinClient for FakeClient {
    async fn get_server_time(&self) -> Result<ServerTime, KucoinError> {
        self.calls.server_time.fetch_add(1, Ordering::SeqCst);
        Ok(ServerTime {
            timestamp: 1_700_000_000_000,
        })
    }

    async fn get_ticker(&self, _symbol: &str) -> Result<Ticker, KucoinError> {
        Err(KucoinError::InvalidResponse("not used".into()))
    }

    async fn get_public_ws_token(&self) -> Result<WsToken, KucoinError> {
        self.calls.public_token.fetch_add(1, Ordering::SeqCst);
        if self.hang_token {
            std::future::pending::<()>().await;
        }
        self.token()
    }

    async fn get_private_ws_token(&self) -> Result<WsToken, KucoinError> {
        self.calls.private_token.fetch_add(1, Ordering::SeqCst);
        self.token()
    }
}

impl FakeClient {
    fn token(&self) -> Result<WsToken, KucoinError> {
        if self.fail_token {
            return Err(KucoinError::InvalidResponse("token unavailable".into()));
        }
        Ok(WsToken {
            token: "fake".into(),
            instance_servers: vec![InstanceServer {
                endpoint: "wss://fake.invalid/".into(),
                encrypt: true,
                protocol: "websocket".into(),
                ping_interval: 18_000,
                ping_timeout: 10_000,
            }],
        })
    }
}

struct FakeHandle {
    calls: Arc<Calls>,
    fail_subscribe: bool,
    hang_subscribe: bool,
    hang_on_stop: bool,
}

impl FeedHandle for FakeHandle {
    async fn subscribe(&mut self, message: &SubscribeMessage) -> Result<(), KucoinError> {
        self.calls.subscribe.fetch_add(1, Ordering::SeqCst);
        assert_eq!(message.topic, TOPIC);
        if self.hang_subscribe {
            std::future::pending::<()>().await;
        }
        if self.fail_subscribe {
            return Err(KucoinError::Feed {
                code: 404,
                message: "topic not found".into(),
            });
        }
        Ok(())
    }

    async fn stop(&mut self) {
        self.calls.stop.fetch_add(1, Ordering::SeqCst);
        if self.hang_on_stop {
            std::future::pending::<()>().await;
        }
    }
}

type Channels = (
    mpsc::Receiver<DownstreamMessage>,
    mpsc::Receiver<KucoinError>,
);

struct FakeConnector {
    calls: Arc<Calls>,
    channels: Mutex<Option<Channels>>,
    fail_connect: bool,
    fail_subscribe: bool,
    hang_subscribe: bool,
    hang_on_stop: bool,
}

impl FeedConnector for FakeConnector {
    type Handle = FakeHandle;

    async fn connect(&self, _token: &WsToken) -> Result<Feed<FakeHandle>, KucoinError> {
        self.calls.connect.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(KucoinError::WebSocketMsg("connection refused".into()));
        }
        let (messages, errors) = self
            .channels
            .lock()
            .unwrap()
            .take()
            .expect("connect called twice");
        Ok(Feed {
            handle: FakeHandle {
                calls: self.calls.clone(),
                fail_subscribe: self.fail_subscribe,
                hang_subscribe: self.hang_subscribe,
                hang_on_stop: self.hang_on_stop,
            },
            messages,
            errors,
        })
    }
}

/// Test fixture: fake collaborators plus the sending ends of the feed channels.
struct Harness {
    calls: Arc<Calls>,
    client: FakeClient,
    connector: FakeConnector,
    messages: mpsc::Sender<DownstreamMessage>,
    errors: mpsc::Sender<KucoinError>,
}

impl Harness {
    fn new() -> Self {
        let calls = Arc::new(Calls::default());
        let (messages, messages_rx) = mpsc::channel(16);
        let (errors, errors_rx) = mpsc::channel(16);
        Self {
            client: FakeClient {
                calls: calls.clone(),
                fail_token: false,
                hang_token: false,
            },
            connector: FakeConnector {
                calls: calls.clone(),
                channels: Mutex::new(Some((messages_rx, errors_rx))),
                fail_connect: false,
                fail_subscribe: false,
                hang_subscribe: false,
                hang_on_stop: false,
            },
            calls,
            messages,
            errors,
        }
    }

    fn worker(self) -> (
        SubscriptionWorker<FakeClient, FakeConnector>,
        Arc<Calls>,
        mpsc::Sender<DownstreamMessage>,
        mpsc::Sender<KucoinError>,
    ) {
        let worker = SubscriptionWorker::new(
            self.client,
            self.connector,
            SubscribeMessage::new(TOPIC, false),
        );
        (worker, self.calls, self.messages, self.errors)
    }
}

/// Collects formatted log lines for the current thread.
#[derive(Clone, Default)]
struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    fn lines(&self) -> Vec<String> {
        let buffer = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buffer)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn ticker_message(price: &str) -> DownstreamMessage {
    let text = serde_json::json!({
        "type": "message",
        "topic": TOPIC,
        "subject": "trade.ticker",
        "data": { "price": price }
    })
    .to_string();
    DownstreamMessage::from_text(&text).unwrap()
}

#[tokio::test]
async fn test_token_failure_skips_connect() {
    let mut harness = Harness::new();
    harness.client.fail_token = true;
    let (worker, calls, _messages, _errors) = harness.worker();

    let report = worker.run(CancellationToken::new()).await;

    assert_eq!(report.exit, WorkerExit::TokenFailed);
    assert_eq!(Calls::get(&calls.public_token), 1);
    assert_eq!(Calls::get(&calls.connect), 0);
    assert_eq!(Calls::get(&calls.stop), 0);
}

#[tokio::test]
async fn test_connect_failure() {
    let mut harness = Harness::new();
    harness.connector.fail_connect = true;
    let (worker, calls, _messages, _errors) = harness.worker();

    let report = worker.run(CancellationToken::new()).await;

    assert_eq!(report.exit, WorkerExit::ConnectFailed);
    assert_eq!(Calls::get(&calls.connect), 1);
    assert_eq!(Calls::get(&calls.subscribe), 0);
}

#[tokio::test]
async fn test_subscribe_failure_tears_down() {
    let mut harness = Harness::new();
    harness.connector.fail_subscribe = true;
    let (worker, calls, _messages, _errors) = harness.worker();

    let report = worker.run(CancellationToken::new()).await;

    assert_eq!(report.exit, WorkerExit::SubscribeFailed);
    assert_eq!(Calls::get(&calls.subscribe), 1);
    assert_eq!(Calls::get(&calls.stop), 1);
}

#[tokio::test]
async fn test_private_subscription_uses_private_token() {
    let harness = Harness::new();
    let worker = SubscriptionWorker::new(
        harness.client,
        harness.connector,
        SubscribeMessage::new(TOPIC, true),
    );
    drop(harness.messages);

    let report = worker.run(CancellationToken::new()).await;

    assert_eq!(report.exit, WorkerExit::ConnectionClosed);
    assert_eq!(Calls::get(&harness.calls.private_token), 1);
    assert_eq!(Calls::get(&harness.calls.public_token), 0);
}

#[tokio::test]
async fn test_messages_logged_until_cancelled() {
    let logs = LogCapture::default();
    let _guard = logs.install();
    let (worker, calls, messages, _errors) = Harness::new().worker();
    messages.send(ticker_message("0.08")).await.unwrap();
    messages.send(ticker_message("0.09")).await.unwrap();

    let cancel = CancellationToken::new();
    let task = tokio::spawn(worker.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let report = task.await.unwrap();
    assert_eq!(report.exit, WorkerExit::Cancelled);
    assert_eq!(report.messages, 2);
    assert_eq!(Calls::get(&calls.connect), 1);
    assert_eq!(Calls::get(&calls.subscribe), 1);
    assert_eq!(Calls::get(&calls.stop), 1);

    let lines = logs.lines();
    let received: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains("Received: "))
        .map(|(i, _)| i)
        .collect();
    let exit = lines
        .iter()
        .position(|line| line.contains("Exit subscription"))
        .expect("exit line logged");
    assert_eq!(received.len(), 2);
    assert!(lines[received[0]].contains("0.08"));
    assert!(lines[received[1]].contains("0.09"));
    assert!(received.iter().all(|&i| i < exit));
}

#[tokio::test]
async fn test_cancel_during_token_request() {
    let mut harness = Harness::new();
    harness.client.hang_token = true;
    let (worker, calls, _messages, _errors) = harness.worker();

    let cancel = CancellationToken::new();
    let task = tokio::spawn(worker.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();

    let report = tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.exit, WorkerExit::Cancelled);
    assert_eq!(Calls::get(&calls.public_token), 1);
    assert_eq!(Calls::get(&calls.connect), 0);
    assert_eq!(Calls::get(&calls.stop), 0);
}

#[tokio::test]
async fn test_cancel_during_subscribe_stops_connection() {
    let mut harness = Harness::new();
    harness.connector.hang_subscribe = true;
    let (worker, calls, _messages, _errors) = harness.worker();

    let cancel = CancellationToken::new();
    let task = tokio::spawn(worker.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();

    let report = tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.exit, WorkerExit::Cancelled);
    assert_eq!(report.messages, 0);
    assert_eq!(Calls::get(&calls.subscribe), 1);
    assert_eq!(Calls::get(&calls.stop), 1);
}

#[tokio::test]
async fn test_stream_error_stops_once() {
    let (worker, calls, messages, errors) = Harness::new().worker();
    messages.send(ticker_message("0.08")).await.unwrap();

    let task = tokio::spawn(worker.run(CancellationToken::new()));
    tokio::time::sleep(Duration::from_millis(50)).await;
    errors
        .send(KucoinError::Timeout("pong message"))
        .await
        .unwrap();

    let report = task.await.unwrap();
    assert_eq!(report.exit, WorkerExit::StreamError);
    assert_eq!(report.messages, 1);
    assert_eq!(Calls::get(&calls.stop), 1);
}

#[tokio::test]
async fn test_error_wins_over_pending_messages() {
    let (worker, calls, messages, errors) = Harness::new().worker();
    messages.send(ticker_message("0.08")).await.unwrap();
    errors
        .send(KucoinError::Feed {
            code: 401,
            message: "token is expired".into(),
        })
        .await
        .unwrap();

    let report = worker.run(CancellationToken::new()).await;

    assert_eq!(report.exit, WorkerExit::StreamError);
    assert_eq!(report.messages, 0);
    assert_eq!(Calls::get(&calls.stop), 1);
}

#[tokio::test]
async fn test_closed_message_channel() {
    let (worker, calls, messages, _errors) = Harness::new().worker();
    drop(messages);

    let report = worker.run(CancellationToken::new()).await;

    assert_eq!(report.exit, WorkerExit::ConnectionClosed);
    assert_eq!(Calls::get(&calls.stop), 1);
}

#[tokio::test]
async fn test_orchestrator_probes_and_cancels_worker() {
    let harness = Harness::new();
    let calls = harness.calls.clone();
    let messages = harness.messages.clone();
    messages.send(ticker_message("0.08")).await.unwrap();

    let config = RunnerConfig::default().with_grace_period(Duration::from_millis(500));
    let orchestrator = Orchestrator::new(config, harness.client, harness.connector);
    let outcome = orchestrator
        .run(tokio::time::sleep(Duration::from_millis(50)))
        .await;

    assert_eq!(
        outcome.server_time.map(|t| t.millis()),
        Some(1_700_000_000_000)
    );
    let report = outcome.worker.expect("worker should finish within grace");
    assert_eq!(report.exit, WorkerExit::Cancelled);
    assert_eq!(report.messages, 1);
    assert_eq!(Calls::get(&calls.server_time), 1);
    assert_eq!(Calls::get(&calls.stop), 1);
}

#[tokio::test]
async fn test_orchestrator_aborts_stuck_worker() {
    let mut harness = Harness::new();
    harness.connector.hang_on_stop = true;
    let calls = harness.calls.clone();

    let config = RunnerConfig::default().with_grace_period(Duration::from_millis(100));
    let orchestrator = Orchestrator::new(config, harness.client, harness.connector);
    let started = tokio::time::Instant::now();
    let outcome = orchestrator
        .run(tokio::time::sleep(Duration::from_millis(20)))
        .await;

    assert!(outcome.worker.is_none());
    assert!(outcome.server_time.is_some());
    assert_eq!(Calls::get(&calls.stop), 1);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_orchestrator_with_failed_token() {
    let mut harness = Harness::new();
    harness.client.fail_token = true;
    let calls = harness.calls.clone();

    let orchestrator = Orchestrator::new(RunnerConfig::default(), harness.client, harness.connector);
    let outcome = orchestrator
        .run(tokio::time::sleep(Duration::from_millis(50)))
        .await;

    let report = outcome.worker.expect("worker exits on its own");
    assert_eq!(report.exit, WorkerExit::TokenFailed);
    assert_eq!(Calls::get(&calls.connect), 0);
}
