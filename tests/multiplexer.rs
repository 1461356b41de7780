//! Multiplexer behavior over an in-memory transport.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use coinx::exchanges::zb::ZbStreamClient;
use coinx::types::Ticker;
use coinx::ws::{
    Connection, ConnectionState, Connector, Frame, FrameSink, Multiplexer, RawProtocol, WsConfig,
};
use coinx::{CoinxError, CurrencyPair};
use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use rust_decimal::Decimal;
use tokio::sync::{Notify, mpsc};
use tokio::time::timeout;
use tokio_stream::wrappers::UnboundedReceiverStream;

type FrameSender = mpsc::UnboundedSender<Result<Frame, CoinxError>>;

const WAIT: Duration = Duration::from_secs(2);

/// What the fake server saw.
#[derive(Default)]
struct Recorder {
    sent: Mutex<Vec<String>>,
    closes: AtomicUsize,
    dials: AtomicUsize,
}

impl Recorder {
    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

struct MemorySink {
    recorder: Arc<Recorder>,
}

impl FrameSink for MemorySink {
    fn send(&mut self, frame: String) -> BoxFuture<'_, Result<(), CoinxError>> {
        self.recorder.sent.lock().unwrap().push(frame);
        Box::pin(async { Ok(()) })
    }

    fn close(&mut self) -> BoxFuture<'_, Result<(), CoinxError>> {
        self.recorder.closes.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(()) })
    }
}

enum Dial {
    Accept(mpsc::UnboundedReceiver<Result<Frame, CoinxError>>),
    Refuse,
    /// Accept once the gate is opened.
    Gated(mpsc::UnboundedReceiver<Result<Frame, CoinxError>>, Arc<Notify>),
    Hang,
}

/// Connector answering each dial with the next scripted outcome.
struct MemoryConnector {
    recorder: Arc<Recorder>,
    script: Mutex<VecDeque<Dial>>,
}

impl MemoryConnector {
    fn new(recorder: Arc<Recorder>, script: Vec<Dial>) -> Self {
        Self {
            recorder,
            script: Mutex::new(script.into()),
        }
    }
}

impl Connector for MemoryConnector {
    fn connect<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Connection, CoinxError>> {
        self.recorder.dials.fetch_add(1, Ordering::SeqCst);
        let dial = self.script.lock().unwrap().pop_front().unwrap_or(Dial::Refuse);
        let recorder = Arc::clone(&self.recorder);
        Box::pin(async move {
            let frames = match dial {
                Dial::Accept(rx) => rx,
                Dial::Gated(rx, gate) => {
                    gate.notified().await;
                    rx
                }
                Dial::Refuse => {
                    return Err(CoinxError::Connection {
                        url: url.to_string(),
                        reason: "connection refused".to_string(),
                    });
                }
                Dial::Hang => futures_util::future::pending().await,
            };
            Ok(Connection {
                sink: Box::new(MemorySink { recorder }),
                frames: UnboundedReceiverStream::new(frames).boxed(),
            })
        })
    }
}

fn accept() -> (Dial, FrameSender) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Dial::Accept(rx), tx)
}

fn raw_mux(script: Vec<Dial>) -> (Multiplexer<RawProtocol, MemoryConnector>, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let connector = MemoryConnector::new(Arc::clone(&recorder), script);
    let mux = Multiplexer::with_connector("mem://test", RawProtocol, WsConfig::default(), connector);
    (mux, recorder)
}

fn text(s: &str) -> Result<Frame, CoinxError> {
    Ok(s.as_bytes().to_vec())
}

fn utf8(frame: &[u8]) -> Result<String, CoinxError> {
    String::from_utf8(frame.to_vec()).map_err(|e| CoinxError::InvalidResponse(e.to_string()))
}

async fn wait_for_state<P, C>(mux: &Multiplexer<P, C>, expected: ConnectionState)
where
    P: coinx::ws::StreamProtocol,
    C: Connector,
{
    timeout(WAIT, async {
        while mux.state().await != expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("state not reached");
}

/// Decoder tagging each frame with its `n` field.
fn sequence_number(frame: &[u8]) -> Result<i64, CoinxError> {
    let value: serde_json::Value = serde_json::from_slice(frame)?;
    value["n"]
        .as_i64()
        .ok_or_else(|| CoinxError::InvalidResponse("missing n".to_string()))
}

#[tokio::test]
async fn test_frames_reach_only_their_channel() {
    let (dial, server) = accept();
    let (mux, _recorder) = raw_mux(vec![dial]);

    // Both callbacks feed one log, so the global dispatch order is visible.
    let (log_tx, mut log_rx) = mpsc::unbounded_channel();
    for channel in ["A", "B"] {
        let log = log_tx.clone();
        mux.register_channel(channel, sequence_number, move |n| {
            let _ = log.send((channel, n));
        });
    }
    drop(log_tx);

    mux.connect().await.unwrap();
    server.send(text(r#"{"channel":"A","n":1}"#)).unwrap();
    server.send(text(r#"{"channel":"B","n":2}"#)).unwrap();
    server.send(text(r#"{"channel":"A","n":3}"#)).unwrap();
    server.send(text(r#"{"channel":"C","n":4}"#)).unwrap();
    server.send(text(r#"{"no_channel":true}"#)).unwrap();
    server.send(text(r#"{"channel":"B","n":5}"#)).unwrap();

    let mut log = Vec::new();
    while log.len() < 4 {
        log.push(timeout(WAIT, log_rx.recv()).await.unwrap().unwrap());
    }

    assert_eq!(log, vec![("A", 1), ("B", 2), ("A", 3), ("B", 5)]);
    mux.disconnect().await;
    assert!(log_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_undecodable_frame_is_skipped() {
    let (dial, server) = accept();
    let (mux, _recorder) = raw_mux(vec![dial]);

    let (tx, mut rx) = mpsc::unbounded_channel();
    mux.register_channel(
        "A",
        |frame: &[u8]| {
            let value: serde_json::Value = serde_json::from_slice(frame)?;
            value["n"]
                .as_i64()
                .ok_or_else(|| CoinxError::InvalidResponse("missing n".to_string()))
        },
        move |n| {
            let _ = tx.send(n);
        },
    );

    mux.connect().await.unwrap();
    server.send(text(r#"{"channel":"A","n":"oops"}"#)).unwrap();
    server.send(text(r#"{"channel":"A","n":7}"#)).unwrap();

    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(7));
    assert_eq!(mux.state().await, ConnectionState::Connected);
    mux.disconnect().await;
}

#[tokio::test]
async fn test_subscribe_sends_control_frame() {
    let (dial, _server) = accept();
    let (mux, recorder) = raw_mux(vec![dial]);

    mux.connect().await.unwrap();
    let channel = mux.subscribe("A", utf8, |_| {}).await.unwrap();

    assert_eq!(channel, "A");
    assert!(mux.registry().contains("A"));
    let sent = recorder.sent();
    assert_eq!(sent.len(), 1);
    let frame: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
    assert_eq!(frame["event"], "addChannel");
    assert_eq!(frame["channel"], "A");
    mux.disconnect().await;
}

#[tokio::test]
async fn test_subscribe_before_connect() {
    let (mux, recorder) = raw_mux(vec![]);

    let result = mux.subscribe("A", utf8, |_| {}).await;

    assert!(matches!(result, Err(CoinxError::NotConnected)));
    assert!(mux.registry().is_empty());
    assert!(recorder.sent().is_empty());
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let (dial, _server) = accept();
    let (mux, recorder) = raw_mux(vec![dial]);

    mux.connect().await.unwrap();
    mux.connect().await.unwrap();

    assert_eq!(recorder.dials.load(Ordering::SeqCst), 1);
    assert!(mux.is_connected().await);
    mux.disconnect().await;
}

#[tokio::test]
async fn test_concurrent_disconnect_closes_once() {
    let (dial, _server) = accept();
    let (mux, recorder) = raw_mux(vec![dial]);

    mux.connect().await.unwrap();
    let other = mux.clone();
    tokio::join!(mux.disconnect(), other.disconnect());
    mux.disconnect().await;

    assert_eq!(recorder.closes(), 1);
    assert_eq!(mux.state().await, ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_read_error_disconnects() {
    let (dial, server) = accept();
    let (mux, recorder) = raw_mux(vec![dial]);

    mux.connect().await.unwrap();
    server
        .send(Err(CoinxError::ConnectionClosed {
            reason: "reset by peer".to_string(),
        }))
        .unwrap();

    wait_for_state(&mux, ConnectionState::Disconnected).await;
    assert_eq!(recorder.closes(), 1);

    // A late explicit disconnect is a no-op.
    mux.disconnect().await;
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test]
async fn test_end_of_stream_disconnects() {
    let (dial, server) = accept();
    let (mux, recorder) = raw_mux(vec![dial]);

    mux.connect().await.unwrap();
    drop(server);

    wait_for_state(&mux, ConnectionState::Disconnected).await;
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test]
async fn test_failed_connect_can_be_retried() {
    let (dial, server) = accept();
    let (mux, _recorder) = raw_mux(vec![Dial::Refuse, dial]);

    let (tx, mut rx) = mpsc::unbounded_channel();
    mux.register_channel("A", utf8, move |s| {
        let _ = tx.send(s);
    });

    let err = mux.connect().await.unwrap_err();
    assert!(matches!(err, CoinxError::Connection { .. }));
    assert_eq!(mux.state().await, ConnectionState::Disconnected);

    mux.connect().await.unwrap();
    server.send(text(r#"{"channel":"A"}"#)).unwrap();
    assert!(timeout(WAIT, rx.recv()).await.unwrap().is_some());
    mux.disconnect().await;
}

#[tokio::test]
async fn test_connect_timeout() {
    let recorder = Arc::new(Recorder::default());
    let connector = MemoryConnector::new(Arc::clone(&recorder), vec![Dial::Hang]);
    let config = WsConfig::builder()
        .connect_timeout(Duration::from_millis(50))
        .build();
    let mux = Multiplexer::with_connector("mem://test", RawProtocol, config, connector);

    let err = mux.connect().await.unwrap_err();

    assert!(matches!(err, CoinxError::Timeout));
    assert_eq!(mux.state().await, ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_disconnect_during_handshake() {
    let gate = Arc::new(Notify::new());
    let (_tx, rx) = mpsc::unbounded_channel();
    let (mux, recorder) = raw_mux(vec![Dial::Gated(rx, Arc::clone(&gate))]);

    let connecting = tokio::spawn({
        let mux = mux.clone();
        async move { mux.connect().await }
    });
    wait_for_state(&mux, ConnectionState::Connecting).await;

    mux.disconnect().await;
    assert_eq!(mux.state().await, ConnectionState::Disconnected);
    gate.notify_one();

    let result = connecting.await.unwrap();
    assert!(matches!(result, Err(CoinxError::ConnectionClosed { .. })));
    assert_eq!(recorder.closes(), 1);
    assert_eq!(mux.state().await, ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_unregister_stops_delivery() {
    let (dial, server) = accept();
    let (mux, _recorder) = raw_mux(vec![dial]);

    let (tx, mut rx) = mpsc::unbounded_channel();
    mux.register_channel("A", utf8, move |s| {
        let _ = tx.send(s);
    });
    mux.connect().await.unwrap();

    server.send(text(r#"{"channel":"A","n":1}"#)).unwrap();
    assert!(timeout(WAIT, rx.recv()).await.unwrap().is_some());

    assert!(mux.unregister_channel("A"));
    assert!(!mux.unregister_channel("A"));
    server.send(text(r#"{"channel":"A","n":2}"#)).unwrap();

    // The sender lives in the dropped pipeline, so the channel closes.
    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), None);
    mux.disconnect().await;
}

#[tokio::test]
async fn test_zb_ticker_stream() {
    let recorder = Arc::new(Recorder::default());
    let (dial, server) = accept();
    let connector = MemoryConnector::new(Arc::clone(&recorder), vec![dial]);
    let client = ZbStreamClient::with_connector("mem://zb", WsConfig::default(), connector);

    client.connect().await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel::<Ticker>();
    let channel = client
        .subscribe_ticker(&CurrencyPair::new("btc", "usdt"), move |ticker| {
            let _ = tx.send(ticker);
        })
        .await
        .unwrap();
    assert_eq!(channel, "btcusdt_ticker");

    let sent = recorder.sent();
    let frame: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
    assert_eq!(frame["channel"], "btcusdt_ticker");

    server
        .send(text(
            r#"{"channel":"btcusdt_ticker","date":"1516868838012","ticker":{"vol":"1234.5","last":"9000.5","sell":"9001","buy":"9000","high":"9500","low":"8800"}}"#,
        ))
        .unwrap();

    let ticker = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(ticker.last, Decimal::new(90005, 1));
    assert_eq!(ticker.time, 1_516_868_838_012);

    client.disconnect().await;
    assert_eq!(client.state().await, ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_concurrent_connect_dials_once() {
    let gate = Arc::new(Notify::new());
    let (server, rx) = mpsc::unbounded_channel();
    let (mux, recorder) = raw_mux(vec![Dial::Gated(rx, Arc::clone(&gate))]);

    let (tx, mut delivered) = mpsc::unbounded_channel();
    mux.register_channel("A", sequence_number, move |n| {
        let _ = tx.send(n);
    });

    let other = mux.clone();
    let opener = tokio::spawn(async move { other.connect().await });
    wait_for_state(&mux, ConnectionState::Connecting).await;

    // Both callers race while the first handshake is still in flight.
    let racer = mux.clone();
    let (first, second) = tokio::join!(mux.connect(), racer.connect());
    first.unwrap();
    second.unwrap();
    gate.notify_one();
    opener.await.unwrap().unwrap();

    assert_eq!(recorder.dials.load(Ordering::SeqCst), 1);
    assert_eq!(mux.state().await, ConnectionState::Connected);

    // One receive loop: each frame is dispatched exactly once.
    server.send(text(r#"{"channel":"A","n":1}"#)).unwrap();
    server.send(text(r#"{"channel":"A","n":2}"#)).unwrap();
    assert_eq!(timeout(WAIT, delivered.recv()).await.unwrap(), Some(1));
    assert_eq!(timeout(WAIT, delivered.recv()).await.unwrap(), Some(2));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(delivered.try_recv().is_err());

    mux.disconnect().await;
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test]
async fn test_stale_loop_does_not_release_new_connection() {
    let (first_dial, first) = accept();
    let (second_dial, second) = accept();
    let (mux, recorder) = raw_mux(vec![first_dial, second_dial]);

    let (tx, mut delivered) = mpsc::unbounded_channel();
    mux.register_channel("A", sequence_number, move |n| {
        let _ = tx.send(n);
    });

    mux.connect().await.unwrap();
    drop(first);

    // Reconnect as soon as the first loop lets go, racing its release.
    timeout(WAIT, async {
        while recorder.dials.load(Ordering::SeqCst) < 2 {
            mux.connect().await.unwrap();
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("second connection not opened");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(mux.state().await, ConnectionState::Connected);
    assert_eq!(recorder.closes(), 1);

    second.send(text(r#"{"channel":"A","n":9}"#)).unwrap();
    assert_eq!(timeout(WAIT, delivered.recv()).await.unwrap(), Some(9));
    mux.disconnect().await;
    assert_eq!(recorder.closes(), 2);
}

#[tokio::test]
async fn test_dropping_last_handle_closes_connection() {
    let (dial, server) = accept();
    let (mux, recorder) = raw_mux(vec![dial]);

    mux.connect().await.unwrap();
    let clone = mux.clone();
    drop(mux);
    assert_eq!(recorder.closes(), 0);
    drop(clone);

    timeout(WAIT, async {
        while recorder.closes() == 0 || !server.is_closed() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("connection left open");
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test]
async fn test_panicking_callback_keeps_connection() {
    let (dial, server) = accept();
    let (mux, recorder) = raw_mux(vec![dial]);

    mux.register_channel("A", utf8, |_| {
        panic!("callback failure");
    });
    let (tx, mut delivered) = mpsc::unbounded_channel();
    mux.register_channel("B", sequence_number, move |n| {
        let _ = tx.send(n);
    });

    mux.connect().await.unwrap();
    server.send(text(r#"{"channel":"A","n":1}"#)).unwrap();
    server.send(text(r#"{"channel":"B","n":2}"#)).unwrap();

    assert_eq!(timeout(WAIT, delivered.recv()).await.unwrap(), Some(2));
    assert_eq!(mux.state().await, ConnectionState::Connected);
    assert_eq!(recorder.closes(), 0);

    mux.disconnect().await;
    assert_eq!(recorder.closes(), 1);
}
