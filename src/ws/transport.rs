//! Streaming transport abstraction.
//!
//! The multiplexer never touches sockets directly: a [`Connector`] dials the
//! endpoint and hands back a [`Connection`], a write half ([`FrameSink`]) and
//! a read half ([`FrameStream`]). [`TungsteniteConnector`] is the production
//! implementation; tests plug in in-memory ones.

use futures_util::future::{self, BoxFuture};
use futures_util::stream::{BoxStream, SplitSink};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::trace;

use crate::error::CoinxError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;

/// Payload of one inbound message.
pub type Frame = Vec<u8>;

/// Inbound frames. An `Err` item or the end of the stream means the
/// connection is gone.
pub type FrameStream = BoxStream<'static, Result<Frame, CoinxError>>;

/// Write half of a connection.
pub trait FrameSink: Send {
    /// Send one text frame.
    fn send(&mut self, frame: String) -> BoxFuture<'_, Result<(), CoinxError>>;

    /// Close the connection.
    fn close(&mut self) -> BoxFuture<'_, Result<(), CoinxError>>;
}

/// An open connection, split into its two halves.
pub struct Connection {
    pub sink: Box<dyn FrameSink>,
    pub frames: FrameStream,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

/// Opens connections to a streaming endpoint.
pub trait Connector: Send + Sync + 'static {
    /// Dial `url` and complete the handshake.
    fn connect<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Connection, CoinxError>>;
}

/// WebSocket connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl Connector for TungsteniteConnector {
    fn connect<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Connection, CoinxError>> {
        Box::pin(async move {
            let (ws_stream, _) =
                connect_async(url)
                    .await
                    .map_err(|e| CoinxError::Connection {
                        url: url.to_string(),
                        reason: e.to_string(),
                    })?;

            let (sink, receiver) = ws_stream.split();
            let frames = receiver
                .take_while(|msg| future::ready(!matches!(msg, Ok(WsMessage::Close(_)))))
                .filter_map(|msg| {
                    future::ready(match msg {
                        Ok(WsMessage::Text(text)) => Some(Ok(text.as_str().as_bytes().to_vec())),
                        Ok(WsMessage::Binary(data)) => Some(Ok(data.to_vec())),
                        Ok(other) => {
                            trace!(?other, "Ignoring control message");
                            None
                        }
                        Err(e) => Some(Err(CoinxError::from(e))),
                    })
                })
                .boxed();

            Ok(Connection {
                sink: Box::new(TungsteniteSink(sink)),
                frames,
            })
        })
    }
}

struct TungsteniteSink(WsSink);

impl FrameSink for TungsteniteSink {
    fn send(&mut self, frame: String) -> BoxFuture<'_, Result<(), CoinxError>> {
        Box::pin(async move {
            self.0.send(WsMessage::text(frame)).await?;
            Ok(())
        })
    }

    fn close(&mut self) -> BoxFuture<'_, Result<(), CoinxError>> {
        Box::pin(async move {
            self.0.close().await?;
            Ok(())
        })
    }
}
