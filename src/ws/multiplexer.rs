//! One streaming connection shared by many subscribed channels.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use futures_util::StreamExt;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, error, info, trace, warn};

use crate::error::CoinxError;
use crate::ws::config::WsConfig;
use crate::ws::protocol::StreamProtocol;
use crate::ws::registry::{ChannelRegistration, ChannelRegistry};
use crate::ws::transport::{Connection, Connector, FrameSink, FrameStream, TungsteniteConnector};

/// Lifecycle of the multiplexer's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection; `connect()` may be called.
    Disconnected,
    /// Handshake in flight.
    Connecting,
    /// Connection open and the receive loop running.
    Connected,
}

struct Link {
    sink: Box<dyn FrameSink>,
    shutdown: oneshot::Sender<()>,
}

enum LinkState {
    Disconnected,
    Connecting,
    Connected(Link),
}

impl LinkState {
    fn public(&self) -> ConnectionState {
        match self {
            LinkState::Disconnected => ConnectionState::Disconnected,
            LinkState::Connecting => ConnectionState::Connecting,
            LinkState::Connected(_) => ConnectionState::Connected,
        }
    }
}

struct Slot {
    state: LinkState,
    /// Bumped on every connection attempt; a receive loop only tears down
    /// the connection it was started for.
    generation: u64,
}

struct Inner<P, C> {
    url: String,
    config: WsConfig,
    connector: C,
    protocol: P,
    registry: ChannelRegistry,
    slot: Mutex<Slot>,
}

/// Multiplexes independently subscribed channels over one connection.
///
/// Every inbound frame is tagged with its channel by the exchange's
/// [`StreamProtocol`] and routed to the decoder and callback registered for
/// that channel. Frames are handled one at a time on a single receive task,
/// so each channel sees its frames in arrival order.
///
/// Cloning is cheap; clones share the connection and the channel table.
///
/// # Example
///
/// ```rust,no_run
/// use coinx::ws::{Multiplexer, RawProtocol};
///
/// #[tokio::main]
/// async fn main() -> Result<(), coinx::CoinxError> {
///     let mux = Multiplexer::new("wss://example.com/ws", RawProtocol);
///     mux.connect().await?;
///
///     mux.subscribe(
///         "ticker",
///         |frame: &[u8]| Ok(serde_json::from_slice::<serde_json::Value>(frame)?),
///         |value| println!("{value}"),
///     )
///     .await?;
///     Ok(())
/// }
/// ```
pub struct Multiplexer<P, C = TungsteniteConnector> {
    inner: Arc<Inner<P, C>>,
}

impl<P, C> Clone for Multiplexer<P, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, C> std::fmt::Debug for Multiplexer<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Multiplexer")
            .field("url", &self.inner.url)
            .field("channels", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}

impl<P: StreamProtocol> Multiplexer<P> {
    /// Create a multiplexer for `url` using WebSocket transport.
    pub fn new(url: impl Into<String>, protocol: P) -> Self {
        Self::with_config(url, protocol, WsConfig::default())
    }

    /// Create a multiplexer with a custom configuration.
    pub fn with_config(url: impl Into<String>, protocol: P, config: WsConfig) -> Self {
        Self::with_connector(url, protocol, config, TungsteniteConnector)
    }
}

impl<P: StreamProtocol, C: Connector> Multiplexer<P, C> {
    /// Create a multiplexer with a custom transport.
    pub fn with_connector(
        url: impl Into<String>,
        protocol: P,
        config: WsConfig,
        connector: C,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                url: url.into(),
                config,
                connector,
                protocol,
                registry: ChannelRegistry::new(),
                slot: Mutex::new(Slot {
                    state: LinkState::Disconnected,
                    generation: 0,
                }),
            }),
        }
    }

    /// The endpoint this multiplexer connects to.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// The exchange protocol in use.
    pub fn protocol(&self) -> &P {
        &self.inner.protocol
    }

    /// The channel table.
    pub fn registry(&self) -> &ChannelRegistry {
        &self.inner.registry
    }

    /// Current connection state.
    pub async fn state(&self) -> ConnectionState {
        self.inner.slot.lock().await.state.public()
    }

    /// Whether the connection is open.
    pub async fn is_connected(&self) -> bool {
        self.state().await == ConnectionState::Connected
    }

    /// Open the connection and start the receive loop.
    ///
    /// Does nothing when already connected or connecting. A failed handshake
    /// returns the error and leaves the multiplexer disconnected, so the call
    /// can simply be repeated. If [`Multiplexer::disconnect`] runs while the
    /// handshake is in flight, the new connection is closed and
    /// [`CoinxError::ConnectionClosed`] is returned.
    pub async fn connect(&self) -> Result<(), CoinxError> {
        let generation = {
            let mut slot = self.inner.slot.lock().await;
            if !matches!(slot.state, LinkState::Disconnected) {
                debug!(url = %self.inner.url, "Already connected or connecting");
                return Ok(());
            }
            slot.generation += 1;
            slot.state = LinkState::Connecting;
            slot.generation
        };

        info!(url = %self.inner.url, generation, "Connecting");
        let dial = self.inner.connector.connect(&self.inner.url);
        let result = match self.inner.config.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, dial)
                .await
                .unwrap_or(Err(CoinxError::Timeout)),
            None => dial.await,
        };

        let mut slot = self.inner.slot.lock().await;
        let current =
            slot.generation == generation && matches!(slot.state, LinkState::Connecting);

        match result {
            Err(e) => {
                if current {
                    slot.state = LinkState::Disconnected;
                }
                warn!(url = %self.inner.url, error = %e, "Connection failed");
                Err(e)
            }
            Ok(Connection { mut sink, .. }) if !current => {
                drop(slot);
                debug!(url = %self.inner.url, "Disconnected during handshake, closing");
                if let Err(e) = sink.close().await {
                    debug!(error = %e, "Error closing abandoned connection");
                }
                Err(CoinxError::ConnectionClosed {
                    reason: "disconnected while connecting".to_string(),
                })
            }
            Ok(Connection { sink, frames }) => {
                let (shutdown, shutdown_rx) = oneshot::channel();
                slot.state = LinkState::Connected(Link { sink, shutdown });
                drop(slot);

                tokio::spawn(receive_loop(
                    Arc::downgrade(&self.inner),
                    generation,
                    frames,
                    shutdown_rx,
                ));
                info!(url = %self.inner.url, "Connected");
                Ok(())
            }
        }
    }

    /// Close the connection and stop the receive loop.
    ///
    /// Does nothing when already disconnected. Safe to call concurrently and
    /// from inside channel callbacks; the connection is closed exactly once.
    pub async fn disconnect(&self) {
        release(&self.inner, None).await;
    }

    /// Install (or replace) the pipeline for a wire channel id.
    ///
    /// Takes effect from the next inbound frame, in any connection state.
    /// No subscription request is sent.
    pub fn register_channel<T, D, F>(&self, channel: impl Into<String>, decode: D, dispatch: F)
    where
        T: 'static,
        D: Fn(&[u8]) -> Result<T, CoinxError> + Send + Sync + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let registration = ChannelRegistration::new(channel, decode, dispatch);
        debug!(channel = registration.channel(), "Registering channel");
        self.inner.registry.register(registration);
    }

    /// Drop a channel's pipeline. Frames for it are ignored afterwards.
    pub fn unregister_channel(&self, channel: &str) -> bool {
        self.inner.registry.remove(channel).is_some()
    }

    /// Subscribe to a logical channel.
    ///
    /// Derives the wire channel id through the protocol, registers the
    /// pipeline under it and sends the subscription request. Returns the
    /// channel id. Fails with [`CoinxError::NotConnected`], registering
    /// nothing, when the connection is not open.
    pub async fn subscribe<T, D, F>(
        &self,
        logical_name: &str,
        decode: D,
        dispatch: F,
    ) -> Result<String, CoinxError>
    where
        T: 'static,
        D: Fn(&[u8]) -> Result<T, CoinxError> + Send + Sync + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let channel = self.inner.protocol.channel_id(logical_name);
        let request = self.inner.protocol.subscribe_frame(&channel);

        let mut slot = self.inner.slot.lock().await;
        let LinkState::Connected(link) = &mut slot.state else {
            return Err(CoinxError::NotConnected);
        };

        self.inner
            .registry
            .register(ChannelRegistration::new(channel.clone(), decode, dispatch));
        link.sink.send(request).await?;

        info!(channel = %channel, "Subscribed");
        Ok(channel)
    }
}

impl<P: StreamProtocol, C> Inner<P, C> {
    fn handle_frame(&self, frame: &[u8]) {
        let Some(channel) = self.protocol.frame_channel(frame) else {
            trace!(len = frame.len(), "Frame without channel tag");
            return;
        };

        match catch_unwind(AssertUnwindSafe(|| self.registry.dispatch(&channel, frame))) {
            Ok(Some(Ok(()))) => {}
            Ok(Some(Err(e))) => warn!(channel = %channel, error = %e, "Skipping undecodable frame"),
            Ok(None) => trace!(channel = %channel, "No pipeline for channel"),
            Err(_) => error!(channel = %channel, "Channel callback panicked, frame dropped"),
        }
    }
}

/// Take the connection out of the slot and close it.
///
/// With `Some(generation)` only that connection is released, so a receive
/// loop that outlived its connection cannot tear down a newer one.
async fn release<P, C>(inner: &Inner<P, C>, generation: Option<u64>) -> bool {
    let link = {
        let mut slot = inner.slot.lock().await;
        if generation.is_some_and(|g| g != slot.generation) {
            return false;
        }
        match std::mem::replace(&mut slot.state, LinkState::Disconnected) {
            LinkState::Connected(link) => link,
            LinkState::Connecting => {
                debug!(url = %inner.url, "Abandoning connection attempt");
                return true;
            }
            LinkState::Disconnected => return false,
        }
    };

    let Link { mut sink, shutdown } = link;
    let _ = shutdown.send(());
    if let Err(e) = sink.close().await {
        debug!(error = %e, "Error while closing connection");
    }
    info!(url = %inner.url, "Disconnected");
    true
}

async fn receive_loop<P: StreamProtocol, C: Connector>(
    inner: Weak<Inner<P, C>>,
    generation: u64,
    mut frames: FrameStream,
    mut shutdown: oneshot::Receiver<()>,
) {
    debug!(generation, "Receive loop started");
    loop {
        let next = tokio::select! {
            biased;
            _ = &mut shutdown => {
                debug!(generation, "Receive loop stopped");
                return;
            }
            next = frames.next() => next,
        };

        // Every handle is gone; dropping `Inner` closed the connection.
        let Some(inner) = inner.upgrade() else {
            debug!(generation, "Multiplexer dropped, receive loop stopped");
            return;
        };
        match next {
            Some(Ok(frame)) => inner.handle_frame(&frame),
            Some(Err(e)) => {
                warn!(error = %e, "Read failed, disconnecting");
                break;
            }
            None => {
                info!("Connection closed by server");
                break;
            }
        }
    }
    if let Some(inner) = inner.upgrade() {
        release(&inner, Some(generation)).await;
    }
}

impl<P, C> Drop for Inner<P, C> {
    fn drop(&mut self) {
        let LinkState::Connected(link) =
            std::mem::replace(&mut self.slot.get_mut().state, LinkState::Disconnected)
        else {
            return;
        };

        let Link { mut sink, shutdown } = link;
        let _ = shutdown.send(());
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                debug!(url = %self.url, "Multiplexer dropped while connected, closing");
                runtime.spawn(async move {
                    if let Err(e) = sink.close().await {
                        debug!(error = %e, "Error while closing connection");
                    }
                });
            }
            Err(_) => warn!(url = %self.url, "Multiplexer dropped outside a runtime, connection not closed"),
        }
    }
}
