//! Channel table: channel id → decode/dispatch pipeline.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::CoinxError;

type Handler = dyn Fn(&[u8]) -> Result<(), CoinxError> + Send + Sync;

/// A channel's decoder and callback, erased over the decoded type.
pub struct ChannelRegistration {
    channel: String,
    handler: Box<Handler>,
}

impl ChannelRegistration {
    /// Pair a decoder with the callback that receives its output.
    pub fn new<T, D, F>(channel: impl Into<String>, decode: D, dispatch: F) -> Self
    where
        T: 'static,
        D: Fn(&[u8]) -> Result<T, CoinxError> + Send + Sync + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            channel: channel.into(),
            handler: Box::new(move |frame: &[u8]| {
                dispatch(decode(frame)?);
                Ok(())
            }),
        }
    }

    /// The channel id this registration serves.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Decode `frame` and, on success, hand the value to the callback.
    /// The callback is not invoked when decoding fails.
    pub fn handle(&self, frame: &[u8]) -> Result<(), CoinxError> {
        (self.handler)(frame)
    }
}

impl std::fmt::Debug for ChannelRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistration")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

/// Registered channels, keyed by channel id. Last registration wins.
///
/// Lookups hand out an `Arc` and release the lock before any callback runs,
/// so callbacks are free to register further channels.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: RwLock<HashMap<String, Arc<ChannelRegistration>>>,
}

impl ChannelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace a registration, returning the one it replaced.
    pub fn register(&self, registration: ChannelRegistration) -> Option<Arc<ChannelRegistration>> {
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        channels.insert(registration.channel.clone(), Arc::new(registration))
    }

    /// Remove a channel's registration.
    pub fn remove(&self, channel: &str) -> Option<Arc<ChannelRegistration>> {
        self.channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(channel)
    }

    /// Current registration for a channel.
    pub fn get(&self, channel: &str) -> Option<Arc<ChannelRegistration>> {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel)
            .cloned()
    }

    /// Whether a channel is registered.
    pub fn contains(&self, channel: &str) -> bool {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(channel)
    }

    /// Registered channel ids, in no particular order.
    pub fn channels(&self) -> Vec<String> {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no channel is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Route a frame to its channel's pipeline.
    ///
    /// Returns `None` when nothing is registered for `channel`.
    pub fn dispatch(&self, channel: &str, frame: &[u8]) -> Option<Result<(), CoinxError>> {
        let registration = self.get(channel)?;
        Some(registration.handle(frame))
    }
}
