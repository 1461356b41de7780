//! Per-exchange streaming conventions.

use serde::{Deserialize, Serialize};

/// Control frame asking the server to start a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFrame {
    pub event: String,
    pub channel: String,
}

impl ControlFrame {
    /// `{"event":"addChannel","channel":<channel>}`
    pub fn add_channel(channel: impl Into<String>) -> Self {
        Self {
            event: "addChannel".to_string(),
            channel: channel.into(),
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    channel: Option<String>,
}

/// How an exchange names channels and tags frames.
///
/// Only [`StreamProtocol::channel_id`] is exchange-specific for the feeds
/// supported here; the defaults speak the `addChannel` / top-level
/// `"channel"` dialect.
pub trait StreamProtocol: Send + Sync + 'static {
    /// Wire channel id for a logical subscription name.
    fn channel_id(&self, logical_name: &str) -> String;

    /// Serialized subscription request for `channel`.
    fn subscribe_frame(&self, channel: &str) -> String {
        serde_json::to_string(&ControlFrame::add_channel(channel))
            .unwrap_or_else(|_| format!(r#"{{"event":"addChannel","channel":"{channel}"}}"#))
    }

    /// Channel tag of an inbound frame, if it has one.
    fn frame_channel(&self, frame: &[u8]) -> Option<String> {
        serde_json::from_slice::<Envelope>(frame).ok()?.channel
    }
}

/// Protocol that uses logical names as channel ids unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawProtocol;

impl StreamProtocol for RawProtocol {
    fn channel_id(&self, logical_name: &str) -> String {
        logical_name.to_string()
    }
}
