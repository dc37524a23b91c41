use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

/// The status published to Discord, replaced wholesale on every update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresencePayload {
    pub details: Option<String>,
    pub state: Option<String>,
    pub large_image_key: Option<String>,
    pub small_image_key: Option<String>,
    /// Start of the elapsed timer; there is never an end timestamp
    pub start_timestamp: Option<DateTime<Utc>>,
}

impl PresencePayload {
    /// An empty payload, which clears the published presence
    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Callbacks from a presence client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Connected,
    Disconnected {
        code: Option<i32>,
        message: Option<String>,
    },
    Error {
        code: i32,
        message: String,
    },
}

/// One connection attempt; callbacks from an earlier attempt carry an older id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Where a presence client delivers its [`ClientEvent`]s
pub type ClientEventSink = Arc<dyn Fn(ConnectionId, ClientEvent) + Send + Sync>;

/// Trait for presence services (Discord, ...)
pub trait PresenceClient: Send {
    /// Returns the name of this client (for logging)
    fn name(&self) -> &'static str;

    /// Start connecting; the outcome arrives later as a [`ClientEvent`]
    /// tagged with `connection`.
    ///
    /// Returns false if no connection attempt could be started.
    fn connect(&mut self, connection: ConnectionId) -> bool;

    fn disconnect(&mut self);

    fn set_presence(&mut self, payload: PresencePayload);

    /// Work still running after `disconnect`, awaited before the process exits
    fn take_close_task(&mut self) -> Option<JoinHandle<()>> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}
