//! Discord Rich Presence integration using discord-sdk

use std::time::{Duration, SystemTime};

use discord_sdk::{
    activity::{ActivityBuilder, Assets},
    wheel::{UserState, Wheel},
    Discord, Subscriptions,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::presence::{
    ClientEvent, ClientEventSink, ConnectionId, PresenceClient, PresencePayload,
};

/// Timeout for waiting for Discord handshake
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// `ClientEvent::Error` codes
pub const ERROR_UNAVAILABLE: i32 = 1;
pub const ERROR_HANDSHAKE_TIMEOUT: i32 = 2;
pub const ERROR_CONNECTION_CLOSED: i32 = 3;

#[derive(Debug)]
enum Request {
    Update(PresencePayload),
    Disconnect,
}

/// Presence client backed by the local Discord app.
///
/// Each `connect` spawns a task that owns the Discord connection; payloads
/// and the disconnect request are passed to it over a channel. The task
/// handle outlives `disconnect` so shutdown can wait for the activity to be
/// cleared.
pub struct DiscordClient {
    app_id: i64,
    events: ClientEventSink,
    link: Option<mpsc::UnboundedSender<Request>>,
    task: Option<JoinHandle<()>>,
}

impl DiscordClient {
    pub fn new(app_id: i64, events: ClientEventSink) -> Self {
        Self {
            app_id,
            events,
            link: None,
            task: None,
        }
    }

    fn is_live(&self) -> bool {
        self.link.as_ref().is_some_and(|link| !link.is_closed())
    }
}

impl PresenceClient for DiscordClient {
    fn name(&self) -> &'static str {
        "Discord"
    }

    fn connect(&mut self, connection: ConnectionId) -> bool {
        if self.is_live() {
            tracing::debug!("Discord connection task already running");
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!("Cannot start Discord connection: {}", e);
                return false;
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let events = self.events.clone();
        let report: Reporter = Box::new(move |event| events(connection, event));
        self.task = Some(runtime.spawn(run_discord_task(self.app_id, rx, report)));
        self.link = Some(tx);
        true
    }

    fn disconnect(&mut self) {
        if let Some(link) = self.link.take() {
            let _ = link.send(Request::Disconnect);
        }
    }

    fn set_presence(&mut self, payload: PresencePayload) {
        match &self.link {
            Some(link) => {
                let _ = link.send(Request::Update(payload));
            }
            None => tracing::debug!("Dropping presence update, Discord is not connected"),
        }
    }

    fn take_close_task(&mut self) -> Option<JoinHandle<()>> {
        self.task.take()
    }
}

/// Delivers events of one connection attempt
type Reporter = Box<dyn Fn(ClientEvent) + Send + Sync>;

/// Background task that maintains the Discord connection and processes presence updates
async fn run_discord_task(
    app_id: i64,
    mut requests: mpsc::UnboundedReceiver<Request>,
    events: Reporter,
) {
    let (wheel, handler) = Wheel::new(Box::new(|err| {
        tracing::warn!("Discord error: {:?}", err);
    }));

    let mut user_spoke = wheel.user();

    let discord = match Discord::new(app_id, Subscriptions::ACTIVITY, Box::new(handler)) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!("Discord not available: {:?}", e);
            events(ClientEvent::Error {
                code: ERROR_UNAVAILABLE,
                message: format!("Discord not available: {:?}", e),
            });
            return;
        }
    };

    tracing::info!("Discord connecting...");

    let handshake = tokio::time::sleep(HANDSHAKE_TIMEOUT);
    tokio::pin!(handshake);
    let mut handshake_done = false;

    loop {
        tokio::select! {
            changed = user_spoke.0.changed() => {
                if changed.is_err() {
                    events(ClientEvent::Error {
                        code: ERROR_CONNECTION_CLOSED,
                        message: "Discord connection closed".to_string(),
                    });
                    break;
                }

                let event = match &*user_spoke.0.borrow() {
                    UserState::Connected(user) => {
                        tracing::info!(
                            "Discord Rich Presence connected as {}#{}",
                            user.username,
                            user.discriminator.unwrap_or(0)
                        );
                        handshake_done = true;
                        ClientEvent::Connected
                    }
                    UserState::Disconnected(err) => ClientEvent::Disconnected {
                        code: None,
                        message: Some(format!("{:?}", err)),
                    },
                };
                events(event);
            }
            _ = &mut handshake, if !handshake_done => {
                tracing::warn!("Discord handshake timed out");
                events(ClientEvent::Error {
                    code: ERROR_HANDSHAKE_TIMEOUT,
                    message: "Discord handshake timed out".to_string(),
                });
                break;
            }
            request = requests.recv() => match request {
                Some(Request::Update(payload)) => {
                    let result = if payload.is_empty() {
                        discord.clear_activity().await.map(|_| ())
                    } else {
                        discord.update_activity(build_activity(&payload)).await.map(|_| ())
                    };

                    if let Err(e) = result {
                        tracing::debug!("Failed to update Discord activity: {:?}", e);
                    }
                }
                Some(Request::Disconnect) | None => {
                    if let Err(e) = discord.clear_activity().await {
                        tracing::debug!("Failed to clear Discord activity: {:?}", e);
                    }
                    break;
                }
            },
        }
    }

    discord.disconnect().await;
    tracing::info!("Discord Rich Presence disconnected");
}

fn build_activity(payload: &PresencePayload) -> ActivityBuilder {
    let mut activity = ActivityBuilder::new();
    if let Some(details) = &payload.details {
        activity = activity.details(details);
    }
    if let Some(state) = &payload.state {
        activity = activity.state(state);
    }

    let mut assets = Assets::default();
    if let Some(key) = &payload.large_image_key {
        assets = assets.large(key, None::<&str>);
    }
    if let Some(key) = &payload.small_image_key {
        assets = assets.small(key, None::<&str>);
    }
    activity = activity.assets(assets);

    if let Some(start) = payload.start_timestamp {
        activity = activity.start_timestamp(SystemTime::from(start));
    }
    activity
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn client() -> DiscordClient {
        DiscordClient::new(759699771689795615, Arc::new(|_, _| {}))
    }

    #[test]
    fn connect_needs_a_runtime() {
        let mut client = client();
        assert!(!client.connect(ConnectionId::default().next()));
        assert!(!client.is_live());
        assert!(client.take_close_task().is_none());
    }

    #[test]
    fn updates_without_connection_are_dropped() {
        let mut client = client();
        client.set_presence(PresencePayload::cleared());
        client.disconnect();
        assert!(!client.is_live());
    }

    #[tokio::test]
    async fn only_one_connection_task_at_a_time() {
        let mut client = client();
        let connection = ConnectionId::default().next();
        assert!(client.connect(connection));
        assert!(!client.connect(connection.next()));

        client.disconnect();
        assert!(!client.is_live());

        // Kept for shutdown to wait on
        assert!(client.take_close_task().is_some());
        assert!(client.take_close_task().is_none());
    }
}
