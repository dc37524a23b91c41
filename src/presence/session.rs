//! Connection state machine tying lifecycle events, timer ticks and client
//! callbacks to presence updates

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use super::builder::PresenceBuilder;
use super::clock::ActivityClock;
use super::observers::ObserverRegistry;
use super::scheduler::PollingScheduler;
use super::traits::{
    ClientEvent, ConnectionId, ConnectionState, PresenceClient, PresencePayload,
};
use crate::config::PresenceConfig;
use crate::editor::EditorQuery;
use crate::platform::{EventCategory, LifecycleEvent};
use crate::settings::Mode;

/// One presence session per process.
///
/// Not thread-safe by itself; the owner must serialize every call, see
/// [`super::manager::run_session`].
pub struct PresenceSession<C: PresenceClient, Q: EditorQuery> {
    config: PresenceConfig,
    client: C,
    editor: Q,
    observers: ObserverRegistry,
    scheduler: PollingScheduler,
    clock: ActivityClock,
    mode: Mode,
    state: ConnectionState,
    connection: ConnectionId,
    active: bool,
    last_workspace: Option<String>,
}

impl<C: PresenceClient, Q: EditorQuery> PresenceSession<C, Q> {
    pub fn new(
        config: PresenceConfig,
        client: C,
        editor: Q,
        observers: ObserverRegistry,
        mode: Mode,
    ) -> Self {
        Self {
            config,
            client,
            editor,
            observers,
            scheduler: PollingScheduler::new(),
            clock: ActivityClock::new(Utc::now()),
            mode,
            state: ConnectionState::Disconnected,
            connection: ConnectionId::default(),
            active: false,
            last_workspace: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The latest connection attempt
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn clock(&self) -> &ActivityClock {
        &self.clock
    }

    pub fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }

    pub fn scheduler(&self) -> &PollingScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut PollingScheduler {
        &mut self.scheduler
    }

    /// Start observing Xcode, connecting right away if it is already running
    pub fn activate(&mut self, editor_running: bool) {
        if self.active {
            tracing::info!("XCord is already running");
            return;
        }

        tracing::info!("Activating presence session in {} mode", self.mode);
        self.active = true;
        self.observers.set_mode(self.mode);

        if editor_running {
            tracing::info!("{} running, connecting...", self.config.app_name);
            self.request_connect();
        }
    }

    /// Stop observing and take the presence down
    pub fn deactivate(&mut self) {
        if !self.active {
            tracing::info!("XCord is not running");
            return;
        }

        tracing::info!("Deactivating presence session");
        self.shutdown();
    }

    /// Tear everything down; safe to call any number of times
    pub fn shutdown(&mut self) {
        self.active = false;
        self.observers.teardown();
        self.close(true);
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }

        tracing::info!("Timer mode set to {}: {}", mode, mode.message());
        self.mode = mode;
        if self.active {
            self.observers.set_mode(mode);
        }
    }

    pub fn handle_client_event(
        &mut self,
        connection: ConnectionId,
        event: ClientEvent,
        now: DateTime<Utc>,
    ) {
        if connection != self.connection {
            tracing::debug!(
                "Ignoring {:?} from an earlier {} connection",
                event,
                self.client.name()
            );
            return;
        }

        match event {
            ClientEvent::Connected => {
                if self.state != ConnectionState::Connecting {
                    tracing::debug!(
                        "Ignoring connect from {} while {:?}",
                        self.client.name(),
                        self.state
                    );
                    return;
                }

                tracing::info!("{} connected", self.client.name());
                self.state = ConnectionState::Connected;
                self.clock.start(now);
                self.scheduler.arm(self.config.refresh_interval);
            }
            ClientEvent::Disconnected { code, message } => {
                tracing::info!(
                    "{} disconnected (code: {:?}, message: {})",
                    self.client.name(),
                    code,
                    message.as_deref().unwrap_or("none")
                );
                self.close(true);
            }
            ClientEvent::Error { code, message } => {
                tracing::warn!("{} error {}: {}", self.client.name(), code, message);
                self.close(false);
            }
        }
    }

    pub fn handle_lifecycle_event(&mut self, event: LifecycleEvent) {
        // Queued before a mode change removed the subscription
        if !self.observers.is_subscribed(event.category) {
            tracing::debug!("Dropping unobserved {:?} event", event.category);
            return;
        }

        match event.category {
            EventCategory::ProcessLaunch => {
                tracing::info!("{} launched, connecting...", self.config.app_name);
                self.request_connect();
            }
            EventCategory::ProcessTerminate => {
                tracing::info!("{} closed, disconnecting...", self.config.app_name);
                self.close(true);
            }
            EventCategory::ProcessActivate | EventCategory::SystemDidWake => {
                self.clock.resume(event.at);
                self.update_status();
            }
            EventCategory::ProcessDeactivate | EventCategory::SystemWillSleep => {
                self.clock.mark_inactive(event.at);
                self.update_status();
            }
        }
    }

    /// Query Xcode and publish the resulting presence
    pub fn update_status(&mut self) {
        if self.state != ConnectionState::Connected {
            return;
        }

        let context = self.editor.snapshot();
        tracing::debug!(
            "Application Name: {}, File Name: {}, Workspace: {}",
            context.front_application.as_deref().unwrap_or(""),
            context.active_file.as_deref().unwrap_or(""),
            context.active_workspace.as_deref().unwrap_or("")
        );

        let (presence, last_workspace) = PresenceBuilder::new(&self.config).build(
            &context,
            self.last_workspace.as_deref(),
            self.clock.elapsed_start(),
        );
        self.last_workspace = last_workspace;
        self.client.set_presence(presence);
        tracing::debug!("Updated presence");
    }

    /// Close work the client left running, see [`PresenceClient::take_close_task`]
    pub fn take_close_task(&mut self) -> Option<JoinHandle<()>> {
        self.client.take_close_task()
    }

    fn request_connect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            return;
        }

        self.state = ConnectionState::Connecting;
        self.connection = self.connection.next();
        if !self.client.connect(self.connection) {
            tracing::warn!("Failed to start connecting to {}", self.client.name());
            self.state = ConnectionState::Disconnected;
        }
    }

    fn close(&mut self, clear_presence: bool) {
        self.scheduler.disarm();
        if self.state == ConnectionState::Disconnected {
            return;
        }

        self.state = ConnectionState::Disconnected;
        if clear_presence {
            self.client.set_presence(PresencePayload::cleared());
        }
        self.client.disconnect();
    }
}

impl<C: PresenceClient, Q: EditorQuery> Drop for PresenceSession<C, Q> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
