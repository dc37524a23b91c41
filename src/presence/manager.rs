//! Runs the presence session on one task and routes every input to it

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};

use super::observers::EventForwarder;
use super::session::PresenceSession;
use super::traits::{
    ClientEvent, ClientEventSink, ConnectionId, ConnectionState, PresenceClient,
};
use crate::editor::EditorQuery;
use crate::platform::LifecycleEvent;
use crate::settings::{Mode, PreferenceStore};

/// How long shutdown waits for the client to take the presence down
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub enum SessionCommand {
    Activate,
    Deactivate,
    SetMode(Mode),
    Lifecycle(LifecycleEvent),
    Client {
        connection: ConnectionId,
        event: ClientEvent,
    },
    Status(oneshot::Sender<SessionStatus>),
    Shutdown(oneshot::Sender<()>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: ConnectionState,
    pub mode: Mode,
    pub active: bool,
}

/// Cheap to clone; every clone talks to the same session task
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    pub fn activate(&self) {
        self.send(SessionCommand::Activate);
    }

    pub fn deactivate(&self) {
        self.send(SessionCommand::Deactivate);
    }

    pub fn set_mode(&self, mode: Mode) {
        self.send(SessionCommand::SetMode(mode));
    }

    /// `None` once the session task has stopped
    pub async fn status(&self) -> Option<SessionStatus> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Status(tx));
        rx.await.ok()
    }

    /// Stop the session task and wait until the presence is taken down
    /// and the client has closed its connection
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Shutdown(tx));
        let _ = rx.await;
    }

    /// Handler for the observer registry, called from the platform thread
    pub fn lifecycle_forwarder(&self) -> EventForwarder {
        let commands = self.commands.clone();
        Arc::new(move |event| {
            let _ = commands.send(SessionCommand::Lifecycle(event));
        })
    }

    /// Callback for the presence client's connection task
    pub fn client_sink(&self) -> ClientEventSink {
        let commands = self.commands.clone();
        Arc::new(move |connection, event| {
            let _ = commands.send(SessionCommand::Client { connection, event });
        })
    }

    fn send(&self, command: SessionCommand) {
        if self.commands.send(command).is_err() {
            tracing::debug!("Presence session already stopped");
        }
    }
}

pub fn session_channel() -> (SessionHandle, mpsc::UnboundedReceiver<SessionCommand>) {
    let (commands, rx) = mpsc::unbounded_channel();
    (SessionHandle { commands }, rx)
}

/// What the session task needs besides the session itself
pub struct SessionContext {
    /// Whether Xcode is running right now, asked on every activation
    pub editor_running: Box<dyn Fn() -> bool + Send>,
    pub preferences: Box<dyn PreferenceStore>,
}

/// Drive `session` until a shutdown command arrives.
///
/// Commands and refresh ticks are handled one at a time on this task, which
/// is what keeps the session's state consistent. The shutdown is
/// acknowledged once the client's close task finished or [`CLOSE_TIMEOUT`]
/// passed.
pub async fn run_session<C, Q>(
    mut session: PresenceSession<C, Q>,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    mut context: SessionContext,
) where
    C: PresenceClient,
    Q: EditorQuery,
{
    tracing::debug!("Presence session task started");
    let mut shutdown_ack = None;

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };

                match command {
                    SessionCommand::Activate => {
                        let running = (context.editor_running)();
                        session.activate(running);
                    }
                    SessionCommand::Deactivate => session.deactivate(),
                    SessionCommand::SetMode(mode) => {
                        if let Err(e) = mode.persist(context.preferences.as_mut()) {
                            tracing::error!("Failed to save timer mode: {}", e);
                        }
                        session.set_mode(mode);
                    }
                    SessionCommand::Lifecycle(event) => session.handle_lifecycle_event(event),
                    SessionCommand::Client { connection, event } => {
                        session.handle_client_event(connection, event, Utc::now());
                    }
                    SessionCommand::Status(reply) => {
                        let _ = reply.send(SessionStatus {
                            state: session.state(),
                            mode: session.mode(),
                            active: session.is_active(),
                        });
                    }
                    SessionCommand::Shutdown(ack) => {
                        shutdown_ack = Some(ack);
                        break;
                    }
                }
            }
            _ = session.scheduler_mut().tick() => session.update_status(),
        }
    }

    session.shutdown();
    if let Some(task) = session.take_close_task() {
        match tokio::time::timeout(CLOSE_TIMEOUT, task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Presence client close task failed: {}", e),
            Err(_) => tracing::warn!("Presence client did not close within {:?}", CLOSE_TIMEOUT),
        }
    }
    tracing::info!("Presence session stopped");

    if let Some(ack) = shutdown_ack {
        let _ = ack.send(());
    }
}
