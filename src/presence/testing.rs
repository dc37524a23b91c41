//! Test doubles shared by the session tests

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::traits::{ConnectionId, PresenceClient, PresencePayload};
use crate::editor::{EditorContext, EditorQuery};
use crate::error::XcordError;
use crate::settings::PreferenceStore;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Connect,
    Disconnect,
    SetPresence(PresencePayload),
    /// The close task finished
    Closed,
}

#[derive(Clone)]
pub(crate) struct RecordingClient {
    calls: Arc<Mutex<Vec<Call>>>,
    accept_connect: Arc<AtomicBool>,
    connections: Arc<Mutex<Vec<ConnectionId>>>,
    close_delay: Option<Duration>,
    close_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl RecordingClient {
    pub(crate) fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            accept_connect: Arc::new(AtomicBool::new(true)),
            connections: Arc::new(Mutex::new(Vec::new())),
            close_delay: None,
            close_task: Arc::new(Mutex::new(None)),
        }
    }

    /// Disconnecting leaves a task that records [`Call::Closed`] after `delay`
    pub(crate) fn with_close_delay(delay: Duration) -> Self {
        Self {
            close_delay: Some(delay),
            ..Self::new()
        }
    }

    pub(crate) fn last_connection(&self) -> Option<ConnectionId> {
        self.connections.lock().unwrap().last().copied()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn published(&self) -> Vec<PresencePayload> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SetPresence(payload) => Some(payload),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn refuse_connect(&self) {
        self.accept_connect.store(false, Ordering::SeqCst);
    }

    pub(crate) fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl PresenceClient for RecordingClient {
    fn name(&self) -> &'static str {
        "Recording"
    }

    fn connect(&mut self, connection: ConnectionId) -> bool {
        self.calls.lock().unwrap().push(Call::Connect);
        self.connections.lock().unwrap().push(connection);
        self.accept_connect.load(Ordering::SeqCst)
    }

    fn disconnect(&mut self) {
        self.calls.lock().unwrap().push(Call::Disconnect);

        if let Some(delay) = self.close_delay {
            let calls = Arc::clone(&self.calls);
            let task = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                calls.lock().unwrap().push(Call::Closed);
            });
            *self.close_task.lock().unwrap() = Some(task);
        }
    }

    fn set_presence(&mut self, payload: PresencePayload) {
        self.calls.lock().unwrap().push(Call::SetPresence(payload));
    }

    fn take_close_task(&mut self) -> Option<JoinHandle<()>> {
        self.close_task.lock().unwrap().take()
    }
}

#[derive(Clone, Default)]
pub(crate) struct FixedEditor {
    context: Arc<Mutex<EditorContext>>,
}

impl FixedEditor {
    pub(crate) fn set(&self, front: &str, file: Option<&str>, workspace: Option<&str>) {
        *self.context.lock().unwrap() = EditorContext {
            front_application: Some(front.to_string()),
            active_file: file.map(String::from),
            active_workspace: workspace.map(String::from),
        };
    }
}

impl EditorQuery for FixedEditor {
    fn front_application(&self) -> Option<String> {
        self.context.lock().unwrap().front_application.clone()
    }

    fn active_file(&self) -> Option<String> {
        self.context.lock().unwrap().active_file.clone()
    }

    fn active_workspace(&self) -> Option<String> {
        self.context.lock().unwrap().active_workspace.clone()
    }
}

/// Shared so a test can inspect what the session task wrote
#[derive(Clone, Default)]
pub(crate) struct MemoryPreferences {
    values: Arc<Mutex<BTreeMap<String, bool>>>,
}

impl PreferenceStore for MemoryPreferences {
    fn get_bool(&self, key: &str) -> bool {
        self.values.lock().unwrap().get(key).copied().unwrap_or(false)
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), XcordError> {
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}
