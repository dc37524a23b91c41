//! OS lifecycle notifications: process launch/terminate, focus changes and
//! system sleep/wake.

pub mod osascript;
mod polling;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

pub use polling::{is_process_running, PollingLifecycleSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventCategory {
    ProcessLaunch,
    ProcessTerminate,
    ProcessActivate,
    ProcessDeactivate,
    SystemWillSleep,
    SystemDidWake,
}

/// The application a notification is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentity {
    pub name: String,
    pub bundle_id: Option<String>,
}

impl AppIdentity {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bundle_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleEvent {
    pub category: EventCategory,
    /// `None` for system-wide notifications such as sleep and wake
    pub subject: Option<AppIdentity>,
    /// When the source observed the change
    pub at: DateTime<Utc>,
}

impl LifecycleEvent {
    pub fn new(category: EventCategory, subject: Option<AppIdentity>, at: DateTime<Utc>) -> Self {
        Self {
            category,
            subject,
            at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

pub type EventFilter = Box<dyn Fn(&LifecycleEvent) -> bool + Send + Sync>;
pub type EventHandler = Box<dyn Fn(LifecycleEvent) + Send + Sync>;

/// Source of OS lifecycle notifications
pub trait LifecycleSource: Send + Sync {
    fn subscribe(
        &self,
        category: EventCategory,
        filter: EventFilter,
        handler: EventHandler,
    ) -> SubscriptionToken;

    fn unsubscribe(&self, token: SubscriptionToken);
}

struct Subscriber {
    token: SubscriptionToken,
    category: EventCategory,
    filter: EventFilter,
    handler: EventHandler,
}

/// Subscriber bookkeeping shared by lifecycle sources.
///
/// Handlers run on the dispatching thread while the table is locked, so they
/// must not subscribe or unsubscribe.
#[derive(Default)]
pub struct SubscriberTable {
    next_token: AtomicU64,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl SubscriberTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Deliver an event to every matching subscriber, returns how many accepted it
    pub fn dispatch(&self, event: &LifecycleEvent) -> usize {
        let subscribers = self.lock();
        let mut delivered = 0;
        for subscriber in subscribers.iter() {
            if subscriber.category == event.category && (subscriber.filter)(event) {
                (subscriber.handler)(event.clone());
                delivered += 1;
            }
        }
        delivered
    }

    pub fn categories(&self) -> Vec<EventCategory> {
        let mut categories: Vec<_> = self.lock().iter().map(|s| s.category).collect();
        categories.sort();
        categories
    }

    /// Whether anyone listens for at least one of `categories`
    pub fn is_watching(&self, categories: &[EventCategory]) -> bool {
        self.lock().iter().any(|s| categories.contains(&s.category))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LifecycleSource for SubscriberTable {
    fn subscribe(
        &self,
        category: EventCategory,
        filter: EventFilter,
        handler: EventHandler,
    ) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.lock().push(Subscriber {
            token,
            category,
            filter,
            handler,
        });
        token
    }

    fn unsubscribe(&self, token: SubscriptionToken) {
        self.lock().retain(|s| s.token != token);
    }
}
