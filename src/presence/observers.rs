use std::sync::Arc;

use crate::config::PresenceConfig;
use crate::platform::{
    AppIdentity, EventCategory, LifecycleEvent, LifecycleSource, SubscriptionToken,
};
use crate::settings::Mode;

/// Receives lifecycle events that passed the registry's filter
pub type EventForwarder = Arc<dyn Fn(LifecycleEvent) + Send + Sync>;

/// Categories observed in a mode
pub fn categories_for(mode: Mode) -> Vec<EventCategory> {
    let mut categories = vec![EventCategory::ProcessLaunch, EventCategory::ProcessTerminate];
    if mode == Mode::Strict {
        categories.push(EventCategory::ProcessActivate);
        categories.push(EventCategory::ProcessDeactivate);
    }
    if mode != Mode::Flaunt {
        categories.push(EventCategory::SystemWillSleep);
        categories.push(EventCategory::SystemDidWake);
    }
    categories
}

#[derive(Debug, Clone)]
struct TrackedApp {
    bundle_id: String,
    name: String,
}

impl TrackedApp {
    /// System-wide notifications have no subject and always concern us
    fn matches(&self, subject: Option<&AppIdentity>) -> bool {
        match subject {
            None => true,
            Some(app) => match &app.bundle_id {
                Some(bundle_id) => *bundle_id == self.bundle_id,
                None => app.name == self.name,
            },
        }
    }
}

/// Owns the lifecycle subscriptions for one session
pub struct ObserverRegistry {
    source: Arc<dyn LifecycleSource>,
    tracked: TrackedApp,
    forward: EventForwarder,
    subscriptions: Vec<(EventCategory, SubscriptionToken)>,
}

impl ObserverRegistry {
    pub fn new(
        source: Arc<dyn LifecycleSource>,
        config: &PresenceConfig,
        forward: EventForwarder,
    ) -> Self {
        Self {
            source,
            tracked: TrackedApp {
                bundle_id: config.bundle_id.clone(),
                name: config.app_name.clone(),
            },
            forward,
            subscriptions: Vec::new(),
        }
    }

    /// Replace all subscriptions with the set observed in `mode`
    pub fn set_mode(&mut self, mode: Mode) {
        self.teardown();

        for category in categories_for(mode) {
            let tracked = self.tracked.clone();
            let forward = Arc::clone(&self.forward);
            let token = self.source.subscribe(
                category,
                Box::new(move |event| tracked.matches(event.subject.as_ref())),
                Box::new(move |event| forward(event)),
            );
            self.subscriptions.push((category, token));
        }

        tracing::debug!("Observing {:?} for {} mode", self.active_categories(), mode);
    }

    pub fn teardown(&mut self) {
        for (_, token) in self.subscriptions.drain(..) {
            self.source.unsubscribe(token);
        }
    }

    pub fn is_subscribed(&self, category: EventCategory) -> bool {
        self.subscriptions.iter().any(|(c, _)| *c == category)
    }

    pub fn is_observing(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    pub fn active_categories(&self) -> Vec<EventCategory> {
        self.subscriptions.iter().map(|(c, _)| *c).collect()
    }
}

impl Drop for ObserverRegistry {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::SubscriberTable;
    use chrono::Utc;
    use std::sync::Mutex;

    fn registry() -> (
        ObserverRegistry,
        Arc<SubscriberTable>,
        Arc<Mutex<Vec<LifecycleEvent>>>,
    ) {
        let table = Arc::new(SubscriberTable::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let registry = ObserverRegistry::new(
            table.clone(),
            &PresenceConfig::default(),
            Arc::new(move |event| sink.lock().unwrap().push(event)),
        );
        (registry, table, seen)
    }

    #[test]
    fn strict_mode_observes_focus_and_power() {
        let (mut registry, table, _) = registry();
        registry.set_mode(Mode::Strict);

        assert_eq!(
            table.categories(),
            vec![
                EventCategory::ProcessLaunch,
                EventCategory::ProcessTerminate,
                EventCategory::ProcessActivate,
                EventCategory::ProcessDeactivate,
                EventCategory::SystemWillSleep,
                EventCategory::SystemDidWake,
            ]
        );
    }

    #[test]
    fn flaunt_mode_observes_only_launch_and_terminate() {
        let (mut registry, table, _) = registry();
        registry.set_mode(Mode::Strict);
        registry.set_mode(Mode::Flaunt);

        assert_eq!(
            table.categories(),
            vec![EventCategory::ProcessLaunch, EventCategory::ProcessTerminate]
        );
        assert!(!registry.is_subscribed(EventCategory::ProcessDeactivate));
        assert!(!registry.is_subscribed(EventCategory::SystemWillSleep));
    }

    #[test]
    fn only_the_tracked_editor_is_forwarded() {
        let (mut registry, table, seen) = registry();
        registry.set_mode(Mode::Strict);
        let now = Utc::now();

        let xcode = AppIdentity {
            name: "Xcode".to_string(),
            bundle_id: Some("com.apple.dt.Xcode".to_string()),
        };
        let impostor = AppIdentity {
            name: "Xcode".to_string(),
            bundle_id: Some("com.example.Xcode".to_string()),
        };

        table.dispatch(&LifecycleEvent::new(
            EventCategory::ProcessActivate,
            Some(xcode),
            now,
        ));
        table.dispatch(&LifecycleEvent::new(
            EventCategory::ProcessActivate,
            Some(impostor),
            now,
        ));
        table.dispatch(&LifecycleEvent::new(
            EventCategory::ProcessLaunch,
            Some(AppIdentity::named("Safari")),
            now,
        ));
        table.dispatch(&LifecycleEvent::new(
            EventCategory::ProcessLaunch,
            Some(AppIdentity::named("Xcode")),
            now,
        ));
        table.dispatch(&LifecycleEvent::new(
            EventCategory::SystemDidWake,
            None,
            now,
        ));

        let categories: Vec<_> = seen.lock().unwrap().iter().map(|e| e.category).collect();
        assert_eq!(
            categories,
            vec![
                EventCategory::ProcessActivate,
                EventCategory::ProcessLaunch,
                EventCategory::SystemDidWake,
            ]
        );
    }

    #[test]
    fn teardown_is_idempotent_and_runs_on_drop() {
        let (mut registry, table, _) = registry();
        registry.set_mode(Mode::Strict);
        registry.teardown();
        registry.teardown();
        assert!(table.is_empty());
        assert!(!registry.is_observing());

        registry.set_mode(Mode::Flaunt);
        assert_eq!(table.len(), 2);
        drop(registry);
        assert!(table.is_empty());
    }
}
