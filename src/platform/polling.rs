//! Lifecycle notifications derived from periodic sampling of the system

use std::ffi::OsStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use sysinfo::{ProcessesToUpdate, System};

use super::{
    osascript, AppIdentity, EventCategory, EventFilter, EventHandler, LifecycleEvent,
    LifecycleSource, SubscriberTable, SubscriptionToken,
};

const SAMPLE_PERIOD: Duration = Duration::from_secs(1);

/// Wall clock running this many sample periods ahead of the monotonic clock
/// means the machine was asleep in between
const SLEEP_GAP_FACTOR: u32 = 3;

/// Categories that need the frontmost application
const FOCUS_CATEGORIES: [EventCategory; 2] =
    [EventCategory::ProcessActivate, EventCategory::ProcessDeactivate];

const FRONT_APP_SCRIPT: &str = r#"tell application "System Events"
    set frontApp to first application process whose frontmost is true
    return (name of frontApp) & linefeed & (bundle identifier of frontApp)
end tell"#;

/// Check whether a process with this exact name is running
pub fn is_process_running(name: &str) -> bool {
    let mut system = System::new();
    process_running(&mut system, name)
}

fn process_running(system: &mut System, name: &str) -> bool {
    system.refresh_processes(ProcessesToUpdate::All, true);
    let name = OsStr::new(name);
    system.processes().values().any(|process| process.name() == name)
}

fn front_application() -> Option<AppIdentity> {
    osascript::run(FRONT_APP_SCRIPT).and_then(|text| parse_front_app(&text))
}

fn parse_front_app(text: &str) -> Option<AppIdentity> {
    let mut lines = text.lines();
    let name = lines.next()?.trim();
    if name.is_empty() {
        return None;
    }

    let bundle_id = lines
        .next()
        .map(str::trim)
        .filter(|id| !id.is_empty() && *id != "missing value")
        .map(|id| id.to_string());

    Some(AppIdentity {
        name: name.to_string(),
        bundle_id,
    })
}

fn slept_between(
    previous_wall: DateTime<Utc>,
    previous_mono: Instant,
    now_wall: DateTime<Utc>,
    now_mono: Instant,
) -> bool {
    let wall = (now_wall - previous_wall).to_std().unwrap_or_default();
    let mono = now_mono.saturating_duration_since(previous_mono);
    wall.saturating_sub(mono) > SAMPLE_PERIOD * SLEEP_GAP_FACTOR
}

fn process_event(
    was_running: bool,
    is_running: bool,
    tracked: &AppIdentity,
    at: DateTime<Utc>,
) -> Option<LifecycleEvent> {
    let category = match (was_running, is_running) {
        (false, true) => EventCategory::ProcessLaunch,
        (true, false) => EventCategory::ProcessTerminate,
        _ => return None,
    };
    Some(LifecycleEvent::new(category, Some(tracked.clone()), at))
}

fn focus_events(
    previous: Option<&AppIdentity>,
    current: Option<&AppIdentity>,
    at: DateTime<Utc>,
) -> Vec<LifecycleEvent> {
    if previous == current {
        return Vec::new();
    }

    let mut events = Vec::with_capacity(2);
    if let Some(previous) = previous {
        events.push(LifecycleEvent::new(
            EventCategory::ProcessDeactivate,
            Some(previous.clone()),
            at,
        ));
    }
    if let Some(current) = current {
        events.push(LifecycleEvent::new(
            EventCategory::ProcessActivate,
            Some(current.clone()),
            at,
        ));
    }
    events
}

/// Track the frontmost application and report changes.
///
/// `observed` is `None` when focus is not watched or the query failed. While
/// unwatched the last known app is forgotten, and the first app seen after
/// that is only recorded, since no change was observed.
fn track_focus(
    last: &mut Option<AppIdentity>,
    watched: bool,
    observed: Option<AppIdentity>,
    at: DateTime<Utc>,
) -> Vec<LifecycleEvent> {
    if !watched {
        *last = None;
        return Vec::new();
    }

    // A failed query keeps the last known front application
    let Some(front) = observed else {
        return Vec::new();
    };

    let events = match last.as_ref() {
        Some(previous) => focus_events(Some(previous), Some(&front), at),
        None => Vec::new(),
    };
    *last = Some(front);
    events
}

struct Sampler {
    tracked: AppIdentity,
    system: System,
    tracked_running: bool,
    front: Option<AppIdentity>,
    last_wall: DateTime<Utc>,
    last_mono: Instant,
}

impl Sampler {
    fn new(tracked: AppIdentity) -> Self {
        let mut system = System::new();
        let tracked_running = process_running(&mut system, &tracked.name);
        Self {
            tracked,
            system,
            tracked_running,
            front: None,
            last_wall: Utc::now(),
            last_mono: Instant::now(),
        }
    }

    fn sample(&mut self, watch_focus: bool) -> Vec<LifecycleEvent> {
        let now_wall = Utc::now();
        let now_mono = Instant::now();
        let mut events = Vec::new();

        if slept_between(self.last_wall, self.last_mono, now_wall, now_mono) {
            tracing::debug!("System slept since {}", self.last_wall);
            events.push(LifecycleEvent::new(
                EventCategory::SystemWillSleep,
                None,
                self.last_wall,
            ));
            events.push(LifecycleEvent::new(
                EventCategory::SystemDidWake,
                None,
                now_wall,
            ));
        }

        let running = process_running(&mut self.system, &self.tracked.name);
        events.extend(process_event(
            self.tracked_running,
            running,
            &self.tracked,
            now_wall,
        ));
        self.tracked_running = running;

        let observed = if watch_focus {
            front_application()
        } else {
            None
        };
        events.extend(track_focus(&mut self.front, watch_focus, observed, now_wall));

        self.last_wall = now_wall;
        self.last_mono = now_mono;
        events
    }
}

/// Samples process list, frontmost application and clocks once per second
/// on a background thread
pub struct PollingLifecycleSource {
    subscribers: Arc<SubscriberTable>,
    running: Arc<AtomicBool>,
}

impl PollingLifecycleSource {
    pub fn start(tracked: AppIdentity) -> Self {
        let subscribers = Arc::new(SubscriberTable::new());
        let running = Arc::new(AtomicBool::new(true));

        let table = Arc::clone(&subscribers);
        let running_clone = Arc::clone(&running);
        thread::spawn(move || {
            Self::run_sampler(tracked, table, running_clone);
        });

        Self {
            subscribers,
            running,
        }
    }

    fn run_sampler(tracked: AppIdentity, table: Arc<SubscriberTable>, running: Arc<AtomicBool>) {
        tracing::debug!("Lifecycle sampler started for {}", tracked.name);
        let mut sampler = Sampler::new(tracked);

        while running.load(Ordering::SeqCst) {
            thread::sleep(SAMPLE_PERIOD);
            if !running.load(Ordering::SeqCst) {
                break;
            }

            let watch_focus = table.is_watching(&FOCUS_CATEGORIES);
            for event in sampler.sample(watch_focus) {
                let delivered = table.dispatch(&event);
                tracing::trace!("{:?} delivered to {} subscriber(s)", event.category, delivered);
            }
        }

        tracing::debug!("Lifecycle sampler stopped");
    }
}

impl LifecycleSource for PollingLifecycleSource {
    fn subscribe(
        &self,
        category: EventCategory,
        filter: EventFilter,
        handler: EventHandler,
    ) -> SubscriptionToken {
        self.subscribers.subscribe(category, filter, handler)
    }

    fn unsubscribe(&self, token: SubscriptionToken) {
        self.subscribers.unsubscribe(token);
    }
}

impl Drop for PollingLifecycleSource {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_front_app_with_bundle_id() {
        let app = parse_front_app("Xcode\ncom.apple.dt.Xcode").unwrap();
        assert_eq!(app.name, "Xcode");
        assert_eq!(app.bundle_id.as_deref(), Some("com.apple.dt.Xcode"));

        let app = parse_front_app("Simulator\nmissing value").unwrap();
        assert_eq!(app.bundle_id, None);

        assert_eq!(parse_front_app(""), None);
    }

    #[test]
    fn wall_clock_jump_means_sleep() {
        let wall = Utc::now();
        let mono = Instant::now();

        let awake_wall = wall + chrono::Duration::seconds(1);
        let awake_mono = mono + Duration::from_secs(1);
        assert!(!slept_between(wall, mono, awake_wall, awake_mono));

        let woke_wall = wall + chrono::Duration::minutes(30);
        assert!(slept_between(wall, mono, woke_wall, awake_mono));

        // The wall clock being set backwards is not a sleep
        let rewound = wall - chrono::Duration::minutes(5);
        assert!(!slept_between(wall, mono, rewound, awake_mono));
    }

    #[test]
    fn process_transitions_emit_launch_and_terminate() {
        let xcode = AppIdentity::named("Xcode");
        let now = Utc::now();

        let launch = process_event(false, true, &xcode, now).unwrap();
        assert_eq!(launch.category, EventCategory::ProcessLaunch);
        assert_eq!(launch.subject, Some(xcode.clone()));

        let quit = process_event(true, false, &xcode, now).unwrap();
        assert_eq!(quit.category, EventCategory::ProcessTerminate);

        assert!(process_event(true, true, &xcode, now).is_none());
        assert!(process_event(false, false, &xcode, now).is_none());
    }

    #[test]
    fn focus_change_deactivates_then_activates() {
        let xcode = AppIdentity::named("Xcode");
        let safari = AppIdentity::named("Safari");
        let now = Utc::now();

        let events = focus_events(Some(&xcode), Some(&safari), now);
        let categories: Vec<_> = events.iter().map(|e| e.category).collect();
        assert_eq!(
            categories,
            vec![EventCategory::ProcessDeactivate, EventCategory::ProcessActivate]
        );
        assert_eq!(events[0].subject, Some(xcode.clone()));
        assert_eq!(events[1].subject, Some(safari));

        assert!(focus_events(Some(&xcode), Some(&xcode), now).is_empty());
        assert_eq!(focus_events(None, Some(&xcode), now).len(), 1);
    }

    #[test]
    fn focus_is_only_tracked_while_watched() {
        let xcode = AppIdentity::named("Xcode");
        let safari = AppIdentity::named("Safari");
        let now = Utc::now();
        let mut last = Some(xcode.clone());

        assert!(track_focus(&mut last, false, None, now).is_empty());
        assert_eq!(last, None);

        // First sample after watching starts only records the app
        assert!(track_focus(&mut last, true, Some(safari.clone()), now).is_empty());
        assert_eq!(last, Some(safari.clone()));

        // Failed query
        assert!(track_focus(&mut last, true, None, now).is_empty());
        assert_eq!(last, Some(safari.clone()));

        let events = track_focus(&mut last, true, Some(xcode.clone()), now);
        let categories: Vec<_> = events.iter().map(|e| e.category).collect();
        assert_eq!(
            categories,
            vec![EventCategory::ProcessDeactivate, EventCategory::ProcessActivate]
        );
        assert_eq!(last, Some(xcode));
    }
}
