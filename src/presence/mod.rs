mod builder;
mod clock;
mod manager;
mod observers;
mod scheduler;
mod session;
#[cfg(test)]
pub(crate) mod testing;
mod traits;

pub use builder::PresenceBuilder;
pub use clock::ActivityClock;
pub use manager::{
    run_session, session_channel, SessionCommand, SessionContext, SessionHandle, SessionStatus,
};
pub use observers::{categories_for, EventForwarder, ObserverRegistry};
pub use scheduler::PollingScheduler;
pub use session::PresenceSession;
pub use traits::{
    ClientEvent, ClientEventSink, ConnectionId, ConnectionState, PresenceClient, PresencePayload,
};
