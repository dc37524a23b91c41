pub mod cli;
pub mod config;
pub mod discord;
pub mod editor;
pub mod error;
pub mod logging;
pub mod platform;
pub mod presence;
pub mod settings;

use std::sync::Arc;

use cli::Args;
use config::PresenceConfig;
use discord::DiscordClient;
use editor::AppleScriptEditor;
use error::XcordError;
use platform::{AppIdentity, PollingLifecycleSource};
use presence::{run_session, session_channel, ObserverRegistry, PresenceSession, SessionContext};
use settings::{JsonPreferences, Mode, DEFAULT_PREFERENCES};

/// Run XCord until Ctrl-C
pub async fn run(args: Args) -> Result<(), XcordError> {
    let config = PresenceConfig::default();

    let mut preferences = JsonPreferences::open_default()?;
    preferences.register_defaults(DEFAULT_PREFERENCES);
    if let Some(mode) = args.mode {
        mode.persist(&mut preferences)?;
    }
    let mode = Mode::from_preferences(&preferences);
    tracing::info!("Timer mode: {} ({})", mode, mode.message());

    let (handle, commands) = session_channel();

    let source = Arc::new(PollingLifecycleSource::start(AppIdentity {
        name: config.app_name.clone(),
        bundle_id: Some(config.bundle_id.clone()),
    }));
    let observers = ObserverRegistry::new(source, &config, handle.lifecycle_forwarder());
    let client = DiscordClient::new(config.discord_app_id, handle.client_sink());
    let editor = AppleScriptEditor::new(config.app_name.clone());

    let app_name = config.app_name.clone();
    let session = PresenceSession::new(config, client, editor, observers, mode);
    let task = tokio::spawn(run_session(
        session,
        commands,
        SessionContext {
            editor_running: Box::new(move || platform::is_process_running(&app_name)),
            preferences: Box::new(preferences),
        },
    ));

    if args.inactive {
        tracing::info!("Starting with presence switched off");
    } else {
        handle.activate();
    }

    let signal = tokio::signal::ctrl_c().await.map_err(XcordError::Signal);
    tracing::info!("Shutting down...");
    handle.shutdown().await;
    task.await?;

    signal
}
