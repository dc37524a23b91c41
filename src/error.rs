use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum XcordError {
    #[error("Failed to get {0} directory")]
    MissingDirectory(&'static str),

    #[error("Failed to access settings file {path}: {source}")]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    SettingsParse(#[from] serde_json::Error),

    #[error("Presence session stopped: {0}")]
    SessionTask(#[from] tokio::task::JoinError),

    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
}
