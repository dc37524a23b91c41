mod presence;

pub use presence::{
    DiscordClient, ERROR_CONNECTION_CLOSED, ERROR_HANDSHAKE_TIMEOUT, ERROR_UNAVAILABLE,
};
