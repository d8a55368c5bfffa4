use hotspot_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("failed to start mpv: {0}")]
    Spawn(std::io::Error),

    #[error("mpv socket did not appear at {0}")]
    SocketTimeout(PathBuf),

    #[error("mpv IPC failed: {0}")]
    Ipc(String),

    #[error("mpv returned no value for property {0}")]
    NoProperty(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("player driver has shut down")]
    DriverClosed,
}

impl From<PlayerError> for CoreError {
    /// The engine only distinguishes "the source refused".
    fn from(e: PlayerError) -> Self {
        match e {
            PlayerError::Core(inner) => inner,
            other => CoreError::PlaybackRejected(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlayerError>;
