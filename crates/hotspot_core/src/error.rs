use crate::types::TimeUs;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hotspot not found: {0}")]
    HotspotNotFound(uuid::Uuid),

    #[error("CTA {index} not found on hotspot {hotspot}")]
    CtaNotFound { hotspot: uuid::Uuid, index: usize },

    #[error("Invalid time range: {start}..{end} (duration {duration})")]
    InvalidTimeRange {
        start: TimeUs,
        end: TimeUs,
        duration: TimeUs,
    },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),

    #[error("Malformed numeric input: {0:?}")]
    MalformedNumericInput(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
