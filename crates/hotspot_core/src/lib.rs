//! Time-gated interactive hotspots over a video surface.

pub mod config;
pub mod edit_mode;
pub mod error;
pub mod geometry;
pub mod hotspots;
pub mod interaction;
pub mod playback;
pub mod session;
pub mod timing;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::EngineConfig;
pub use edit_mode::EditMode;
pub use error::{CoreError, Result};
pub use interaction::{Corner, InputCapture, InteractionController, PointerSurface, TimeMarker};
pub use playback::{PlaybackController, PlaybackState, ResumeScheduler, TimerToken, VideoSource};
pub use session::{ClickOutcome, PlaybackSession};
pub use timing::{AutoPauseRequest, ClickAction, TriggerMemory};
pub use types::*;
