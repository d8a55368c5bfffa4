//! mpv-backed host for the hotspot engine.

pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod mpv;
pub mod scheduler;

pub use config::PlayerConfig;
pub use driver::{PlayerCommand, PlayerDriver, PlayerHandle, PlayerSnapshot};
pub use error::{PlayerError, Result};
pub use mpv::MpvVideoSource;
pub use scheduler::TokioResumeScheduler;
