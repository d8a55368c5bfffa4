use crate::error::{CoreError, Result};
use crate::types::TimeUs;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The underlying video resource.
pub trait VideoSource {
    fn current_time(&self) -> Result<TimeUs>;
    /// `None` until metadata has loaded.
    fn duration(&self) -> Option<TimeUs>;
    fn seek(&mut self, to: TimeUs) -> Result<()>;
    /// May be refused by the resource, e.g. an autoplay policy.
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    /// Whether the resource itself is playing, including changes made
    /// through its own controls.
    fn is_playing(&self) -> Result<bool>;
}

/// Identifies one scheduled auto-resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// Wall-clock timer service owned by the host.
///
/// When a scheduled timer elapses the host hands its token back through
/// [`PlaybackController::on_resume_timer`]. A cancelled token must never be
/// handed back.
pub trait ResumeScheduler {
    fn schedule(&mut self, token: TimerToken, delay: Duration);
    fn cancel(&mut self, token: TimerToken);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    /// `manual` is set when the user paused and an automatic resume must
    /// not happen.
    Paused { manual: bool },
}

#[derive(Debug)]
pub struct PlaybackController {
    state: PlaybackState,
    pending_resume: Option<TimerToken>,
    next_token: u64,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackController {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Paused { manual: false },
            pending_resume: None,
            next_token: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_manually_paused(&self) -> bool {
        self.state == PlaybackState::Paused { manual: true }
    }

    pub fn pending_resume(&self) -> Option<TimerToken> {
        self.pending_resume
    }

    /// User-initiated play. On rejection the state is left as it was and the
    /// error is handed back for the caller to report.
    pub fn play(
        &mut self,
        video: &mut dyn VideoSource,
        scheduler: &mut dyn ResumeScheduler,
    ) -> Result<()> {
        self.cancel_resume(scheduler);
        match video.play() {
            Ok(()) => {
                self.state = PlaybackState::Playing;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "play request rejected");
                Err(rejected(e))
            }
        }
    }

    /// User-initiated pause. Cancels any countdown so it can never resume.
    pub fn pause(
        &mut self,
        video: &mut dyn VideoSource,
        scheduler: &mut dyn ResumeScheduler,
    ) -> Result<()> {
        self.cancel_resume(scheduler);
        self.state = PlaybackState::Paused { manual: true };
        video.pause()
    }

    pub fn toggle_play(
        &mut self,
        video: &mut dyn VideoSource,
        scheduler: &mut dyn ResumeScheduler,
    ) -> Result<()> {
        if self.is_playing() {
            self.pause(video, scheduler)
        } else {
            self.play(video, scheduler)
        }
    }

    /// Engine-initiated pause that resumes by itself after `delay`.
    pub fn auto_pause(
        &mut self,
        delay: Duration,
        video: &mut dyn VideoSource,
        scheduler: &mut dyn ResumeScheduler,
    ) -> Result<TimerToken> {
        self.cancel_resume(scheduler);
        video.pause()?;
        self.state = PlaybackState::Paused { manual: false };

        let token = TimerToken(self.next_token);
        self.next_token += 1;
        scheduler.schedule(token, delay);
        self.pending_resume = Some(token);
        info!(?delay, token = token.0, "auto-pause scheduled");
        Ok(token)
    }

    /// Called by the host when a scheduled timer elapses. Returns whether
    /// playback resumed.
    pub fn on_resume_timer(
        &mut self,
        token: TimerToken,
        video: &mut dyn VideoSource,
    ) -> Result<bool> {
        if self.pending_resume != Some(token) {
            debug!(token = token.0, "ignoring stale resume timer");
            return Ok(false);
        }
        self.pending_resume = None;
        if self.state != (PlaybackState::Paused { manual: false }) {
            return Ok(false);
        }
        match video.play() {
            Ok(()) => {
                self.state = PlaybackState::Playing;
                info!(token = token.0, "auto-resume");
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "auto-resume rejected");
                Err(rejected(e))
            }
        }
    }

    /// Resume after the message overlay is closed.
    pub fn on_message_overlay_dismiss(
        &mut self,
        video: &mut dyn VideoSource,
        scheduler: &mut dyn ResumeScheduler,
    ) -> Result<()> {
        if let PlaybackState::Paused { manual } = &mut self.state {
            *manual = false;
        }
        self.play(video, scheduler)
    }

    /// The resource started playing by itself. Nothing is sent back to it.
    pub fn on_external_play(&mut self, scheduler: &mut dyn ResumeScheduler) {
        self.cancel_resume(scheduler);
        if self.state != PlaybackState::Playing {
            info!("playback started by the source");
            self.state = PlaybackState::Playing;
        }
    }

    /// The resource paused by itself. Never counts as a manual pause, and a
    /// paused state is left as it is.
    pub fn on_external_pause(&mut self) {
        if self.state == PlaybackState::Playing {
            info!("playback paused by the source");
            self.state = PlaybackState::Paused { manual: false };
        }
    }

    /// Drop any outstanding auto-resume.
    pub fn cancel_resume(&mut self, scheduler: &mut dyn ResumeScheduler) {
        if let Some(token) = self.pending_resume.take() {
            debug!(token = token.0, "cancelling auto-resume");
            scheduler.cancel(token);
        }
    }
}

fn rejected(e: CoreError) -> CoreError {
    match e {
        CoreError::PlaybackRejected(_) => e,
        other => CoreError::PlaybackRejected(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeScheduler, FakeVideo};

    const THREE_SECS: Duration = Duration::from_secs(3);

    // -----------------------------------------------------------------------
    // play / pause
    // -----------------------------------------------------------------------

    #[test]
    fn starts_paused_without_manual_flag() {
        let pc = PlaybackController::new();
        assert_eq!(pc.state(), PlaybackState::Paused { manual: false });
    }

    #[test]
    fn play_then_pause() {
        let (mut video, mut sched) = (FakeVideo::new(30.0), FakeScheduler::default());
        let mut pc = PlaybackController::new();

        pc.play(&mut video, &mut sched).unwrap();
        assert!(pc.is_playing());
        assert!(video.playing);

        pc.pause(&mut video, &mut sched).unwrap();
        assert!(pc.is_manually_paused());
        assert!(!video.playing);
    }

    #[test]
    fn rejected_play_keeps_state() {
        let (mut video, mut sched) = (FakeVideo::new(30.0), FakeScheduler::default());
        video.reject_play = true;
        let mut pc = PlaybackController::new();

        let err = pc.play(&mut video, &mut sched).unwrap_err();
        assert!(matches!(err, CoreError::PlaybackRejected(_)));
        assert_eq!(pc.state(), PlaybackState::Paused { manual: false });
    }

    #[test]
    fn toggle_play_alternates() {
        let (mut video, mut sched) = (FakeVideo::new(30.0), FakeScheduler::default());
        let mut pc = PlaybackController::new();
        pc.toggle_play(&mut video, &mut sched).unwrap();
        assert!(pc.is_playing());
        pc.toggle_play(&mut video, &mut sched).unwrap();
        assert!(pc.is_manually_paused());
    }

    // -----------------------------------------------------------------------
    // auto-pause / auto-resume
    // -----------------------------------------------------------------------

    #[test]
    fn auto_pause_schedules_and_resumes() {
        let (mut video, mut sched) = (FakeVideo::new(30.0), FakeScheduler::default());
        let mut pc = PlaybackController::new();
        pc.play(&mut video, &mut sched).unwrap();

        let token = pc.auto_pause(THREE_SECS, &mut video, &mut sched).unwrap();
        assert_eq!(pc.state(), PlaybackState::Paused { manual: false });
        assert_eq!(sched.outstanding(), vec![(token, THREE_SECS)]);

        let resumed = pc.on_resume_timer(token, &mut video).unwrap();
        assert!(resumed);
        assert!(pc.is_playing());
        assert!(pc.pending_resume().is_none());
    }

    #[test]
    fn manual_pause_cancels_countdown() {
        let (mut video, mut sched) = (FakeVideo::new(30.0), FakeScheduler::default());
        let mut pc = PlaybackController::new();
        pc.play(&mut video, &mut sched).unwrap();

        let token = pc.auto_pause(THREE_SECS, &mut video, &mut sched).unwrap();
        pc.pause(&mut video, &mut sched).unwrap();

        assert!(sched.outstanding().is_empty());
        assert_eq!(sched.cancelled, vec![token]);
        // Even a late delivery of the old token does nothing.
        assert!(!pc.on_resume_timer(token, &mut video).unwrap());
        assert!(pc.is_manually_paused());
        assert!(!video.playing);
    }

    #[test]
    fn new_auto_pause_replaces_previous_timer() {
        let (mut video, mut sched) = (FakeVideo::new(30.0), FakeScheduler::default());
        let mut pc = PlaybackController::new();

        let first = pc.auto_pause(THREE_SECS, &mut video, &mut sched).unwrap();
        let second = pc
            .auto_pause(Duration::from_secs(5), &mut video, &mut sched)
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(sched.outstanding().len(), 1);
        assert!(!pc.on_resume_timer(first, &mut video).unwrap());
        assert!(pc.on_resume_timer(second, &mut video).unwrap());
    }

    #[test]
    fn rejected_auto_resume_stays_paused() {
        let (mut video, mut sched) = (FakeVideo::new(30.0), FakeScheduler::default());
        let mut pc = PlaybackController::new();
        let token = pc.auto_pause(THREE_SECS, &mut video, &mut sched).unwrap();

        video.reject_play = true;
        assert!(pc.on_resume_timer(token, &mut video).is_err());
        assert_eq!(pc.state(), PlaybackState::Paused { manual: false });
    }

    #[test]
    fn play_cancels_pending_resume() {
        let (mut video, mut sched) = (FakeVideo::new(30.0), FakeScheduler::default());
        let mut pc = PlaybackController::new();
        pc.auto_pause(THREE_SECS, &mut video, &mut sched).unwrap();

        pc.play(&mut video, &mut sched).unwrap();
        assert!(sched.outstanding().is_empty());
        assert!(pc.pending_resume().is_none());
    }

    // -----------------------------------------------------------------------
    // notifications from the source
    // -----------------------------------------------------------------------

    #[test]
    fn external_play_and_pause_track_source() {
        let (mut video, mut sched) = (FakeVideo::new(30.0), FakeScheduler::default());
        let mut pc = PlaybackController::new();

        pc.on_external_play(&mut sched);
        assert!(pc.is_playing());
        pc.on_external_pause();
        assert_eq!(pc.state(), PlaybackState::Paused { manual: false });
        // Nothing was ever requested from the source.
        assert!(!video.playing);
        assert!(video.seeks.is_empty());

        pc.pause(&mut video, &mut sched).unwrap();
        pc.on_external_pause();
        assert!(pc.is_manually_paused());
    }

    #[test]
    fn external_play_cancels_countdown() {
        let (mut video, mut sched) = (FakeVideo::new(30.0), FakeScheduler::default());
        let mut pc = PlaybackController::new();
        let token = pc.auto_pause(THREE_SECS, &mut video, &mut sched).unwrap();

        pc.on_external_play(&mut sched);
        assert!(pc.is_playing());
        assert!(sched.outstanding().is_empty());
        assert!(!pc.on_resume_timer(token, &mut video).unwrap());
    }

    #[test]
    fn dismiss_overlay_resumes_after_manual_pause() {
        let (mut video, mut sched) = (FakeVideo::new(30.0), FakeScheduler::default());
        let mut pc = PlaybackController::new();
        pc.pause(&mut video, &mut sched).unwrap();

        pc.on_message_overlay_dismiss(&mut video, &mut sched).unwrap();
        assert!(pc.is_playing());
    }

    #[test]
    fn dismiss_overlay_rejected_clears_manual_flag() {
        let (mut video, mut sched) = (FakeVideo::new(30.0), FakeScheduler::default());
        let mut pc = PlaybackController::new();
        pc.pause(&mut video, &mut sched).unwrap();

        video.reject_play = true;
        assert!(pc.on_message_overlay_dismiss(&mut video, &mut sched).is_err());
        assert_eq!(pc.state(), PlaybackState::Paused { manual: false });
    }
}
