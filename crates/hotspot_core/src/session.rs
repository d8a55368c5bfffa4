use crate::config::EngineConfig;
use crate::edit_mode::EditMode;
use crate::error::Result;
use crate::interaction::{Corner, InteractionController, PointerSurface, TimeMarker};
use crate::playback::{PlaybackController, PlaybackState, ResumeScheduler, TimerToken, VideoSource};
use crate::timing::{evaluate_tick, resolve_click, visible_hotspots, AutoPauseRequest, ClickAction, TriggerMemory};
use crate::types::*;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of clicking a hotspot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Edit mode: the hotspot became the selection.
    Selected(Uuid),
    /// Playback paused and the message overlay is up.
    ShowMessage(String),
    /// Playback paused; the host should open the link.
    OpenUrl(String),
    Ignored,
}

/// Everything the engine tracks for one attached video source.
///
/// The hotspot set stays with the caller: operations that change it take the
/// current set by reference and hand back its replacement.
#[derive(Debug)]
pub struct PlaybackSession {
    config: EngineConfig,
    source: String,
    current_time: TimeUs,
    playback: PlaybackController,
    triggered: TriggerMemory,
    mode: EditMode,
    interaction: InteractionController,
    message: Option<String>,
    show_hotspots: bool,
}

impl PlaybackSession {
    /// Start a session for a newly attached source.
    pub fn attach(source: impl Into<String>, config: EngineConfig) -> Self {
        let source = source.into();
        info!(%source, "video source attached");
        Self {
            config,
            source,
            current_time: TimeUs::ZERO,
            playback: PlaybackController::new(),
            triggered: TriggerMemory::new(),
            mode: EditMode::View,
            interaction: InteractionController::new(),
            message: None,
            show_hotspots: true,
        }
    }

    /// Swap in a new source. Everything but the config starts over.
    pub fn attach_source(&mut self, source: impl Into<String>, scheduler: &mut dyn ResumeScheduler) {
        self.playback.cancel_resume(scheduler);
        let config = std::mem::take(&mut self.config);
        *self = Self::attach(source, config);
    }

    /// Tear down: cancels the pending auto-resume and releases any capture.
    pub fn detach(mut self, scheduler: &mut dyn ResumeScheduler) {
        self.playback.cancel_resume(scheduler);
        self.interaction.cancel();
        info!(source = %self.source, "video source detached");
    }

    // -- accessors ----------------------------------------------------------

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current_time(&self) -> TimeUs {
        self.current_time
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn pending_resume(&self) -> Option<TimerToken> {
        self.playback.pending_resume()
    }

    pub fn mode(&self) -> &EditMode {
        &self.mode
    }

    pub fn triggered(&self) -> &TriggerMemory {
        &self.triggered
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_gesture_active(&self) -> bool {
        self.interaction.is_active()
    }

    pub fn show_hotspots(&self) -> bool {
        self.show_hotspots
    }

    pub fn set_show_hotspots(&mut self, show: bool) {
        self.show_hotspots = show;
    }

    pub fn visible<'a>(&self, hotspots: &'a HotspotSet) -> Vec<&'a Hotspot> {
        let edit = self.mode.is_edit();
        if !edit && !self.show_hotspots {
            return vec![];
        }
        visible_hotspots(self.current_time, hotspots, edit)
    }

    // -- playback -----------------------------------------------------------

    /// A time-update tick from the source.
    pub fn on_time_update(
        &mut self,
        time: TimeUs,
        hotspots: &HotspotSet,
        video: &mut dyn VideoSource,
        scheduler: &mut dyn ResumeScheduler,
    ) -> Result<Option<AutoPauseRequest>> {
        self.current_time = time;
        let Some(request) = evaluate_tick(
            time,
            hotspots,
            self.mode.is_edit(),
            self.playback.is_manually_paused(),
            &mut self.triggered,
        ) else {
            return Ok(None);
        };
        self.playback.auto_pause(request.duration, video, scheduler)?;
        Ok(Some(request))
    }

    /// The source reports a seek, whoever started it.
    pub fn on_seeked(&mut self, time: TimeUs, scheduler: &mut dyn ResumeScheduler) {
        self.current_time = time;
        self.triggered.clear();
        self.playback.cancel_resume(scheduler);
    }

    /// The source reports it started playing, e.g. from its own controls.
    pub fn on_played(&mut self, scheduler: &mut dyn ResumeScheduler) {
        self.playback.on_external_play(scheduler);
    }

    /// The source reports it paused on its own.
    pub fn on_paused(&mut self) {
        self.playback.on_external_pause();
    }

    /// Seek the source, clamped to the duration when known.
    pub fn seek(
        &mut self,
        to: TimeUs,
        video: &mut dyn VideoSource,
        scheduler: &mut dyn ResumeScheduler,
    ) -> Result<TimeUs> {
        let upper = video.duration().unwrap_or(TimeUs(i64::MAX));
        let target = to.clamp_to(TimeUs::ZERO, upper);
        video.seek(target)?;
        self.on_seeked(target, scheduler);
        Ok(target)
    }

    /// Seek to a fraction of the duration, as from the progress bar.
    pub fn seek_fraction(
        &mut self,
        fraction: f64,
        video: &mut dyn VideoSource,
        scheduler: &mut dyn ResumeScheduler,
    ) -> Result<TimeUs> {
        let Some(duration) = video.duration() else {
            return Ok(self.current_time);
        };
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            return Err(crate::error::CoreError::MalformedNumericInput(fraction.to_string()));
        };
        let target = TimeUs::from_seconds(duration.as_seconds() * fraction);
        self.seek(target, video, scheduler)
    }

    pub fn play(
        &mut self,
        video: &mut dyn VideoSource,
        scheduler: &mut dyn ResumeScheduler,
    ) -> Result<()> {
        self.playback.play(video, scheduler)
    }

    pub fn pause(
        &mut self,
        video: &mut dyn VideoSource,
        scheduler: &mut dyn ResumeScheduler,
    ) -> Result<()> {
        self.playback.pause(video, scheduler)
    }

    pub fn toggle_play(
        &mut self,
        video: &mut dyn VideoSource,
        scheduler: &mut dyn ResumeScheduler,
    ) -> Result<()> {
        self.playback.toggle_play(video, scheduler)
    }

    pub fn on_resume_timer(
        &mut self,
        token: TimerToken,
        video: &mut dyn VideoSource,
    ) -> Result<bool> {
        self.playback.on_resume_timer(token, video)
    }

    /// Close the message overlay and carry on playing.
    pub fn dismiss_message(
        &mut self,
        video: &mut dyn VideoSource,
        scheduler: &mut dyn ResumeScheduler,
    ) -> Result<()> {
        self.message = None;
        self.playback.on_message_overlay_dismiss(video, scheduler)
    }

    /// Click on a hotspot: selects it in edit mode, otherwise runs its CTA.
    pub fn click_hotspot(
        &mut self,
        id: Uuid,
        hotspots: &HotspotSet,
        video: &mut dyn VideoSource,
        scheduler: &mut dyn ResumeScheduler,
    ) -> Result<ClickOutcome> {
        if self.mode.is_edit() {
            self.mode.select(Some(id));
            return Ok(ClickOutcome::Selected(id));
        }
        let Some(action) = hotspots.get(id).and_then(resolve_click) else {
            return Ok(ClickOutcome::Ignored);
        };

        self.playback.pause(video, scheduler)?;
        Ok(match action {
            ClickAction::ShowMessage(text) => {
                self.message = Some(text.clone());
                ClickOutcome::ShowMessage(text)
            }
            ClickAction::OpenUrl(href) => {
                info!(%href, "opening hotspot link");
                ClickOutcome::OpenUrl(href)
            }
        })
    }

    // -- editing ------------------------------------------------------------

    pub fn toggle_edit_mode(&mut self, scheduler: &mut dyn ResumeScheduler) {
        self.mode.toggle(&mut self.triggered);
        self.interaction.cancel();
        self.playback.cancel_resume(scheduler);
    }

    pub fn set_creating(&mut self, on: bool) {
        self.mode.set_creating(on);
    }

    pub fn select(&mut self, id: Option<Uuid>) {
        self.mode.select(id);
    }

    pub fn click_surface(
        &mut self,
        hotspots: &HotspotSet,
        surface: &dyn PointerSurface,
        duration: Option<TimeUs>,
    ) -> Option<HotspotSet> {
        let container = surface.container_size();
        self.mode
            .click_surface(hotspots, self.current_time, container, duration, &self.config)
    }

    pub fn delete_hotspot(&mut self, hotspots: &HotspotSet, id: Uuid) -> HotspotSet {
        if self.interaction.active_hotspot() == Some(id) {
            self.interaction.cancel();
        }
        self.mode.delete_hotspot(hotspots, id)
    }

    // -- gestures -----------------------------------------------------------

    pub fn begin_drag(&mut self, id: Uuid, pointer: Point, surface: &mut dyn PointerSurface) -> bool {
        self.interaction
            .begin_drag(self.mode.is_edit(), id, pointer, surface)
    }

    pub fn begin_resize(
        &mut self,
        hotspots: &HotspotSet,
        id: Uuid,
        corner: Corner,
        pointer: Point,
        surface: &mut dyn PointerSurface,
    ) -> bool {
        let Some(hotspot) = hotspots.get(id) else {
            return false;
        };
        self.interaction
            .begin_resize(self.mode.is_edit(), hotspot, corner, pointer, surface)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn begin_scrub(
        &mut self,
        hotspots: &HotspotSet,
        id: Uuid,
        marker: TimeMarker,
        pointer_x: f64,
        timeline_width: f64,
        duration: Option<TimeUs>,
        surface: &mut dyn PointerSurface,
    ) -> bool {
        let Some(hotspot) = hotspots.get(id) else {
            return false;
        };
        self.interaction.begin_scrub(
            self.mode.is_edit(),
            hotspot,
            marker,
            pointer_x,
            timeline_width,
            duration,
            surface,
        )
    }

    /// Feed a pointer-move; returns the replacement set when the live
    /// gesture changed a hotspot.
    pub fn pointer_move(
        &mut self,
        pointer: Point,
        hotspots: &HotspotSet,
        surface: &dyn PointerSurface,
    ) -> Option<HotspotSet> {
        let updated = self
            .interaction
            .pointer_move(pointer, hotspots, surface.container_size())?;
        match hotspots.with_updated(updated) {
            Ok(next) => Some(next),
            Err(e) => {
                warn!(error = %e, "gesture update dropped");
                None
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.interaction.pointer_up();
    }
}
