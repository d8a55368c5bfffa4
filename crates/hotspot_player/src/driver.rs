//! Single event loop that owns the session, the video source and the
//! hotspot set. Position ticks, timer fires and user commands are handled
//! one at a time, and a fresh [`PlayerSnapshot`] is published after each.

use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use crate::scheduler::TokioResumeScheduler;
use hotspot_core::{
    ClickOutcome, CoreError, Corner, HotspotSet, InputCapture, PlaybackSession, Point,
    PointerSurface, Size, TimeMarker, TimeUs, TimerToken, VideoSource,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

const COMMAND_CAPACITY: usize = 64;

/// How far past the expected position a tick may land before it counts as
/// a seek.
const SEEK_SLACK: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    Play,
    Pause,
    TogglePlay,
    Seek(TimeUs),
    /// Progress-bar seek, 0.0 to 1.0 of the duration.
    SeekFraction(f64),
    ToggleEditMode,
    SetCreating(bool),
    SetShowHotspots(bool),
    ClickHotspot(Uuid),
    ClickSurface,
    DismissMessage,
    DeleteHotspot(Uuid),
    ResizeViewport(Size),
    BeginDrag {
        id: Uuid,
        pointer: Point,
    },
    BeginResize {
        id: Uuid,
        corner: Corner,
        pointer: Point,
    },
    BeginScrub {
        id: Uuid,
        marker: TimeMarker,
        pointer_x: f64,
        timeline_width: f64,
    },
    PointerMove(Point),
    PointerUp,
    UpdateHotspots(HotspotSet),
    Shutdown,
}

/// What a front end needs to draw the player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub time: TimeUs,
    pub duration: Option<TimeUs>,
    pub playing: bool,
    pub edit_mode: bool,
    pub selected: Option<Uuid>,
    pub creating: bool,
    pub visible: Vec<Uuid>,
    pub message: Option<String>,
    /// Link from the most recent URL click, for the host to open.
    pub opened_link: Option<String>,
    pub resume_pending: bool,
    pub pointer_captured: bool,
    pub hotspots: HotspotSet,
    pub last_error: Option<String>,
}

/// The viewport the hotspots are laid out in. Capturing the pointer just
/// raises a flag the front end reads from the snapshot.
#[derive(Debug, Default)]
struct ViewportSurface {
    size: Size,
    captured: Arc<AtomicBool>,
}

impl PointerSurface for ViewportSurface {
    fn container_size(&self) -> Size {
        self.size
    }

    fn capture_pointer(&mut self) -> InputCapture {
        self.captured.store(true, Ordering::SeqCst);
        let captured = Arc::clone(&self.captured);
        InputCapture::new(move || captured.store(false, Ordering::SeqCst))
    }
}

/// Cloneable front-end side of a running driver.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<PlayerCommand>,
    snapshots: watch::Receiver<PlayerSnapshot>,
}

impl PlayerHandle {
    pub async fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlayerError::DriverClosed)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(PlayerCommand::Shutdown).await
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshots.clone()
    }
}

pub struct PlayerDriver<V> {
    session: PlaybackSession,
    video: V,
    scheduler: TokioResumeScheduler,
    timer_rx: mpsc::UnboundedReceiver<TimerToken>,
    commands: mpsc::Receiver<PlayerCommand>,
    snapshots: watch::Sender<PlayerSnapshot>,
    hotspots: HotspotSet,
    surface: ViewportSurface,
    tick_interval: Duration,
    last_position: TimeUs,
    last_tick: Instant,
    opened_link: Option<String>,
    last_error: Option<String>,
}

impl<V: VideoSource + Send + 'static> PlayerDriver<V> {
    pub fn new(
        source: impl Into<String>,
        video: V,
        hotspots: HotspotSet,
        config: &PlayerConfig,
    ) -> (Self, PlayerHandle) {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);

        let mut driver = Self {
            session: PlaybackSession::attach(source, config.engine.clone()),
            video,
            scheduler: TokioResumeScheduler::new(timer_tx),
            timer_rx,
            commands: command_rx,
            // Replaced below once the driver exists to describe itself.
            snapshots: watch::channel(empty_snapshot()).0,
            hotspots,
            surface: ViewportSurface::default(),
            tick_interval: config.tick_interval(),
            last_position: TimeUs::ZERO,
            last_tick: Instant::now(),
            opened_link: None,
            last_error: None,
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(driver.snapshot());
        driver.snapshots = snapshot_tx;

        let handle = PlayerHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        (driver, handle)
    }

    pub fn spawn(self) -> JoinHandle<V> {
        tokio::spawn(self.run())
    }

    /// Run until `Shutdown` arrives or every handle is dropped. Hands the
    /// video source back once the session is detached.
    pub async fn run(mut self) -> V {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.last_tick = Instant::now();
        info!(source = %self.session.source(), "player driver started");

        loop {
            tokio::select! {
                _ = ticker.tick() => self.on_tick(),
                Some(token) = self.timer_rx.recv() => self.on_timer(token),
                command = self.commands.recv() => match command {
                    Some(PlayerCommand::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
            }
            self.publish();
        }

        let Self {
            session,
            video,
            mut scheduler,
            ..
        } = self;
        session.detach(&mut scheduler);
        info!("player driver stopped");
        video
    }

    // ---- Events ----

    /// Poll the source. Play state and position may have been changed from
    /// mpv's own controls, so both are reconciled before hotspots are checked.
    fn on_tick(&mut self) {
        let now = Instant::now();
        let elapsed = now - self.last_tick;
        self.last_tick = now;

        let was_playing = self.session.is_playing();
        let playing = match self.video.is_playing() {
            Ok(playing) => playing,
            Err(e) => {
                debug!(error = %e, "play state unavailable");
                return;
            }
        };
        if playing && !was_playing {
            self.session.on_played(&mut self.scheduler);
        } else if !playing && was_playing {
            self.session.on_paused();
        }

        let time = match self.video.current_time() {
            Ok(t) => t,
            Err(e) => {
                debug!(error = %e, "position unavailable");
                return;
            }
        };
        let budget = if playing || was_playing { elapsed } else { Duration::ZERO };
        let expected = self.last_position + TimeUs::from_seconds((budget + SEEK_SLACK).as_secs_f64());
        if time < self.last_position || time > expected {
            debug!(%time, last = %self.last_position, "position jumped");
            self.session.on_seeked(time, &mut self.scheduler);
        }
        self.last_position = time;

        if !self.session.is_playing() {
            return;
        }
        if let Err(e) =
            self.session
                .on_time_update(time, &self.hotspots, &mut self.video, &mut self.scheduler)
        {
            self.record(e);
        }
    }

    fn on_timer(&mut self, token: TimerToken) {
        if let Err(e) = self.session.on_resume_timer(token, &mut self.video) {
            self.record(e);
        }
    }

    fn handle(&mut self, command: PlayerCommand) {
        debug!(?command, "player command");
        self.last_error = None;
        if let Err(e) = self.apply(command) {
            self.record(e);
        }
    }

    fn apply(&mut self, command: PlayerCommand) -> hotspot_core::Result<()> {
        use PlayerCommand::*;

        match command {
            Play => self.session.play(&mut self.video, &mut self.scheduler)?,
            Pause => self.session.pause(&mut self.video, &mut self.scheduler)?,
            TogglePlay => self.session.toggle_play(&mut self.video, &mut self.scheduler)?,
            Seek(to) => {
                self.last_position = self.session.seek(to, &mut self.video, &mut self.scheduler)?;
            }
            SeekFraction(fraction) => {
                self.last_position =
                    self.session
                        .seek_fraction(fraction, &mut self.video, &mut self.scheduler)?;
            }
            ToggleEditMode => self.session.toggle_edit_mode(&mut self.scheduler),
            SetCreating(on) => self.session.set_creating(on),
            SetShowHotspots(show) => self.session.set_show_hotspots(show),
            ClickHotspot(id) => {
                let outcome = self.session.click_hotspot(
                    id,
                    &self.hotspots,
                    &mut self.video,
                    &mut self.scheduler,
                )?;
                if let ClickOutcome::OpenUrl(href) = outcome {
                    self.opened_link = Some(href);
                }
            }
            ClickSurface => {
                let duration = self.video.duration();
                if let Some(next) =
                    self.session
                        .click_surface(&self.hotspots, &self.surface, duration)
                {
                    self.hotspots = next;
                }
            }
            DismissMessage => self
                .session
                .dismiss_message(&mut self.video, &mut self.scheduler)?,
            DeleteHotspot(id) => self.hotspots = self.session.delete_hotspot(&self.hotspots, id),
            ResizeViewport(size) => {
                if !size.is_finite() || size.width < 0.0 || size.height < 0.0 {
                    return Err(CoreError::InvalidGeometry(format!("viewport {size:?}")));
                }
                self.surface.size = size;
            }
            BeginDrag { id, pointer } => {
                let started = self.session.begin_drag(id, pointer, &mut self.surface);
                log_gesture("drag", id, started);
            }
            BeginResize {
                id,
                corner,
                pointer,
            } => {
                let started =
                    self.session
                        .begin_resize(&self.hotspots, id, corner, pointer, &mut self.surface);
                log_gesture("resize", id, started);
            }
            BeginScrub {
                id,
                marker,
                pointer_x,
                timeline_width,
            } => {
                let duration = self.video.duration();
                let started = self.session.begin_scrub(
                    &self.hotspots,
                    id,
                    marker,
                    pointer_x,
                    timeline_width,
                    duration,
                    &mut self.surface,
                );
                log_gesture("scrub", id, started);
            }
            PointerMove(pointer) => {
                if let Some(next) =
                    self.session
                        .pointer_move(pointer, &self.hotspots, &self.surface)
                {
                    self.hotspots = next;
                }
            }
            PointerUp => self.session.pointer_up(),
            UpdateHotspots(set) => {
                set.validate(self.video.duration())?;
                self.hotspots = set;
            }
            // Handled by the loop itself.
            Shutdown => {}
        }
        Ok(())
    }

    fn record(&mut self, e: CoreError) {
        warn!(error = %e, "player event failed");
        self.last_error = Some(e.to_string());
    }

    // ---- Snapshots ----

    fn snapshot(&self) -> PlayerSnapshot {
        let mode = self.session.mode();
        PlayerSnapshot {
            time: self.session.current_time(),
            duration: self.video.duration(),
            playing: self.session.is_playing(),
            edit_mode: mode.is_edit(),
            selected: mode.selected(),
            creating: mode.is_creating(),
            visible: self
                .session
                .visible(&self.hotspots)
                .into_iter()
                .map(|h| h.id)
                .collect(),
            message: self.session.message().map(str::to_string),
            opened_link: self.opened_link.clone(),
            resume_pending: self.session.pending_resume().is_some(),
            pointer_captured: self.surface.captured.load(Ordering::SeqCst),
            hotspots: self.hotspots.clone(),
            last_error: self.last_error.clone(),
        }
    }

    fn publish(&self) {
        let next = self.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

fn log_gesture(kind: &str, id: Uuid, started: bool) {
    if !started {
        debug!(kind, %id, "gesture not started");
    }
}

fn empty_snapshot() -> PlayerSnapshot {
    PlayerSnapshot {
        time: TimeUs::ZERO,
        duration: None,
        playing: false,
        edit_mode: false,
        selected: None,
        creating: false,
        visible: vec![],
        message: None,
        opened_link: None,
        resume_pending: false,
        pointer_captured: false,
        hotspots: HotspotSet::default(),
        last_error: None,
    }
}
