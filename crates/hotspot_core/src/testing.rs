//! In-memory collaborators for unit tests.

use crate::error::{CoreError, Result};
use crate::interaction::{InputCapture, PointerSurface};
use crate::playback::{ResumeScheduler, TimerToken, VideoSource};
use crate::types::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub(crate) fn make_hotspot(start: f64, end: f64) -> Hotspot {
    Hotspot {
        id: Uuid::new_v4(),
        name: String::new(),
        x: 0.0,
        y: 0.0,
        width: 50.0,
        height: 50.0,
        start_time: TimeUs::from_seconds(start),
        end_time: TimeUs::from_seconds(end),
        shape: Shape::Circle,
        opacity: 0.8,
        is_active: true,
        ctas: vec![],
        style: HotspotStyle::default(),
    }
}

pub(crate) fn pausing_cta(seconds: &str) -> Cta {
    Cta {
        action: CtaAction::Message("paused".into()),
        label: None,
        pause_duration: Some(seconds.to_string()),
    }
}

#[derive(Debug)]
pub(crate) struct FakeVideo {
    pub time: TimeUs,
    pub duration: Option<TimeUs>,
    pub playing: bool,
    pub reject_play: bool,
    pub seeks: Vec<TimeUs>,
}

impl FakeVideo {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            time: TimeUs::ZERO,
            duration: Some(TimeUs::from_seconds(duration_secs)),
            playing: false,
            reject_play: false,
            seeks: vec![],
        }
    }
}

impl VideoSource for FakeVideo {
    fn current_time(&self) -> Result<TimeUs> {
        Ok(self.time)
    }

    fn duration(&self) -> Option<TimeUs> {
        self.duration
    }

    fn seek(&mut self, to: TimeUs) -> Result<()> {
        self.time = to;
        self.seeks.push(to);
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if self.reject_play {
            return Err(CoreError::PlaybackRejected("autoplay blocked".into()));
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.playing = false;
        Ok(())
    }

    fn is_playing(&self) -> Result<bool> {
        Ok(self.playing)
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeScheduler {
    pub scheduled: Vec<(TimerToken, Duration)>,
    pub cancelled: Vec<TimerToken>,
}

impl FakeScheduler {
    pub fn outstanding(&self) -> Vec<(TimerToken, Duration)> {
        self.scheduled
            .iter()
            .filter(|(t, _)| !self.cancelled.contains(t))
            .copied()
            .collect()
    }
}

impl ResumeScheduler for FakeScheduler {
    fn schedule(&mut self, token: TimerToken, delay: Duration) {
        self.scheduled.push((token, delay));
    }

    fn cancel(&mut self, token: TimerToken) {
        self.cancelled.push(token);
    }
}

#[derive(Debug)]
pub(crate) struct FakeSurface {
    pub size: Size,
    pub held: Arc<AtomicUsize>,
}

impl FakeSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width, height),
            held: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Captures acquired and not yet released.
    pub fn held(&self) -> usize {
        self.held.load(Ordering::SeqCst)
    }
}

impl PointerSurface for FakeSurface {
    fn container_size(&self) -> Size {
        self.size
    }

    fn capture_pointer(&mut self) -> InputCapture {
        let held = Arc::clone(&self.held);
        held.fetch_add(1, Ordering::SeqCst);
        InputCapture::new(move || {
            held.fetch_sub(1, Ordering::SeqCst);
        })
    }
}
