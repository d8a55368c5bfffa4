//! Drag, resize and timeline-scrub gestures.
//!
//! A gesture starts on pointer-down, turns every pointer-move into an
//! updated hotspot and ends on pointer-up. While a gesture is live it holds
//! an [`InputCapture`] from the surface; dropping the gesture for any reason
//! releases it.

use crate::geometry::{clamp_position, clamp_size};
use crate::types::*;
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Move/up listener registration held for the lifetime of a gesture.
/// The release callback runs exactly once, when the capture is dropped.
pub struct InputCapture {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl InputCapture {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A capture with nothing to release.
    pub fn detached() -> Self {
        Self { release: None }
    }
}

impl Drop for InputCapture {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for InputCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputCapture")
            .field("held", &self.release.is_some())
            .finish()
    }
}

/// The container the hotspots are drawn over.
pub trait PointerSurface {
    fn container_size(&self) -> Size;
    /// Start routing pointer-move/up to the engine until the capture drops.
    fn capture_pointer(&mut self) -> InputCapture;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Corner {
    /// Sign applied to the pointer delta on each axis. Dragging a north or
    /// west handle outward moves the pointer towards negative coordinates.
    fn signs(&self) -> (f64, f64) {
        match self {
            Corner::NorthWest => (-1.0, -1.0),
            Corner::NorthEast => (1.0, -1.0),
            Corner::SouthWest => (-1.0, 1.0),
            Corner::SouthEast => (1.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMarker {
    Start,
    End,
}

#[derive(Debug)]
enum GestureKind {
    Drag {
        last: Point,
    },
    Resize {
        corner: Corner,
        start_pointer: Point,
        start_size: Size,
    },
    Scrub {
        marker: TimeMarker,
        start_x: f64,
        initial_time: TimeUs,
        timeline_width: f64,
        duration: TimeUs,
    },
}

#[derive(Debug)]
struct Gesture {
    hotspot_id: Uuid,
    kind: GestureKind,
    _capture: InputCapture,
}

#[derive(Debug, Default)]
pub struct InteractionController {
    gesture: Option<Gesture>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn active_hotspot(&self) -> Option<Uuid> {
        self.gesture.as_ref().map(|g| g.hotspot_id)
    }

    /// Pointer-down on a hotspot body. Ignored outside edit mode.
    pub fn begin_drag(
        &mut self,
        edit_mode: bool,
        hotspot_id: Uuid,
        pointer: Point,
        surface: &mut dyn PointerSurface,
    ) -> bool {
        if !edit_mode || !pointer.is_finite() {
            return false;
        }
        self.start(hotspot_id, GestureKind::Drag { last: pointer }, surface);
        true
    }

    /// Pointer-down on one of the four corner handles.
    pub fn begin_resize(
        &mut self,
        edit_mode: bool,
        hotspot: &Hotspot,
        corner: Corner,
        pointer: Point,
        surface: &mut dyn PointerSurface,
    ) -> bool {
        if !edit_mode || !pointer.is_finite() {
            return false;
        }
        let kind = GestureKind::Resize {
            corner,
            start_pointer: pointer,
            start_size: hotspot.size(),
        };
        self.start(hotspot.id, kind, surface);
        true
    }

    /// Pointer-down on a start/end marker of the hotspot timeline.
    /// Needs a known duration and a timeline with some width.
    pub fn begin_scrub(
        &mut self,
        edit_mode: bool,
        hotspot: &Hotspot,
        marker: TimeMarker,
        pointer_x: f64,
        timeline_width: f64,
        duration: Option<TimeUs>,
        surface: &mut dyn PointerSurface,
    ) -> bool {
        let Some(duration) = duration.filter(|d| *d > TimeUs::ZERO) else {
            return false;
        };
        if !edit_mode || !pointer_x.is_finite() || !(timeline_width > 0.0) {
            return false;
        }
        let initial_time = match marker {
            TimeMarker::Start => hotspot.start_time,
            TimeMarker::End => hotspot.end_time,
        };
        let kind = GestureKind::Scrub {
            marker,
            start_x: pointer_x,
            initial_time,
            timeline_width,
            duration,
        };
        self.start(hotspot.id, kind, surface);
        true
    }

    /// Turn a pointer-move into an updated hotspot, or `None` when there is
    /// no gesture or the move would break an invariant.
    pub fn pointer_move(
        &mut self,
        pointer: Point,
        hotspots: &HotspotSet,
        container: Size,
    ) -> Option<Hotspot> {
        let gesture = self.gesture.as_mut()?;
        let Some(current) = hotspots.get(gesture.hotspot_id) else {
            debug!(id = %gesture.hotspot_id, "hotspot vanished mid-gesture");
            self.gesture = None;
            return None;
        };

        match &mut gesture.kind {
            GestureKind::Drag { last } => {
                let dx = pointer.x - last.x;
                let dy = pointer.y - last.y;
                let origin = clamp_position(current, current.x + dx, current.y + dy, container)
                    .map_err(|e| warn!(error = %e, "drag ignored"))
                    .ok()?;
                *last = pointer;
                Some(Hotspot {
                    x: origin.x,
                    y: origin.y,
                    ..current.clone()
                })
            }
            GestureKind::Resize {
                corner,
                start_pointer,
                start_size,
            } => {
                let (sx, sy) = corner.signs();
                let dx = (pointer.x - start_pointer.x) * sx;
                let dy = (pointer.y - start_pointer.y) * sy;
                let size = clamp_size(
                    current,
                    start_size.width + dx,
                    start_size.height + dy,
                    container,
                )
                .map_err(|e| warn!(error = %e, "resize ignored"))
                .ok()?;
                let mut resized = Hotspot {
                    width: size.width,
                    height: size.height,
                    ..current.clone()
                };
                // The minimum size can push past the far edge; slide back in.
                let origin = clamp_position(&resized, resized.x, resized.y, container).ok()?;
                resized.x = origin.x;
                resized.y = origin.y;
                Some(resized)
            }
            GestureKind::Scrub {
                marker,
                start_x,
                initial_time,
                timeline_width,
                duration,
            } => {
                if !pointer.x.is_finite() {
                    return None;
                }
                let seconds_per_px = duration.as_seconds() / *timeline_width;
                let delta = (pointer.x - *start_x) * seconds_per_px;
                let new_time = TimeUs::from_seconds(initial_time.as_seconds() + delta)
                    .clamp_to(TimeUs::ZERO, *duration);
                match marker {
                    TimeMarker::Start if new_time < current.end_time => Some(Hotspot {
                        start_time: new_time,
                        ..current.clone()
                    }),
                    TimeMarker::End if new_time > current.start_time => Some(Hotspot {
                        end_time: new_time,
                        ..current.clone()
                    }),
                    _ => {
                        debug!(?marker, %new_time, "scrub would invert window");
                        None
                    }
                }
            }
        }
    }

    /// Pointer-up: the gesture ends and its capture is released.
    pub fn pointer_up(&mut self) {
        if let Some(g) = self.gesture.take() {
            debug!(id = %g.hotspot_id, "gesture finished");
        }
    }

    /// Abandon any live gesture (mode toggle, seek, unmount).
    pub fn cancel(&mut self) {
        self.gesture = None;
    }

    fn start(&mut self, hotspot_id: Uuid, kind: GestureKind, surface: &mut dyn PointerSurface) {
        // Release the previous capture before taking a new one.
        self.gesture = None;
        debug!(id = %hotspot_id, ?kind, "gesture started");
        self.gesture = Some(Gesture {
            hotspot_id,
            kind,
            _capture: surface.capture_pointer(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::fits_within;
    use crate::testing::{make_hotspot, FakeSurface};

    fn secs(s: f64) -> TimeUs {
        TimeUs::from_seconds(s)
    }

    fn placed(x: f64, y: f64, w: f64, h: f64) -> Hotspot {
        Hotspot {
            x,
            y,
            width: w,
            height: h,
            ..make_hotspot(10.0, 20.0)
        }
    }

    // -----------------------------------------------------------------------
    // input capture
    // -----------------------------------------------------------------------

    #[test]
    fn capture_released_on_pointer_up() {
        let mut surface = FakeSurface::new(640.0, 360.0);
        let hs = placed(0.0, 0.0, 50.0, 50.0);
        let mut ic = InteractionController::new();

        assert!(ic.begin_drag(true, hs.id, Point::new(5.0, 5.0), &mut surface));
        assert_eq!(surface.held(), 1);
        ic.pointer_up();
        assert_eq!(surface.held(), 0);
        assert!(!ic.is_active());
    }

    #[test]
    fn capture_released_on_cancel_and_drop() {
        let mut surface = FakeSurface::new(640.0, 360.0);
        let hs = placed(0.0, 0.0, 50.0, 50.0);

        let mut ic = InteractionController::new();
        ic.begin_resize(true, &hs, Corner::SouthEast, Point::new(50.0, 50.0), &mut surface);
        ic.cancel();
        assert_eq!(surface.held(), 0);

        let mut ic = InteractionController::new();
        ic.begin_drag(true, hs.id, Point::new(1.0, 1.0), &mut surface);
        drop(ic);
        assert_eq!(surface.held(), 0);
    }

    #[test]
    fn new_gesture_releases_previous_capture() {
        let mut surface = FakeSurface::new(640.0, 360.0);
        let hs = placed(0.0, 0.0, 50.0, 50.0);
        let mut ic = InteractionController::new();
        ic.begin_drag(true, hs.id, Point::new(1.0, 1.0), &mut surface);
        ic.begin_drag(true, hs.id, Point::new(2.0, 2.0), &mut surface);
        assert_eq!(surface.held(), 1);
    }

    #[test]
    fn detached_capture_drops_quietly() {
        drop(InputCapture::detached());
    }

    #[test]
    fn no_gestures_outside_edit_mode() {
        let mut surface = FakeSurface::new(640.0, 360.0);
        let hs = placed(0.0, 0.0, 50.0, 50.0);
        let mut ic = InteractionController::new();

        assert!(!ic.begin_drag(false, hs.id, Point::new(1.0, 1.0), &mut surface));
        assert!(!ic.begin_resize(false, &hs, Corner::NorthWest, Point::new(1.0, 1.0), &mut surface));
        assert!(!ic.begin_scrub(false, &hs, TimeMarker::Start, 0.0, 100.0, Some(secs(60.0)), &mut surface));
        assert_eq!(surface.held(), 0);
        let set = HotspotSet::new(vec![hs]);
        assert!(ic.pointer_move(Point::new(9.0, 9.0), &set, surface.size).is_none());
    }

    // -----------------------------------------------------------------------
    // drag
    // -----------------------------------------------------------------------

    #[test]
    fn drag_uses_incremental_deltas() {
        let mut surface = FakeSurface::new(640.0, 360.0);
        let hs = placed(100.0, 100.0, 50.0, 50.0);
        let id = hs.id;
        let mut set = HotspotSet::new(vec![hs]);
        let mut ic = InteractionController::new();
        ic.begin_drag(true, id, Point::new(0.0, 0.0), &mut surface);

        for p in [Point::new(10.0, 5.0), Point::new(30.0, 5.0)] {
            let moved = ic.pointer_move(p, &set, surface.size).unwrap();
            set = set.with_updated(moved).unwrap();
        }
        let h = set.get(id).unwrap();
        assert_eq!((h.x, h.y), (130.0, 105.0));
    }

    #[test]
    fn drag_clamps_to_container() {
        let mut surface = FakeSurface::new(640.0, 360.0);
        let hs = placed(600.0, 10.0, 50.0, 50.0);
        let set = HotspotSet::new(vec![hs.clone()]);
        let mut ic = InteractionController::new();
        ic.begin_drag(true, hs.id, Point::new(0.0, 0.0), &mut surface);

        let moved = ic.pointer_move(Point::new(500.0, -500.0), &set, surface.size).unwrap();
        assert_eq!((moved.x, moved.y), (590.0, 0.0));
        assert!(fits_within(&moved, surface.size));
    }

    #[test]
    fn drag_with_nan_pointer_is_ignored() {
        let mut surface = FakeSurface::new(640.0, 360.0);
        let hs = placed(10.0, 10.0, 50.0, 50.0);
        let set = HotspotSet::new(vec![hs.clone()]);
        let mut ic = InteractionController::new();
        ic.begin_drag(true, hs.id, Point::new(0.0, 0.0), &mut surface);

        assert!(ic.pointer_move(Point::new(f64::NAN, 3.0), &set, surface.size).is_none());
        let moved = ic.pointer_move(Point::new(5.0, 5.0), &set, surface.size).unwrap();
        assert_eq!((moved.x, moved.y), (15.0, 15.0));
    }

    #[test]
    fn drag_of_deleted_hotspot_ends_gesture() {
        let mut surface = FakeSurface::new(640.0, 360.0);
        let hs = placed(10.0, 10.0, 50.0, 50.0);
        let mut ic = InteractionController::new();
        ic.begin_drag(true, hs.id, Point::new(0.0, 0.0), &mut surface);

        assert!(ic.pointer_move(Point::new(5.0, 5.0), &HotspotSet::default(), surface.size).is_none());
        assert!(!ic.is_active());
        assert_eq!(surface.held(), 0);
    }

    // -----------------------------------------------------------------------
    // resize
    // -----------------------------------------------------------------------

    #[test]
    fn resize_south_east_grows_with_pointer() {
        let mut surface = FakeSurface::new(640.0, 360.0);
        let hs = placed(100.0, 100.0, 60.0, 60.0);
        let set = HotspotSet::new(vec![hs.clone()]);
        let mut ic = InteractionController::new();
        ic.begin_resize(true, &hs, Corner::SouthEast, Point::new(160.0, 160.0), &mut surface);

        let r = ic.pointer_move(Point::new(200.0, 170.0), &set, surface.size).unwrap();
        assert_eq!((r.width, r.height), (100.0, 70.0));
        assert_eq!((r.x, r.y), (100.0, 100.0));
    }

    #[test]
    fn resize_north_west_inverts_both_axes() {
        let mut surface = FakeSurface::new(640.0, 360.0);
        let hs = placed(100.0, 100.0, 80.0, 80.0);
        let set = HotspotSet::new(vec![hs.clone()]);
        let mut ic = InteractionController::new();
        ic.begin_resize(true, &hs, Corner::NorthWest, Point::new(100.0, 100.0), &mut surface);

        let r = ic.pointer_move(Point::new(90.0, 110.0), &set, surface.size).unwrap();
        assert_eq!((r.width, r.height), (90.0, 70.0));
    }

    #[test]
    fn resize_deltas_measured_from_gesture_start() {
        let mut surface = FakeSurface::new(640.0, 360.0);
        let hs = placed(0.0, 0.0, 60.0, 60.0);
        let mut set = HotspotSet::new(vec![hs.clone()]);
        let mut ic = InteractionController::new();
        ic.begin_resize(true, &hs, Corner::NorthEast, Point::new(60.0, 0.0), &mut surface);

        for p in [Point::new(70.0, 0.0), Point::new(80.0, -10.0)] {
            let r = ic.pointer_move(p, &set, surface.size).unwrap();
            set = set.with_updated(r).unwrap();
        }
        let h = set.get(hs.id).unwrap();
        assert_eq!((h.width, h.height), (80.0, 70.0));
    }

    #[test]
    fn resize_never_below_minimum_or_outside_container() {
        let mut surface = FakeSurface::new(640.0, 360.0);
        let hs = placed(600.0, 320.0, 40.0, 40.0);
        let set = HotspotSet::new(vec![hs.clone()]);
        let mut ic = InteractionController::new();
        ic.begin_resize(true, &hs, Corner::SouthWest, Point::new(600.0, 360.0), &mut surface);

        for p in [
            Point::new(900.0, 0.0),
            Point::new(-400.0, 900.0),
            Point::new(600.0, 360.0),
        ] {
            let r = ic.pointer_move(p, &set, surface.size).unwrap();
            assert!(fits_within(&r, surface.size), "{r:?}");
        }
    }

    // -----------------------------------------------------------------------
    // scrub
    // -----------------------------------------------------------------------

    #[test]
    fn scrub_converts_pixels_to_time() {
        let mut surface = FakeSurface::new(640.0, 360.0);
        let hs = make_hotspot(10.0, 20.0);
        let set = HotspotSet::new(vec![hs.clone()]);
        let mut ic = InteractionController::new();
        // 600 px for 60 s: 10 px per second.
        ic.begin_scrub(true, &hs, TimeMarker::Start, 100.0, 600.0, Some(secs(60.0)), &mut surface);

        let r = ic.pointer_move(Point::new(150.0, 0.0), &set, surface.size).unwrap();
        assert_eq!(r.start_time, secs(15.0));
        let r = ic.pointer_move(Point::new(0.0, 0.0), &set, surface.size).unwrap();
        assert_eq!(r.start_time, secs(0.0));
    }

    #[test]
    fn scrub_start_cannot_pass_end() {
        let mut surface = FakeSurface::new(640.0, 360.0);
        let hs = make_hotspot(10.0, 20.0);
        let set = HotspotSet::new(vec![hs.clone()]);
        let mut ic = InteractionController::new();
        ic.begin_scrub(true, &hs, TimeMarker::Start, 100.0, 600.0, Some(secs(60.0)), &mut surface);

        assert!(ic.pointer_move(Point::new(200.0, 0.0), &set, surface.size).is_none());
        assert!(ic.pointer_move(Point::new(250.0, 0.0), &set, surface.size).is_none());
        assert!(ic.is_active());
    }

    #[test]
    fn scrub_end_cannot_precede_start_and_caps_at_duration() {
        let mut surface = FakeSurface::new(640.0, 360.0);
        let hs = make_hotspot(10.0, 20.0);
        let set = HotspotSet::new(vec![hs.clone()]);
        let mut ic = InteractionController::new();
        ic.begin_scrub(true, &hs, TimeMarker::End, 200.0, 600.0, Some(secs(60.0)), &mut surface);

        assert!(ic.pointer_move(Point::new(100.0, 0.0), &set, surface.size).is_none());
        let r = ic.pointer_move(Point::new(5000.0, 0.0), &set, surface.size).unwrap();
        assert_eq!(r.end_time, secs(60.0));
    }

    #[test]
    fn scrub_needs_duration_and_width() {
        let mut surface = FakeSurface::new(640.0, 360.0);
        let hs = make_hotspot(10.0, 20.0);
        let mut ic = InteractionController::new();
        assert!(!ic.begin_scrub(true, &hs, TimeMarker::End, 0.0, 600.0, None, &mut surface));
        assert!(!ic.begin_scrub(true, &hs, TimeMarker::End, 0.0, 0.0, Some(secs(60.0)), &mut surface));
        assert!(!ic.begin_scrub(true, &hs, TimeMarker::End, 0.0, f64::NAN, Some(secs(60.0)), &mut surface));
    }
}
