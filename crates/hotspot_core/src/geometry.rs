use crate::config::EngineConfig;
use crate::error::{CoreError, Result};
use crate::types::*;
use tracing::warn;
use uuid::Uuid;

/// Smallest width or height a hotspot may have.
pub const MIN_HOTSPOT_SIZE: f64 = 50.0;

/// Build a new hotspot centered in the container, starting at `at_time`.
///
/// The window runs for `config.default_window_secs`, cut short at the video
/// duration when that is known.
pub fn create_default(
    at_time: TimeUs,
    container: Size,
    duration: Option<TimeUs>,
    ordinal: usize,
    config: &EngineConfig,
) -> Hotspot {
    if let Err(e) = config.validate() {
        warn!(error = %e, "engine config out of range, using defaults for new hotspot");
        return create_default(at_time, container, duration, ordinal, &EngineConfig {
            name_prefix: config.name_prefix.clone(),
            default_shape: config.default_shape,
            default_style: config.default_style.clone(),
            ..EngineConfig::default()
        });
    }

    let size = config.default_size.max(MIN_HOTSPOT_SIZE);
    let center = container.center();
    let mut end_time = at_time + TimeUs::from_seconds(config.default_window_secs);
    if let Some(d) = duration {
        end_time = end_time.min(d);
    }

    let mut hotspot = Hotspot {
        id: Uuid::new_v4(),
        name: format!("{} {}", config.name_prefix, ordinal),
        x: 0.0,
        y: 0.0,
        width: size,
        height: size,
        start_time: at_time,
        end_time,
        shape: config.default_shape,
        opacity: config.default_opacity,
        is_active: true,
        ctas: vec![],
        style: config.default_style.clone(),
    };
    let origin = clamp_position_unchecked(
        &hotspot,
        center.x - size / 2.0,
        center.y - size / 2.0,
        container,
    );
    hotspot.x = origin.x;
    hotspot.y = origin.y;
    hotspot
}

/// Clamp a proposed origin so the hotspot stays inside `bounds`.
/// Each axis is clamped to `[0, bound - size]` on its own.
pub fn clamp_position(
    hotspot: &Hotspot,
    proposed_x: f64,
    proposed_y: f64,
    bounds: Size,
) -> Result<Point> {
    check_finite(&[proposed_x, proposed_y, bounds.width, bounds.height])?;
    Ok(clamp_position_unchecked(hotspot, proposed_x, proposed_y, bounds))
}

fn clamp_position_unchecked(hotspot: &Hotspot, x: f64, y: f64, bounds: Size) -> Point {
    Point::new(
        x.min(bounds.width - hotspot.width).max(0.0),
        y.min(bounds.height - hotspot.height).max(0.0),
    )
}

/// Clamp a proposed size to `[MIN_HOTSPOT_SIZE, bound - origin]` per axis.
/// The minimum wins when the space left is smaller than it.
pub fn clamp_size(
    hotspot: &Hotspot,
    proposed_w: f64,
    proposed_h: f64,
    bounds: Size,
) -> Result<Size> {
    check_finite(&[proposed_w, proposed_h, bounds.width, bounds.height])?;
    Ok(Size::new(
        proposed_w.min(bounds.width - hotspot.x).max(MIN_HOTSPOT_SIZE),
        proposed_h.min(bounds.height - hotspot.y).max(MIN_HOTSPOT_SIZE),
    ))
}

/// Check `0 <= start < end <= duration`. The upper bound is skipped while
/// the duration is still unknown.
pub fn validate_time_range(start: TimeUs, end: TimeUs, duration: Option<TimeUs>) -> Result<()> {
    let out_of_range = start < TimeUs::ZERO
        || start >= end
        || duration.is_some_and(|d| end > d);
    if out_of_range {
        return Err(CoreError::InvalidTimeRange {
            start,
            end,
            duration: duration.unwrap_or(end),
        });
    }
    Ok(())
}

/// Whether the hotspot lies fully inside `bounds` and meets the minimum size.
pub fn fits_within(hotspot: &Hotspot, bounds: Size) -> bool {
    hotspot.x >= 0.0
        && hotspot.y >= 0.0
        && hotspot.x + hotspot.width <= bounds.width
        && hotspot.y + hotspot.height <= bounds.height
        && hotspot.width >= MIN_HOTSPOT_SIZE
        && hotspot.height >= MIN_HOTSPOT_SIZE
}

fn check_finite(values: &[f64]) -> Result<()> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(bad) => Err(CoreError::MalformedNumericInput(bad.to_string())),
        None => Ok(()),
    }
}
