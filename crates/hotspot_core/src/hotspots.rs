use crate::error::{CoreError, Result};
use crate::geometry::validate_time_range;
use crate::types::*;
use tracing::warn;
use uuid::Uuid;

/// Edits on the hotspot collection. Every operation leaves `self` untouched
/// and returns the replacement set; a rejected edit returns `Err` and the
/// caller keeps what it had.
impl HotspotSet {
    /// Append a hotspot. Its id must not already be present.
    pub fn with_added(&self, hotspot: Hotspot) -> Result<Self> {
        if self.get(hotspot.id).is_some() {
            return Err(CoreError::InvalidGeometry(format!(
                "hotspot id {} already in set",
                hotspot.id
            )));
        }
        let mut next = self.clone();
        next.hotspots.push(hotspot);
        Ok(next)
    }

    /// Replace the hotspot with the same id, keeping its position in the order.
    pub fn with_updated(&self, hotspot: Hotspot) -> Result<Self> {
        let idx = self.index_of(hotspot.id)?;
        let mut next = self.clone();
        next.hotspots[idx] = hotspot;
        Ok(next)
    }

    /// Drop a hotspot. Removing an unknown id yields an equal set.
    pub fn without(&self, id: Uuid) -> Self {
        Self {
            hotspots: self.hotspots.iter().filter(|h| h.id != id).cloned().collect(),
        }
    }

    /// Set both ends of the window, enforcing `0 <= start < end <= duration`.
    pub fn with_time_range(
        &self,
        id: Uuid,
        start: TimeUs,
        end: TimeUs,
        duration: Option<TimeUs>,
    ) -> Result<Self> {
        if let Err(e) = validate_time_range(start, end, duration) {
            warn!(%id, %start, %end, "rejecting time range edit");
            return Err(e);
        }
        self.with_edit(id, |h| {
            h.start_time = start;
            h.end_time = end;
            Ok(())
        })
    }

    /// Apply `MM:SS` text from the start field. The new start must be below
    /// the current end; it is floored at zero.
    pub fn with_start_text(&self, id: Uuid, text: &str) -> Result<Self> {
        let parsed = TimeUs::parse_mmss(text)?;
        let current = self.get(id).ok_or(CoreError::HotspotNotFound(id))?;
        if parsed >= current.end_time {
            return Err(CoreError::InvalidTimeRange {
                start: parsed,
                end: current.end_time,
                duration: current.end_time,
            });
        }
        self.with_edit(id, |h| {
            h.start_time = parsed.max(TimeUs::ZERO);
            Ok(())
        })
    }

    /// Apply `MM:SS` text from the end field. The new end must be above the
    /// current start; it is capped at the duration when known.
    pub fn with_end_text(&self, id: Uuid, text: &str, duration: Option<TimeUs>) -> Result<Self> {
        let parsed = TimeUs::parse_mmss(text)?;
        let current = self.get(id).ok_or(CoreError::HotspotNotFound(id))?;
        let capped = duration.map_or(parsed, |d| parsed.min(d));
        if parsed <= current.start_time || capped <= current.start_time {
            return Err(CoreError::InvalidTimeRange {
                start: current.start_time,
                end: parsed,
                duration: duration.unwrap_or(parsed),
            });
        }
        self.with_edit(id, |h| {
            h.end_time = capped;
            Ok(())
        })
    }

    pub fn renamed(&self, id: Uuid, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        self.with_edit(id, |h| {
            h.name = name;
            Ok(())
        })
    }

    pub fn with_active_toggled(&self, id: Uuid) -> Result<Self> {
        self.with_edit(id, |h| {
            h.is_active = !h.is_active;
            Ok(())
        })
    }

    pub fn with_shape(&self, id: Uuid, shape: Shape) -> Result<Self> {
        self.with_edit(id, |h| {
            h.shape = shape;
            Ok(())
        })
    }

    /// Opacity is kept within the 10%..100% slider range.
    pub fn with_opacity(&self, id: Uuid, opacity: f64) -> Result<Self> {
        if !opacity.is_finite() {
            return Err(CoreError::MalformedNumericInput(opacity.to_string()));
        }
        self.with_edit(id, |h| {
            h.opacity = opacity.clamp(0.1, 1.0);
            Ok(())
        })
    }

    pub fn with_style(&self, id: Uuid, style: HotspotStyle) -> Result<Self> {
        self.with_edit(id, |h| {
            h.style = HotspotStyle {
                border_width: style.border_width.min(10),
                ..style
            };
            Ok(())
        })
    }

    // -- CTAs ---------------------------------------------------------------

    pub fn with_cta_added(&self, id: Uuid, kind: CtaKind) -> Result<Self> {
        self.with_edit(id, |h| {
            h.ctas.push(Cta::new_default(kind));
            Ok(())
        })
    }

    pub fn with_cta_updated(&self, id: Uuid, index: usize, cta: Cta) -> Result<Self> {
        self.with_edit(id, |h| {
            let slot = h
                .ctas
                .get_mut(index)
                .ok_or(CoreError::CtaNotFound { hotspot: id, index })?;
            *slot = cta;
            Ok(())
        })
    }

    pub fn with_cta_removed(&self, id: Uuid, index: usize) -> Result<Self> {
        self.with_edit(id, |h| {
            if index >= h.ctas.len() {
                return Err(CoreError::CtaNotFound { hotspot: id, index });
            }
            h.ctas.remove(index);
            Ok(())
        })
    }

    /// Check a whole set handed in from outside: ids are unique and every
    /// window satisfies `0 <= start < end <= duration`.
    pub fn validate(&self, duration: Option<TimeUs>) -> Result<()> {
        let mut seen = std::collections::HashSet::with_capacity(self.len());
        for h in &self.hotspots {
            if !seen.insert(h.id) {
                return Err(CoreError::InvalidGeometry(format!("duplicate hotspot id {}", h.id)));
            }
            validate_time_range(h.start_time, h.end_time, duration)?;
        }
        Ok(())
    }

    // -- helpers ------------------------------------------------------------

    fn index_of(&self, id: Uuid) -> Result<usize> {
        self.hotspots
            .iter()
            .position(|h| h.id == id)
            .ok_or(CoreError::HotspotNotFound(id))
    }

    fn with_edit(&self, id: Uuid, edit: impl FnOnce(&mut Hotspot) -> Result<()>) -> Result<Self> {
        let idx = self.index_of(id)?;
        let mut next = self.clone();
        edit(&mut next.hotspots[idx])?;
        Ok(next)
    }
}
