use crate::types::*;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Hotspots that have already fired during the current playback pass.
/// Cleared on seek, on edit-mode toggle and when the source changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerMemory {
    fired: HashSet<Uuid>,
}

impl TriggerMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.fired.contains(&id)
    }

    /// Returns false if the id was already recorded.
    pub fn mark(&mut self, id: Uuid) -> bool {
        self.fired.insert(id)
    }

    pub fn clear(&mut self) {
        if !self.fired.is_empty() {
            debug!(count = self.fired.len(), "clearing trigger memory");
        }
        self.fired.clear();
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}

/// Hotspots to render at `time`. Inactive hotspots never render; in edit
/// mode every active hotspot renders regardless of its window.
pub fn visible_hotspots(time: TimeUs, hotspots: &HotspotSet, edit_mode: bool) -> Vec<&Hotspot> {
    hotspots
        .iter()
        .filter(|h| h.is_active && (edit_mode || h.contains_time(time)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoPauseRequest {
    pub hotspot_id: Uuid,
    pub duration: Duration,
}

/// Decide whether a hotspot newly fires at `time`.
///
/// At most one hotspot fires per tick: the first, in set order, that is
/// active, contains `time`, has not fired this pass and whose first CTA
/// asks for a positive pause. The winner is recorded in `memory`.
pub fn evaluate_tick(
    time: TimeUs,
    hotspots: &HotspotSet,
    edit_mode: bool,
    manual_pause: bool,
    memory: &mut TriggerMemory,
) -> Option<AutoPauseRequest> {
    if edit_mode || manual_pause {
        return None;
    }

    let (hotspot, seconds) = hotspots.iter().find_map(|h| {
        if !h.is_active || !h.contains_time(time) || memory.contains(h.id) {
            return None;
        }
        let seconds = h.ctas.first()?.auto_pause_seconds()?;
        Some((h, seconds))
    })?;

    memory.mark(hotspot.id);
    debug!(id = %hotspot.id, %time, seconds, "hotspot fired");
    Some(AutoPauseRequest {
        hotspot_id: hotspot.id,
        duration: Duration::from_secs(seconds),
    })
}

/// What a click on a hotspot does outside edit mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    ShowMessage(String),
    OpenUrl(String),
}

/// A message CTA wins over a URL CTA. CTAs with an empty value are skipped.
pub fn resolve_click(hotspot: &Hotspot) -> Option<ClickAction> {
    let mut message = None;
    let mut url = None;
    for cta in &hotspot.ctas {
        match &cta.action {
            CtaAction::Message(text) => {
                message.get_or_insert(text);
            }
            CtaAction::Url(href) => {
                url.get_or_insert(href);
            }
        }
    }

    match (message, url) {
        (Some(text), _) if !text.is_empty() => Some(ClickAction::ShowMessage(text.clone())),
        (_, Some(href)) if !href.is_empty() => Some(ClickAction::OpenUrl(href.clone())),
        _ => None,
    }
}
