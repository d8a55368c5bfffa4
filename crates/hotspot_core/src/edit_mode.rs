use crate::config::EngineConfig;
use crate::geometry::create_default;
use crate::timing::TriggerMemory;
use crate::types::*;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    View,
    Edit {
        selected: Option<Uuid>,
        creating: bool,
    },
}

impl EditMode {
    pub fn is_edit(&self) -> bool {
        matches!(self, EditMode::Edit { .. })
    }

    pub fn selected(&self) -> Option<Uuid> {
        match self {
            EditMode::Edit { selected, .. } => *selected,
            EditMode::View => None,
        }
    }

    pub fn is_creating(&self) -> bool {
        matches!(self, EditMode::Edit { creating: true, .. })
    }

    /// Switch between view and edit. Either direction starts from a clean
    /// selection and forgets which hotspots fired.
    pub fn toggle(&mut self, memory: &mut TriggerMemory) {
        *self = match *self {
            EditMode::View => EditMode::Edit {
                selected: None,
                creating: false,
            },
            EditMode::Edit { .. } => EditMode::View,
        };
        memory.clear();
        info!(edit = self.is_edit(), "edit mode toggled");
    }

    /// Select a hotspot, or clear with `None`. No-op in view mode.
    pub fn select(&mut self, id: Option<Uuid>) {
        if let EditMode::Edit { selected, .. } = self {
            *selected = id;
        }
    }

    /// Arm or disarm "click to add hotspot". No-op in view mode.
    pub fn set_creating(&mut self, on: bool) {
        if let EditMode::Edit { creating, .. } = self {
            *creating = on;
        }
    }

    /// A click on the video surface, away from any hotspot. While creating,
    /// this adds a default hotspot at the container midpoint (the click
    /// position is not used), selects it and disarms creation.
    pub fn click_surface(
        &mut self,
        hotspots: &HotspotSet,
        current_time: TimeUs,
        container: Size,
        duration: Option<TimeUs>,
        config: &EngineConfig,
    ) -> Option<HotspotSet> {
        let EditMode::Edit { selected, creating } = self else {
            return None;
        };
        if !*creating {
            return None;
        }

        let hotspot = create_default(current_time, container, duration, hotspots.len() + 1, config);
        let id = hotspot.id;
        // Fresh uuids never collide with existing ids.
        let next = hotspots.with_added(hotspot).ok()?;
        *selected = Some(id);
        *creating = false;
        info!(%id, "hotspot created");
        Some(next)
    }

    /// Remove a hotspot; the selection is cleared if it pointed at it.
    pub fn delete_hotspot(&mut self, hotspots: &HotspotSet, id: Uuid) -> HotspotSet {
        if self.selected() == Some(id) {
            self.select(None);
        }
        hotspots.without(id)
    }
}
