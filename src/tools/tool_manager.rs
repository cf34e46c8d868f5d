use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Enumeration of gizmo manipulation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GizmoMode {
    Translate,
    Rotate,
    Scale,
}

impl GizmoMode {
    /// Convert string identifier to mode for toolbar compatibility.
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "translate" => Some(Self::Translate),
            "rotate" => Some(Self::Rotate),
            "scale" => Some(Self::Scale),
            _ => None,
        }
    }

    /// Convert mode to string identifier for UI display.
    pub fn to_string(&self) -> &'static str {
        match self {
            Self::Translate => "translate",
            Self::Rotate => "rotate",
            Self::Scale => "scale",
        }
    }
}

/// Resource tracking the currently active gizmo mode.
///
/// `None` is the initial state; exactly one mode is active otherwise.
/// Transitions are driven externally (keyboard or [`GizmoModeEvent`]),
/// never by the selection logic itself.
#[derive(Resource, Default)]
pub struct ToolManager {
    active_mode: Option<GizmoMode>,
}

impl ToolManager {
    /// Activate the given mode, replacing the previous one. Returns false
    /// when the mode was already active and nothing changed.
    pub fn activate(&mut self, mode: GizmoMode) -> bool {
        if self.active_mode == Some(mode) {
            return false;
        }
        self.active_mode = Some(mode);
        info!("gizmo mode activated: {}", mode.to_string());
        true
    }

    /// Deactivate the current mode, returning it.
    pub fn deactivate(&mut self) -> Option<GizmoMode> {
        let previous = self.active_mode.take();
        if let Some(mode) = previous {
            info!("gizmo mode deactivated: {}", mode.to_string());
        }
        previous
    }

    pub fn active_mode(&self) -> Option<GizmoMode> {
        self.active_mode
    }

    pub fn is_active(&self, mode: GizmoMode) -> bool {
        self.active_mode == Some(mode)
    }
}

/// Event fired when the gizmo mode changes via toolbar or keyboard.
#[derive(Event)]
pub struct GizmoModeEvent {
    pub mode: Option<GizmoMode>,
}

pub fn handle_gizmo_mode_events(
    mut events: EventReader<GizmoModeEvent>,
    mut tool_manager: ResMut<ToolManager>,
) {
    for event in events.read() {
        match event.mode {
            Some(mode) => {
                tool_manager.activate(mode);
            }
            None => {
                tool_manager.deactivate();
            }
        }
    }
}

// W/E/R switch modes, Tab clears back to the inactive state.
pub fn gizmo_mode_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut events: EventWriter<GizmoModeEvent>,
) {
    if keyboard.just_pressed(KeyCode::KeyW) {
        events.write(GizmoModeEvent {
            mode: Some(GizmoMode::Translate),
        });
    }
    if keyboard.just_pressed(KeyCode::KeyE) {
        events.write(GizmoModeEvent {
            mode: Some(GizmoMode::Rotate),
        });
    }
    if keyboard.just_pressed(KeyCode::KeyR) {
        events.write(GizmoModeEvent {
            mode: Some(GizmoMode::Scale),
        });
    }
    if keyboard.just_pressed(KeyCode::Tab) {
        events.write(GizmoModeEvent { mode: None });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_inactive() {
        let manager = ToolManager::default();
        assert_eq!(manager.active_mode(), None);
    }

    #[test]
    fn exactly_one_mode_active_after_transitions() {
        let mut manager = ToolManager::default();
        assert!(manager.activate(GizmoMode::Translate));
        assert!(manager.activate(GizmoMode::Rotate));
        assert!(manager.is_active(GizmoMode::Rotate));
        assert!(!manager.is_active(GizmoMode::Translate));
    }

    #[test]
    fn reactivating_the_active_mode_reports_no_change() {
        let mut manager = ToolManager::default();
        manager.activate(GizmoMode::Scale);
        assert!(!manager.activate(GizmoMode::Scale));
    }

    #[test]
    fn deactivate_returns_previous_mode() {
        let mut manager = ToolManager::default();
        manager.activate(GizmoMode::Rotate);
        assert_eq!(manager.deactivate(), Some(GizmoMode::Rotate));
        assert_eq!(manager.deactivate(), None);
    }

    #[test]
    fn mode_string_round_trip() {
        for mode in [GizmoMode::Translate, GizmoMode::Rotate, GizmoMode::Scale] {
            assert_eq!(GizmoMode::from_string(mode.to_string()), Some(mode));
        }
        assert_eq!(GizmoMode::from_string("bend"), None);
    }
}
