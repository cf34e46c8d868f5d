use bevy::platform::collections::HashSet;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::constants::render_settings::{
    BOX_SELECT_BORDER, BOX_SELECT_FILL, BOX_SELECT_THRESHOLD,
};
use crate::engine::camera::EditorCamera;
use crate::tools::selection::{Selectable, SelectionGroup};
use crate::tools::transform_gizmo::GizmoDragState;

/// Screen-space rectangle spanned by a drag, normalised so that
/// `min.x <= max.x` and `min.y <= max.y` whatever direction the drag took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl SelectionRect {
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

/// Drag state for the box selection interaction.
///
/// `pending` is set on pointer-down over empty space; the rectangle only
/// becomes `active` once the drag exceeds [`BOX_SELECT_THRESHOLD`] pixels,
/// so a plain click never flashes a zero-size box.
#[derive(Resource, Default)]
pub struct BoxSelectionState {
    pending: bool,
    active: bool,
    anchor: Vec2,
    current: Vec2,
    previous_selection: Vec<Entity>,
}

impl BoxSelectionState {
    pub fn begin(&mut self, anchor: Vec2) {
        self.pending = true;
        self.active = false;
        self.anchor = anchor;
        self.current = anchor;
    }

    /// Record pointer movement; returns the current rect once the drag has
    /// exceeded the activation threshold.
    pub fn update(&mut self, point: Vec2) -> Option<SelectionRect> {
        if !self.pending {
            return None;
        }
        self.current = point;
        if !self.active && (point - self.anchor).length() > BOX_SELECT_THRESHOLD {
            self.active = true;
        }
        self.active.then(|| self.rect())
    }

    /// End the drag. Idempotent: ending an already-ended drag is a no-op.
    pub fn end(&mut self) {
        self.pending = false;
        self.active = false;
        self.previous_selection.clear();
    }

    pub fn rect(&self) -> SelectionRect {
        SelectionRect::from_corners(self.anchor, self.current)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True while a drag that crossed the activation threshold has not been
    /// ended yet. Click-selection consults this to skip the release event.
    pub fn activated_this_drag(&self) -> bool {
        self.active
    }
}

#[derive(Component)]
pub struct SelectionOverlay;

// Pointer-down arms a pending drag, pointer-move resizes the rectangle and
// refreshes the group from projected entity positions, pointer-up finalises.
pub fn handle_box_selection(
    mut box_state: ResMut<BoxSelectionState>,
    drag_state: Res<GizmoDragState>,
    mouse: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<EditorCamera>>,
    selectables: Query<(Entity, &GlobalTransform), With<Selectable>>,
    mut group: ResMut<SelectionGroup>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor_pos) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };

    let shift_held = keyboard.pressed(KeyCode::ShiftLeft) || keyboard.pressed(KeyCode::ShiftRight);

    if mouse.just_pressed(MouseButton::Left) {
        // A grabbed gizmo handle owns this drag.
        if drag_state.is_dragging() {
            return;
        }
        box_state.begin(cursor_pos);
        box_state.previous_selection = if shift_held {
            group.iter().collect()
        } else {
            Vec::new()
        };
    } else if mouse.pressed(MouseButton::Left) {
        let Some(rect) = box_state.update(cursor_pos) else {
            return;
        };

        // Replace (or, additive, extend) the group with everything whose
        // projected viewport position falls inside the rect.
        let mut desired: HashSet<Entity> = box_state.previous_selection.iter().copied().collect();
        for (entity, transform) in &selectables {
            let Ok(screen_pos) = camera.world_to_viewport(camera_transform, transform.translation())
            else {
                continue;
            };
            if rect.contains(screen_pos) {
                desired.insert(entity);
            }
        }
        group.replace(desired);
    } else if mouse.just_released(MouseButton::Left) {
        box_state.end();
    }
}

// Overlay node is created lazily on the first drag, then hidden and reused
// across drags. Hiding an already-hidden overlay is a no-op.
pub fn update_box_overlay(
    mut commands: Commands,
    box_state: Res<BoxSelectionState>,
    mut overlays: Query<(&mut Node, &mut Visibility), With<SelectionOverlay>>,
) {
    let Ok((mut node, mut visibility)) = overlays.single_mut() else {
        if box_state.is_active() {
            spawn_overlay(&mut commands, box_state.rect());
        }
        return;
    };

    if box_state.is_active() {
        let rect = box_state.rect();
        node.left = Val::Px(rect.min.x);
        node.top = Val::Px(rect.min.y);
        node.width = Val::Px(rect.width());
        node.height = Val::Px(rect.height());
        *visibility = Visibility::Visible;
    } else {
        *visibility = Visibility::Hidden;
    }
}

fn spawn_overlay(commands: &mut Commands, rect: SelectionRect) {
    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(rect.min.x),
            top: Val::Px(rect.min.y),
            width: Val::Px(rect.width()),
            height: Val::Px(rect.height()),
            border: UiRect::all(Val::Px(1.0)),
            ..default()
        },
        BackgroundColor(BOX_SELECT_FILL),
        BorderColor(BOX_SELECT_BORDER),
        Visibility::Visible,
        SelectionOverlay,
        Name::new("box_selection_overlay"),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_is_normalised_for_all_drag_directions() {
        let anchor = Vec2::new(40.0, 40.0);
        for corner in [
            Vec2::new(80.0, 90.0),
            Vec2::new(10.0, 90.0),
            Vec2::new(80.0, 5.0),
            Vec2::new(10.0, 5.0),
        ] {
            let rect = SelectionRect::from_corners(anchor, corner);
            assert!(rect.min.x <= rect.max.x);
            assert!(rect.min.y <= rect.max.y);
        }
    }

    #[test]
    fn reverse_drag_yields_expected_rect() {
        let rect = SelectionRect::from_corners(Vec2::new(50.0, 50.0), Vec2::new(10.0, 10.0));
        assert_eq!(rect.min, Vec2::new(10.0, 10.0));
        assert_eq!(rect.max, Vec2::new(50.0, 50.0));
        assert_eq!(rect.width(), 40.0);
        assert_eq!(rect.height(), 40.0);
    }

    #[test]
    fn drag_below_threshold_never_activates() {
        let mut state = BoxSelectionState::default();
        state.begin(Vec2::new(100.0, 100.0));
        assert!(state.update(Vec2::new(101.0, 101.0)).is_none());
        assert!(!state.is_active());
    }

    #[test]
    fn ending_twice_is_a_no_op() {
        let mut state = BoxSelectionState::default();
        state.begin(Vec2::ZERO);
        state.update(Vec2::new(20.0, 20.0));
        assert!(state.is_active());
        state.end();
        assert!(!state.is_active());
        state.end();
        assert!(!state.is_active());
        assert!(state.update(Vec2::new(30.0, 30.0)).is_none());
    }
}
