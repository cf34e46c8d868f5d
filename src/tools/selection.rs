use bevy::platform::collections::HashSet;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::engine::picking::{PickCompleted, PickOutcome, ScenePicker};
use crate::tools::box_selection::BoxSelectionState;
use crate::tools::transform_gizmo::GizmoDragState;

/// The set of currently selected scene entities. Membership is unique and
/// insertion order is irrelevant; every effective mutation queues one
/// [`SelectionChanged`] event at the end of the frame.
#[derive(Resource, Default)]
pub struct SelectionGroup {
    entities: HashSet<Entity>,
    dirty: bool,
}

impl SelectionGroup {
    /// Insert an entity. No-op (and no change event) if already present.
    pub fn insert(&mut self, entity: Entity) -> bool {
        let added = self.entities.insert(entity);
        self.dirty |= added;
        added
    }

    /// Remove an entity. No-op if absent.
    pub fn remove(&mut self, entity: Entity) -> bool {
        let removed = self.entities.remove(&entity);
        self.dirty |= removed;
        removed
    }

    pub fn clear(&mut self) {
        if !self.entities.is_empty() {
            self.entities.clear();
            self.dirty = true;
        }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }

    /// Replace the whole membership. Marks the group changed only when the
    /// new set actually differs, so per-frame refreshes stay quiet.
    pub fn replace(&mut self, entities: HashSet<Entity>) {
        if self.entities != entities {
            self.entities = entities;
            self.dirty = true;
        }
    }

    fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

/// Fired once per frame in which the group's membership changed.
#[derive(Event)]
pub struct SelectionChanged {
    pub selected: usize,
}

/// Marks an entity as selectable by box selection; pair it with `Pickable`
/// so single clicks can resolve it through the framebuffer picker.
#[derive(Component)]
pub struct Selectable;

/// Pick request issued by a single click, waiting for its readback.
#[derive(Resource, Default)]
pub struct PendingClickPick {
    generation: Option<u64>,
    additive: bool,
}

// Single click (no drag) resolves the entity under the cursor through the
// framebuffer picker rather than a CPU raycast.
pub fn click_select(
    buttons: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    box_state: Res<BoxSelectionState>,
    drag_state: Res<GizmoDragState>,
    picker: Option<ResMut<ScenePicker>>,
    mut pending: ResMut<PendingClickPick>,
) {
    if !buttons.just_released(MouseButton::Left) {
        return;
    }
    // A box drag or a gizmo handle drag consumed this release.
    if box_state.activated_this_drag() || drag_state.is_dragging() {
        return;
    }

    let Some(mut picker) = picker else {
        return;
    };
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor_pos) = window.cursor_position() else {
        return;
    };

    pending.generation = Some(picker.request_pick(cursor_pos));
    pending.additive =
        keyboard.pressed(KeyCode::ShiftLeft) || keyboard.pressed(KeyCode::ShiftRight);
}

// Applies the picker's answer to the selection group. Stale generations are
// ignored; the picker reports them as superseded.
pub fn apply_click_pick(
    mut events: EventReader<PickCompleted>,
    mut pending: ResMut<PendingClickPick>,
    mut group: ResMut<SelectionGroup>,
) {
    for event in events.read() {
        if pending.generation != Some(event.generation) {
            continue;
        }
        pending.generation = None;

        match event.outcome {
            PickOutcome::Hit(entity) => {
                let was_selected = group.contains(entity);
                if !pending.additive {
                    group.clear();
                }
                if was_selected && pending.additive {
                    group.remove(entity);
                } else {
                    group.insert(entity);
                }
            }
            PickOutcome::Miss => {
                if !pending.additive {
                    group.clear();
                }
            }
            PickOutcome::Superseded => {}
        }
    }
}

// Deselect all on Escape key press
pub fn deselect_on_escape(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut group: ResMut<SelectionGroup>,
) {
    if keyboard.just_pressed(KeyCode::Escape) {
        group.clear();
    }
}

// Drop despawned entities from the group so consumers never see dangling ids.
pub fn prune_despawned(mut group: ResMut<SelectionGroup>, selectables: Query<(), With<Selectable>>) {
    let stale: Vec<Entity> = group
        .iter()
        .filter(|entity| selectables.get(*entity).is_err())
        .collect();
    for entity in stale {
        group.remove(entity);
    }
}

pub fn flush_selection_changes(
    mut group: ResMut<SelectionGroup>,
    mut events: EventWriter<SelectionChanged>,
) {
    if group.take_dirty() {
        events.write(SelectionChanged {
            selected: group.len(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    #[test]
    fn insert_is_idempotent() {
        let mut group = SelectionGroup::default();
        assert!(group.insert(entity(1)));
        assert!(!group.insert(entity(1)));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn contains_reflects_inserts_minus_removes() {
        let mut group = SelectionGroup::default();
        group.insert(entity(1));
        group.insert(entity(2));
        group.remove(entity(1));
        assert!(!group.contains(entity(1)));
        assert!(group.contains(entity(2)));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn redundant_mutations_do_not_mark_dirty() {
        let mut group = SelectionGroup::default();
        group.insert(entity(1));
        assert!(group.take_dirty());

        group.insert(entity(1));
        group.remove(entity(7));
        assert!(!group.take_dirty());

        group.clear();
        assert!(group.take_dirty());
        group.clear();
        assert!(!group.take_dirty());
    }
}
