//! Interactive viewport tools for selecting and transforming scene entities.
//!
//! Provides click and box selection backed by the framebuffer picker, a
//! shared selection group with change events, and a translate/rotate/scale
//! transform gizmo driven by a unified tool manager.
//!
//! ## Interaction flow
//!
//! ```text
//! Pointer input
//!   ├─> begin/update_handle_drag     (gizmo handles own the drag)
//!   ├─> handle_box_selection         (drag on empty space draws the box)
//!   └─> click_select                 (plain click asks the picker)
//!         └─> PickCompleted ─> apply_click_pick ─> SelectionGroup
//! SelectionGroup ─> SelectionChanged ─> gizmo handle placement, outline mask
//! ```
//!
//! Within a frame, pointer systems run in a fixed chain so that a released
//! gizmo drag or an active box drag always wins over click selection.

/// Screen-space drag rectangle and its reusable overlay node.
///
/// The rectangle is normalised with element-wise min/max so drags in any
/// direction produce a valid region.
pub mod box_selection;

/// Ray intersection and drag parameterisation helpers for gizmo handles.
pub mod gizmo_math;

/// Shared selection group with set semantics and change events.
pub mod selection;

/// Gizmo mode state machine coordinating exclusive mode activation.
pub mod tool_manager;

/// Translate/rotate/scale handle meshes and drag manipulation.
pub mod transform_gizmo;

use bevy::prelude::*;

use crate::engine::picking::PickCompleted;
use box_selection::{BoxSelectionState, handle_box_selection, update_box_overlay};
use selection::{
    PendingClickPick, SelectionChanged, SelectionGroup, apply_click_pick, click_select,
    deselect_on_escape, flush_selection_changes, prune_despawned,
};
use tool_manager::{
    GizmoModeEvent, ToolManager, gizmo_mode_shortcuts, handle_gizmo_mode_events,
};
use transform_gizmo::{
    BuiltHandles, GizmoDragState, begin_handle_drag, sync_gizmo_to_selection, update_handle_drag,
};

// Registers selection, box selection, and gizmo resources and systems.
pub struct EditorToolsPlugin;

impl Plugin for EditorToolsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SelectionGroup>()
            .init_resource::<BoxSelectionState>()
            .init_resource::<PendingClickPick>()
            .init_resource::<ToolManager>()
            .init_resource::<BuiltHandles>()
            .init_resource::<GizmoDragState>()
            .add_event::<SelectionChanged>()
            .add_event::<GizmoModeEvent>()
            // Registered here too so the tools run without the picking plugin.
            .add_event::<PickCompleted>()
            .add_systems(
                Update,
                (
                    gizmo_mode_shortcuts,
                    handle_gizmo_mode_events,
                    // Pointer systems are ordered: click selection must see
                    // drag state before the drags reset it on release.
                    click_select,
                    begin_handle_drag,
                    update_handle_drag,
                    handle_box_selection,
                    update_box_overlay,
                    apply_click_pick,
                    deselect_on_escape,
                    prune_despawned,
                    sync_gizmo_to_selection,
                    flush_selection_changes,
                )
                    .chain(),
            );
    }
}
