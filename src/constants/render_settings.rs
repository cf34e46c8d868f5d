use bevy::prelude::*;

// Drag must exceed this many pixels before a pending box selection activates.
pub const BOX_SELECT_THRESHOLD: f32 = 3.0;

pub const BOX_SELECT_FILL: Color = Color::srgba(0.3, 0.55, 1.0, 0.12);
pub const BOX_SELECT_BORDER: Color = Color::srgba(0.3, 0.55, 1.0, 0.8);

pub const GIZMO_HANDLE_LENGTH: f32 = 1.4;
pub const GIZMO_HANDLE_THICKNESS: f32 = 0.06;
pub const GIZMO_RING_RADIUS: f32 = 1.1;
pub const GIZMO_RING_THICKNESS: f32 = 0.04;
pub const GIZMO_SCALE_CUBE_SIZE: f32 = 0.16;

pub const GIZMO_AXIS_X_COLOR: Color = Color::srgb(0.9, 0.2, 0.2);
pub const GIZMO_AXIS_Y_COLOR: Color = Color::srgb(0.2, 0.8, 0.2);
pub const GIZMO_AXIS_Z_COLOR: Color = Color::srgb(0.25, 0.45, 0.95);

pub const OUTLINE_COLOR: Color = Color::srgb(1.0, 0.62, 0.1);
pub const OUTLINE_THICKNESS: f32 = 2.0;

// Render layers. Layer 0 is the main scene.
pub const PICKING_LAYER: usize = 4;
pub const OUTLINE_MASK_LAYER: usize = 5;
pub const NAV_GIZMO_LAYER: usize = 6;

// Off-screen pick target is reallocated to track the primary window size.
pub const PICK_TARGET_DEFAULT_WIDTH: u32 = 1280;
pub const PICK_TARGET_DEFAULT_HEIGHT: u32 = 720;

pub const NAV_GIZMO_VIEWPORT_SIZE: u32 = 128;
