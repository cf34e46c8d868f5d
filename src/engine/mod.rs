//! Engine-facing extensions: cameras, off-screen passes, materials, audio,
//! and animation helpers registered against Bevy's plugin surface.

/// Sound playback with an explicit session lifecycle.
pub mod audio;

/// Orbit viewport camera the pointer tools raycast through.
pub mod camera;

/// Custom surface materials with typed uniform slots.
pub mod materials;

/// Screen-corner axis triad tracking the viewport orientation.
pub mod navigation_gizmo;

/// Framebuffer object picking with generation-counted requests.
pub mod picking;

/// Selection outline mask and fullscreen composite pass.
pub mod render;

/// Way-point path assets and follower animation.
pub mod waypoint;
