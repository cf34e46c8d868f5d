//! Editor-style viewport tooling for Bevy: selection, transform gizmos,
//! framebuffer picking, outlines, custom materials, sound, and way-point
//! animation, each packaged as a plugin.

pub mod constants;
pub mod engine;
pub mod tools;
