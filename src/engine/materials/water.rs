use bevy::{
    prelude::*,
    reflect::TypePath,
    render::render_resource::{AsBindGroup, ShaderRef},
};

/// Water shader with vertex-displaced waves and depth-tinted color.
///
/// `params` packs wave amplitude, wave frequency, wave speed, and surface
/// opacity into one vector.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct WaterMaterial {
    #[uniform(0)]
    pub deep_color: LinearRgba,

    #[uniform(1)]
    pub shallow_color: LinearRgba,

    #[uniform(2)]
    pub params: Vec4,
}

impl Default for WaterMaterial {
    fn default() -> Self {
        Self {
            deep_color: LinearRgba::new(0.02, 0.12, 0.25, 1.0),
            shallow_color: LinearRgba::new(0.1, 0.5, 0.6, 1.0),
            params: Vec4::new(0.08, 1.6, 0.9, 0.85),
        }
    }
}

impl Material for WaterMaterial {
    fn vertex_shader() -> ShaderRef {
        "shaders/water.wgsl".into()
    }

    fn fragment_shader() -> ShaderRef {
        "shaders/water.wgsl".into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        AlphaMode::Blend
    }
}
