use bevy::{
    prelude::*,
    reflect::TypePath,
    render::render_resource::{AsBindGroup, ShaderRef},
};

/// Procedural ground grid rendered in the fragment shader.
///
/// `params` packs cell size, line width, and the distance at which lines
/// fade out.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct GridMaterial {
    #[uniform(0)]
    pub line_color: LinearRgba,

    #[uniform(1)]
    pub base_color: LinearRgba,

    #[uniform(2)]
    pub params: Vec4,
}

impl Default for GridMaterial {
    fn default() -> Self {
        Self {
            line_color: LinearRgba::new(0.85, 0.85, 0.85, 0.6),
            base_color: LinearRgba::new(0.12, 0.12, 0.13, 1.0),
            params: Vec4::new(1.0, 0.02, 60.0, 0.0),
        }
    }
}

impl Material for GridMaterial {
    fn fragment_shader() -> ShaderRef {
        "shaders/grid.wgsl".into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        AlphaMode::Blend
    }
}
