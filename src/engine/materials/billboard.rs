use bevy::{
    prelude::*,
    reflect::TypePath,
    render::render_resource::{AsBindGroup, ShaderRef},
};

/// Camera-facing quad material. The vertex shader rebuilds the quad in view
/// space so the mesh always faces the viewer; `size` is the world-space
/// half extent of the quad.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct BillboardMaterial {
    #[texture(0)]
    #[sampler(1)]
    pub texture: Handle<Image>,

    #[uniform(2)]
    pub tint: LinearRgba,

    #[uniform(3)]
    pub size: Vec4,
}

impl BillboardMaterial {
    pub fn new(texture: Handle<Image>, half_extent: Vec2) -> Self {
        Self {
            texture,
            tint: LinearRgba::WHITE,
            size: Vec4::new(half_extent.x, half_extent.y, 0.0, 0.0),
        }
    }
}

impl Material for BillboardMaterial {
    fn vertex_shader() -> ShaderRef {
        "shaders/billboard.wgsl".into()
    }

    fn fragment_shader() -> ShaderRef {
        "shaders/billboard.wgsl".into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        AlphaMode::Blend
    }
}
