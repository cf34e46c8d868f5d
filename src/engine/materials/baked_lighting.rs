use bevy::{
    prelude::*,
    reflect::TypePath,
    render::render_resource::{AsBindGroup, ShaderRef},
};

/// Unlit material sampling a pre-baked lighting texture, for static props
/// whose shading was computed offline. `exposure` packs an intensity
/// multiplier in x.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct BakedLightingMaterial {
    #[texture(0)]
    #[sampler(1)]
    pub bake_texture: Handle<Image>,

    #[uniform(2)]
    pub exposure: Vec4,
}

impl BakedLightingMaterial {
    pub fn new(bake_texture: Handle<Image>) -> Self {
        Self {
            bake_texture,
            exposure: Vec4::new(1.0, 0.0, 0.0, 0.0),
        }
    }
}

impl Material for BakedLightingMaterial {
    fn fragment_shader() -> ShaderRef {
        "shaders/baked_lighting.wgsl".into()
    }
}
