use bevy::{
    prelude::*,
    reflect::TypePath,
    render::render_resource::{AsBindGroup, ShaderRef},
};

/// Flattens the mesh onto a ground plane along the light direction and
/// shades it with a constant shadow color. Rendered as a second mesh
/// instance below the caster.
///
/// `light_plane` packs the light direction (xyz) and the plane height (w).
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct PlanarShadowMaterial {
    #[uniform(0)]
    pub shadow_color: LinearRgba,

    #[uniform(1)]
    pub light_plane: Vec4,
}

impl Default for PlanarShadowMaterial {
    fn default() -> Self {
        Self {
            shadow_color: LinearRgba::new(0.0, 0.0, 0.0, 0.45),
            light_plane: Vec4::new(0.4, -1.0, 0.3, 0.001),
        }
    }
}

impl Material for PlanarShadowMaterial {
    fn vertex_shader() -> ShaderRef {
        "shaders/planar_shadow.wgsl".into()
    }

    fn fragment_shader() -> ShaderRef {
        "shaders/planar_shadow.wgsl".into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        AlphaMode::Blend
    }
}
