//! Custom surface materials with typed uniform slots.

pub mod baked_lighting;
pub mod billboard;
pub mod grid;
pub mod planar_shadow;
pub mod water;

use bevy::prelude::*;

pub use baked_lighting::BakedLightingMaterial;
pub use billboard::BillboardMaterial;
pub use grid::GridMaterial;
pub use planar_shadow::PlanarShadowMaterial;
pub use water::WaterMaterial;

pub struct ToolkitMaterialsPlugin;

impl Plugin for ToolkitMaterialsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            MaterialPlugin::<WaterMaterial>::default(),
            MaterialPlugin::<GridMaterial>::default(),
            MaterialPlugin::<BillboardMaterial>::default(),
            MaterialPlugin::<PlanarShadowMaterial>::default(),
            MaterialPlugin::<BakedLightingMaterial>::default(),
        ));
    }
}
