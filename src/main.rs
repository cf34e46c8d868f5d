use bevy::asset::{AssetMetaCheck, RenderAssetUsages};
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::window::PresentMode;

use scene_editor_toolkit::engine::audio::{PlaySound, SoundLibrary, SoundPlayerPlugin};
use scene_editor_toolkit::engine::camera::{EditorCamera, OrbitCamera, camera_controller};
use scene_editor_toolkit::engine::materials::{
    BakedLightingMaterial, BillboardMaterial, GridMaterial, PlanarShadowMaterial,
    ToolkitMaterialsPlugin, WaterMaterial,
};
use scene_editor_toolkit::engine::navigation_gizmo::NavigationGizmoPlugin;
use scene_editor_toolkit::engine::picking::{FramebufferPickingPlugin, Pickable};
use scene_editor_toolkit::engine::render::outline_post_processing::{
    OutlinePostProcessPlugin, OutlineSettings,
};
use scene_editor_toolkit::engine::waypoint::{WaypointFollower, WaypointPath, WaypointPlugin};
use scene_editor_toolkit::tools::EditorToolsPlugin;
use scene_editor_toolkit::tools::selection::{Selectable, SelectionChanged};

fn main() {
    let mut app = create_app();

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            app.run();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.run();
    }
}

fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .add_plugins(ToolkitMaterialsPlugin)
        .add_plugins(FramebufferPickingPlugin)
        .add_plugins(OutlinePostProcessPlugin)
        .add_plugins(EditorToolsPlugin)
        .add_plugins(NavigationGizmoPlugin)
        .add_plugins(SoundPlayerPlugin)
        .add_plugins(WaypointPlugin);

    app.init_resource::<OrbitCamera>()
        .add_systems(Startup, setup)
        .add_systems(Update, (camera_controller, selection_feedback_sound));

    app
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}

fn create_window_config() -> Window {
    #[cfg(target_arch = "wasm32")]
    {
        Window {
            canvas: Some("#bevy".into()),
            fit_canvas_to_parent: true,
            prevent_default_event_handling: false,
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        Window {
            title: "scene editor toolkit".into(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }
}

/// Demo scene: gridded ground, a water pool, a ring of pickable props, and
/// a prop patrolling a way-point loop.
fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut grid_materials: ResMut<Assets<GridMaterial>>,
    mut water_materials: ResMut<Assets<WaterMaterial>>,
    mut billboard_materials: ResMut<Assets<BillboardMaterial>>,
    mut shadow_materials: ResMut<Assets<PlanarShadowMaterial>>,
    mut bake_materials: ResMut<Assets<BakedLightingMaterial>>,
    mut images: ResMut<Assets<Image>>,
    mut paths: ResMut<Assets<WaypointPath>>,
    mut library: ResMut<SoundLibrary>,
    asset_server: Res<AssetServer>,
) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 12.0, 18.0).looking_at(Vec3::ZERO, Vec3::Y),
        EditorCamera,
        IsDefaultUiCamera,
        OutlineSettings::default(),
        Name::new("editor_camera"),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(6.0, 14.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(60.0, 60.0))),
        MeshMaterial3d(grid_materials.add(GridMaterial::default())),
        Name::new("ground_grid"),
    ));

    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(10.0, 10.0).subdivisions(48))),
        MeshMaterial3d(water_materials.add(WaterMaterial::default())),
        Transform::from_xyz(-14.0, 0.15, -8.0),
        Name::new("water_pool"),
    ));

    // Pickable props for the selection tools, each with a planar shadow
    // cast onto the ground plane.
    let prop_mesh = meshes.add(Cuboid::from_length(1.0));
    let shadow_material = shadow_materials.add(PlanarShadowMaterial::default());
    for (index, position) in [
        Vec3::new(-3.0, 0.5, 0.0),
        Vec3::new(0.0, 0.5, -3.0),
        Vec3::new(3.0, 0.5, 0.0),
        Vec3::new(0.0, 0.5, 3.0),
    ]
    .into_iter()
    .enumerate()
    {
        commands.spawn((
            Mesh3d(prop_mesh.clone()),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::hsv(index as f32 * 90.0, 0.55, 0.9),
                ..default()
            })),
            Transform::from_translation(position),
            Selectable,
            Pickable,
            Name::new(format!("prop_{index}")),
        ));
        commands.spawn((
            Mesh3d(prop_mesh.clone()),
            MeshMaterial3d(shadow_material.clone()),
            Transform::from_translation(position),
            Name::new(format!("prop_{index}_shadow")),
        ));
    }

    // Pedestal shaded by an offline-baked lighting texture.
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(2.0, 0.4, 2.0))),
        MeshMaterial3d(bake_materials.add(BakedLightingMaterial::new(
            images.add(checker_image(8, 32)),
        ))),
        Transform::from_xyz(12.0, 0.2, -6.0),
        Name::new("baked_pedestal"),
    ));

    // Camera-facing marker billboard over the scene centre.
    commands.spawn((
        Mesh3d(meshes.add(Rectangle::new(1.0, 1.0))),
        MeshMaterial3d(billboard_materials.add(BillboardMaterial::new(
            images.add(marker_sprite_image(64)),
            Vec2::splat(0.8),
        ))),
        Transform::from_xyz(0.0, 3.0, 0.0),
        Name::new("centre_marker"),
    ));

    // Patrolling prop following an in-memory way-point loop.
    let patrol = paths.add(WaypointPath {
        points: vec![
            [8.0, 0.5, 8.0],
            [8.0, 0.5, -8.0],
            [-8.0, 0.5, -8.0],
            [-8.0, 0.5, 8.0],
        ],
        looped: true,
    });
    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(0.5))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.9, 0.75, 0.2),
            ..default()
        })),
        Transform::from_xyz(8.0, 0.5, 8.0),
        WaypointFollower::new(patrol, 3.0),
        Selectable,
        Pickable,
        Name::new("patrol_prop"),
    ));

    library.set_bank(asset_server.load("audio/editor.bank.json"));
}

/// Soft radial dot with a transparent rim, used by the marker billboard.
fn marker_sprite_image(size: u32) -> Image {
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    let half = size as f32 / 2.0;
    for y in 0..size {
        for x in 0..size {
            let dx = (x as f32 + 0.5 - half) / half;
            let dy = (y as f32 + 0.5 - half) / half;
            let r = (dx * dx + dy * dy).sqrt();
            let alpha = ((1.0 - r) * 3.0).clamp(0.0, 1.0);
            data.extend_from_slice(&[255, 200, 80, (alpha * 255.0) as u8]);
        }
    }
    Image::new(
        Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        data,
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    )
}

/// Two-tone checker standing in for an offline lightmap bake.
fn checker_image(cells: u32, cell_px: u32) -> Image {
    let size = cells * cell_px;
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let even = ((x / cell_px) + (y / cell_px)) % 2 == 0;
            let v: u8 = if even { 220 } else { 90 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    Image::new(
        Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        data,
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    )
}

// Audible feedback when the selection changes.
fn selection_feedback_sound(
    mut changes: EventReader<SelectionChanged>,
    mut sounds: EventWriter<PlaySound>,
) {
    for change in changes.read() {
        let name = if change.selected > 0 { "select" } else { "deselect" };
        sounds.write(PlaySound {
            name: name.to_string(),
        });
    }
}
