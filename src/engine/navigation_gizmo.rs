use bevy::prelude::*;
use bevy::render::camera::Viewport;
use bevy::render::view::RenderLayers;
use bevy::window::{PrimaryWindow, WindowResized};

use crate::constants::render_settings::{
    GIZMO_AXIS_X_COLOR, GIZMO_AXIS_Y_COLOR, GIZMO_AXIS_Z_COLOR, NAV_GIZMO_LAYER,
    NAV_GIZMO_VIEWPORT_SIZE,
};
use crate::engine::camera::EditorCamera;

#[derive(Component)]
pub struct NavGizmoCamera;

#[derive(Component)]
pub struct NavigationGizmo;

pub struct NavigationGizmoPlugin;

impl Plugin for NavigationGizmoPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, create_navigation_gizmo)
            .add_systems(Update, (update_navigation_camera, reposition_nav_viewport));
    }
}

/// Axis triad rendered by a small overlay camera in the top-right corner.
/// The overlay camera mirrors the editor camera's orientation, so the triad
/// always shows where the world axes point.
pub fn create_navigation_gizmo(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let layers = RenderLayers::layer(NAV_GIZMO_LAYER);

    let widget = commands
        .spawn((
            Transform::default(),
            Visibility::Visible,
            NavigationGizmo,
            layers.clone(),
            Name::new("navigation_gizmo"),
        ))
        .id();

    for (axis, color) in [
        (Vec3::X, GIZMO_AXIS_X_COLOR),
        (Vec3::Y, GIZMO_AXIS_Y_COLOR),
        (Vec3::Z, GIZMO_AXIS_Z_COLOR),
    ] {
        let material = materials.add(StandardMaterial {
            base_color: color,
            unlit: true,
            ..default()
        });
        let size = Vec3::splat(0.12) + axis.abs() * 0.88;
        let arm = commands
            .spawn((
                Mesh3d(meshes.add(Cuboid::new(size.x, size.y, size.z))),
                MeshMaterial3d(material.clone()),
                Transform::from_translation(axis * 0.5),
                layers.clone(),
            ))
            .id();
        let tip = commands
            .spawn((
                Mesh3d(meshes.add(Sphere::new(0.14))),
                MeshMaterial3d(material),
                Transform::from_translation(axis),
                layers.clone(),
            ))
            .id();
        commands.entity(widget).add_child(arm);
        commands.entity(widget).add_child(tip);
    }

    let viewport = windows
        .single()
        .ok()
        .map(|window| corner_viewport(window.physical_width()));

    commands.spawn((
        Camera3d::default(),
        Camera {
            order: 10,
            viewport,
            clear_color: ClearColorConfig::None,
            ..default()
        },
        Transform::from_translation(Vec3::new(0.0, 0.0, 4.0)).looking_at(Vec3::ZERO, Vec3::Y),
        layers,
        NavGizmoCamera,
        Name::new("nav_gizmo_camera"),
    ));
}

fn corner_viewport(window_width: u32) -> Viewport {
    let size = NAV_GIZMO_VIEWPORT_SIZE;
    Viewport {
        physical_position: UVec2::new(window_width.saturating_sub(size), 0),
        physical_size: UVec2::splat(size),
        ..default()
    }
}

// The overlay camera orbits the triad with the editor camera's rotation.
pub fn update_navigation_camera(
    editor_camera: Query<&GlobalTransform, (With<EditorCamera>, Without<NavGizmoCamera>)>,
    mut nav_camera: Query<&mut Transform, With<NavGizmoCamera>>,
) {
    let (Ok(editor_transform), Ok(mut nav_transform)) =
        (editor_camera.single(), nav_camera.single_mut())
    else {
        return;
    };

    let rotation = editor_transform.compute_transform().rotation;
    *nav_transform =
        Transform::from_translation(rotation * Vec3::new(0.0, 0.0, 4.0)).looking_at(Vec3::ZERO, rotation * Vec3::Y);
}

pub fn reposition_nav_viewport(
    mut resized: EventReader<WindowResized>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut nav_camera: Query<&mut Camera, With<NavGizmoCamera>>,
) {
    if resized.read().last().is_none() {
        return;
    }
    let (Ok(window), Ok(mut camera)) = (windows.single(), nav_camera.single_mut()) else {
        return;
    };
    camera.viewport = Some(corner_viewport(window.physical_width()));
}
