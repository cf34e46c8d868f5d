use bevy::prelude::*;
use bevy::render::view::NoFrustumCulling;
use bevy::window::PrimaryWindow;

use crate::constants::render_settings::{
    GIZMO_AXIS_X_COLOR, GIZMO_AXIS_Y_COLOR, GIZMO_AXIS_Z_COLOR, GIZMO_HANDLE_LENGTH,
    GIZMO_HANDLE_THICKNESS, GIZMO_RING_RADIUS, GIZMO_RING_THICKNESS, GIZMO_SCALE_CUBE_SIZE,
};
use crate::engine::camera::EditorCamera;
use crate::tools::gizmo_math::{axis_drag_t, ray_hits_obb, ray_plane_t, signed_angle_around_axis};
use crate::tools::selection::SelectionGroup;
use crate::tools::tool_manager::{GizmoMode, ToolManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GizmoAxis {
    X,
    Y,
    Z,
}

impl GizmoAxis {
    pub fn unit(&self) -> Vec3 {
        match self {
            Self::X => Vec3::X,
            Self::Y => Vec3::Y,
            Self::Z => Vec3::Z,
        }
    }

    fn color(&self) -> Color {
        match self {
            Self::X => GIZMO_AXIS_X_COLOR,
            Self::Y => GIZMO_AXIS_Y_COLOR,
            Self::Z => GIZMO_AXIS_Z_COLOR,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

/// Root entity the per-mode handle meshes hang off. Its translation follows
/// the selection centroid.
#[derive(Component)]
pub struct GizmoRoot;

#[derive(Component)]
pub struct GizmoHandle {
    pub axis: GizmoAxis,
}

/// Grab volume for a handle, in handle-local space.
#[derive(Component)]
pub struct HandleExtent(pub Vec3);

/// Which mode the currently spawned handle set belongs to.
#[derive(Resource, Default)]
pub struct BuiltHandles {
    mode: Option<GizmoMode>,
}

struct ActiveDrag {
    mode: GizmoMode,
    axis: Vec3,
    centroid: Vec3,
    start_param: f32,
    start_vector: Vec3,
    initial: Vec<(Entity, Transform)>,
}

/// In-progress handle drag. Cleared on release, and terminated early when
/// the selection empties mid-drag.
#[derive(Resource, Default)]
pub struct GizmoDragState {
    drag: Option<ActiveDrag>,
}

impl GizmoDragState {
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn end(&mut self) {
        self.drag = None;
    }

    /// Drop snapshot entries that are no longer valid targets. Returns false
    /// (and ends the drag) when nothing is left to manipulate.
    fn retain_valid(&mut self, mut still_valid: impl FnMut(Entity) -> bool) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        drag.initial.retain(|(entity, _)| still_valid(*entity));
        if drag.initial.is_empty() {
            self.drag = None;
            return false;
        }
        true
    }
}

/// Delta produced by one frame of a handle drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GizmoDelta {
    Translate(Vec3),
    Rotate { axis: Vec3, angle: f32 },
    Scale(Vec3),
}

/// Apply a drag delta to an entity's snapshot transform. Rotation orbits
/// the selection centroid so groups turn as a rigid body.
pub fn apply_delta(initial: &Transform, centroid: Vec3, delta: GizmoDelta) -> Transform {
    let mut out = *initial;
    match delta {
        GizmoDelta::Translate(offset) => {
            out.translation += offset;
        }
        GizmoDelta::Rotate { axis, angle } => {
            let spin = Quat::from_axis_angle(axis, angle);
            out.rotation = spin * initial.rotation;
            out.translation = centroid + spin * (initial.translation - centroid);
        }
        GizmoDelta::Scale(amount) => {
            out.scale = (initial.scale + amount).max(Vec3::splat(0.01));
        }
    }
    out
}

fn selection_centroid(
    group: &SelectionGroup,
    transforms: &Query<&GlobalTransform>,
) -> Option<Vec3> {
    let mut sum = Vec3::ZERO;
    let mut count = 0;
    for entity in group.iter() {
        if let Ok(transform) = transforms.get(entity) {
            sum += transform.translation();
            count += 1;
        }
    }
    (count > 0).then(|| sum / count as f32)
}

// Keeps the handle set in sync with the active mode and parks the root at
// the selection centroid. Hidden whenever there is nothing to manipulate.
pub fn sync_gizmo_to_selection(
    mut commands: Commands,
    tool_manager: Res<ToolManager>,
    group: Res<SelectionGroup>,
    mut built: ResMut<BuiltHandles>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    transforms: Query<&GlobalTransform>,
    mut roots: Query<(Entity, &mut Transform, &mut Visibility), With<GizmoRoot>>,
) {
    let mode = tool_manager.active_mode();

    if built.mode != mode {
        for (root, _, _) in &roots {
            commands.entity(root).despawn();
        }
        if let Some(mode) = mode {
            spawn_handles(&mut commands, &mut meshes, &mut materials, mode);
        }
        built.mode = mode;
        return;
    }

    let Ok((_, mut root_transform, mut visibility)) = roots.single_mut() else {
        return;
    };

    match selection_centroid(&group, &transforms) {
        Some(centroid) if mode.is_some() => {
            root_transform.translation = centroid;
            *visibility = Visibility::Visible;
        }
        _ => {
            *visibility = Visibility::Hidden;
        }
    }
}

fn spawn_handles(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    mode: GizmoMode,
) {
    let root = commands
        .spawn((
            Transform::default(),
            Visibility::Hidden,
            GizmoRoot,
            Name::new("transform_gizmo"),
        ))
        .id();

    for axis in [GizmoAxis::X, GizmoAxis::Y, GizmoAxis::Z] {
        let material = materials.add(StandardMaterial {
            base_color: axis.color(),
            unlit: true,
            depth_bias: 100.0,
            ..default()
        });

        let (mesh, transform, extent) = match mode {
            GizmoMode::Translate => shaft_handle(meshes, axis, GIZMO_HANDLE_LENGTH),
            GizmoMode::Scale => {
                // Shaft plus end cube share one grab volume.
                let (mesh, transform, mut extent) =
                    shaft_handle(meshes, axis, GIZMO_HANDLE_LENGTH);
                extent += Vec3::splat(GIZMO_SCALE_CUBE_SIZE);
                (mesh, transform, extent)
            }
            GizmoMode::Rotate => ring_handle(meshes, axis),
        };

        let handle = commands
            .spawn((
                Mesh3d(mesh),
                MeshMaterial3d(material.clone()),
                transform,
                GizmoHandle { axis },
                HandleExtent(extent),
                NoFrustumCulling,
                Name::new(format!("gizmo_handle_{}", axis.name())),
            ))
            .id();
        commands.entity(root).add_child(handle);

        if mode == GizmoMode::Scale {
            let cube = commands
                .spawn((
                    Mesh3d(meshes.add(Cuboid::from_length(GIZMO_SCALE_CUBE_SIZE))),
                    MeshMaterial3d(material),
                    Transform::from_translation(axis.unit() * GIZMO_HANDLE_LENGTH),
                    NoFrustumCulling,
                ))
                .id();
            commands.entity(root).add_child(cube);
        }
    }
}

fn shaft_handle(
    meshes: &mut ResMut<Assets<Mesh>>,
    axis: GizmoAxis,
    length: f32,
) -> (Handle<Mesh>, Transform, Vec3) {
    let t = GIZMO_HANDLE_THICKNESS;
    let size = match axis {
        GizmoAxis::X => Vec3::new(length, t, t),
        GizmoAxis::Y => Vec3::new(t, length, t),
        GizmoAxis::Z => Vec3::new(t, t, length),
    };
    let mesh = meshes.add(Cuboid::new(size.x, size.y, size.z));
    let transform = Transform::from_translation(axis.unit() * length * 0.5);
    // Grab volume is fatter than the visual shaft.
    let extent = size + Vec3::splat(t * 3.0);
    (mesh, transform, extent)
}

fn ring_handle(
    meshes: &mut ResMut<Assets<Mesh>>,
    axis: GizmoAxis,
) -> (Handle<Mesh>, Transform, Vec3) {
    let mesh = meshes.add(Torus::new(
        GIZMO_RING_RADIUS - GIZMO_RING_THICKNESS,
        GIZMO_RING_RADIUS + GIZMO_RING_THICKNESS,
    ));
    // Torus lies in the XZ plane; rotate its normal onto the handle axis.
    let rotation = match axis {
        GizmoAxis::X => Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        GizmoAxis::Y => Quat::IDENTITY,
        GizmoAxis::Z => Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
    };
    let transform = Transform::from_rotation(rotation);
    let d = GIZMO_RING_RADIUS * 2.0 + GIZMO_RING_THICKNESS * 4.0;
    let flat = GIZMO_RING_THICKNESS * 6.0;
    let extent = match axis {
        GizmoAxis::X => Vec3::new(flat, d, d),
        GizmoAxis::Y => Vec3::new(d, flat, d),
        GizmoAxis::Z => Vec3::new(d, d, flat),
    };
    (mesh, transform, extent)
}

pub fn begin_handle_drag(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<EditorCamera>>,
    tool_manager: Res<ToolManager>,
    group: Res<SelectionGroup>,
    handles: Query<(&GlobalTransform, &GizmoHandle, &HandleExtent)>,
    roots: Query<&GlobalTransform, With<GizmoRoot>>,
    transforms: Query<&Transform, Without<GizmoRoot>>,
    mut drag_state: ResMut<GizmoDragState>,
) {
    if !buttons.just_pressed(MouseButton::Left) {
        return;
    }
    let Some(mode) = tool_manager.active_mode() else {
        return;
    };
    if group.is_empty() {
        return;
    }

    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor_pos) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(camera_transform, cursor_pos) else {
        return;
    };
    let Ok(root) = roots.single() else {
        return;
    };

    let origin = ray.origin;
    let dir = ray.direction.as_vec3();

    let mut best: Option<(f32, GizmoAxis)> = None;
    for (xf, handle, HandleExtent(extent)) in &handles {
        if let Some(t) = ray_hits_obb(origin, dir, xf, *extent) {
            if t > 0.0 && best.is_none_or(|(best_t, _)| t < best_t) {
                best = Some((t, handle.axis));
            }
        }
    }
    let Some((_, axis)) = best else {
        return;
    };

    let centroid = root.translation();
    let axis_world = axis.unit();

    let (start_param, start_vector) = match mode {
        GizmoMode::Translate | GizmoMode::Scale => {
            let Some(t) = axis_drag_t(origin, dir, centroid, axis_world) else {
                return;
            };
            (t, Vec3::ZERO)
        }
        GizmoMode::Rotate => {
            let Some(t) = ray_plane_t(origin, dir, centroid, axis_world) else {
                return;
            };
            let v = (origin + dir * t - centroid).normalize_or_zero();
            if v == Vec3::ZERO {
                return;
            }
            (0.0, v)
        }
    };

    let mut initial = Vec::new();
    for entity in group.iter() {
        if let Ok(transform) = transforms.get(entity) {
            initial.push((entity, *transform));
        }
    }
    if initial.is_empty() {
        return;
    }

    drag_state.drag = Some(ActiveDrag {
        mode,
        axis: axis_world,
        centroid,
        start_param,
        start_vector,
        initial,
    });
}

pub fn update_handle_drag(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<EditorCamera>>,
    group: Res<SelectionGroup>,
    mut transforms: Query<&mut Transform>,
    mut drag_state: ResMut<GizmoDragState>,
) {
    if !drag_state.is_dragging() {
        return;
    }
    if buttons.just_released(MouseButton::Left) {
        drag_state.end();
        return;
    }

    // The one correctness-sensitive edge case: selection emptied while a
    // drag is in progress. Terminate without touching anything.
    if !drag_state.retain_valid(|entity| group.contains(entity) && transforms.get(entity).is_ok()) {
        return;
    }

    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor_pos) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(camera_transform, cursor_pos) else {
        return;
    };

    let Some(drag) = drag_state.drag.as_ref() else {
        return;
    };
    let origin = ray.origin;
    let dir = ray.direction.as_vec3();

    let delta = match drag.mode {
        GizmoMode::Translate => {
            let Some(t) = axis_drag_t(origin, dir, drag.centroid, drag.axis) else {
                return;
            };
            GizmoDelta::Translate(drag.axis * (t - drag.start_param))
        }
        GizmoMode::Scale => {
            let Some(t) = axis_drag_t(origin, dir, drag.centroid, drag.axis) else {
                return;
            };
            GizmoDelta::Scale(drag.axis.abs() * (t - drag.start_param))
        }
        GizmoMode::Rotate => {
            let Some(t) = ray_plane_t(origin, dir, drag.centroid, drag.axis) else {
                return;
            };
            let v = (origin + dir * t - drag.centroid).normalize_or_zero();
            if v == Vec3::ZERO {
                return;
            }
            GizmoDelta::Rotate {
                axis: drag.axis,
                angle: signed_angle_around_axis(drag.axis, drag.start_vector, v),
            }
        }
    };

    for (entity, initial) in &drag.initial {
        if let Ok(mut transform) = transforms.get_mut(*entity) {
            *transform = apply_delta(initial, drag.centroid, delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    fn drag_with(targets: Vec<(Entity, Transform)>) -> GizmoDragState {
        GizmoDragState {
            drag: Some(ActiveDrag {
                mode: GizmoMode::Translate,
                axis: Vec3::X,
                centroid: Vec3::ZERO,
                start_param: 0.0,
                start_vector: Vec3::ZERO,
                initial: targets,
            }),
        }
    }

    #[test]
    fn translate_delta_moves_along_axis() {
        let initial = Transform::from_xyz(1.0, 2.0, 3.0);
        let out = apply_delta(&initial, Vec3::ZERO, GizmoDelta::Translate(Vec3::X * 2.5));
        assert_eq!(out.translation, Vec3::new(3.5, 2.0, 3.0));
        assert_eq!(out.rotation, initial.rotation);
    }

    #[test]
    fn rotate_delta_orbits_the_centroid() {
        let initial = Transform::from_xyz(2.0, 0.0, 0.0);
        let out = apply_delta(
            &initial,
            Vec3::ZERO,
            GizmoDelta::Rotate {
                axis: Vec3::Y,
                angle: std::f32::consts::FRAC_PI_2,
            },
        );
        assert!(out.translation.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-5));
    }

    #[test]
    fn scale_delta_clamps_above_zero() {
        let initial = Transform::default();
        let out = apply_delta(&initial, Vec3::ZERO, GizmoDelta::Scale(Vec3::X * -5.0));
        assert_eq!(out.scale, Vec3::new(0.01, 1.0, 1.0));
    }

    #[test]
    fn emptied_selection_terminates_the_drag() {
        let mut state = drag_with(vec![(entity(1), Transform::default())]);
        assert!(state.is_dragging());
        assert!(!state.retain_valid(|_| false));
        assert!(!state.is_dragging());
    }

    #[test]
    fn partially_emptied_selection_keeps_dragging_the_rest() {
        let keep = entity(2);
        let mut state = drag_with(vec![
            (entity(1), Transform::default()),
            (keep, Transform::default()),
        ]);
        assert!(state.retain_valid(|e| e == keep));
        assert!(state.is_dragging());
        assert_eq!(state.drag.as_ref().unwrap().initial.len(), 1);
    }
}
