use bevy::{
    input::mouse::{MouseMotion, MouseWheel},
    prelude::*,
};

/// Marks the editor viewport camera the tools raycast through.
#[derive(Component)]
pub struct EditorCamera;

/// Orbit camera state: yaw/pitch around a focus point at a zoomable
/// distance. The `Transform` written each frame is derived from this.
#[derive(Resource)]
pub struct OrbitCamera {
    pub focus_point: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub last_mouse_pos: Vec2,
}

impl OrbitCamera {
    pub fn new(focus_point: Vec3, distance: f32) -> Self {
        Self {
            focus_point,
            distance,
            yaw: 0.0,
            pitch: -0.7,
            last_mouse_pos: Vec2::ZERO,
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }

    pub fn target_transform(&self) -> Transform {
        let offset = self.rotation() * Vec3::new(0.0, 0.0, self.distance);
        Transform::from_translation(self.focus_point + offset)
            .looking_at(self.focus_point, Vec3::Y)
    }

    /// Intersect the cursor ray with the ground plane at y = 0.
    pub fn mouse_to_ground_plane(
        &self,
        cursor_pos: Vec2,
        camera: &Camera,
        camera_transform: &GlobalTransform,
    ) -> Option<Vec3> {
        let ray = camera.viewport_to_world(camera_transform, cursor_pos).ok()?;
        if ray.direction.y.abs() < 0.001 {
            return None;
        }
        let t = -ray.origin.y / ray.direction.y;
        (t > 0.0).then(|| ray.origin + ray.direction * t)
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 18.0)
    }
}

// Middle mouse pans, right mouse orbits, wheel zooms. The transform eases
// toward the derived target so pointer tools see a stable camera.
pub fn camera_controller(
    mut camera_query: Query<&mut Transform, With<EditorCamera>>,
    mut orbit: ResMut<OrbitCamera>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    mut cursor_moved: EventReader<CursorMoved>,
    time: Res<Time>,
) {
    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    for cursor in cursor_moved.read() {
        orbit.last_mouse_pos = cursor.position;
    }

    for scroll in scroll_events.read() {
        let zoom_factor = if scroll.y > 0.0 { 0.9 } else { 1.1 };
        orbit.distance = (orbit.distance * zoom_factor).clamp(2.0, 500.0);
    }

    let total_motion: Vec2 = mouse_motion.read().map(|motion| motion.delta).sum();

    if mouse_button.pressed(MouseButton::Middle) && total_motion != Vec2::ZERO {
        let sensitivity = orbit.distance * 0.001;
        let yaw_rot = Quat::from_rotation_y(orbit.yaw);
        let right = yaw_rot * Vec3::X;
        let forward = yaw_rot * Vec3::Z;
        orbit.focus_point += right * -total_motion.x * sensitivity;
        orbit.focus_point += forward * -total_motion.y * sensitivity;
    }

    if mouse_button.pressed(MouseButton::Right) && total_motion != Vec2::ZERO {
        orbit.yaw -= total_motion.x * 0.005;
        orbit.pitch = (orbit.pitch - total_motion.y * 0.005).clamp(-1.5, -0.05);
    }

    let target = orbit.target_transform();
    let lerp_speed = (12.0 * time.delta_secs()).min(1.0);
    camera_transform.translation = camera_transform.translation.lerp(target.translation, lerp_speed);
    camera_transform.rotation = camera_transform.rotation.slerp(target.rotation, lerp_speed);
}
