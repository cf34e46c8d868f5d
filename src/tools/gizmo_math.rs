use bevy::prelude::*;

/// Ray/OBB intersection in handle-local space. The ray is transformed into
/// the box's local frame and tested against its half-extents.
pub fn ray_hits_obb(origin: Vec3, dir: Vec3, xf: &GlobalTransform, size: Vec3) -> Option<f32> {
    let inv = xf.compute_matrix().inverse();
    let local_origin = inv.transform_point3(origin);
    let local_dir = inv.transform_vector3(dir);
    let half = size * 0.5;
    ray_aabb_hit_t(local_origin, local_dir, -half, half)
}

// Slab-method ray/AABB intersection, returns the nearest non-negative t.
pub fn ray_aabb_hit_t(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        if d.abs() < f32::EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let mut t0 = (min[axis] - o) / d;
        let mut t1 = (max[axis] - o) / d;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_exit < 0.0 {
        return None;
    }
    Some(if t_enter >= 0.0 { t_enter } else { t_exit })
}

/// Parameter along `axis_dir` (through `axis_origin`) of the point closest
/// to the ray. Returns None when ray and axis are near parallel, where the
/// closest-point problem degenerates.
pub fn axis_drag_t(
    ray_origin: Vec3,
    ray_dir: Vec3,
    axis_origin: Vec3,
    axis_dir: Vec3,
) -> Option<f32> {
    let w = ray_origin - axis_origin;
    let b = ray_dir.dot(axis_dir);
    let d = ray_dir.dot(w);
    let e = axis_dir.dot(w);
    let denom = 1.0 - b * b;
    if denom.abs() < 1e-4 {
        return None;
    }
    Some((e - b * d) / denom)
}

/// Intersect a ray with the plane through `point` with normal `normal`.
pub fn ray_plane_t(ray_origin: Vec3, ray_dir: Vec3, point: Vec3, normal: Vec3) -> Option<f32> {
    let denom = ray_dir.dot(normal);
    if denom.abs() < 1e-5 {
        return None;
    }
    let t = (point - ray_origin).dot(normal) / denom;
    (t > 0.0).then_some(t)
}

/// Signed angle from `from` to `to` around `axis`, both vectors lying in the
/// plane perpendicular to the axis.
pub fn signed_angle_around_axis(axis: Vec3, from: Vec3, to: Vec3) -> f32 {
    from.cross(to).dot(axis).atan2(from.dot(to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_hit_from_outside_and_inside() {
        let t = ray_aabb_hit_t(
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::Z,
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
        )
        .unwrap();
        assert!((t - 4.0).abs() < 1e-5);

        // Ray starting inside returns the exit distance.
        let t = ray_aabb_hit_t(Vec3::ZERO, Vec3::Z, Vec3::splat(-1.0), Vec3::splat(1.0)).unwrap();
        assert!((t - 1.0).abs() < 1e-5);

        assert!(
            ray_aabb_hit_t(
                Vec3::new(5.0, 0.0, -5.0),
                Vec3::Z,
                Vec3::splat(-1.0),
                Vec3::splat(1.0)
            )
            .is_none()
        );
    }

    #[test]
    fn axis_t_tracks_the_cursor_along_the_axis() {
        // Camera above the origin looking down, dragging along +X.
        let t = axis_drag_t(
            Vec3::new(3.0, 10.0, 0.0),
            Vec3::NEG_Y,
            Vec3::ZERO,
            Vec3::X,
        )
        .unwrap();
        assert!((t - 3.0).abs() < 1e-4);
    }

    #[test]
    fn axis_t_rejects_parallel_rays() {
        assert!(axis_drag_t(Vec3::new(0.0, 1.0, 0.0), Vec3::X, Vec3::ZERO, Vec3::X).is_none());
    }

    #[test]
    fn plane_hit_point() {
        let t = ray_plane_t(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, Vec3::ZERO, Vec3::Y).unwrap();
        assert!((t - 5.0).abs() < 1e-5);
        assert!(ray_plane_t(Vec3::new(0.0, 5.0, 0.0), Vec3::X, Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn quarter_turn_is_signed() {
        let angle = signed_angle_around_axis(Vec3::Y, Vec3::X, Vec3::NEG_Z);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        let angle = signed_angle_around_axis(Vec3::Y, Vec3::X, Vec3::Z);
        assert!((angle + std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }
}
