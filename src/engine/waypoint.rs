//! Way-point path following.
//!
//! Paths are plain JSON assets (`*.path.json`) listing world-space points;
//! a follower component walks its transform along the segments with a
//! configurable easing curve, firing an event per reached way-point and one
//! on completion.

use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;
use serde::Deserialize;

/// Easing curves applied to each segment's interpolation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Easing {
    Linear,
    QuadraticIn,
    QuadraticOut,
    /// Hermite smoothstep, eases both ends.
    #[default]
    SmoothStep,
}

impl Easing {
    /// Evaluate at `t`, clamped to [0, 1].
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::QuadraticIn => t * t,
            Self::QuadraticOut => {
                let omt = 1.0 - t;
                1.0 - omt * omt
            }
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Ordered list of world-space way-points.
#[derive(Asset, TypePath, Debug, Clone, Deserialize)]
pub struct WaypointPath {
    pub points: Vec<[f32; 3]>,
    #[serde(default)]
    pub looped: bool,
}

impl WaypointPath {
    pub fn point(&self, index: usize) -> Option<Vec3> {
        self.points.get(index).copied().map(Vec3::from_array)
    }

    pub fn segment_count(&self) -> usize {
        match self.points.len() {
            0 | 1 => 0,
            n if self.looped => n,
            n => n - 1,
        }
    }

    fn segment(&self, index: usize) -> Option<(Vec3, Vec3)> {
        if index >= self.segment_count() {
            return None;
        }
        let from = self.point(index)?;
        let to = self.point((index + 1) % self.points.len())?;
        Some((from, to))
    }
}

/// Walks an entity's translation along a [`WaypointPath`].
#[derive(Component)]
pub struct WaypointFollower {
    pub path: Handle<WaypointPath>,
    /// Seconds spent on each segment.
    pub segment_duration: f32,
    pub easing: Easing,
    segment: usize,
    elapsed: f32,
    finished: bool,
}

impl WaypointFollower {
    pub fn new(path: Handle<WaypointPath>, segment_duration: f32) -> Self {
        Self {
            path,
            segment_duration: segment_duration.max(f32::EPSILON),
            easing: Easing::default(),
            segment: 0,
            elapsed: 0.0,
            finished: false,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance by `dt` seconds and sample the new position. Reached
    /// way-point indices and completion are reported for event dispatch.
    pub fn step(&mut self, path: &WaypointPath, dt: f32) -> FollowerStep {
        let mut step = FollowerStep::default();
        if self.finished || path.segment_count() == 0 {
            return step;
        }

        self.elapsed += dt;
        while self.elapsed >= self.segment_duration {
            self.elapsed -= self.segment_duration;
            self.segment += 1;
            step.reached.push(self.segment % path.points.len());

            if self.segment >= path.segment_count() {
                if path.looped {
                    self.segment = 0;
                } else {
                    self.finished = true;
                    step.completed = true;
                    step.position = path.point(path.points.len() - 1);
                    return step;
                }
            }
        }

        let (from, to) = match path.segment(self.segment) {
            Some(segment) => segment,
            None => return step,
        };
        let t = self.easing.evaluate(self.elapsed / self.segment_duration);
        step.position = Some(from.lerp(to, t));
        step
    }
}

#[derive(Default)]
pub struct FollowerStep {
    pub position: Option<Vec3>,
    pub reached: Vec<usize>,
    pub completed: bool,
}

/// Fired when a follower passes a way-point.
#[derive(Event)]
pub struct WaypointReached {
    pub follower: Entity,
    pub index: usize,
}

/// Fired once when a non-looping follower reaches the end of its path.
#[derive(Event)]
pub struct PathCompleted {
    pub follower: Entity,
}

pub struct WaypointPlugin;

impl Plugin for WaypointPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(JsonAssetPlugin::<WaypointPath>::new(&["path.json"]))
            .add_event::<WaypointReached>()
            .add_event::<PathCompleted>()
            .add_systems(Update, advance_followers);
    }
}

pub fn advance_followers(
    time: Res<Time>,
    paths: Res<Assets<WaypointPath>>,
    mut followers: Query<(Entity, &mut WaypointFollower, &mut Transform)>,
    mut reached_events: EventWriter<WaypointReached>,
    mut completed_events: EventWriter<PathCompleted>,
) {
    for (entity, mut follower, mut transform) in &mut followers {
        let Some(path) = paths.get(&follower.path) else {
            continue;
        };
        let step = follower.step(path, time.delta_secs());
        if let Some(position) = step.position {
            transform.translation = position;
        }
        for index in step.reached {
            reached_events.write(WaypointReached {
                follower: entity,
                index,
            });
        }
        if step.completed {
            completed_events.write(PathCompleted { follower: entity });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_path() -> WaypointPath {
        WaypointPath {
            points: vec![[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [10.0, 0.0, 10.0]],
            looped: false,
        }
    }

    #[test]
    fn path_descriptor_deserializes() {
        let path: WaypointPath =
            serde_json::from_str(r#"{ "points": [[0, 1, 2], [3, 4, 5]], "looped": true }"#)
                .unwrap();
        assert_eq!(path.point(1), Some(Vec3::new(3.0, 4.0, 5.0)));
        assert!(path.looped);

        // `looped` is optional and defaults off.
        let path: WaypointPath = serde_json::from_str(r#"{ "points": [] }"#).unwrap();
        assert!(!path.looped);
        assert_eq!(path.segment_count(), 0);
    }

    #[test]
    fn easing_endpoints_and_clamping() {
        for easing in [
            Easing::Linear,
            Easing::QuadraticIn,
            Easing::QuadraticOut,
            Easing::SmoothStep,
        ] {
            assert_eq!(easing.evaluate(0.0), 0.0);
            assert!((easing.evaluate(1.0) - 1.0).abs() < 1e-6);
            assert_eq!(easing.evaluate(-2.0), 0.0);
            assert!((easing.evaluate(3.0) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn linear_follower_samples_mid_segment() {
        let path = straight_path();
        let mut follower =
            WaypointFollower::new(Handle::default(), 1.0).with_easing(Easing::Linear);
        let step = follower.step(&path, 0.5);
        assert_eq!(step.position, Some(Vec3::new(5.0, 0.0, 0.0)));
        assert!(step.reached.is_empty());
    }

    #[test]
    fn follower_reports_reached_waypoints_and_completion() {
        let path = straight_path();
        let mut follower =
            WaypointFollower::new(Handle::default(), 1.0).with_easing(Easing::Linear);

        let step = follower.step(&path, 1.25);
        assert_eq!(step.reached, vec![1]);
        assert!(!step.completed);

        let step = follower.step(&path, 1.0);
        assert!(step.completed);
        assert!(follower.is_finished());
        assert_eq!(step.position, Some(Vec3::new(10.0, 0.0, 10.0)));

        // A finished follower stays put.
        let step = follower.step(&path, 1.0);
        assert!(step.position.is_none());
        assert!(!step.completed);
    }

    #[test]
    fn looped_path_wraps_instead_of_finishing() {
        let mut path = straight_path();
        path.looped = true;
        let mut follower =
            WaypointFollower::new(Handle::default(), 1.0).with_easing(Easing::Linear);

        // Three segments in a looped 3-point path; run past the end.
        let step = follower.step(&path, 3.5);
        assert!(!step.completed);
        assert!(!follower.is_finished());
        // Back on segment 0, half way.
        assert_eq!(step.position, Some(Vec3::new(5.0, 0.0, 0.0)));
    }
}
