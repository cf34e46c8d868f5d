//! Framebuffer object picking.
//!
//! Pickable entities are mirrored onto a dedicated render layer with their
//! identifier encoded as an unlit color; an off-screen camera renders that
//! layer and a one-pixel readback on the following frame resolves the
//! entity under the requested coordinates.
//!
//! ## Request protocol
//!
//! ```text
//! request_pick(x, y)
//!   └─> PickQueue (generation counter, last writer wins)
//!       └─> pick camera activated ─> id pass rendered ─> pixel readback
//!           └─> PickCompleted { generation, Hit | Miss }
//! Superseded requests complete with PickOutcome::Superseded, exactly once.
//! ```

/// Identifier color encoding and pixel decoding.
pub mod id_encoding;

/// Generation-counter pick request queue.
pub mod pick_queue;

use bevy::asset::RenderAssetUsages;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::platform::collections::HashMap;
use bevy::prelude::*;
use bevy::render::camera::RenderTarget;
use bevy::render::gpu_readback::{Readback, ReadbackComplete};
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat, TextureUsages};
use bevy::render::view::{NoFrustumCulling, RenderLayers};
use bevy::window::{PrimaryWindow, WindowResized};
use thiserror::Error;

use crate::constants::render_settings::{
    PICK_TARGET_DEFAULT_HEIGHT, PICK_TARGET_DEFAULT_WIDTH, PICKING_LAYER,
};
use crate::engine::camera::EditorCamera;
use id_encoding::{id_from_pixel, id_to_color, pixel_at};
use pick_queue::PickQueue;

/// Marks an entity for the id pass. Requires a `Mesh3d` on the same entity.
#[derive(Component)]
pub struct Pickable;

/// Off-screen entity rendered in place of a pickable source, tinted with
/// the source's identifier color.
#[derive(Component)]
pub struct PickMirror {
    pub source: Entity,
}

#[derive(Component)]
pub struct PickCamera;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    Hit(Entity),
    Miss,
    /// The request was overwritten by a newer one before it resolved.
    Superseded,
}

/// Fired once per request, carrying the generation returned by
/// [`ScenePicker::request_pick`].
#[derive(Event)]
pub struct PickCompleted {
    pub generation: u64,
    pub outcome: PickOutcome,
}

#[derive(Debug, Error)]
pub enum PickError {
    #[error("pick coordinates {0} outside the target")]
    OutOfBounds(UVec2),
}

/// Sequential identifier assignment for pickable entities. Ids are 1-based;
/// 0 is the cleared background.
#[derive(Resource, Default)]
pub struct PickRegistry {
    by_id: HashMap<u32, Entity>,
    by_entity: HashMap<Entity, u32>,
    next_id: u32,
}

impl PickRegistry {
    pub fn assign(&mut self, entity: Entity) -> u32 {
        if let Some(id) = self.by_entity.get(&entity) {
            return *id;
        }
        self.next_id += 1;
        let id = self.next_id;
        self.by_id.insert(id, entity);
        self.by_entity.insert(entity, id);
        id
    }

    pub fn release(&mut self, entity: Entity) {
        if let Some(id) = self.by_entity.remove(&entity) {
            self.by_id.remove(&id);
        }
    }

    pub fn resolve(&self, id: u32) -> Option<Entity> {
        self.by_id.get(&id).copied()
    }
}

/// Public pick entry point plus the off-screen target it resolves against.
#[derive(Resource)]
pub struct ScenePicker {
    queue: PickQueue,
    target: Handle<Image>,
    target_size: UVec2,
}

impl ScenePicker {
    /// Request the entity under `position` (window pixels). Returns the
    /// request generation; the answer arrives as a [`PickCompleted`] event
    /// no earlier than the next frame. A still-pending previous request is
    /// superseded (last writer wins).
    pub fn request_pick(&mut self, position: Vec2) -> u64 {
        self.queue.submit(position)
    }

    pub fn has_pending(&self) -> bool {
        self.queue.pending().is_some()
    }

    fn resolve_pixel(
        &self,
        data: &[u8],
        window_size: Vec2,
        cursor: Vec2,
    ) -> Result<Option<u32>, PickError> {
        let position = UVec2::new(
            (cursor.x / window_size.x * self.target_size.x as f32) as u32,
            (cursor.y / window_size.y * self.target_size.y as f32) as u32,
        );
        let pixel = pixel_at(data, self.target_size, position)
            .ok_or(PickError::OutOfBounds(position))?;
        Ok(id_from_pixel(pixel))
    }
}

/// Readback pacing: the id pass must have rendered at least once after a
/// request before the pixel copy is scheduled.
#[derive(Resource, Default)]
struct PickPassState {
    armed: bool,
    in_flight: bool,
}

pub struct FramebufferPickingPlugin;

impl Plugin for FramebufferPickingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PickRegistry>()
            .init_resource::<PickPassState>()
            .add_event::<PickCompleted>()
            .add_systems(Startup, setup_pick_target)
            .add_systems(
                Update,
                (
                    build_pick_mirrors,
                    sync_pick_mirrors,
                    emit_superseded,
                    resize_pick_target,
                ),
            )
            .add_systems(PostUpdate, (sync_pick_camera, drive_pick_readback).chain());
    }
}

fn pick_target_image(width: u32, height: u32) -> Image {
    let mut image = Image::new_fill(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0, 0, 0, 255],
        TextureFormat::Rgba8Unorm,
        RenderAssetUsages::default(),
    );
    image.texture_descriptor.usage = TextureUsages::TEXTURE_BINDING
        | TextureUsages::COPY_DST
        | TextureUsages::COPY_SRC
        | TextureUsages::RENDER_ATTACHMENT;
    image
}

fn setup_pick_target(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let (width, height) = windows
        .single()
        .map(|w| (w.physical_width().max(1), w.physical_height().max(1)))
        .unwrap_or((PICK_TARGET_DEFAULT_WIDTH, PICK_TARGET_DEFAULT_HEIGHT));

    let target = images.add(pick_target_image(width, height));

    commands.spawn((
        Camera3d::default(),
        Camera {
            target: RenderTarget::Image(target.clone().into()),
            order: -10,
            clear_color: ClearColorConfig::Custom(Color::BLACK),
            is_active: false,
            ..default()
        },
        Tonemapping::None,
        Msaa::Off,
        RenderLayers::layer(PICKING_LAYER),
        PickCamera,
        Name::new("pick_camera"),
    ));

    commands.insert_resource(ScenePicker {
        queue: PickQueue::default(),
        target,
        target_size: UVec2::new(width, height),
    });
}

// The id target tracks the primary window so cursor coordinates map 1:1.
fn resize_pick_target(
    mut resized: EventReader<WindowResized>,
    mut picker: ResMut<ScenePicker>,
    mut images: ResMut<Assets<Image>>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    if resized.read().last().is_none() {
        return;
    }
    let Ok(window) = windows.single() else {
        return;
    };
    let (width, height) = (window.physical_width().max(1), window.physical_height().max(1));
    if picker.target_size == UVec2::new(width, height) {
        return;
    }
    images.insert(picker.target.id(), pick_target_image(width, height));
    picker.target_size = UVec2::new(width, height);
}

// Spawns an id-tinted mirror for every new pickable entity.
pub fn build_pick_mirrors(
    mut commands: Commands,
    mut registry: ResMut<PickRegistry>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    new_pickables: Query<(Entity, &Mesh3d), Added<Pickable>>,
) {
    for (entity, mesh) in &new_pickables {
        let id = registry.assign(entity);
        commands.spawn((
            Mesh3d(mesh.0.clone()),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: id_to_color(id),
                unlit: true,
                ..default()
            })),
            Transform::default(),
            RenderLayers::layer(PICKING_LAYER),
            NoFrustumCulling,
            PickMirror { source: entity },
            Name::new(format!("pick_mirror_{id}")),
        ));
    }
}

// Mirrors follow their sources; mirrors of despawned sources are reclaimed.
pub fn sync_pick_mirrors(
    mut commands: Commands,
    mut registry: ResMut<PickRegistry>,
    sources: Query<&GlobalTransform, With<Pickable>>,
    mut mirrors: Query<(Entity, &PickMirror, &mut Transform)>,
) {
    for (mirror_entity, mirror, mut transform) in &mut mirrors {
        match sources.get(mirror.source) {
            Ok(source_transform) => {
                *transform = source_transform.compute_transform();
            }
            Err(_) => {
                registry.release(mirror.source);
                commands.entity(mirror_entity).despawn();
            }
        }
    }
}

fn emit_superseded(mut picker: ResMut<ScenePicker>, mut events: EventWriter<PickCompleted>) {
    for generation in picker.queue.drain_superseded() {
        events.write(PickCompleted {
            generation,
            outcome: PickOutcome::Superseded,
        });
    }
}

// The pick camera shadows the editor camera and only renders while a
// request is in progress.
fn sync_pick_camera(
    picker: Res<ScenePicker>,
    pass_state: Res<PickPassState>,
    editor_camera: Query<(&GlobalTransform, &Projection), (With<EditorCamera>, Without<PickCamera>)>,
    mut pick_camera: Query<(&mut Camera, &mut Transform, &mut Projection), With<PickCamera>>,
) {
    let Ok((mut camera, mut transform, mut projection)) = pick_camera.single_mut() else {
        return;
    };
    camera.is_active = picker.has_pending() || pass_state.in_flight;

    let Ok((editor_transform, editor_projection)) = editor_camera.single() else {
        return;
    };
    *transform = editor_transform.compute_transform();
    *projection = editor_projection.clone();
}

// Schedules the pixel copy one frame after the id pass rendered, then
// resolves the queue from the returned bytes.
fn drive_pick_readback(
    mut commands: Commands,
    picker: Res<ScenePicker>,
    mut pass_state: ResMut<PickPassState>,
) {
    if !picker.has_pending() {
        pass_state.armed = false;
        return;
    }
    if pass_state.in_flight {
        return;
    }
    if !pass_state.armed {
        // The camera switches on this frame; its first id pass runs at the
        // end of it. Read back on the next one.
        pass_state.armed = true;
        return;
    }

    pass_state.in_flight = true;
    commands
        .spawn(Readback::texture(picker.target.clone()))
        .observe(complete_pick_readback);
}

fn complete_pick_readback(
    trigger: Trigger<ReadbackComplete>,
    mut commands: Commands,
    mut picker: ResMut<ScenePicker>,
    mut pass_state: ResMut<PickPassState>,
    registry: Res<PickRegistry>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut events: EventWriter<PickCompleted>,
) {
    commands.entity(trigger.target()).try_despawn();
    pass_state.in_flight = false;
    pass_state.armed = false;

    let Some((generation, cursor)) = picker.queue.complete() else {
        return;
    };

    let Ok(window) = windows.single() else {
        return;
    };
    let window_size = Vec2::new(window.width().max(1.0), window.height().max(1.0));

    let outcome = match picker.resolve_pixel(&trigger.event().0, window_size, cursor) {
        Ok(Some(id)) => registry
            .resolve(id)
            .map(PickOutcome::Hit)
            .unwrap_or(PickOutcome::Miss),
        Ok(None) => PickOutcome::Miss,
        Err(err) => {
            warn!("pick readback failed: {err}");
            PickOutcome::Miss
        }
    };

    events.write(PickCompleted {
        generation,
        outcome,
    });
}
