use bevy::asset::RenderAssetUsages;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::{
    core_pipeline::{
        core_3d::graph::{Core3d, Node3d},
        fullscreen_vertex_shader::fullscreen_shader_vertex_state,
    },
    ecs::query::QueryItem,
    prelude::*,
    render::{
        RenderApp,
        camera::RenderTarget,
        extract_component::{
            ComponentUniforms, DynamicUniformIndex, ExtractComponent, ExtractComponentPlugin,
            UniformComponentPlugin,
        },
        extract_resource::{ExtractResource, ExtractResourcePlugin},
        render_asset::RenderAssets,
        render_graph::{
            NodeRunError, RenderGraphApp, RenderGraphContext, RenderLabel, ViewNode, ViewNodeRunner,
        },
        render_resource::{
            binding_types::{sampler, texture_2d, uniform_buffer},
            *,
        },
        renderer::{RenderContext, RenderDevice},
        texture::GpuImage,
        view::{NoFrustumCulling, RenderLayers, ViewTarget},
    },
    window::{PrimaryWindow, WindowResized},
};

use crate::constants::render_settings::{
    OUTLINE_COLOR, OUTLINE_MASK_LAYER, OUTLINE_THICKNESS, PICK_TARGET_DEFAULT_HEIGHT,
    PICK_TARGET_DEFAULT_WIDTH,
};
use crate::engine::camera::EditorCamera;
use crate::tools::selection::SelectionGroup;

const OUTLINE_SHADER_PATH: &str = "shaders/outline_postprocess.wgsl";

/// Selected entities are re-rendered flat into an off-screen mask; a
/// fullscreen pass then draws the outline color wherever mask coverage
/// changes within the configured thickness.
pub struct OutlinePostProcessPlugin;

impl Plugin for OutlinePostProcessPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            ExtractComponentPlugin::<OutlineSettings>::default(),
            UniformComponentPlugin::<OutlineSettings>::default(),
            ExtractResourcePlugin::<OutlineMaskTarget>::default(),
        ))
        .add_systems(Startup, setup_outline_mask)
        .add_systems(
            Update,
            (sync_outline_mirrors, resize_outline_mask),
        )
        .add_systems(PostUpdate, sync_mask_camera);

        let Some(render_app) = app.get_sub_app_mut(RenderApp) else {
            return;
        };

        render_app
            .add_render_graph_node::<ViewNodeRunner<OutlinePostProcessNode>>(
                Core3d,
                OutlinePostProcessLabel,
            )
            .add_render_graph_edges(
                Core3d,
                (
                    Node3d::Tonemapping,
                    OutlinePostProcessLabel,
                    Node3d::EndMainPassPostProcessing,
                ),
            );
    }

    fn finish(&self, app: &mut App) {
        let Some(render_app) = app.get_sub_app_mut(RenderApp) else {
            return;
        };

        render_app.init_resource::<OutlinePostProcessPipeline>();
    }
}

#[derive(Debug, Hash, PartialEq, Eq, Clone, RenderLabel)]
struct OutlinePostProcessLabel;

#[derive(Component, Clone, Copy, ExtractComponent, ShaderType)]
pub struct OutlineSettings {
    pub color: Vec4,
    pub thickness: f32,
    pub _padding: Vec3,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            color: Vec4::from_array(OUTLINE_COLOR.to_linear().to_f32_array()),
            thickness: OUTLINE_THICKNESS,
            _padding: Vec3::ZERO,
        }
    }
}

/// Off-screen mask image the selected-entity silhouettes render into.
#[derive(Resource, Clone, ExtractResource)]
pub struct OutlineMaskTarget {
    pub image: Handle<Image>,
    size: UVec2,
}

#[derive(Component)]
pub struct OutlineMaskCamera;

/// Flat silhouette copy of a selected entity on the mask layer.
#[derive(Component)]
pub struct OutlineMirror {
    pub source: Entity,
}

fn mask_image(width: u32, height: u32) -> Image {
    let mut image = Image::new_fill(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0, 0, 0, 0],
        TextureFormat::Rgba8Unorm,
        RenderAssetUsages::default(),
    );
    image.texture_descriptor.usage = TextureUsages::TEXTURE_BINDING
        | TextureUsages::COPY_DST
        | TextureUsages::RENDER_ATTACHMENT;
    image
}

fn setup_outline_mask(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let (width, height) = windows
        .single()
        .map(|w| (w.physical_width().max(1), w.physical_height().max(1)))
        .unwrap_or((PICK_TARGET_DEFAULT_WIDTH, PICK_TARGET_DEFAULT_HEIGHT));

    let image = images.add(mask_image(width, height));

    commands.spawn((
        Camera3d::default(),
        Camera {
            target: RenderTarget::Image(image.clone().into()),
            order: -9,
            clear_color: ClearColorConfig::Custom(Color::NONE),
            is_active: false,
            ..default()
        },
        Tonemapping::None,
        Msaa::Off,
        RenderLayers::layer(OUTLINE_MASK_LAYER),
        OutlineMaskCamera,
        Name::new("outline_mask_camera"),
    ));

    commands.insert_resource(OutlineMaskTarget {
        image,
        size: UVec2::new(width, height),
    });
}

fn resize_outline_mask(
    mut resized: EventReader<WindowResized>,
    mut target: ResMut<OutlineMaskTarget>,
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
    if target.size == UVec2::new(width, height) {
        return;
    }
    images.insert(target.image.id(), mask_image(width, height));
    target.size = UVec2::new(width, height);
}

// Silhouette mirrors track the selection group: spawned when an entity
// joins, reclaimed when it leaves or despawns.
pub fn sync_outline_mirrors(
    mut commands: Commands,
    group: Option<Res<SelectionGroup>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    sources: Query<(&Mesh3d, &GlobalTransform)>,
    mut mirrors: Query<(Entity, &OutlineMirror, &mut Transform)>,
) {
    let Some(group) = group else {
        return;
    };
    let mut mirrored: Vec<Entity> = Vec::new();

    for (mirror_entity, mirror, mut transform) in &mut mirrors {
        let selected = group.contains(mirror.source);
        match sources.get(mirror.source) {
            Ok((_, source_transform)) if selected => {
                *transform = source_transform.compute_transform();
                mirrored.push(mirror.source);
            }
            _ => {
                commands.entity(mirror_entity).despawn();
            }
        }
    }

    for entity in group.iter() {
        if mirrored.contains(&entity) {
            continue;
        }
        let Ok((mesh, source_transform)) = sources.get(entity) else {
            continue;
        };
        commands.spawn((
            Mesh3d(mesh.0.clone()),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::WHITE,
                unlit: true,
                ..default()
            })),
            source_transform.compute_transform(),
            RenderLayers::layer(OUTLINE_MASK_LAYER),
            NoFrustumCulling,
            OutlineMirror { source: entity },
        ));
    }
}

// Mask camera shadows the editor camera; it only renders while something
// is selected.
fn sync_mask_camera(
    group: Option<Res<SelectionGroup>>,
    editor_camera: Query<
        (&GlobalTransform, &Projection),
        (With<EditorCamera>, Without<OutlineMaskCamera>),
    >,
    mut mask_camera: Query<(&mut Camera, &mut Transform, &mut Projection), With<OutlineMaskCamera>>,
) {
    let Ok((mut camera, mut transform, mut projection)) = mask_camera.single_mut() else {
        return;
    };
    camera.is_active = group.as_ref().is_some_and(|group| !group.is_empty());

    let Ok((editor_transform, editor_projection)) = editor_camera.single() else {
        return;
    };
    *transform = editor_transform.compute_transform();
    *projection = editor_projection.clone();
}

#[derive(Default)]
struct OutlinePostProcessNode;

impl ViewNode for OutlinePostProcessNode {
    type ViewQuery = (
        &'static ViewTarget,
        &'static OutlineSettings,
        &'static DynamicUniformIndex<OutlineSettings>,
    );

    fn run(
        &self,
        _graph: &mut RenderGraphContext,
        render_context: &mut RenderContext,
        (view_target, _outline_settings, settings_index): QueryItem<Self::ViewQuery>,
        world: &World,
    ) -> Result<(), NodeRunError> {
        let outline_pipeline = world.resource::<OutlinePostProcessPipeline>();
        let pipeline_cache = world.resource::<PipelineCache>();

        let Some(pipeline) = pipeline_cache.get_render_pipeline(outline_pipeline.pipeline_id)
        else {
            return Ok(());
        };

        let settings_uniforms = world.resource::<ComponentUniforms<OutlineSettings>>();
        let Some(settings_binding) = settings_uniforms.uniforms().binding() else {
            return Ok(());
        };

        let Some(mask_target) = world.get_resource::<OutlineMaskTarget>() else {
            return Ok(());
        };
        let gpu_images = world.resource::<RenderAssets<GpuImage>>();
        let Some(mask) = gpu_images.get(&mask_target.image) else {
            return Ok(());
        };

        let post_process = view_target.post_process_write();

        let bind_group = render_context.render_device().create_bind_group(
            "outline_post_process_bind_group",
            &outline_pipeline.layout,
            &BindGroupEntries::sequential((
                post_process.source,
                &outline_pipeline.sampler,
                &mask.texture_view,
                &outline_pipeline.sampler,
                settings_binding.clone(),
            )),
        );

        let mut render_pass = render_context.begin_tracked_render_pass(RenderPassDescriptor {
            label: Some("outline_post_process_pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: post_process.destination,
                resolve_target: None,
                ops: Operations::default(),
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_render_pipeline(pipeline);
        render_pass.set_bind_group(0, &bind_group, &[settings_index.index()]);
        render_pass.draw(0..3, 0..1);

        Ok(())
    }
}

#[derive(Resource)]
struct OutlinePostProcessPipeline {
    layout: BindGroupLayout,
    sampler: Sampler,
    pipeline_id: CachedRenderPipelineId,
}

impl FromWorld for OutlinePostProcessPipeline {
    fn from_world(world: &mut World) -> Self {
        let render_device = world.resource::<RenderDevice>();

        let layout = render_device.create_bind_group_layout(
            "outline_post_process_bind_group_layout",
            &BindGroupLayoutEntries::sequential(
                ShaderStages::FRAGMENT,
                (
                    texture_2d(TextureSampleType::Float { filterable: false }),
                    sampler(SamplerBindingType::NonFiltering),
                    texture_2d(TextureSampleType::Float { filterable: false }),
                    sampler(SamplerBindingType::NonFiltering),
                    uniform_buffer::<OutlineSettings>(true),
                ),
            ),
        );

        let sampler = render_device.create_sampler(&SamplerDescriptor {
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            ..default()
        });

        let shader = world.load_asset(OUTLINE_SHADER_PATH);

        let pipeline_id =
            world
                .resource_mut::<PipelineCache>()
                .queue_render_pipeline(RenderPipelineDescriptor {
                    label: Some("outline_post_process_pipeline".into()),
                    layout: vec![layout.clone()],
                    vertex: fullscreen_shader_vertex_state(),
                    fragment: Some(FragmentState {
                        shader,
                        shader_defs: vec![],
                        entry_point: "fragment".into(),
                        targets: vec![Some(ColorTargetState {
                            format: TextureFormat::bevy_default(),
                            blend: None,
                            write_mask: ColorWrites::ALL,
                        })],
                    }),
                    primitive: PrimitiveState::default(),
                    depth_stencil: None,
                    multisample: MultisampleState::default(),
                    push_constant_ranges: vec![],
                    zero_initialize_workgroup_memory: false,
                });

        Self {
            layout,
            sampler,
            pipeline_id,
        }
    }
}
