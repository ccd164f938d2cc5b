//! Scene forward pass
//!
//! Owns the GPU side of the scene: meshes, textures, materials and one
//! transform uniform per rendered entity. Draws are issued in sorted order,
//! switching pipelines and material bind groups only when they change.

use bevy_ecs::prelude::*;
use std::collections::HashMap;

use super::{create_scene_pipeline, SceneLayouts};
use crate::backend::*;
use crate::postfx::Framebuffer;
use crate::resources::{
    CubeMapData, GpuTexture, MaterialId, MaterialUniformData, Mesh, MeshId, ShaderKind,
    ShaderMaterial, TextureData, TextureId,
};
use crate::scene::{
    sort_draw_items, CameraUniformData, DrawItem, LightingUniformData, RendererComponent,
    Transform, TransformUniformData,
};

/// GPU resources for a mesh
struct GpuMesh {
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    index_count: u32,
}

struct GpuMaterial {
    material: ShaderMaterial,
    uniform: BufferHandle,
    bind_group: BindGroupHandle,
}

/// Per-object GPU resources
struct GpuObject {
    transform_buffer: BufferHandle,
    transform_bind_group: BindGroupHandle,
}

/// Remembers the last bound shader and material so consecutive draws only
/// rebind what changed
#[derive(Debug, Default)]
pub struct StateTracker {
    shader: Option<ShaderKind>,
    material: Option<MaterialId>,
}

impl StateTracker {
    /// True if `shader` differs from the bound one; it becomes the bound one
    pub fn shader_changed(&mut self, shader: ShaderKind) -> bool {
        let changed = self.shader != Some(shader);
        self.shader = Some(shader);
        changed
    }

    pub fn material_changed(&mut self, material: MaterialId) -> bool {
        let changed = self.material != Some(material);
        self.material = Some(material);
        changed
    }
}

/// Counters from one scene draw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub draws: u32,
    pub pipeline_switches: u32,
    pub material_switches: u32,
}

pub struct ForwardPass {
    layouts: SceneLayouts,
    pipelines: HashMap<ShaderKind, RenderPipelineHandle>,

    camera_buffer: BufferHandle,
    lighting_buffer: BufferHandle,
    frame_bind_group: BindGroupHandle,

    sampler: SamplerHandle,
    default_texture: GpuTexture,
    default_cube: GpuTexture,

    meshes: Vec<GpuMesh>,
    textures: Vec<GpuTexture>,
    materials: Vec<GpuMaterial>,
    objects: HashMap<Entity, GpuObject>,
}

impl ForwardPass {
    pub fn new<B: GraphicsBackend>(backend: &mut B) -> BackendResult<Self> {
        let layouts = SceneLayouts::create(backend)?;

        let mut pipelines = HashMap::new();
        for kind in ShaderKind::ALL {
            pipelines.insert(kind, create_scene_pipeline(backend, kind, &layouts)?);
        }

        let camera_buffer =
            backend.create_buffer(&BufferDescriptor::uniform::<CameraUniformData>("Camera Buffer"))?;
        let lighting_buffer = backend
            .create_buffer(&BufferDescriptor::uniform::<LightingUniformData>("Lighting Buffer"))?;
        let frame_bind_group = backend.create_bind_group(
            layouts.frame,
            &[
                (
                    0,
                    BindGroupEntry::Buffer {
                        buffer: camera_buffer,
                        offset: 0,
                        size: None,
                    },
                ),
                (
                    1,
                    BindGroupEntry::Buffer {
                        buffer: lighting_buffer,
                        offset: 0,
                        size: None,
                    },
                ),
            ],
        )?;

        let sampler = backend.create_sampler(&SamplerDescriptor::repeating("Material Sampler"))?;
        let default_texture = GpuTexture::create(backend, &TextureData::white())?;
        let default_cube =
            GpuTexture::create_cube(backend, &CubeMapData::solid_color([128, 128, 128, 255], "flat"))?;

        Ok(Self {
            layouts,
            pipelines,
            camera_buffer,
            lighting_buffer,
            frame_bind_group,
            sampler,
            default_texture,
            default_cube,
            meshes: Vec::new(),
            textures: Vec::new(),
            materials: Vec::new(),
            objects: HashMap::new(),
        })
    }

    pub fn add_mesh<B: GraphicsBackend>(&mut self, backend: &mut B, mesh: &Mesh) -> BackendResult<MeshId> {
        let id = self.meshes.len();
        let vertex_data = mesh.vertex_bytes();
        let index_data = mesh.index_bytes();

        let vertex_buffer = backend.create_buffer_init(
            &BufferDescriptor {
                label: Some(format!("{} Vertices", mesh.name)),
                size: vertex_data.len() as u64,
                usage: BufferUsage::VERTEX,
            },
            vertex_data,
        )?;
        let index_buffer = backend.create_buffer_init(
            &BufferDescriptor {
                label: Some(format!("{} Indices", mesh.name)),
                size: index_data.len() as u64,
                usage: BufferUsage::INDEX,
            },
            index_data,
        )?;

        self.meshes.push(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count() as u32,
        });
        log::debug!("Uploaded mesh {} ({} triangles)", mesh.name, mesh.triangle_count());
        Ok(MeshId(id as u32))
    }

    pub fn add_texture<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        data: &TextureData,
    ) -> BackendResult<TextureId> {
        let texture = GpuTexture::create(backend, data)?;
        self.textures.push(texture);
        Ok(TextureId(self.textures.len() as u32 - 1))
    }

    pub fn add_cube_map<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        data: &CubeMapData,
    ) -> BackendResult<TextureId> {
        let texture = GpuTexture::create_cube(backend, data)?;
        self.textures.push(texture);
        Ok(TextureId(self.textures.len() as u32 - 1))
    }

    /// View for a texture slot, falling back to the default when the slot
    /// is empty or holds a texture of the wrong dimension
    fn slot_view(&self, slot: Option<TextureId>, dimension: TextureDimension) -> TextureViewHandle {
        let fallback = match dimension {
            TextureDimension::Cube => &self.default_cube,
            _ => &self.default_texture,
        };
        slot.and_then(|id| self.textures.get(id.0 as usize))
            .filter(|t| t.dimension == dimension)
            .unwrap_or(fallback)
            .view
    }

    pub fn add_material<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        material: ShaderMaterial,
    ) -> BackendResult<MaterialId> {
        let uniform = backend.create_buffer_init(
            &BufferDescriptor::uniform::<MaterialUniformData>(format!("{} Material", material.name)),
            bytemuck::bytes_of(&material.uniform_data()),
        )?;

        let d2 = TextureDimension::D2;
        let entries = [
            (
                0,
                BindGroupEntry::Buffer {
                    buffer: uniform,
                    offset: 0,
                    size: None,
                },
            ),
            (1, BindGroupEntry::Texture(self.slot_view(material.diffuse, d2))),
            (2, BindGroupEntry::Texture(self.slot_view(material.diffuse2, d2))),
            (3, BindGroupEntry::Texture(self.slot_view(material.specular, d2))),
            (4, BindGroupEntry::Texture(self.slot_view(material.reflectivity, d2))),
            (
                5,
                BindGroupEntry::Texture(self.slot_view(material.environment, TextureDimension::Cube)),
            ),
            (6, BindGroupEntry::Sampler(self.sampler)),
        ];
        let bind_group = backend.create_bind_group(self.layouts.material, &entries)?;

        self.materials.push(GpuMaterial {
            material,
            uniform,
            bind_group,
        });
        Ok(MaterialId(self.materials.len() as u32 - 1))
    }

    pub fn material(&self, id: MaterialId) -> Option<&ShaderMaterial> {
        self.materials.get(id.0 as usize).map(|m| &m.material)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn write_frame_uniforms<B: GraphicsBackend>(
        &self,
        backend: &mut B,
        camera: &CameraUniformData,
        lighting: &LightingUniformData,
    ) {
        backend.write_buffer(self.camera_buffer, 0, bytemuck::bytes_of(camera));
        backend.write_buffer(self.lighting_buffer, 0, bytemuck::bytes_of(lighting));
    }

    /// Upload transforms of rendered entities, creating uniforms for new
    /// ones and freeing those of entities that stopped rendering
    pub fn sync_objects<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        world: &mut World,
    ) -> BackendResult<()> {
        let current: Vec<(Entity, TransformUniformData)> = world
            .query_filtered::<(Entity, &Transform), With<RendererComponent>>()
            .iter(world)
            .map(|(entity, transform)| (entity, transform.uniform_data()))
            .collect();

        for (entity, data) in &current {
            if !self.objects.contains_key(entity) {
                let transform_buffer = backend.create_buffer(
                    &BufferDescriptor::uniform::<TransformUniformData>(format!("{:?} Transform", entity)),
                )?;
                let transform_bind_group = backend.create_bind_group(
                    self.layouts.object,
                    &[(
                        0,
                        BindGroupEntry::Buffer {
                            buffer: transform_buffer,
                            offset: 0,
                            size: None,
                        },
                    )],
                )?;
                self.objects.insert(
                    *entity,
                    GpuObject {
                        transform_buffer,
                        transform_bind_group,
                    },
                );
            }
            if let Some(object) = self.objects.get(entity) {
                backend.write_buffer(object.transform_buffer, 0, bytemuck::bytes_of(data));
            }
        }

        let stale: Vec<Entity> = self
            .objects
            .keys()
            .filter(|e| !current.iter().any(|(c, _)| c == *e))
            .copied()
            .collect();
        for entity in stale {
            if let Some(object) = self.objects.remove(&entity) {
                backend.destroy_bind_group(object.transform_bind_group);
                backend.destroy_buffer(object.transform_buffer);
            }
        }
        Ok(())
    }

    /// Renderable entities in draw order. Entities referring to unknown
    /// materials are skipped.
    pub fn collect_draws(&self, world: &mut World) -> Vec<DrawItem> {
        let mut items: Vec<DrawItem> = world
            .query::<(Entity, &RendererComponent)>()
            .iter(world)
            .filter_map(|(entity, renderer)| {
                let material = self.material(renderer.material)?;
                Some(DrawItem {
                    entity,
                    mesh: renderer.mesh,
                    material: renderer.material,
                    render_layer: material.render_layer,
                    shader: material.shader,
                })
            })
            .collect();
        sort_draw_items(&mut items);
        items
    }

    /// Record the scene pass into `target`, clearing it first
    pub fn draw<B: GraphicsBackend>(
        &self,
        backend: &mut B,
        target: &Framebuffer,
        clear_color: [f32; 4],
        items: &[DrawItem],
    ) -> BackendResult<DrawStats> {
        let desc = target
            .render_pass(Some(clear_color))
            .ok_or_else(|| BackendError::NotInitialized(target.label().to_string()))?;
        let (width, height) = target.size();

        backend.begin_render_pass(&desc);
        backend.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
        backend.set_bind_group(0, self.frame_bind_group);

        let mut stats = DrawStats::default();
        let mut state = StateTracker::default();

        for item in items {
            let (Some(mesh), Some(material), Some(object)) = (
                self.meshes.get(item.mesh.0 as usize),
                self.materials.get(item.material.0 as usize),
                self.objects.get(&item.entity),
            ) else {
                continue;
            };

            if state.shader_changed(item.shader) {
                if let Some(&pipeline) = self.pipelines.get(&item.shader) {
                    backend.set_render_pipeline(pipeline);
                }
                stats.pipeline_switches += 1;
            }
            if state.material_changed(item.material) {
                backend.set_bind_group(2, material.bind_group);
                stats.material_switches += 1;
            }

            backend.set_bind_group(1, object.transform_bind_group);
            backend.set_vertex_buffer(0, mesh.vertex_buffer, 0);
            backend.set_index_buffer(mesh.index_buffer, 0, IndexFormat::Uint32);
            backend.draw_indexed(0..mesh.index_count, 0, 0..1);
            stats.draws += 1;
        }

        backend.end_render_pass();
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_reports_only_changes() {
        let mut state = StateTracker::default();
        let sequence = [
            (ShaderKind::BlinnPhongTextured, 0),
            (ShaderKind::BlinnPhongTextured, 0),
            (ShaderKind::BlinnPhongTextured, 1),
            (ShaderKind::Reflective, 1),
            (ShaderKind::Skybox, 2),
        ];
        let mut shader_switches = 0;
        let mut material_switches = 0;
        for (shader, material) in sequence {
            shader_switches += state.shader_changed(shader) as u32;
            material_switches += state.material_changed(MaterialId(material)) as u32;
        }
        assert_eq!(shader_switches, 3);
        assert_eq!(material_switches, 3);
    }
}
