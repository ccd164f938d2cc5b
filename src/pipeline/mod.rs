//! Forward rendering pipeline for the scene
//!
//! One render pipeline per [`ShaderKind`], all sharing three bind groups:
//! 0. frame: camera and lighting uniforms
//! 1. object: model and normal matrices
//! 2. material: material constants, four 2D textures, the environment cube
//!    map and a sampler

pub mod forward_pass;
pub mod shaders;

pub use forward_pass::{DrawStats, ForwardPass, StateTracker};
pub use shaders::scene_shader_source;

use crate::backend::*;
use crate::postfx::{FRAMEBUFFER_COLOR_FORMAT, FRAMEBUFFER_DEPTH_FORMAT};
use crate::resources::ShaderKind;

/// Bind group layouts shared by every scene pipeline
#[derive(Debug, Clone, Copy)]
pub struct SceneLayouts {
    pub frame: BindGroupLayoutHandle,
    pub object: BindGroupLayoutHandle,
    pub material: BindGroupLayoutHandle,
}

impl SceneLayouts {
    pub fn create<B: GraphicsBackend>(backend: &mut B) -> BackendResult<Self> {
        let frame = backend.create_bind_group_layout(&[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStageFlags::VERTEX_FRAGMENT,
                ty: BindingType::UniformBuffer,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStageFlags::FRAGMENT,
                ty: BindingType::UniformBuffer,
            },
        ])?;

        let object = backend.create_bind_group_layout(&[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStageFlags::VERTEX,
            ty: BindingType::UniformBuffer,
        }])?;

        let mut material_entries = vec![BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStageFlags::VERTEX_FRAGMENT,
            ty: BindingType::UniformBuffer,
        }];
        for binding in 1..=4 {
            material_entries.push(BindGroupLayoutEntry {
                binding,
                visibility: ShaderStageFlags::FRAGMENT,
                ty: BindingType::float_texture(TextureDimension::D2),
            });
        }
        material_entries.push(BindGroupLayoutEntry {
            binding: 5,
            visibility: ShaderStageFlags::FRAGMENT,
            ty: BindingType::float_texture(TextureDimension::Cube),
        });
        material_entries.push(BindGroupLayoutEntry {
            binding: 6,
            visibility: ShaderStageFlags::FRAGMENT,
            ty: BindingType::Sampler { comparison: false },
        });
        let material = backend.create_bind_group_layout(&material_entries)?;

        Ok(Self {
            frame,
            object,
            material,
        })
    }
}

/// Pipeline for one shader kind, drawing into a scene framebuffer
pub fn create_scene_pipeline<B: GraphicsBackend>(
    backend: &mut B,
    kind: ShaderKind,
    layouts: &SceneLayouts,
) -> BackendResult<RenderPipelineHandle> {
    // the sky sits at the far plane behind everything else
    let depth_write_enabled = kind != ShaderKind::Skybox;

    backend.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(format!("{:?} Pipeline", kind)),
        shader: scene_shader_source(kind),
        vertex_layouts: vec![Vertex::layout()],
        bind_group_layouts: vec![layouts.frame, layouts.object, layouts.material],
        primitive_topology: PrimitiveTopology::TriangleList,
        front_face: FrontFace::Ccw,
        cull_mode: CullMode::Back,
        depth_stencil: Some(DepthStencilState {
            format: FRAMEBUFFER_DEPTH_FORMAT,
            depth_write_enabled,
            depth_compare: CompareFunction::LessEqual,
        }),
        color_targets: vec![ColorTargetState {
            format: FRAMEBUFFER_COLOR_FORMAT,
            blend: None,
            write_mask: ColorWrites::ALL,
        }],
    })
}
