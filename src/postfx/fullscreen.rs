//! Fullscreen triangle passes shared by every post effect

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

use crate::backend::*;

/// Common fullscreen triangle vertex shader
pub const FULLSCREEN_VERTEX_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var output: VertexOutput;

    // Generate fullscreen triangle
    let x = f32((vertex_index << 1u) & 2u);
    let y = f32(vertex_index & 2u);

    output.position = vec4<f32>(x * 2.0 - 1.0, y * 2.0 - 1.0, 0.0, 1.0);
    output.uv = vec2<f32>(x, 1.0 - y);

    return output;
}
"#;

/// Bindings every effect fragment shader can use
pub const EFFECT_BINDINGS: &str = r#"
struct EffectUniform {
    params: vec4<f32>,
    texel: vec4<f32>,
    volume_scale: vec4<f32>,
    volume_offset: vec4<f32>,
}

@group(0) @binding(0) var source_texture: texture_2d<f32>;
@group(0) @binding(1) var source_sampler: sampler;
@group(0) @binding(2) var<uniform> effect: EffectUniform;
"#;

/// Copies the source texture unchanged
pub const BLIT_FRAGMENT_SHADER: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(source_texture, source_sampler, in.uv);
}
"#;

/// Per-pass constants.
///
/// `params` meaning depends on the effect; `texel` holds the size of one
/// source pixel in UV units in `xy`. `volume_scale`/`volume_offset` map a
/// colour into the 0..1 coordinates of the volume texture.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct EffectUniform {
    pub params: Vec4,
    pub texel: Vec4,
    pub volume_scale: Vec4,
    pub volume_offset: Vec4,
}

impl EffectUniform {
    pub fn new(params: Vec4, width: u32, height: u32) -> Self {
        Self {
            params,
            texel: Vec4::new(
                1.0 / width.max(1) as f32,
                1.0 / height.max(1) as f32,
                0.0,
                0.0,
            ),
            volume_scale: Vec4::ONE,
            volume_offset: Vec4::ZERO,
        }
    }

    pub fn with_volume_transform(mut self, scale: Vec3, offset: Vec3) -> Self {
        self.volume_scale = scale.extend(1.0);
        self.volume_offset = offset.extend(0.0);
        self
    }
}

pub fn effect_shader_source(fragment: &str) -> String {
    format!("{FULLSCREEN_VERTEX_SHADER}\n{EFFECT_BINDINGS}\n{fragment}")
}

/// A pipeline drawing one fullscreen triangle that samples a source texture
pub struct FullscreenPass {
    label: String,
    layout: BindGroupLayoutHandle,
    pipeline: RenderPipelineHandle,
    sampler: SamplerHandle,
    uniform: BufferHandle,
    /// Extra 3D texture bound at binding 3
    volume: Option<TextureViewHandle>,
    /// Bind group for the most recent source view
    bind_group: Option<(TextureViewHandle, BindGroupHandle)>,
}

impl FullscreenPass {
    pub fn new<B: GraphicsBackend>(
        backend: &mut B,
        label: &str,
        fragment_shader: &str,
        target_format: TextureFormat,
        volume: Option<TextureViewHandle>,
    ) -> BackendResult<Self> {
        let mut entries = vec![
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStageFlags::FRAGMENT,
                ty: BindingType::float_texture(TextureDimension::D2),
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStageFlags::FRAGMENT,
                ty: BindingType::Sampler { comparison: false },
            },
            BindGroupLayoutEntry {
                binding: 2,
                visibility: ShaderStageFlags::FRAGMENT,
                ty: BindingType::UniformBuffer,
            },
        ];
        if volume.is_some() {
            entries.push(BindGroupLayoutEntry {
                binding: 3,
                visibility: ShaderStageFlags::FRAGMENT,
                ty: BindingType::float_texture(TextureDimension::D3),
            });
        }
        let layout = backend.create_bind_group_layout(&entries)?;

        let pipeline = backend.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(format!("{label} Pipeline")),
            shader: effect_shader_source(fragment_shader),
            vertex_layouts: Vec::new(),
            bind_group_layouts: vec![layout],
            primitive_topology: PrimitiveTopology::TriangleList,
            front_face: FrontFace::Ccw,
            cull_mode: CullMode::None,
            depth_stencil: None,
            color_targets: vec![ColorTargetState {
                format: target_format,
                blend: None,
                write_mask: ColorWrites::ALL,
            }],
        })?;

        let sampler = backend.create_sampler(&SamplerDescriptor {
            label: Some(format!("{label} Sampler")),
            ..Default::default()
        })?;
        let uniform = backend.create_buffer(&BufferDescriptor::uniform::<EffectUniform>(format!(
            "{label} Uniform"
        )))?;

        Ok(Self {
            label: label.to_string(),
            layout,
            pipeline,
            sampler,
            uniform,
            volume,
            bind_group: None,
        })
    }

    pub fn write_uniform<B: GraphicsBackend>(&self, backend: &mut B, data: &EffectUniform) {
        backend.write_buffer(self.uniform, 0, bytemuck::bytes_of(data));
    }

    fn bind_group_for<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        source: TextureViewHandle,
    ) -> BackendResult<BindGroupHandle> {
        if let Some((view, group)) = self.bind_group {
            if view == source {
                return Ok(group);
            }
            backend.destroy_bind_group(group);
            self.bind_group = None;
        }

        let mut entries = vec![
            (0, BindGroupEntry::Texture(source)),
            (1, BindGroupEntry::Sampler(self.sampler)),
            (
                2,
                BindGroupEntry::Buffer {
                    buffer: self.uniform,
                    offset: 0,
                    size: None,
                },
            ),
        ];
        if let Some(volume) = self.volume {
            entries.push((3, BindGroupEntry::Texture(volume)));
        }

        let group = backend.create_bind_group(self.layout, &entries)?;
        self.bind_group = Some((source, group));
        Ok(group)
    }

    /// Record a pass that samples `source` and overwrites `target`
    pub fn draw<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        source: TextureViewHandle,
        target: TextureViewHandle,
    ) -> BackendResult<()> {
        let bind_group = self.bind_group_for(backend, source)?;

        backend.begin_render_pass(&RenderPassDescriptor {
            label: Some(self.label.clone()),
            color_attachments: vec![ColorAttachment {
                view: target,
                load_op: LoadOp::Clear([0.0, 0.0, 0.0, 1.0]),
                store_op: StoreOp::Store,
            }],
            depth_stencil_attachment: None,
        });
        backend.set_render_pipeline(self.pipeline);
        backend.set_bind_group(0, bind_group);
        backend.draw(0..3, 0..1);
        backend.end_render_pass();

        Ok(())
    }

    pub fn release<B: GraphicsBackend>(&mut self, backend: &mut B) {
        if let Some((_, group)) = self.bind_group.take() {
            backend.destroy_bind_group(group);
        }
        backend.destroy_buffer(self.uniform);
        backend.destroy_sampler(self.sampler);
        backend.destroy_render_pipeline(self.pipeline);
        backend.destroy_bind_group_layout(self.layout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texel_size_covers_one_pixel() {
        let u = EffectUniform::new(Vec4::ZERO, 1280, 720);
        assert!((u.texel.x - 1.0 / 1280.0).abs() < 1e-9);
        assert!((u.texel.y - 1.0 / 720.0).abs() < 1e-9);
        assert_eq!(u.volume_scale, Vec4::ONE);
        assert_eq!(std::mem::size_of::<EffectUniform>(), 64);
    }

    #[test]
    fn release_frees_everything_the_pass_created() {
        use crate::backend::recording::RecordingBackend;

        let mut backend = RecordingBackend::new();
        let volume = backend
            .create_texture(&TextureDescriptor::default())
            .and_then(|t| backend.create_texture_view(t))
            .unwrap();
        let before = backend.live.len();

        let mut pass = FullscreenPass::new(
            &mut backend,
            "Test",
            BLIT_FRAGMENT_SHADER,
            TextureFormat::Rgba8Unorm,
            Some(volume),
        )
        .unwrap();
        pass.draw(&mut backend, volume, TextureViewHandle(0)).unwrap();
        assert_eq!(backend.draws, 1);
        assert!(backend.live.len() > before);

        pass.release(&mut backend);
        assert_eq!(backend.live.len(), before);
    }

    #[test]
    fn shader_source_has_both_stages() {
        let source = effect_shader_source(BLIT_FRAGMENT_SHADER);
        assert!(source.contains("fn vs_main"));
        assert!(source.contains("fn fs_main"));
        assert!(source.find("struct VertexOutput") < source.find("fn fs_main"));
    }
}
