//! Windowless backend for tests that tracks which resources are alive

use std::collections::HashSet;
use std::sync::Arc;

use super::traits::*;
use super::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Buffer(u64),
    Texture(u64),
    TextureView(u64),
    Sampler(u64),
    BindGroupLayout(u64),
    BindGroup(u64),
    RenderPipeline(u64),
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u64,
    pub live: HashSet<Resource>,
    pub draws: u32,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self, make: fn(u64) -> Resource) -> u64 {
        self.next_id += 1;
        self.live.insert(make(self.next_id));
        self.next_id
    }
}

impl GraphicsBackend for RecordingBackend {
    fn new(_window: Arc<winit::window::Window>, _vsync: bool) -> BackendResult<Self> {
        Ok(Self::default())
    }

    fn resize(&mut self, _width: u32, _height: u32) {}

    fn surface_size(&self) -> (u32, u32) {
        (64, 64)
    }

    fn begin_frame(&mut self) -> BackendResult<FrameContext> {
        Ok(FrameContext {
            swapchain_view: TextureViewHandle(0),
            width: 64,
            height: 64,
        })
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        Ok(())
    }

    fn swapchain_format(&self) -> TextureFormat {
        TextureFormat::Bgra8UnormSrgb
    }

    fn create_buffer(&mut self, _desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        Ok(BufferHandle(self.allocate(Resource::Buffer)))
    }

    fn create_buffer_init(&mut self, desc: &BufferDescriptor, _data: &[u8]) -> BackendResult<BufferHandle> {
        self.create_buffer(desc)
    }

    fn write_buffer(&mut self, _buffer: BufferHandle, _offset: u64, _data: &[u8]) {}

    fn create_texture(&mut self, _desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        Ok(TextureHandle(self.allocate(Resource::Texture)))
    }

    fn create_texture_view(&mut self, _texture: TextureHandle) -> BackendResult<TextureViewHandle> {
        Ok(TextureViewHandle(self.allocate(Resource::TextureView)))
    }

    fn write_texture(&mut self, _texture: TextureHandle, _data: &[u8], _width: u32, _height: u32, _layers: u32) {}

    fn create_sampler(&mut self, _desc: &SamplerDescriptor) -> BackendResult<SamplerHandle> {
        Ok(SamplerHandle(self.allocate(Resource::Sampler)))
    }

    fn create_bind_group_layout(&mut self, _entries: &[BindGroupLayoutEntry]) -> BackendResult<BindGroupLayoutHandle> {
        Ok(BindGroupLayoutHandle(self.allocate(Resource::BindGroupLayout)))
    }

    fn create_bind_group(
        &mut self,
        _layout: BindGroupLayoutHandle,
        _entries: &[(u32, BindGroupEntry)],
    ) -> BackendResult<BindGroupHandle> {
        Ok(BindGroupHandle(self.allocate(Resource::BindGroup)))
    }

    fn create_render_pipeline(&mut self, _desc: &RenderPipelineDescriptor) -> BackendResult<RenderPipelineHandle> {
        Ok(RenderPipelineHandle(self.allocate(Resource::RenderPipeline)))
    }

    fn begin_render_pass(&mut self, _desc: &RenderPassDescriptor) {}

    fn end_render_pass(&mut self) {}

    fn set_render_pipeline(&mut self, _pipeline: RenderPipelineHandle) {}

    fn set_bind_group(&mut self, _index: u32, _bind_group: BindGroupHandle) {}

    fn set_vertex_buffer(&mut self, _slot: u32, _buffer: BufferHandle, _offset: u64) {}

    fn set_index_buffer(&mut self, _buffer: BufferHandle, _offset: u64, _format: IndexFormat) {}

    fn set_viewport(&mut self, _x: f32, _y: f32, _width: f32, _height: f32, _min_depth: f32, _max_depth: f32) {}

    fn draw(&mut self, _vertices: std::ops::Range<u32>, _instances: std::ops::Range<u32>) {
        self.draws += 1;
    }

    fn draw_indexed(&mut self, _indices: std::ops::Range<u32>, _base_vertex: i32, _instances: std::ops::Range<u32>) {
        self.draws += 1;
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.live.remove(&Resource::Buffer(buffer.0));
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.live.remove(&Resource::Texture(texture.0));
    }

    fn destroy_texture_view(&mut self, view: TextureViewHandle) {
        self.live.remove(&Resource::TextureView(view.0));
    }

    fn destroy_sampler(&mut self, sampler: SamplerHandle) {
        self.live.remove(&Resource::Sampler(sampler.0));
    }

    fn destroy_bind_group_layout(&mut self, layout: BindGroupLayoutHandle) {
        self.live.remove(&Resource::BindGroupLayout(layout.0));
    }

    fn destroy_bind_group(&mut self, bind_group: BindGroupHandle) {
        self.live.remove(&Resource::BindGroup(bind_group.0));
    }

    fn destroy_render_pipeline(&mut self, pipeline: RenderPipelineHandle) {
        self.live.remove(&Resource::RenderPipeline(pipeline.0));
    }
}
