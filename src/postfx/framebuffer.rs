//! Off-screen render targets

use crate::backend::*;

/// Colour format of every framebuffer
pub const FRAMEBUFFER_COLOR_FORMAT: TextureFormat = TextureFormat::Rgba16Float;
pub const FRAMEBUFFER_DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

#[derive(Debug, Clone, Copy)]
struct Attachment {
    texture: TextureHandle,
    view: TextureViewHandle,
}

impl Attachment {
    fn create<B: GraphicsBackend>(
        backend: &mut B,
        label: String,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> BackendResult<Self> {
        let usage = if format.is_depth() {
            TextureUsage::RENDER_ATTACHMENT
        } else {
            TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING
        };
        let texture = backend.create_texture(&TextureDescriptor {
            label: Some(label),
            width,
            height,
            format,
            usage,
            ..Default::default()
        })?;
        let view = backend.create_texture_view(texture)?;
        Ok(Self { texture, view })
    }

    fn release<B: GraphicsBackend>(self, backend: &mut B) {
        backend.destroy_texture_view(self.view);
        backend.destroy_texture(self.texture);
    }
}

/// Colour target with an optional depth target.
///
/// Holds no GPU memory until [`Framebuffer::init`]; resources are recreated on
/// every `init` and freed by [`Framebuffer::release`].
#[derive(Debug)]
pub struct Framebuffer {
    label: String,
    with_depth: bool,
    width: u32,
    height: u32,
    color: Option<Attachment>,
    depth: Option<Attachment>,
}

impl Framebuffer {
    pub fn new(label: &str, with_depth: bool) -> Self {
        Self {
            label: label.to_string(),
            with_depth,
            width: 0,
            height: 0,
            color: None,
            depth: None,
        }
    }

    pub fn init<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> BackendResult<()> {
        self.release(backend);

        let (width, height) = (width.max(1), height.max(1));
        self.color = Some(Attachment::create(
            backend,
            format!("{} Color", self.label),
            width,
            height,
            FRAMEBUFFER_COLOR_FORMAT,
        )?);
        if self.with_depth {
            self.depth = Some(Attachment::create(
                backend,
                format!("{} Depth", self.label),
                width,
                height,
                FRAMEBUFFER_DEPTH_FORMAT,
            )?);
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Recreate the targets if the size changed
    pub fn resize<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> BackendResult<()> {
        if self.is_initialized() && self.size() == (width.max(1), height.max(1)) {
            return Ok(());
        }
        self.init(backend, width, height)
    }

    pub fn release<B: GraphicsBackend>(&mut self, backend: &mut B) {
        if let Some(color) = self.color.take() {
            color.release(backend);
        }
        if let Some(depth) = self.depth.take() {
            depth.release(backend);
        }
        self.width = 0;
        self.height = 0;
    }

    /// Record a pass that clears colour (and depth to 1.0)
    pub fn clear<B: GraphicsBackend>(&self, backend: &mut B, color: [f32; 4]) {
        if let Some(desc) = self.render_pass(Some(color)) {
            backend.begin_render_pass(&desc);
            backend.end_render_pass();
        }
    }

    /// Pass descriptor targeting this framebuffer, clearing when `clear` is set
    pub fn render_pass(&self, clear: Option<[f32; 4]>) -> Option<RenderPassDescriptor> {
        let color = self.color?;
        Some(RenderPassDescriptor {
            label: Some(self.label.clone()),
            color_attachments: vec![ColorAttachment {
                view: color.view,
                load_op: clear.map_or(LoadOp::Load, LoadOp::Clear),
                store_op: StoreOp::Store,
            }],
            depth_stencil_attachment: self.depth.map(|depth| DepthStencilAttachment {
                view: depth.view,
                depth_load_op: if clear.is_some() {
                    LoadOp::Clear([1.0, 0.0, 0.0, 0.0])
                } else {
                    LoadOp::Load
                },
                depth_store_op: StoreOp::Store,
                depth_clear_value: 1.0,
            }),
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.color.is_some()
    }

    pub fn has_depth(&self) -> bool {
        self.with_depth
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn color_view(&self) -> Option<TextureViewHandle> {
        self.color.map(|c| c.view)
    }

    pub fn depth_view(&self) -> Option<TextureViewHandle> {
        self.depth.map(|d| d.view)
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_framebuffer_has_no_targets() {
        let fb = Framebuffer::new("Scene", true);
        assert!(!fb.is_initialized());
        assert!(fb.has_depth());
        assert_eq!(fb.size(), (0, 0));
        assert!(fb.color_view().is_none());
        assert!(fb.render_pass(Some([0.0; 4])).is_none());
    }
}
