//! Window management using winit

use std::sync::Arc;
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    window::{Window as WinitWindow, WindowBuilder},
};

use crate::error::{DemoError, DemoResult};

/// What the event handler wants the loop to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Wrapper around winit window with additional state
pub struct Window {
    window: Arc<WinitWindow>,
    width: u32,
    height: u32,
    close_requested: bool,
}

impl Window {
    /// Create a new window with the given title and dimensions
    pub fn new(event_loop: &EventLoop<()>, title: &str, width: u32, height: u32) -> DemoResult<Self> {
        let window = WindowBuilder::new()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(width, height))
            .build(event_loop)
            .map_err(|e| DemoError::Window(e.to_string()))?;

        Ok(Self {
            window: Arc::new(window),
            width,
            height,
            close_requested: false,
        })
    }

    /// Get arc reference to window
    pub fn window_arc(&self) -> Arc<WinitWindow> {
        Arc::clone(&self.window)
    }

    /// Get current window dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn should_close(&self) -> bool {
        self.close_requested
    }

    /// Track size and close state from window events
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::Resized(size) => {
                self.width = size.width;
                self.height = size.height;
            }
            WindowEvent::CloseRequested => {
                self.close_requested = true;
            }
            _ => {}
        }
    }

    /// Request a redraw
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

/// Run the event loop until the window closes or `handler` asks to exit.
///
/// Redraws are requested continuously, so `handler` sees a
/// `RedrawRequested` event every frame.
pub fn run<F>(event_loop: EventLoop<()>, mut window: Window, mut handler: F) -> DemoResult<()>
where
    F: FnMut(&mut Window, &Event<()>) -> LoopControl,
{
    event_loop
        .run(move |event, elwt: &EventLoopWindowTarget<()>| {
            elwt.set_control_flow(ControlFlow::Poll);

            if let Event::WindowEvent { event, .. } = &event {
                window.handle_event(event);
            }

            if handler(&mut window, &event) == LoopControl::Exit || window.should_close() {
                elwt.exit();
                return;
            }

            if let Event::AboutToWait = event {
                window.request_redraw();
            }
        })
        .map_err(|e| DemoError::Window(e.to_string()))
}
