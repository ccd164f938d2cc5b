use brick_scene::args::Args;
use brick_scene::window::{self, LoopControl};
use brick_scene::{DemoError, DemoResult, Engine, Window};
use clap::Parser;
use winit::event::{DeviceEvent, Event, WindowEvent};
use winit::event_loop::EventLoop;

fn main() -> DemoResult<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = args.into_config();
    log::info!("Asset root: {}", config.asset_root.display());

    let event_loop = EventLoop::new().map_err(|e| DemoError::Window(e.to_string()))?;
    let window = Window::new(&event_loop, &config.title, config.width, config.height)?;
    let mut engine = Engine::new(window.window_arc(), &config)?;
    let max_frames = config.max_frames;

    let mut failure: Option<DemoError> = None;
    let result = window::run(event_loop, window, |window, event| {
        match event {
            Event::WindowEvent { event, .. } => {
                engine.handle_window_event(event);
                match event {
                    WindowEvent::Resized(_) => {
                        let (width, height) = window.dimensions();
                        if let Err(err) = engine.resize(width, height) {
                            failure = Some(err);
                            return LoopControl::Exit;
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        if let Err(err) = engine.frame() {
                            failure = Some(err);
                            return LoopControl::Exit;
                        }
                        if max_frames.is_some_and(|max| engine.frame_count() >= max) {
                            log::info!("Reached {} frames", engine.frame_count());
                            return LoopControl::Exit;
                        }
                    }
                    _ => {}
                }
            }
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => engine.handle_mouse_motion(delta.0, delta.1),
            Event::LoopExiting => engine.shutdown(),
            _ => {}
        }
        LoopControl::Continue
    });

    match failure {
        Some(err) => {
            log::error!("{}", err);
            Err(err)
        }
        None => result,
    }
}
