//! vrview - 3D/VR animation viewer
//!
//! Hosts the animation display in a native window. The host has no VR
//! runtime, so toggling VR reports that no device is available.

use std::path::Path;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::WindowId,
};

use vrview::config::AppConfig;
use vrview::display::AnimationDisplay;
use vrview::input::{InputAction, InputMapper};
use vrview::scene::default_scene;
use vrview::systems::{FrameStatsLogger, WindowContainer, WindowSurfaceProvider, WindowSystem};
use vrview_xr::UnsupportedBackend;

/// Main application state
struct App {
    config: AppConfig,
    window: Option<WindowSystem>,
    display: Option<AnimationDisplay>,
    /// Last cursor position in logical pixels
    cursor: (f64, f64),
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            window: None,
            display: None,
            cursor: (0.0, 0.0),
        }
    }

    /// Build the display inside `window` and load the scene
    fn build_display(&self, window: &WindowSystem) -> Option<AnimationDisplay> {
        let container = WindowContainer::new(window.window().clone());
        let provider = WindowSurfaceProvider::new(
            window.window().clone(),
            self.config.window.vsync,
            &self.config.display,
        );

        let mut display = AnimationDisplay::new(
            Box::new(container),
            Box::new(provider),
            Box::new(UnsupportedBackend::new()),
            self.config.clone(),
        );
        if self.config.debug.show_stats {
            display = display.with_stats(Box::new(FrameStatsLogger::default()));
        }

        if let Err(e) = display.init() {
            log::error!("Failed to initialise display: {}", e);
            return None;
        }

        let scene_path = &self.config.display.scene_path;
        if Path::new(scene_path).exists() {
            display.load_scene(scene_path);
        } else {
            log::info!("Scene '{}' not found; using the built-in scene", scene_path);
            display.load_template(&default_scene());
        }

        if self.config.effects.enabled {
            display.add_composer();
        }
        display.create_scene();
        Some(display)
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match WindowSystem::create(event_loop, &self.config.window) {
            Ok(window) => window,
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                return;
            }
        };

        let Some(display) = self.build_display(&window) else {
            event_loop.exit();
            return;
        };

        window.update_title(display.vr_mode());
        window.request_redraw();
        self.window = Some(window);
        self.display = Some(display);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let (Some(window), Some(display)) = (&self.window, &mut self.display) else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                display.destroy();
                event_loop.exit();
            }

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                display.update_view();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return;
                };
                let key_event = InputMapper::key_event(key);
                match event.state {
                    ElementState::Pressed => display.on_key_down(&key_event),
                    ElementState::Released => display.on_key_up(&key_event),
                }

                match InputMapper::map_keyboard(key, event.state) {
                    Some(InputAction::ToggleVr) => {
                        display.toggle_vr_mode();
                        window.update_title(display.vr_mode());
                    }
                    Some(InputAction::ToggleFullscreen) => window.toggle_fullscreen(),
                    Some(InputAction::Exit) => {
                        display.destroy();
                        event_loop.exit();
                    }
                    None => {}
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f64>(window.window().scale_factor());
                self.cursor = (logical.x, logical.y);
                display.on_mouse_move(&InputMapper::pointer_event(logical.x, logical.y, None));
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let (x, y) = self.cursor;
                let pointer = InputMapper::pointer_event(x, y, Some(button));
                match state {
                    ElementState::Pressed => {
                        display.on_mouse_down(&pointer);
                        if button == winit::event::MouseButton::Right {
                            display.on_context_menu(&pointer);
                        }
                    }
                    ElementState::Released => display.on_mouse_up(&pointer),
                }
            }

            WindowEvent::RedrawRequested => {
                display.on_animation_frame();
                window.request_redraw();
            }

            _ => {}
        }
    }
}

fn main() {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()),
    )
    .init();
    log::info!("Starting vrview");

    // Create event loop
    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app).expect("Event loop error");
}
