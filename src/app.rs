//! Application shell
//!
//! Owns the winit event loop and drives the per-frame sequence: sample
//! input, run the user update callback, refresh the camera, upload globals,
//! render. The window close request (or escape) is the only exit path.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use cgmath::Vector3;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowAttributes},
};

use crate::gfx::{
    camera::{
        camera_controller::CameraController, camera_utils::CameraManager, fly_camera::FlyCamera,
    },
    rendering::render_engine::RenderEngine,
    scene::Scene,
};

/// Keyboard state sampled once per frame by the update callback.
pub struct InputState {
    pressed: HashSet<KeyCode>,
}

impl InputState {
    fn new() -> Self {
        Self {
            pressed: HashSet::new(),
        }
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }
}

/// Runs once when the GPU exists; load models, textures and the skybox here.
pub type SetupCallback = Box<dyn FnOnce(&mut Scene, &mut RenderEngine) -> anyhow::Result<()>>;

/// Runs every frame before the camera update and the draw.
pub type UpdateCallback = Box<dyn FnMut(&mut Scene, &InputState, f32)>;

pub struct BraeApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    scene: Scene,
    input: InputState,
    setup_callback: Option<SetupCallback>,
    update_callback: Option<UpdateCallback>,
    last_frame: Instant,
}

impl BraeApp {
    /// Create a new application with default settings.
    pub fn new() -> Self {
        let event_loop = EventLoop::new().expect("Failed to create event loop");

        let camera = FlyCamera::new(Vector3::new(0.0, 0.0, 3.0), 0.0, -90.0, 800.0 / 600.0);
        let controller = CameraController::new(2.0, 0.1);
        let camera_manager = CameraManager::new(camera, controller);
        let scene = Scene::new(camera_manager);

        Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                render_engine: None,
                scene,
                input: InputState::new(),
                setup_callback: None,
                update_callback: None,
                last_frame: Instant::now(),
            },
        }
    }

    /// Set the one-shot scene setup callback.
    pub fn set_setup<F>(&mut self, setup: F)
    where
        F: FnOnce(&mut Scene, &mut RenderEngine) -> anyhow::Result<()> + 'static,
    {
        self.app_state.setup_callback = Some(Box::new(setup));
    }

    /// Set the per-frame update callback.
    pub fn set_update<F>(&mut self, update: F)
    where
        F: FnMut(&mut Scene, &InputState, f32) + 'static,
    {
        self.app_state.update_callback = Some(Box::new(update));
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.app_state.scene
    }

    /// Run the application (consumes self and starts the event loop).
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self.event_loop.take().expect("Event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)?;
        Ok(())
    }
}

impl Default for BraeApp {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title("brae")
            .with_inner_size(winit::dpi::LogicalSize::new(800, 600));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        // mouse-delta look wants a captured, hidden cursor
        if window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
            .is_err()
        {
            log::warn!("cursor grab not supported on this platform");
        }
        window.set_cursor_visible(false);

        let (width, height) = window.inner_size().into();
        let window_clone = window.clone();
        let mut renderer =
            pollster::block_on(async move { RenderEngine::new(window_clone, width, height).await });

        self.scene
            .camera_manager
            .camera
            .resize_projection(width, height);

        if let Some(setup) = self.setup_callback.take() {
            if let Err(e) = setup(&mut self.scene, &mut renderer) {
                log::error!("scene setup failed: {:#}", e);
            }
        }

        self.scene
            .init_gpu_resources(renderer.device(), renderer.queue());
        self.render_engine = Some(renderer);
        self.last_frame = Instant::now();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(render_engine) = self.render_engine.as_mut() else {
            return;
        };

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state,
                        ..
                    },
                ..
            } => {
                if matches!(key_code, KeyCode::Escape) {
                    event_loop.exit();
                    return;
                }

                match state {
                    ElementState::Pressed => {
                        self.input.pressed.insert(key_code);
                    }
                    ElementState::Released => {
                        self.input.pressed.remove(&key_code);
                    }
                }

                self.scene
                    .camera_manager
                    .controller
                    .process_keyboard(key_code, state);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.scene
                    .camera_manager
                    .camera
                    .resize_projection(width, height);
                render_engine.resize(width, height);
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_frame.elapsed().as_secs_f32();
                self.last_frame = Instant::now();

                // per-frame order: scene mutation, camera refresh,
                // transform recompute, uniform upload, draw
                if let Some(update) = self.update_callback.as_mut() {
                    update(&mut self.scene, &self.input, dt);
                }
                self.scene.update(dt);
                self.scene.update_transforms(render_engine.queue());
                render_engine.update(&self.scene);
                render_engine.render_frame(&self.scene);
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        if let winit::event::DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.scene
                .camera_manager
                .controller
                .process_mouse(dx, dy);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
