//! Voxglow - voxel world viewer

use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

use voxglow::core::{
    camera::Camera,
    camera_controller::FpsCameraController,
    input::InputState,
    logging,
    time::FrameTimer,
};
use voxglow::render::{context::{AcquireFailure, GpuContext}, VoxelRenderer};
use voxglow::scene::SceneConfig;
use voxglow::voxel::{generate_world, World, WORLD_SIZE};

struct App {
    config: SceneConfig,
    world: World,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    renderer: Option<VoxelRenderer>,
    camera: Camera,
    controller: FpsCameraController,
    input: InputState,
    timer: FrameTimer,
    cursor_grabbed: bool,
}

impl App {
    fn new(config: SceneConfig, world: World) -> Self {
        Self {
            camera: config.camera,
            controller: FpsCameraController::new(config.camera_speed, config.mouse_sensitivity),
            config,
            world,
            window: None,
            gpu: None,
            renderer: None,
            input: InputState::new(),
            timer: FrameTimer::new(),
            cursor_grabbed: false,
        }
    }

    fn toggle_cursor_grab(&mut self) {
        if let Some(window) = &self.window {
            self.cursor_grabbed = !self.cursor_grabbed;

            if self.cursor_grabbed {
                window.set_cursor_grab(CursorGrabMode::Confined)
                    .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked))
                    .ok();
                window.set_cursor_visible(false);
            } else {
                window.set_cursor_grab(CursorGrabMode::None).ok();
                window.set_cursor_visible(true);
            }

            self.input.set_mouse_captured(self.cursor_grabbed);
        }
    }

    /// Flip one of the pipeline switches at runtime
    fn toggle_setting(&mut self, key: KeyCode) {
        let Some(renderer) = &mut self.renderer else { return };
        let mut settings = renderer.settings().clone();
        match key {
            KeyCode::KeyB => settings.bloom = !settings.bloom,
            KeyCode::KeyH => settings.half_resolution = !settings.half_resolution,
            _ => return,
        }
        log::info!(
            "Bloom {}, half resolution {}",
            settings.bloom,
            settings.half_resolution
        );
        renderer.set_settings(settings);
    }

    /// Draw one frame. Returns false when rendering can't continue.
    fn render(&mut self) -> bool {
        let Some(gpu) = &mut self.gpu else { return true };
        let Some(renderer) = &mut self.renderer else { return true };
        let Some(voxels) = self.world.texture() else { return true };

        let output = match gpu.get_current_texture() {
            Ok(t) => t,
            Err(e) => return gpu.handle_surface_error(e) != AcquireFailure::Fatal,
        };

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let (width, height) = gpu.size();

        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });
        renderer.render(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &view,
            self.camera,
            width,
            height,
            voxels,
        );
        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        true
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Voxglow")
            .with_inner_size(PhysicalSize::new(self.config.window_width, self.config.window_height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let gpu = match pollster::block_on(GpuContext::new(window.clone())) {
            Ok(gpu) => gpu,
            Err(e) => {
                log::error!("Failed to create GPU context: {}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        log::info!("Window created: {}x{}", size.width, size.height);

        self.world.upload_to_gpu(&gpu.device, &gpu.queue);
        let renderer = VoxelRenderer::new(&gpu.device, gpu.format(), self.config.render.clone());

        self.window = Some(window);
        self.renderer = Some(renderer);
        self.gpu = Some(gpu);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.process_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        match code {
                            KeyCode::Escape => {
                                if self.cursor_grabbed {
                                    self.toggle_cursor_grab();
                                } else {
                                    event_loop.exit();
                                }
                            }
                            KeyCode::Tab => self.toggle_cursor_grab(),
                            KeyCode::KeyB | KeyCode::KeyH => self.toggle_setting(code),
                            _ => {}
                        }
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                self.input.begin_frame();
                if let Some(fps) = self.timer.tick() {
                    log::info!("{:.1} FPS", fps);
                    if let Some(window) = &self.window {
                        window.set_title(&format!(
                            "Voxglow - {:.1} FPS | Tab=mouse, WASD=move, B=bloom, H=half res",
                            fps
                        ));
                    }
                }

                let dt = self.timer.delta_secs();
                self.controller.update(&mut self.camera, &self.input, dt);

                if !self.render() {
                    event_loop.exit();
                }

                self.input.end_frame();

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.input.process_mouse_motion(delta);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = parse_path_arg(&args, "--config");

    let config = match SceneConfig::load_or_default(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    if args.iter().any(|a| a == "--dump-config") {
        match config.to_json_pretty() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                log::error!("Failed to serialize config: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    log::info!("Voxglow starting...");
    let (world, _stats) = generate_world::<WORLD_SIZE>(&config.terrain, &config.trees);

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let mut app = App::new(config, world);

    event_loop.run_app(&mut app).expect("Event loop error");
}

/// Parse a path-valued flag from the command line
fn parse_path_arg(args: &[String], flag: &str) -> Option<PathBuf> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}
