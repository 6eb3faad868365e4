//! Orb Scene
//!
//! Orbit-camera 3D scene viewer with high-resolution PNG export.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use orb_scene::config::AppConfig;
use orb_scene::export::{FileDownloader, ScreenshotExporter};
use orb_scene::render::{HeadlessRenderer, RenderPipeline};
use orb_scene::scene::{self, SceneDescription, presets};
use orb_scene::viewport::Viewport;

/// Time allowed for the headless capture's file write
const CAPTURE_WRITE_TIMEOUT: Duration = Duration::from_secs(60);

/// Orbit-camera scene viewer with high-resolution screenshot export
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Preset name or path to a scene description (.json)
    #[arg(short, long)]
    scene: Option<String>,

    /// Override capture width (pixels)
    #[arg(long)]
    capture_width: Option<i64>,

    /// Override capture height (pixels)
    #[arg(long)]
    capture_height: Option<i64>,

    /// Override the screenshot output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Render one screenshot without opening a window, then exit
    #[arg(long)]
    capture: bool,

    /// Print the built-in scene presets and exit
    #[arg(long)]
    list_scenes: bool,
}

/// Application state
struct App {
    window: Option<Arc<Window>>,
    pipeline: Option<RenderPipeline>,
    config: AppConfig,
    scene: SceneDescription,
    viewport: Viewport,
    exporter: ScreenshotExporter,
    downloader: FileDownloader,
    last_frame: Instant,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
}

impl App {
    fn new(config: AppConfig, scene: SceneDescription) -> Self {
        let viewport = Viewport::new(config.window.width, config.window.height, 1.0)
            .with_max_pixel_ratio(config.window.max_pixel_ratio);
        Self {
            window: None,
            pipeline: None,
            exporter: ScreenshotExporter::new(config.capture.aspect),
            downloader: FileDownloader::new(&config.capture.output_dir),
            config,
            scene,
            viewport,
            last_frame: Instant::now(),
            mouse_pressed: false,
            last_mouse_pos: None,
        }
    }

    fn resize(&mut self, window: &Window, new_size: PhysicalSize<u32>) {
        let scale_factor = window.scale_factor();
        let logical = new_size.to_logical::<u32>(scale_factor);
        self.viewport
            .set_window_size(logical.width, logical.height, scale_factor);

        if let Some(ref mut pipeline) = self.pipeline {
            pipeline.resize_surface(new_size);
            if let Err(e) = self.viewport.apply_window_size(pipeline) {
                log::error!("Failed to resize render target: {}", e);
            }
        }
    }

    fn save(&mut self) {
        let Some(pipeline) = self.pipeline.as_mut() else {
            return;
        };
        let (width, height) = (self.config.capture.width, self.config.capture.height);

        match self
            .exporter
            .export_image(pipeline, &self.viewport, &mut self.downloader, width, height)
        {
            Ok(report) => pipeline.set_status(format!("Saving {}", report.file_name)),
            Err(e) => {
                log::warn!("Screenshot export failed: {}", e);
                pipeline.set_status(e.to_string());
            }
        }
    }

    fn poll_downloads(&mut self) {
        for result in self.downloader.poll() {
            let status = match result {
                Ok(path) => {
                    log::info!("Screenshot saved to {}", path.display());
                    format!("Saved {}", path.display())
                }
                Err(e) => {
                    log::error!("Failed to write screenshot: {}", e);
                    format!("Write failed: {}", e)
                }
            };
            if let Some(ref mut pipeline) = self.pipeline {
                pipeline.set_status(status);
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(LogicalSize::new(self.config.window.width, self.config.window.height));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let pipeline = pollster::block_on(RenderPipeline::new(
            window.clone(),
            &self.scene,
            &self.config.controls,
        ));
        let mut pipeline = match pipeline {
            Ok(pipeline) => pipeline,
            Err(e) => {
                log::error!("Failed to initialise renderer: {}", e);
                event_loop.exit();
                return;
            }
        };
        pipeline.set_capture_size(self.config.capture.width, self.config.capture.height);
        self.pipeline = Some(pipeline);

        self.resize(&window, window.inner_size());
        self.last_frame = Instant::now();

        log::info!("Window created, rendering started");
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // First, let egui handle the event
        let egui_consumed = match self.pipeline {
            Some(ref mut pipeline) => pipeline.handle_event(&window, &event),
            None => false,
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.resize(&window, new_size);
            }
            WindowEvent::MouseInput { state, button, .. } if !egui_consumed => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                }
            }
            WindowEvent::CursorMoved { position, .. } if !egui_consumed => {
                if self.mouse_pressed
                    && let Some((last_x, last_y)) = self.last_mouse_pos
                    && let Some(ref mut pipeline) = self.pipeline
                {
                    pipeline
                        .camera
                        .orbit((position.x - last_x) as f32, (position.y - last_y) as f32);
                }
                self.last_mouse_pos = Some((position.x, position.y));
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.last_mouse_pos = Some((position.x, position.y));
            }
            WindowEvent::MouseWheel { delta, .. } if !egui_consumed => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(ref mut pipeline) = self.pipeline {
                    pipeline.camera.zoom(scroll);
                }
            }
            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if event.state == ElementState::Pressed && !event.repeat {
                    use winit::keyboard::{Key, NamedKey};
                    match event.logical_key {
                        Key::Named(NamedKey::Escape) => event_loop.exit(),
                        Key::Named(NamedKey::F12) => {
                            if let Some(ref mut pipeline) = self.pipeline {
                                pipeline.request_save();
                            }
                        }
                        _ => {}
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = now.duration_since(self.last_frame).as_secs_f32();
                self.last_frame = now;

                let mut save_requested = false;
                if let Some(ref mut pipeline) = self.pipeline {
                    pipeline.update(dt);

                    match pipeline.render(&window) {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            let (width, height) = pipeline.size();
                            pipeline.resize_surface(PhysicalSize::new(width, height));
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("Out of memory!");
                            event_loop.exit();
                        }
                        Err(e) => log::warn!("Render error: {:?}", e),
                    }

                    save_requested = pipeline.take_save_request();
                }
                if save_requested {
                    self.save();
                }
                self.poll_downloads();

                window.request_redraw();
            }
            _ => {}
        }
    }
}

/// Render one capture without a window and wait for it to be written
fn run_capture(config: &AppConfig, scene: &SceneDescription) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let viewport = Viewport::new(config.window.width, config.window.height, 1.0)
        .with_max_pixel_ratio(config.window.max_pixel_ratio);
    let (width, height) = viewport.drawing_buffer_size();

    let mut renderer = pollster::block_on(HeadlessRenderer::new(scene, width, height))?;
    let exporter = ScreenshotExporter::new(config.capture.aspect);
    let mut downloader = FileDownloader::new(&config.capture.output_dir);

    let report = exporter.export_image(
        &mut renderer,
        &viewport,
        &mut downloader,
        config.capture.width,
        config.capture.height,
    )?;
    log::info!("Captured {}x{} '{}'", report.width, report.height, report.file_name);

    match downloader.wait(CAPTURE_WRITE_TIMEOUT) {
        Some(result) => Ok(result?),
        None => Err("timed out waiting for the screenshot to be written".into()),
    }
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.list_scenes {
        for name in presets::PRESET_NAMES {
            println!("{}", name);
        }
        return;
    }

    let mut config = if let Some(ref path) = args.config {
        match AppConfig::from_file(path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path);
                cfg
            }
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                AppConfig::default()
            }
        }
    } else {
        AppConfig::default()
    };

    // Merge CLI overrides
    if let Some(scene) = args.scene {
        config.scene = scene;
    }
    if let Some(width) = args.capture_width {
        config.capture.width = width;
    }
    if let Some(height) = args.capture_height {
        config.capture.height = height;
    }
    if let Some(output_dir) = args.output_dir {
        config.capture.output_dir = output_dir;
    }

    let scene = match scene::load(&config.scene) {
        Ok(scene) => scene,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    log::info!(
        "Scene '{}' with {} objects, capture {}x{} into {}",
        scene.name,
        scene.objects.len(),
        config.capture.width,
        config.capture.height,
        config.capture.output_dir.display()
    );

    if args.capture {
        match run_capture(&config, &scene) {
            Ok(path) => log::info!("Screenshot saved to {}", path.display()),
            Err(e) => {
                log::error!("Capture failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, scene);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop failed: {}", e);
    }
}
