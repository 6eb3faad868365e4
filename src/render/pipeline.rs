//! Windowed render pipeline
//!
//! Each frame the scene is drawn into an offscreen [`RenderTarget`], blitted
//! to the window surface and overlaid with the egui panel. Capture resizes
//! only touch the offscreen target, so the swapchain keeps the window size
//! throughout an export.

use std::sync::Arc;

use crate::config::ControlsConfig;
use crate::render::camera::Camera;
use crate::render::gpu::{self, GpuError};
use crate::render::scene_renderer::SceneRenderer;
use crate::render::target::{CaptureError, RenderTarget};
use crate::scene::{self, SceneDescription};
use crate::viewport::RenderSurface;

/// Values the panel reads and edits during one frame
struct PanelState {
    scene_name: String,
    object_count: usize,
    triangle_count: usize,
    fps: f32,
    target_size: (u32, u32),
    capture_size: (i64, i64),
    camera_distance: f32,
    camera_yaw: f32,
    camera_pitch: f32,
    damping_enabled: bool,
    damping_factor: f32,
    status: Option<String>,
    save_clicked: bool,
}

/// Main render pipeline for the window
pub struct RenderPipeline {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    scene: SceneRenderer,
    target: RenderTarget,
    blit_pipeline: wgpu::RenderPipeline,
    blit_layout: wgpu::BindGroupLayout,
    blit_sampler: wgpu::Sampler,
    blit_bind_group: wgpu::BindGroup,
    pub camera: Camera,
    scene_name: String,
    object_count: usize,
    // Controls
    damping_enabled: bool,
    damping_factor: f32,
    // egui integration
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    // Performance tracking
    frame_times: Vec<f32>,
    fps: f32,
    // Export state
    capture_size: (i64, i64),
    save_requested: bool,
    status: Option<String>,
}

impl RenderPipeline {
    /// Create the pipeline for `window`, rendering `description`
    pub async fn new(
        window: Arc<winit::window::Window>,
        description: &SceneDescription,
        controls: &ControlsConfig,
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

        let instance = gpu::create_instance();
        let surface = instance
            .create_surface(window.clone())
            .map_err(GpuError::Surface)?;
        let (adapter, device, queue) =
            gpu::request_device(&instance, Some(&surface), "Window Device").await?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let (surface_format, alpha_mode) = gpu::surface_format(&surface_caps)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let target = RenderTarget::new(&device, width, height)?;

        let mut camera = Camera::from_placement(&description.camera, width as f32 / height as f32);
        camera.damping = controls.damping();

        let assembled = scene::assemble(description);
        let scene = SceneRenderer::new(&device, &assembled, &camera);
        log::info!(
            "Scene '{}': {} objects, {} meshes, {} triangles",
            description.name,
            assembled.draws.len(),
            assembled.meshes.len(),
            assembled.triangle_count()
        );

        // Blit from the offscreen target to the surface
        let blit_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("blit_bind_group_layout"),
        });
        let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Blit Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let blit_bind_group = Self::create_blit_bind_group(&device, &blit_layout, &blit_sampler, &target);

        let blit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });
        let blit_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blit Pipeline Layout"),
            bind_group_layouts: &[&blit_layout],
            push_constant_ranges: &[],
        });
        let blit_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Blit Pipeline"),
            layout: Some(&blit_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &blit_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &blit_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            scene,
            target,
            blit_pipeline,
            blit_layout,
            blit_sampler,
            blit_bind_group,
            camera,
            scene_name: description.name.clone(),
            object_count: assembled.draws.len(),
            damping_enabled: controls.damping_enabled,
            damping_factor: controls.damping_factor,
            egui_ctx,
            egui_state,
            egui_renderer,
            frame_times: Vec::with_capacity(60),
            fps: 0.0,
            capture_size: (0, 0),
            save_requested: false,
            status: None,
        })
    }

    fn create_blit_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        target: &RenderTarget,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(target.color_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some("blit_bind_group"),
        })
    }

    /// Reconfigure the swapchain for a new window size
    ///
    /// The offscreen target and camera aspect are left to the viewport.
    pub fn resize_surface(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Handle window events for egui
    pub fn handle_event(&mut self, window: &winit::window::Window, event: &winit::event::WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        response.consumed
    }

    /// Advance damped camera motion and frame timing
    pub fn update(&mut self, dt: f32) {
        self.camera.damping = self.damping_enabled.then_some(self.damping_factor);
        self.camera.update();

        // Track FPS
        self.frame_times.push(dt);
        if self.frame_times.len() > 60 {
            self.frame_times.remove(0);
        }
        if !self.frame_times.is_empty() {
            let avg_dt: f32 = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
            self.fps = 1.0 / avg_dt;
        }

        self.scene.update_camera(&self.queue, &self.camera);
    }

    /// Resolution shown on the save button
    pub fn set_capture_size(&mut self, width: i64, height: i64) {
        self.capture_size = (width, height);
    }

    /// Queue a save, as if the panel button had been clicked
    pub fn request_save(&mut self) {
        self.save_requested = true;
    }

    /// Returns and clears a pending save request
    pub fn take_save_request(&mut self) -> bool {
        std::mem::take(&mut self.save_requested)
    }

    /// Message shown under the save button
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    /// Render a frame with egui overlay
    pub fn render(&mut self, window: &winit::window::Window) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let raw_input = self.egui_state.take_egui_input(window);
        let mut panel = PanelState {
            scene_name: self.scene_name.clone(),
            object_count: self.object_count,
            triangle_count: self.scene.triangle_count(),
            fps: self.fps,
            target_size: self.target.size(),
            capture_size: self.capture_size,
            camera_distance: self.camera.distance,
            camera_yaw: self.camera.yaw,
            camera_pitch: self.camera.pitch,
            damping_enabled: self.damping_enabled,
            damping_factor: self.damping_factor,
            status: self.status.clone(),
            save_clicked: false,
        };
        let egui_output = self.egui_ctx.run(raw_input, |ctx| build_ui(ctx, &mut panel));

        self.damping_enabled = panel.damping_enabled;
        self.damping_factor = panel.damping_factor;
        if panel.save_clicked {
            self.save_requested = true;
        }

        self.egui_state.handle_platform_output(window, egui_output.platform_output);

        let clipped_primitives = self.egui_ctx.tessellate(egui_output.shapes, egui_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: egui_output.pixels_per_point,
        };

        for (id, image_delta) in &egui_output.textures_delta.set {
            self.egui_renderer.update_texture(&self.device, &self.queue, *id, image_delta);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        self.scene
            .encode(&mut encoder, self.target.color_view(), self.target.depth_view());

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.blit_pipeline);
            render_pass.set_bind_group(0, &self.blit_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                })
                .forget_lifetime();

            self.egui_renderer.render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Swapchain size in physical pixels
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}

impl RenderSurface for RenderPipeline {
    fn set_camera_aspect(&mut self, aspect: f32) {
        self.camera.set_aspect(aspect);
    }

    fn camera_aspect(&self) -> f32 {
        self.camera.aspect
    }

    fn resize_target(&mut self, width: u32, height: u32) -> Result<(), CaptureError> {
        if (width, height) == self.target.size() {
            return Ok(());
        }
        self.target.resize(&self.device, width, height)?;
        self.blit_bind_group =
            Self::create_blit_bind_group(&self.device, &self.blit_layout, &self.blit_sampler, &self.target);
        Ok(())
    }

    fn target_size(&self) -> (u32, u32) {
        self.target.size()
    }

    fn render_capture(&mut self) -> Result<Vec<u8>, CaptureError> {
        self.scene.update_camera(&self.queue, &self.camera);
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Capture Encoder"),
        });
        self.scene
            .encode(&mut encoder, self.target.color_view(), self.target.depth_view());
        self.queue.submit(std::iter::once(encoder.finish()));
        self.target.read_pixels(&self.device, &self.queue)
    }
}

fn build_ui(ctx: &egui::Context, panel: &mut PanelState) {
    egui::Window::new("Tweaks")
        .default_pos([10.0, 10.0])
        .default_width(240.0)
        .resizable(false)
        .show(ctx, |ui| {
            ui.heading(&panel.scene_name);
            ui.separator();

            ui.checkbox(&mut panel.damping_enabled, "Damping");
            ui.add_enabled(
                panel.damping_enabled,
                egui::Slider::new(&mut panel.damping_factor, 0.01..=0.5)
                    .text("Factor")
                    .fixed_decimals(2),
            );

            ui.separator();
            ui.collapsing("Camera Info", |ui| {
                egui::Grid::new("camera_grid")
                    .num_columns(2)
                    .spacing([20.0, 4.0])
                    .show(ui, |ui| {
                        ui.label("Distance:");
                        ui.label(format!("{:.2}", panel.camera_distance));
                        ui.end_row();

                        ui.label("Yaw:");
                        ui.label(format!("{:.1}°", panel.camera_yaw.to_degrees()));
                        ui.end_row();

                        ui.label("Pitch:");
                        ui.label(format!("{:.1}°", panel.camera_pitch.to_degrees()));
                        ui.end_row();
                    });
            });

            ui.collapsing("Performance", |ui| {
                egui::Grid::new("perf_grid")
                    .num_columns(2)
                    .spacing([20.0, 4.0])
                    .show(ui, |ui| {
                        ui.label("FPS:");
                        ui.label(format!("{:.0}", panel.fps));
                        ui.end_row();

                        ui.label("Target:");
                        ui.label(format!("{}x{}", panel.target_size.0, panel.target_size.1));
                        ui.end_row();

                        ui.label("Objects:");
                        ui.label(format!("{}", panel.object_count));
                        ui.end_row();

                        ui.label("Triangles:");
                        ui.label(format!("{}", panel.triangle_count));
                        ui.end_row();
                    });
            });

            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("save").clicked() {
                    panel.save_clicked = true;
                }
                ui.label(format!("{}x{} PNG", panel.capture_size.0, panel.capture_size.1));
            });
            if let Some(status) = &panel.status {
                ui.small(status);
            }

            ui.separator();
            ui.small("F12: save | Drag to rotate | Scroll to zoom | ESC to exit");
        });
}
