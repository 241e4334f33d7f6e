use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::camera::Camera;
use crate::color::{Color, ColorEncoding};
use crate::ecs::{FrameStamp, MeshId, TextureId, queue_world, update_world};
use crate::error::{Error, Result};
use crate::gpu::GpuContext;
use crate::input::is_exit_request;
use crate::light::PointLight;
use crate::mesh::Mesh;
use crate::mesh_pass::MeshPass;
use crate::mesh_queue::MeshQueue;
use crate::texture::{Texture, TextureOptions};
use hecs::World;

/// Context provided during app setup.
///
/// Setup spawns the scene's entities into [`world`](Self::world) and
/// registers the meshes and textures they refer to.
pub struct SetupContext<'a> {
    pub gpu: &'a GpuContext,
    pub world: &'a mut World,
    mesh_queue: &'a mut MeshQueue,
    camera: &'a mut Camera,
    light: &'a mut PointLight,
    start_time: Instant,
}

impl SetupContext<'_> {
    /// Seconds since the app started, on the same clock as
    /// [`FrameStamp::reference_time`].
    pub fn now(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Create a cube mesh with the given edge length and return its handle.
    pub fn mesh_cube(&mut self, size: f32) -> MeshId {
        let mesh = Mesh::cube(self.gpu, size);
        self.mesh_queue.add_mesh(mesh)
    }

    /// Create a sphere mesh and return its handle.
    pub fn mesh_sphere(&mut self, radius: f32, segments: u32, rings: u32) -> MeshId {
        let mesh = Mesh::sphere(self.gpu, radius, segments, rings);
        self.mesh_queue.add_mesh(mesh)
    }

    /// Load a texture from a file path and return its handle.
    pub fn texture_from_file(&mut self, path: &str) -> Result<TextureId> {
        let options = TextureOptions::default().with_encoding(self.gpu.encoding());
        let texture = Texture::from_file(self.gpu, path, options)?;
        Ok(self.mesh_queue.add_texture(texture))
    }

    /// Set the camera the scene is viewed through.
    pub fn camera(&mut self, camera: Camera) -> &mut Self {
        *self.camera = camera;
        self
    }

    /// Set the scene's point light.
    pub fn light(&mut self, light: PointLight) -> &mut Self {
        *self.light = light;
        self
    }
}

/// Configuration for the app window.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: Color,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Tumble".to_string(),
            width: 800,
            height: 600,
            clear_color: Color::BLACK,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }
}

/// Run a scene with custom configuration.
///
/// `setup` runs once, when the window and GPU are ready. Every redraw the
/// driver then stamps the frame, runs each entity's [`Animator`](crate::Animator)
/// and draws every entity that has a [`RenderMesh`](crate::RenderMesh).
///
/// Returns when the window is closed or Escape is pressed. Errors creating
/// the event loop, window or GPU context are returned.
///
/// # Example
/// ```ignore
/// tumble::run_with_config(AppConfig::new().title("Cubes"), |ctx| {
///     let cube = ctx.mesh_cube(1.0);
///     let start = ctx.now();
///     ctx.world.spawn((
///         Transform::new(),
///         RenderMesh::new(cube, Color::WHITE),
///         Animator::Spin(PoseGenerator::new(Vec3::ZERO, start)),
///     ));
/// })?;
/// ```
pub fn run_with_config<S>(config: AppConfig, setup: S) -> Result<()>
where
    S: FnOnce(&mut SetupContext) + 'static,
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = TumbleApp {
        state: AppState::Pending {
            config,
            setup: Some(Box::new(setup)),
        },
        error: None,
    };

    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

type SetupFn = Box<dyn FnOnce(&mut SetupContext)>;

struct TumbleApp {
    state: AppState,
    /// Startup failure, returned from `run_with_config` once the loop exits.
    error: Option<Error>,
}

enum AppState {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn>,
    },
    Running(Box<Running>),
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    world: World,
    mesh_queue: MeshQueue,
    mesh_pass: MeshPass,
    camera: Camera,
    light: PointLight,
    clear_color: Color,
    start_time: Instant,
    frame_number: u64,
}

impl Running {
    fn start(event_loop: &ActiveEventLoop, config: &AppConfig, setup: SetupFn) -> Result<Self> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone(), ColorEncoding::Srgb)?;
        gpu.log_startup_info();

        let mesh_pass = MeshPass::new(&gpu);
        let mut world = World::new();
        let mut mesh_queue = MeshQueue::new();
        let mut camera = Camera::new();
        let mut light = PointLight::default();
        let start_time = Instant::now();

        setup(&mut SetupContext {
            gpu: &gpu,
            world: &mut world,
            mesh_queue: &mut mesh_queue,
            camera: &mut camera,
            light: &mut light,
            start_time,
        });
        log::debug!("Scene set up with {} entities", world.len());

        Ok(Self {
            window,
            gpu,
            world,
            mesh_queue,
            mesh_pass,
            camera,
            light,
            clear_color: config.clear_color,
            start_time,
            frame_number: 0,
        })
    }

    fn redraw(&mut self) {
        let stamp = FrameStamp {
            reference_time: self.start_time.elapsed().as_secs_f64(),
            frame_number: self.frame_number,
        };
        update_world(&mut self.world, &stamp);

        self.mesh_queue.clear_queue();
        queue_world(&self.world, &mut self.mesh_queue);
        self.render();

        self.frame_number += 1;
    }

    fn render(&mut self) {
        let Some(output) = self.gpu.acquire_frame() else {
            return;
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let draw_calls = self.mesh_queue.draw_calls();
        self.mesh_pass.ensure_depth_size(&self.gpu);
        self.mesh_pass
            .prepare(&self.gpu, &self.camera, &self.light, &draw_calls);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(self.mesh_pass.depth_attachment()),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.mesh_pass.draw(&mut render_pass, &draw_calls);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

impl ApplicationHandler for TumbleApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Pending { config, setup } = &mut self.state else {
            return;
        };
        let Some(setup) = setup.take() else {
            return;
        };

        match Running::start(event_loop, config, setup) {
            Ok(running) => {
                running.window.request_redraw();
                self.state = AppState::Running(Box::new(running));
            }
            Err(e) => {
                log::error!("Startup failed: {}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let AppState::Running(running) = &mut self.state else {
            return;
        };

        if is_exit_request(&event) {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::Resized(size) => {
                running.gpu.resize(size.width, size.height);
                log::info!(
                    "New viewport: (width: {}, height: {})",
                    size.width,
                    size.height
                );
            }
            WindowEvent::RedrawRequested => {
                running.redraw();
                running.window.request_redraw();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_overrides_defaults() {
        let config = AppConfig::new()
            .title("Cubes")
            .size(640, 480)
            .clear_color(Color::WHITE);

        assert_eq!(config.title, "Cubes");
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.clear_color, Color::WHITE);
        assert_eq!(AppConfig::default().clear_color, Color::BLACK);
    }
}
