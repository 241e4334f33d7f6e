use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use tumble::{
    Color, ColorEncoding, FaceCubeRenderer, GpuContext, PoseGenerator, PoseRates, Vec3,
    is_exit_request,
};

const TITLE: &str = "My spinning cube - Texture over 1 face";
const TEXTURE_PATH: &str = "texture.jpg";

struct Viewer {
    window: Arc<Window>,
    gpu: GpuContext,
    cube: FaceCubeRenderer,
}

#[derive(Default)]
struct App {
    viewer: Option<Viewer>,
    error: Option<tumble::Error>,
    start_time: Option<Instant>,
    generator: Option<PoseGenerator>,
}

impl App {
    fn create_viewer(event_loop: &ActiveEventLoop) -> tumble::Result<Viewer> {
        let window_attrs = WindowAttributes::default()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::PhysicalSize::new(640, 480));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        // Vertex colors go to the screen unconverted, as in a plain GL framebuffer.
        let gpu = GpuContext::new(window.clone(), ColorEncoding::Direct)?;
        gpu.log_startup_info();

        let cube = FaceCubeRenderer::new(&gpu, TEXTURE_PATH);

        Ok(Viewer { window, gpu, cube })
    }

    fn render(&mut self) {
        let (Some(viewer), Some(start), Some(generator)) =
            (&mut self.viewer, self.start_time, self.generator)
        else {
            return;
        };

        let now = start.elapsed().as_secs_f64();
        viewer.cube.prepare(&viewer.gpu, generator.model_matrix(now));

        let Some(output) = viewer.gpu.acquire_frame() else {
            return;
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = viewer
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Face Cube Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Face Cube Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(Color::WHITE.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(viewer.cube.depth_attachment()),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            viewer.cube.draw(&mut render_pass);
        }

        viewer.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }

        match Self::create_viewer(event_loop) {
            Ok(viewer) => {
                // The clock starts once the first frame can be drawn.
                let start = Instant::now();
                self.start_time = Some(start);
                self.generator = Some(PoseGenerator::with_rates(
                    Vec3::new(0.0, 0.0, -4.0),
                    0.0,
                    PoseRates::IMMEDIATE,
                ));
                viewer.window.request_redraw();
                self.viewer = Some(viewer);
            }
            Err(e) => {
                log::error!("Could not start: {}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if is_exit_request(&event) {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::Resized(size) => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.gpu.resize(size.width, size.height);
                    log::info!(
                        "New viewport: (width: {}, height: {})",
                        size.width,
                        size.height
                    );
                }
            }
            WindowEvent::RedrawRequested => {
                self.render();
                if let Some(viewer) = &self.viewer {
                    viewer.window.request_redraw();
                }
            }
            _ => (),
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Could not create event loop: {}", e);
            return ExitCode::FAILURE;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::default();
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop failed: {}", e);
        return ExitCode::FAILURE;
    }

    match app.error {
        Some(_) => ExitCode::FAILURE,
        None => ExitCode::SUCCESS,
    }
}
