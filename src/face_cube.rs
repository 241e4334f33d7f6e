//! A small cube with per-vertex colors and a single textured face.
//!
//! This is the renderer behind the immediate-loop demo. All of its GPU state
//! (pipeline, vertex buffer, matrices, texture, depth buffer) lives in one
//! [`FaceCubeRenderer`] that the render loop owns and feeds a model-view
//! matrix every frame.
//!
//! The cube has half-extent 0.25 and is drawn as 36 unindexed vertices. Each
//! vertex carries a `tex_alpha` that blends between its position-derived
//! color and the texture; only the front (+Z) face has `tex_alpha = 1`.
//!
//! The vertex colors are written as is, so the window surface should be
//! created with [`ColorEncoding::Direct`](crate::ColorEncoding::Direct). The
//! texture is uploaded with whatever encoding the surface ended up with.

use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::gpu::GpuContext;
use crate::mesh_pass::{DEPTH_FORMAT, create_depth_view};
use crate::texture::{Texture, TextureOptions};

/// Vertex of the face-textured cube (24 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FaceVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    /// 0 shows the vertex color, 1 shows the texture.
    pub tex_alpha: f32,
}

impl FaceVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<FaceVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 20,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32,
            },
        ],
    };
}

/// Half the edge length of the cube.
pub const HALF_EXTENT: f32 = 0.25;

//        0 -------- 3
//      / |        / |
//     7 -------- 4  |
//     |  |       |  |
//     |  1 ------|- 2
//     | /        | /
//     6 -------- 5
#[rustfmt::skip]
const CORNERS: [[f32; 3]; 8] = [
    [-1.0,  1.0, -1.0],
    [-1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0],
    [ 1.0,  1.0, -1.0],
    [ 1.0,  1.0,  1.0],
    [ 1.0, -1.0,  1.0],
    [-1.0, -1.0,  1.0],
    [-1.0,  1.0,  1.0],
];

/// Corner indices, two triangles per face.
#[rustfmt::skip]
const TRIANGLES: [[usize; 6]; 6] = [
    [1, 0, 2, 3, 2, 0], // back
    [2, 3, 5, 4, 5, 3], // right
    [5, 4, 6, 7, 6, 4], // front
    [6, 7, 1, 0, 1, 7], // left
    [2, 5, 1, 6, 1, 5], // bottom
    [4, 3, 7, 0, 7, 3], // top
];

const SIDE_UVS: [[f32; 2]; 6] = [
    [1.0, 0.0],
    [1.0, 1.0],
    [0.0, 0.0],
    [0.0, 1.0],
    [0.0, 0.0],
    [1.0, 1.0],
];

#[rustfmt::skip]
const FACE_UVS: [[[f32; 2]; 6]; 6] = [
    [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0], [1.0, 0.0], [0.0, 1.0]],
    SIDE_UVS,
    SIDE_UVS,
    SIDE_UVS,
    [[1.0, 1.0], [1.0, 0.0], [0.0, 1.0], [0.0, 0.0], [0.0, 1.0], [1.0, 0.0]],
    SIDE_UVS,
];

/// Index into [`TRIANGLES`] of the face that shows the texture.
pub const TEXTURED_FACE: usize = 2;

/// The 36 vertices of the cube, face by face.
pub fn face_cube_vertices() -> Vec<FaceVertex> {
    TRIANGLES
        .iter()
        .zip(FACE_UVS.iter())
        .enumerate()
        .flat_map(|(face, (corners, uvs))| {
            let tex_alpha = if face == TEXTURED_FACE { 1.0 } else { 0.0 };
            corners.iter().zip(uvs.iter()).map(move |(&corner, &uv)| {
                let [x, y, z] = CORNERS[corner];
                FaceVertex {
                    position: [x * HALF_EXTENT, y * HALF_EXTENT, z * HALF_EXTENT],
                    uv,
                    tex_alpha,
                }
            })
        })
        .collect()
}

/// Vertical field of view of the demo's projection, in degrees.
pub const FOV_DEGREES: f32 = 50.0;

/// Perspective projection for a viewport of the given aspect ratio.
pub fn projection(aspect: f32) -> Mat4 {
    Mat4::perspective_rh(FOV_DEGREES.to_radians(), aspect, 0.1, 1000.0)
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Matrices {
    mv: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
}

/// Render state of the face-textured cube.
pub struct FaceCubeRenderer {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    matrices_buffer: wgpu::Buffer,
    matrices_bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
}

impl FaceCubeRenderer {
    /// Builds the pipeline and uploads the cube.
    ///
    /// The texture is loaded from `texture_path`, flipped vertically. When it
    /// cannot be loaded the face is drawn white instead.
    pub fn new(gpu: &GpuContext, texture_path: &str) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Face Cube Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/face_cube.wgsl").into()),
        });

        let vertices = face_cube_vertices();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Face Cube Vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let matrices_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Face Cube Matrices"),
            size: std::mem::size_of::<Matrices>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let matrices_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Face Cube Matrices Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let matrices_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Face Cube Matrices Bind Group"),
            layout: &matrices_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: matrices_buffer.as_entire_binding(),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Face Cube Texture Layout"),
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
        });

        let options = TextureOptions::default()
            .flipped()
            .with_encoding(gpu.encoding());
        let texture = match Texture::from_file(gpu, texture_path, options) {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!("Failed to load texture: {}", e);
                Texture::white(gpu)
            }
        };

        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Face Cube Texture Bind Group"),
            layout: &texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Face Cube Pipeline Layout"),
            bind_group_layouts: &[&matrices_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Face Cube Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[FaceVertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            matrices_buffer,
            matrices_bind_group,
            texture_bind_group,
            depth_view: create_depth_view(gpu, "Face Cube Depth Texture"),
            depth_size: (gpu.width(), gpu.height()),
        }
    }

    /// Uploads this frame's model-view matrix and the projection for the
    /// current viewport, and resizes the depth buffer if needed.
    pub fn prepare(&mut self, gpu: &GpuContext, model_view: Mat4) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            self.depth_view = create_depth_view(gpu, "Face Cube Depth Texture");
            self.depth_size = (gpu.width(), gpu.height());
        }

        let matrices = Matrices {
            mv: model_view.to_cols_array_2d(),
            proj: projection(gpu.aspect()).to_cols_array_2d(),
        };
        gpu.queue
            .write_buffer(&self.matrices_buffer, 0, bytemuck::cast_slice(&[matrices]));
    }

    pub fn depth_attachment(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.matrices_bind_group, &[]);
        render_pass.set_bind_group(1, &self.texture_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..self.vertex_count, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn cube_is_thirty_six_vertices_on_the_surface() {
        let vertices = face_cube_vertices();
        assert_eq!(vertices.len(), 36);
        for v in &vertices {
            assert!(v.position.iter().all(|c| c.abs() == HALF_EXTENT));
        }
    }

    #[test]
    fn only_the_front_face_is_textured() {
        let vertices = face_cube_vertices();
        let textured: Vec<_> = vertices.iter().filter(|v| v.tex_alpha == 1.0).collect();
        assert_eq!(textured.len(), 6);
        assert!(textured.iter().all(|v| v.position[2] == HALF_EXTENT));
        assert!(
            vertices
                .iter()
                .all(|v| v.tex_alpha == 0.0 || v.tex_alpha == 1.0)
        );
    }

    #[test]
    fn each_face_is_planar() {
        let vertices = face_cube_vertices();
        for face in vertices.chunks(6) {
            let a = Vec3::from(face[0].position);
            let b = Vec3::from(face[1].position);
            let c = Vec3::from(face[2].position);
            let normal = (b - a).cross(c - a).normalize();
            for v in face {
                assert!((Vec3::from(v.position) - a).dot(normal).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn front_face_maps_the_whole_texture() {
        let vertices = face_cube_vertices();
        let front = &vertices[TEXTURED_FACE * 6..TEXTURED_FACE * 6 + 6];
        for corner in [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]] {
            assert!(front.iter().any(|v| v.uv == corner));
        }
        // bottom edge of the face samples v = 0
        for v in front {
            assert_eq!(v.uv[1] == 0.0, v.position[1] < 0.0);
        }
    }

    #[test]
    fn vertex_stride_matches_layout() {
        assert_eq!(std::mem::size_of::<FaceVertex>(), 24);
        assert_eq!(FaceVertex::LAYOUT.array_stride, 24);
    }

    #[test]
    fn cube_at_minus_four_is_inside_the_frustum() {
        let clip = projection(640.0 / 480.0) * glam::Vec4::new(0.0, 0.0, -4.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
        assert!((0.0..=1.0).contains(&ndc.z));
    }
}
