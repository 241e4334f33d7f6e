//! Lit, textured 3D mesh pass with depth testing.
//!
//! [`MeshPass`] draws a list of [`DrawCall`]s with one camera and one
//! [`PointLight`]. It uses three bind groups:
//!
//! - **Group 0**: scene uniforms (view-projection, camera position, light)
//! - **Group 1**: model uniforms (model matrix, normal matrix, tint, flags),
//!   one slot per draw call addressed with a dynamic offset
//! - **Group 2**: texture and sampler, one bind group per registered texture
//!
//! All model uniforms of a frame are written in one upload before the draws
//! are recorded, so every draw call sees its own transform. Texture bind
//! groups are created the first time a texture is drawn and reused after.
//!
//! # Depth Buffer
//!
//! The pass owns a `Depth32Float` depth buffer. Call
//! [`MeshPass::ensure_depth_size`] after the surface is resized.

use std::collections::HashMap;

use crate::camera::Camera;
use crate::color::Color;
use crate::ecs::TextureId;
use crate::gpu::GpuContext;
use crate::light::PointLight;
use crate::mesh::{Mesh, Transform, Vertex3d};
use crate::texture::Texture;

/// Per-frame scene uniforms.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub ambient: f32,
    pub light_pos: [f32; 3],
    pub _pad: f32,
    pub light_color: [f32; 4],
}

impl SceneUniforms {
    pub fn new(camera: &Camera, light: &PointLight, aspect: f32) -> Self {
        let view_proj = camera.projection_matrix(aspect) * camera.view_matrix();
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            camera_pos: camera.position.to_array(),
            ambient: light.ambient,
            light_pos: light.position.to_array(),
            _pad: 0.0,
            light_color: light.diffuse.to_array(),
        }
    }
}

/// Per-draw model uniforms.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniforms {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`.
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// x: 1.0 when the mesh ignores lighting.
    pub flags: [f32; 4],
}

impl ModelUniforms {
    pub fn new(call: &DrawCall) -> Self {
        let model = call.transform.matrix();
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            color: call.color.to_array(),
            flags: [if call.emissive { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

/// A mesh instance to draw this frame.
pub struct DrawCall<'a> {
    pub mesh: &'a Mesh,
    pub transform: Transform,
    /// Multiplied with the texture color.
    pub color: Color,
    /// `None` binds the pass's white texture.
    pub texture: Option<(TextureId, &'a Texture)>,
    pub emissive: bool,
}

/// Bind groups keyed by texture handle, created on first use.
pub(crate) struct TextureBindings<B> {
    groups: HashMap<TextureId, B>,
}

impl<B> TextureBindings<B> {
    pub(crate) fn new() -> Self {
        Self {
            groups: HashMap::new(),
        }
    }

    pub(crate) fn get_or_create(&mut self, id: TextureId, create: impl FnOnce() -> B) -> &B {
        self.groups.entry(id).or_insert_with(create)
    }

    pub(crate) fn get(&self, id: TextureId) -> Option<&B> {
        self.groups.get(&id)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.groups.len()
    }
}

/// Rounds `size` up to the next multiple of `alignment`.
pub(crate) fn aligned_stride(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Renders textured meshes lit by a single point light.
///
/// - Back-face culling, counter-clockwise front faces
/// - Depth write with `Less` comparison
/// - Alpha blending
pub struct MeshPass {
    pipeline: wgpu::RenderPipeline,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    model_bind_group_layout: wgpu::BindGroupLayout,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    model_stride: u64,
    model_capacity: u64,
    pub(crate) depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    texture_bind_group_layout: wgpu::BindGroupLayout,
    default_texture_bind_group: wgpu::BindGroup,
    texture_bind_groups: TextureBindings<wgpu::BindGroup>,
}

impl MeshPass {
    /// Model slots allocated up front; the buffer doubles when exceeded.
    const INITIAL_MODEL_CAPACITY: u64 = 16;

    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        // Scene uniform buffer (group 0)
        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let scene_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        // Model uniform buffer (group 1), one aligned slot per draw call
        let model_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Model Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<ModelUniforms>() as u64,
                        ),
                    },
                    count: None,
                }],
            });

        let model_stride = aligned_stride(
            std::mem::size_of::<ModelUniforms>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let (model_buffer, model_bind_group) = Self::create_model_slots(
            device,
            &model_bind_group_layout,
            model_stride,
            Self::INITIAL_MODEL_CAPACITY,
        );

        // Texture bind group layout (group 2)
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Texture Bind Group Layout"),
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

        let default_texture_bind_group = create_texture_bind_group(
            device,
            &texture_bind_group_layout,
            &Texture::white(gpu),
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[
                &scene_bind_group_layout,
                &model_bind_group_layout,
                &texture_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let depth_view = create_depth_view(gpu, "Mesh Depth Texture");

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex3d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                front_face: wgpu::FrontFace::Ccw,
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
            scene_buffer,
            scene_bind_group,
            model_bind_group_layout,
            model_buffer,
            model_bind_group,
            model_stride,
            model_capacity: Self::INITIAL_MODEL_CAPACITY,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
            texture_bind_group_layout,
            default_texture_bind_group,
            texture_bind_groups: TextureBindings::new(),
        }
    }

    fn create_model_slots(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Model Uniforms"),
            size: stride * capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<ModelUniforms>() as u64),
                }),
            }],
        });

        (buffer, bind_group)
    }

    /// Grows the model buffer so it holds at least `count` slots.
    fn reserve_models(&mut self, gpu: &GpuContext, count: u64) {
        if count <= self.model_capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        log::debug!("Growing mesh model buffer to {} slots", capacity);
        let (buffer, bind_group) = Self::create_model_slots(
            &gpu.device,
            &self.model_bind_group_layout,
            self.model_stride,
            capacity,
        );
        self.model_buffer = buffer;
        self.model_bind_group = bind_group;
        self.model_capacity = capacity;
    }

    /// Recreates the depth buffer if the surface size changed.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            self.depth_view = create_depth_view(gpu, "Mesh Depth Texture");
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    /// Depth attachment for a render pass that this pass will draw into.
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

    /// Uploads scene and model uniforms for this frame and creates bind
    /// groups for textures not drawn before.
    ///
    /// Must run before the render pass that calls [`draw`](Self::draw) is
    /// begun, since the model buffer may be reallocated.
    pub fn prepare(
        &mut self,
        gpu: &GpuContext,
        camera: &Camera,
        light: &PointLight,
        draw_calls: &[DrawCall],
    ) {
        let scene = SceneUniforms::new(camera, light, gpu.aspect());
        gpu.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::cast_slice(&[scene]));

        if draw_calls.is_empty() {
            return;
        }
        self.reserve_models(gpu, draw_calls.len() as u64);

        for (id, texture) in draw_calls.iter().filter_map(|call| call.texture) {
            let layout = &self.texture_bind_group_layout;
            self.texture_bind_groups.get_or_create(id, || {
                log::debug!("Creating bind group for texture {:?}", id);
                create_texture_bind_group(&gpu.device, layout, texture)
            });
        }

        let stride = self.model_stride as usize;
        let mut staging = vec![0u8; stride * draw_calls.len()];
        for (i, call) in draw_calls.iter().enumerate() {
            let uniforms = ModelUniforms::new(call);
            let bytes = bytemuck::bytes_of(&uniforms);
            staging[i * stride..i * stride + bytes.len()].copy_from_slice(bytes);
        }
        gpu.queue.write_buffer(&self.model_buffer, 0, &staging);
    }

    /// Records the draw calls uploaded by the last [`prepare`](Self::prepare).
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass, draw_calls: &[DrawCall]) {
        if draw_calls.is_empty() {
            return;
        }

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.scene_bind_group, &[]);

        for (i, call) in draw_calls.iter().enumerate() {
            let offset = (i as u64 * self.model_stride) as u32;
            render_pass.set_bind_group(1, &self.model_bind_group, &[offset]);

            let texture_bind_group = call
                .texture
                .and_then(|(id, _)| self.texture_bind_groups.get(id))
                .unwrap_or(&self.default_texture_bind_group);
            render_pass.set_bind_group(2, texture_bind_group, &[]);

            render_pass.set_vertex_buffer(0, call.mesh.vertex_buffer.slice(..));
            render_pass
                .set_index_buffer(call.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..call.mesh.index_count, 0, 0..1);
        }
    }
}

fn create_texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Mesh Texture Bind Group"),
        layout,
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
    })
}

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A depth texture view matching the surface size.
pub(crate) fn create_depth_view(gpu: &GpuContext, label: &str) -> wgpu::TextureView {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: gpu.width(),
            height: gpu.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 112);
        assert_eq!(std::mem::size_of::<ModelUniforms>(), 160);
    }

    #[test]
    fn stride_rounds_up_to_alignment() {
        assert_eq!(aligned_stride(160, 256), 256);
        assert_eq!(aligned_stride(256, 256), 256);
        assert_eq!(aligned_stride(257, 256), 512);
    }

    #[test]
    fn scene_uniforms_carry_the_light() {
        let light = PointLight {
            ambient: 0.3,
            ..PointLight::new(glam::Vec3::new(3.0, 12.0, 3.0), Color::rgb(1.0, 1.0, 0.0))
        };
        let uniforms = SceneUniforms::new(&Camera::new(), &light, 1.0);
        assert_eq!(uniforms.light_pos, [3.0, 12.0, 3.0]);
        assert_eq!(uniforms.light_color, [1.0, 1.0, 0.0, 1.0]);
        assert_eq!(uniforms.ambient, 0.3);
    }

    #[test]
    fn texture_bindings_are_created_once_per_texture() {
        let mut bindings = TextureBindings::new();
        let mut created = 0;
        for id in [TextureId(0), TextureId(1), TextureId(0), TextureId(0)] {
            bindings.get_or_create(id, || {
                created += 1;
                id.0 * 10
            });
        }
        assert_eq!(created, 2);
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings.get(TextureId(1)), Some(&10));
        assert_eq!(bindings.get(TextureId(2)), None);
    }
}
