//! Mesh primitives and spatial transforms.
//!
//! - [`Vertex3d`]: position, normal and UV, the vertex format of the scene pipeline
//! - [`Mesh`]: indexed geometry uploaded to the GPU
//! - [`Transform`]: position, rotation and scale of one mesh instance
//!
//! Geometry is generated on the CPU first ([`cube_geometry`], [`sphere_geometry`])
//! so it can be inspected without a device, then uploaded with [`Mesh::new`].
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |

use crate::gpu::GpuContext;
use glam::{Mat4, Quat, Vec3};

/// A vertex with position, normal, and texture coordinates (32 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    /// Model-space position.
    pub position: [f32; 3],
    /// Unit surface normal.
    pub normal: [f32; 3],
    /// Texture coordinates in [0, 1].
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// Vertex buffer layout matching the table in the module docs.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Vertices and indices of an axis-aligned cube centered at the origin.
///
/// Each face carries its own four vertices so normals stay flat and every
/// face maps the full texture. Front faces wind counter-clockwise.
pub fn cube_geometry(size: f32) -> (Vec<Vertex3d>, Vec<u32>) {
    let h = size * 0.5;

    #[rustfmt::skip]
    let vertices = vec![
        // +Z
        Vertex3d::new([-h, -h,  h], [ 0.0,  0.0,  1.0], [0.0, 1.0]),
        Vertex3d::new([ h, -h,  h], [ 0.0,  0.0,  1.0], [1.0, 1.0]),
        Vertex3d::new([ h,  h,  h], [ 0.0,  0.0,  1.0], [1.0, 0.0]),
        Vertex3d::new([-h,  h,  h], [ 0.0,  0.0,  1.0], [0.0, 0.0]),
        // -Z
        Vertex3d::new([ h, -h, -h], [ 0.0,  0.0, -1.0], [0.0, 1.0]),
        Vertex3d::new([-h, -h, -h], [ 0.0,  0.0, -1.0], [1.0, 1.0]),
        Vertex3d::new([-h,  h, -h], [ 0.0,  0.0, -1.0], [1.0, 0.0]),
        Vertex3d::new([ h,  h, -h], [ 0.0,  0.0, -1.0], [0.0, 0.0]),
        // +Y
        Vertex3d::new([-h,  h,  h], [ 0.0,  1.0,  0.0], [0.0, 1.0]),
        Vertex3d::new([ h,  h,  h], [ 0.0,  1.0,  0.0], [1.0, 1.0]),
        Vertex3d::new([ h,  h, -h], [ 0.0,  1.0,  0.0], [1.0, 0.0]),
        Vertex3d::new([-h,  h, -h], [ 0.0,  1.0,  0.0], [0.0, 0.0]),
        // -Y
        Vertex3d::new([-h, -h, -h], [ 0.0, -1.0,  0.0], [0.0, 1.0]),
        Vertex3d::new([ h, -h, -h], [ 0.0, -1.0,  0.0], [1.0, 1.0]),
        Vertex3d::new([ h, -h,  h], [ 0.0, -1.0,  0.0], [1.0, 0.0]),
        Vertex3d::new([-h, -h,  h], [ 0.0, -1.0,  0.0], [0.0, 0.0]),
        // +X
        Vertex3d::new([ h, -h,  h], [ 1.0,  0.0,  0.0], [0.0, 1.0]),
        Vertex3d::new([ h, -h, -h], [ 1.0,  0.0,  0.0], [1.0, 1.0]),
        Vertex3d::new([ h,  h, -h], [ 1.0,  0.0,  0.0], [1.0, 0.0]),
        Vertex3d::new([ h,  h,  h], [ 1.0,  0.0,  0.0], [0.0, 0.0]),
        // -X
        Vertex3d::new([-h, -h, -h], [-1.0,  0.0,  0.0], [0.0, 1.0]),
        Vertex3d::new([-h, -h,  h], [-1.0,  0.0,  0.0], [1.0, 1.0]),
        Vertex3d::new([-h,  h,  h], [-1.0,  0.0,  0.0], [1.0, 0.0]),
        Vertex3d::new([-h,  h, -h], [-1.0,  0.0,  0.0], [0.0, 0.0]),
    ];

    let indices = (0..6u32)
        .flat_map(|face| {
            let b = face * 4;
            [b, b + 1, b + 2, b + 2, b + 3, b]
        })
        .collect();

    (vertices, indices)
}

/// Vertices and indices of a UV sphere of the given radius.
///
/// `segments` divides the equator, `rings` runs pole to pole.
pub fn sphere_geometry(radius: f32, segments: u32, rings: u32) -> (Vec<Vertex3d>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
    let mut indices = Vec::with_capacity((segments * rings * 6) as usize);

    for ring in 0..=rings {
        let phi = std::f32::consts::PI * ring as f32 / rings as f32;
        let y = phi.cos();
        let ring_radius = phi.sin();

        for seg in 0..=segments {
            let theta = std::f32::consts::TAU * seg as f32 / segments as f32;
            let x = ring_radius * theta.cos();
            let z = ring_radius * theta.sin();

            vertices.push(Vertex3d::new(
                [x * radius, y * radius, z * radius],
                [x, y, z],
                [seg as f32 / segments as f32, ring as f32 / rings as f32],
            ));
        }
    }

    for ring in 0..rings {
        for seg in 0..segments {
            let current = ring * (segments + 1) + seg;
            let next = current + segments + 1;

            indices.extend_from_slice(&[current, current + 1, next]);
            indices.extend_from_slice(&[current + 1, next + 1, next]);
        }
    }

    (vertices, indices)
}

/// Indexed geometry living on the GPU. Immutable once uploaded.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl Mesh {
    /// Uploads vertices and `u32` triangle indices.
    pub fn new(gpu: &GpuContext, vertices: &[Vertex3d], indices: &[u32]) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    /// A cube with the given edge length.
    pub fn cube(gpu: &GpuContext, size: f32) -> Self {
        let (vertices, indices) = cube_geometry(size);
        Self::new(gpu, &vertices, &indices)
    }

    /// A UV sphere with the given radius and tessellation.
    pub fn sphere(gpu: &GpuContext, radius: f32, segments: u32, rings: u32) -> Self {
        let (vertices, indices) = sphere_geometry(radius, segments, rings);
        Self::new(gpu, &vertices, &indices)
    }
}

/// Position, rotation, and scale of a mesh instance.
///
/// [`Transform::matrix`] applies scale, then rotation, then translation.
///
/// ```
/// use tumble::{Transform, Vec3, Quat};
///
/// let transform = Transform {
///     position: Vec3::new(0.0, 10.0, 0.0),
///     rotation: Quat::from_rotation_y(0.5),
///     scale: Vec3::splat(2.0),
/// };
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// The SRT matrix of this transform.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_flat_faces() {
        let (vertices, indices) = cube_geometry(1.0);
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);

        for face in vertices.chunks(4) {
            let n = Vec3::from(face[0].normal);
            for v in face {
                assert_eq!(Vec3::from(v.normal), n);
                // every vertex of a face lies on the plane at distance 0.5
                assert!((Vec3::from(v.position).dot(n) - 0.5).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn cube_winding_faces_outward() {
        let (vertices, indices) = cube_geometry(2.0);
        for tri in indices.chunks(3) {
            let a = Vec3::from(vertices[tri[0] as usize].position);
            let b = Vec3::from(vertices[tri[1] as usize].position);
            let c = Vec3::from(vertices[tri[2] as usize].position);
            let n = Vec3::from(vertices[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(n) > 0.0);
        }
    }

    #[test]
    fn sphere_winding_faces_outward() {
        let (vertices, indices) = sphere_geometry(0.1, 16, 12);
        let mut checked = 0;
        for tri in indices.chunks(3) {
            let a = Vec3::from(vertices[tri[0] as usize].position);
            let b = Vec3::from(vertices[tri[1] as usize].position);
            let c = Vec3::from(vertices[tri[2] as usize].position);
            let n = (b - a).cross(c - a);
            // triangles touching a pole collapse to a line
            if n.length() < 1e-7 {
                continue;
            }
            let centroid = (a + b + c) / 3.0;
            assert!(n.dot(centroid) > 0.0, "inward triangle {:?}", tri);
            checked += 1;
        }
        assert_eq!(checked, 16 * 12 * 2 - 2 * 16);
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let (vertices, indices) = sphere_geometry(0.1, 16, 8);
        assert_eq!(vertices.len(), 17 * 9);
        assert_eq!(indices.len(), 16 * 8 * 6);
        for v in &vertices {
            assert!((Vec3::from(v.position).length() - 0.1).abs() < 1e-5);
        }
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn transform_matrix_is_srt() {
        let transform = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };

        let p = transform.matrix().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 4.0, 3.0), 1e-5));
    }

    #[test]
    fn from_position_keeps_identity_rotation() {
        let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(transform.rotation, Quat::IDENTITY);
        assert_eq!(transform.scale, Vec3::ONE);
    }
}
