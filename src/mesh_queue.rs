//! Mesh and texture storage with a per-frame draw queue.

use crate::color::Color;
use crate::ecs::{MeshId, TextureId};
use crate::mesh::{Mesh, Transform};
use crate::mesh_pass::DrawCall;
use crate::texture::Texture;

/// A queued mesh instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QueuedMesh {
    pub mesh: MeshId,
    pub transform: Transform,
    pub color: Color,
    /// `None` samples the pass's white texture.
    pub texture: Option<TextureId>,
    pub emissive: bool,
}

/// Registered meshes and textures, plus the instances queued this frame.
///
/// Meshes and textures live until the queue is dropped; the draw queue is
/// emptied with [`clear_queue`](Self::clear_queue) at the start of each frame.
///
/// ```ignore
/// let cube = queue.add_mesh(Mesh::cube(&gpu, 1.0));
/// let stone = queue.add_texture(stone_texture);
///
/// // each frame
/// queue.clear_queue();
/// queue.push(QueuedMesh {
///     mesh: cube,
///     transform,
///     color: Color::WHITE,
///     texture: Some(stone),
///     emissive: false,
/// });
/// let calls = queue.draw_calls();
/// mesh_pass.prepare(&gpu, &camera, &light, &calls);
/// mesh_pass.draw(&mut render_pass, &calls);
/// ```
#[derive(Default)]
pub struct MeshQueue {
    meshes: Vec<Mesh>,
    textures: Vec<Texture>,
    draw_queue: Vec<QueuedMesh>,
}

impl MeshQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mesh and returns its handle.
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    /// Registers a texture and returns its handle.
    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.push(texture);
        TextureId(self.textures.len() - 1)
    }

    pub fn push(&mut self, queued: QueuedMesh) {
        self.draw_queue.push(queued);
    }

    #[cfg(test)]
    pub(crate) fn queued(&self) -> &[QueuedMesh] {
        &self.draw_queue
    }

    /// Empties the draw queue. Registered meshes and textures are kept.
    pub fn clear_queue(&mut self) {
        self.draw_queue.clear();
    }

    /// Resolves queued handles into draw calls.
    ///
    /// Instances referring to an unknown mesh are skipped; an unknown texture
    /// falls back to untextured.
    pub fn draw_calls(&self) -> Vec<DrawCall<'_>> {
        self.draw_queue
            .iter()
            .filter_map(|q| {
                let mesh = self.meshes.get(q.mesh.0);
                if mesh.is_none() {
                    log::warn!("Skipping draw of unknown mesh {:?}", q.mesh);
                }
                mesh.map(|mesh| DrawCall {
                    mesh,
                    transform: q.transform,
                    color: q.color,
                    texture: q
                        .texture
                        .and_then(|id| self.textures.get(id.0).map(|t| (id, t))),
                    emissive: q.emissive,
                })
            })
            .collect()
    }
}
