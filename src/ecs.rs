//! Scene components and the per-frame update pass.
//!
//! The scene demo keeps its objects in a `hecs` [`World`]. An entity is drawn
//! when it has a [`Transform`] and a [`RenderMesh`]; it is animated when it
//! also has an [`Animator`].
//!
//! Once per frame the app driver builds a [`FrameStamp`] and calls
//! [`update_world`], which asks every animator for its pose at the stamp's
//! reference time and writes it into the entity's transform. Rendering then
//! reads the updated transforms through [`queue_world`].
//!
//! # Example
//!
//! ```ignore
//! use tumble::*;
//!
//! world.spawn((
//!     Transform::from_position(Vec3::new(-2.0, 10.0, 0.0)),
//!     RenderMesh::with_texture(cube, Color::WHITE, stone),
//!     Animator::Spin(PoseGenerator::new(Vec3::new(-2.0, 10.0, 0.0), start)),
//! ));
//!
//! // each frame
//! update_world(&mut world, &stamp);
//! queue_world(&world, &mut mesh_queue);
//! ```

use hecs::World;

use crate::color::Color;
use crate::mesh::Transform;
use crate::mesh_queue::{MeshQueue, QueuedMesh};
use crate::pose::PoseGenerator;

/// Handle to a mesh registered in a [`MeshQueue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) usize);

/// Handle to a texture registered in a [`MeshQueue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) usize);

/// Makes an entity drawable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderMesh {
    pub mesh: MeshId,
    /// Tint multiplied with the texture (or with white when untextured).
    pub color: Color,
    pub texture: Option<TextureId>,
    /// Drawn at full color, ignoring the scene light.
    pub emissive: bool,
}

impl RenderMesh {
    pub fn new(mesh: MeshId, color: Color) -> Self {
        Self {
            mesh,
            color,
            texture: None,
            emissive: false,
        }
    }

    pub fn with_texture(mesh: MeshId, color: Color, texture: TextureId) -> Self {
        Self {
            texture: Some(texture),
            ..Self::new(mesh, color)
        }
    }

    pub fn emissive(mut self) -> Self {
        self.emissive = true;
        self
    }
}

/// Timing of the current update pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStamp {
    /// Seconds since the app started.
    pub reference_time: f64,
    /// Frames rendered before this one.
    pub frame_number: u64,
}

/// Per-entity update behaviour, run once per update pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Animator {
    /// Writes the generator's pose at the frame's reference time.
    Spin(PoseGenerator),
}

impl Animator {
    /// Runs this behaviour against the entity's transform.
    pub fn update(&self, transform: &mut Transform, stamp: &FrameStamp) {
        match self {
            Animator::Spin(generator) => {
                generator.pose_at(stamp.reference_time).apply_to(transform);
            }
        }
    }
}

/// Runs every [`Animator`] in the world once. Returns how many ran.
pub fn update_world(world: &mut World, stamp: &FrameStamp) -> usize {
    let mut updated = 0;
    for (_entity, (transform, animator)) in world.query_mut::<(&mut Transform, &Animator)>() {
        animator.update(transform, stamp);
        updated += 1;
    }
    updated
}

/// Queues every drawable entity for this frame.
pub fn queue_world(world: &World, queue: &mut MeshQueue) {
    for (_entity, (transform, render)) in world.query::<(&Transform, &RenderMesh)>().iter() {
        queue.push(QueuedMesh {
            mesh: render.mesh,
            transform: *transform,
            color: render.color,
            texture: render.texture,
            emissive: render.emissive,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn update_writes_pose_into_transform() {
        let base = Vec3::new(-2.0, 10.0, 0.0);
        let generator = PoseGenerator::new(base, 0.0);

        let mut world = World::new();
        let cube = world.spawn((Transform::from_position(base), Animator::Spin(generator)));

        let stamp = FrameStamp {
            reference_time: 1.0,
            frame_number: 60,
        };
        assert_eq!(update_world(&mut world, &stamp), 1);

        let transform = *world.get::<&Transform>(cube).unwrap();
        let expected = generator.pose_at(1.0);
        assert_eq!(transform.position, expected.offset);
        assert_eq!(transform.rotation, expected.orientation);
    }

    #[test]
    fn entities_without_animator_stay_put() {
        let mut world = World::new();
        let lamp = world.spawn((Transform::from_position(Vec3::new(3.0, 12.0, 3.0)),));

        update_world(&mut world, &FrameStamp::default());

        let transform = *world.get::<&Transform>(lamp).unwrap();
        assert_eq!(transform.position, Vec3::new(3.0, 12.0, 3.0));
    }

    #[test]
    fn desynchronised_cubes_differ_by_their_start_offset() {
        let mut world = World::new();
        let first = world.spawn((
            Transform::new(),
            Animator::Spin(PoseGenerator::new(Vec3::ZERO, 0.0)),
        ));
        let second = world.spawn((
            Transform::new(),
            Animator::Spin(PoseGenerator::new(Vec3::ZERO, 1.0)),
        ));

        update_world(
            &mut world,
            &FrameStamp {
                reference_time: 3.0,
                frame_number: 0,
            },
        );
        let late = *world.get::<&Transform>(second).unwrap();

        update_world(
            &mut world,
            &FrameStamp {
                reference_time: 2.0,
                frame_number: 1,
            },
        );
        let early = *world.get::<&Transform>(first).unwrap();

        assert!(late.position.abs_diff_eq(early.position, 1e-6));
        assert!(late.rotation.abs_diff_eq(early.rotation, 1e-6));
    }

    #[test]
    fn queue_world_collects_drawables() {
        let mut world = World::new();
        world.spawn((
            Transform::new(),
            RenderMesh::with_texture(MeshId(0), Color::WHITE, TextureId(0)),
        ));
        world.spawn((
            Transform::new(),
            RenderMesh::new(MeshId(1), Color::LAMP).emissive(),
        ));
        world.spawn((Transform::new(),));

        let mut queue = MeshQueue::new();
        queue_world(&world, &mut queue);

        assert_eq!(queue.queued().len(), 2);
        let lamp = queue.queued().iter().find(|q| q.color == Color::LAMP);
        assert!(lamp.is_some_and(|q| q.emissive && q.texture.is_none()));
    }
}
