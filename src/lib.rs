//! # Tumble
//!
//! **Spinning cubes on wgpu, animated by a pure function of time.**
//!
//! The heart of the crate is [`PoseGenerator`]: given the seconds elapsed
//! since it was created, it returns an orientation and an offset from a base
//! position. The same generator drives two rendering styles.
//!
//! - **Retained scene.** Entities in a `hecs` [`World`] carry an
//!   [`Animator`]; [`run_with_config`] stamps every frame and writes each
//!   animator's pose into its entity's [`Transform`] before drawing.
//! - **Immediate loop.** The caller reads the clock itself, asks for
//!   [`PoseGenerator::model_matrix`] and uploads it before each draw, as the
//!   `tumble` binary does with a [`FaceCubeRenderer`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use tumble::*;
//!
//! fn main() -> tumble::Result<()> {
//!     run_with_config(AppConfig::new().title("Cube"), |ctx| {
//!         let cube = ctx.mesh_cube(1.0);
//!         let start = ctx.now();
//!         ctx.camera(Camera::new().at(Vec3::new(0.0, 0.0, 6.0)));
//!         ctx.world.spawn((
//!             Transform::new(),
//!             RenderMesh::new(cube, Color::WHITE),
//!             Animator::Spin(PoseGenerator::new(Vec3::ZERO, start)),
//!         ));
//!     })
//! }
//! ```

mod app;
mod camera;
mod color;
mod ecs;
mod error;
pub mod face_cube;
mod gpu;
mod input;
mod light;
mod mesh;
mod mesh_pass;
mod mesh_queue;
mod pose;
mod texture;

pub use app::{AppConfig, SetupContext, run_with_config};
pub use camera::Camera;
pub use color::{Color, ColorEncoding};
pub use error::{Error, Result};
pub use face_cube::FaceCubeRenderer;
pub use gpu::GpuContext;
pub use input::is_exit_request;
pub use light::PointLight;
pub use mesh::Transform;
pub use pose::{Pose, PoseGenerator, PoseRates};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec3};

// ECS support and type-safe handles
pub use ecs::{Animator, FrameStamp, MeshId, RenderMesh, TextureId, update_world};
pub use hecs::World;
