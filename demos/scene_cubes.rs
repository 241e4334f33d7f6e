//! Two textured cubes tumbling out of sync, lit by a small yellow lamp.
//!
//! Run from a directory containing `stone_texture.png` and `wood_texture.png`;
//! a cube whose texture is missing is drawn plain white.

use std::process::ExitCode;

use tumble::{
    Animator, AppConfig, Camera, Color, PointLight, PoseGenerator, RenderMesh, Transform, Vec3,
    run_with_config,
};

const CUBES: [(Vec3, &str, f64); 2] = [
    (Vec3::new(-2.0, 10.0, 0.0), "stone_texture.png", 0.0),
    (Vec3::new(2.0, 15.0, 0.0), "wood_texture.png", 1.0),
];

const LAMP_POSITION: Vec3 = Vec3::new(3.0, 12.0, 3.0);

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::new()
        .title("Spinning cubes")
        .size(800, 600)
        .clear_color(Color::rgb(0.2, 0.2, 0.4));

    let result = run_with_config(config, |ctx| {
        ctx.camera(
            Camera::new()
                .at(Vec3::new(0.0, -2.0, 0.0))
                .looking_at(Vec3::new(0.0, 12.5, 0.0))
                .with_up(Vec3::Z),
        )
        .light(PointLight::new(LAMP_POSITION, Color::rgb(1.0, 1.0, 0.0)));

        let cube = ctx.mesh_cube(1.0);
        let start = ctx.now();

        for (base, texture_path, delay) in CUBES {
            let render = match ctx.texture_from_file(texture_path) {
                Ok(texture) => RenderMesh::with_texture(cube, Color::WHITE, texture),
                Err(e) => {
                    log::error!("{}; drawing the cube untextured", e);
                    RenderMesh::new(cube, Color::WHITE)
                }
            };

            ctx.world.spawn((
                Transform::from_position(base),
                render,
                Animator::Spin(PoseGenerator::new(base, start + delay)),
            ));
        }

        let lamp = ctx.mesh_sphere(0.1, 16, 12);
        ctx.world.spawn((
            Transform::from_position(LAMP_POSITION),
            RenderMesh::new(lamp, Color::LAMP).emissive(),
        ));
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
