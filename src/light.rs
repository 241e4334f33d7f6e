//! The single point light of the scene demo.
//!
//! One light, no attenuation, no shadows. The mesh shader adds a constant
//! ambient term to a Lambertian diffuse term from this light.

use glam::Vec3;

use crate::color::Color;

/// A point light with a diffuse color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    /// World-space position.
    pub position: Vec3,
    /// Diffuse color of the light.
    pub diffuse: Color,
    /// Ambient intensity applied regardless of light direction.
    pub ambient: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            diffuse: Color::WHITE,
            ambient: 0.2,
        }
    }
}

impl PointLight {
    pub fn new(position: Vec3, diffuse: Color) -> Self {
        Self {
            position,
            diffuse,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_keeps_default_ambient() {
        let light = PointLight::new(Vec3::new(3.0, 12.0, 3.0), Color::rgb(1.0, 1.0, 0.0));
        assert_eq!(light.position, Vec3::new(3.0, 12.0, 3.0));
        assert_eq!(light.diffuse, Color::rgb(1.0, 1.0, 0.0));
        assert_eq!(light.ambient, PointLight::default().ambient);
    }
}
