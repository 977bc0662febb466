/// Orbiting bodies and their procedural generation
use rand::Rng;

use crate::transform::Mat4;
use crate::vector::Vec3;

/// One instance of the shared mesh, circling the origin.
///
/// Angles grow without bound; they only ever feed periodic functions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBody {
    pub orbit_radius: f32,
    /// Radians per second along the orbit
    pub orbit_speed: f32,
    /// Radians per second about the body's own Y axis
    pub self_speed: f32,
    pub scale: f32,
    pub orbit_angle: f32,
    pub self_angle: f32,
}

impl SceneBody {
    pub fn new(orbit_radius: f32, orbit_speed: f32, self_speed: f32, scale: f32) -> Self {
        Self {
            orbit_radius,
            orbit_speed,
            self_speed,
            scale,
            orbit_angle: 0.0,
            self_angle: 0.0,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.orbit_angle += self.orbit_speed * dt;
        self.self_angle += self.self_speed * dt;
    }

    /// Position in the XZ plane; a zero radius pins the body to the origin
    pub fn position(&self) -> Vec3 {
        if self.orbit_radius > 0.0 {
            Vec3::new(
                self.orbit_angle.cos() * self.orbit_radius,
                0.0,
                self.orbit_angle.sin() * self.orbit_radius,
            )
        } else {
            Vec3::ZERO
        }
    }

    /// Scale, then spin, then place on the orbit
    pub fn model_matrix(&self) -> Mat4 {
        let p = self.position();
        Mat4::translation(p.x, 0.0, p.z)
            * Mat4::rotation_y(self.self_angle)
            * Mat4::scale(self.scale, self.scale, self.scale)
    }
}

/// Ranges for procedurally placed bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyGenerator {
    pub count: usize,
    pub sun_scale: f32,
    pub sun_self_speed: f32,
    /// Radius of the innermost ring; every two bodies move one unit outward
    pub base_radius: f32,
    /// Orbit speed is drawn from this range and divided by the radius
    pub orbit_speed: (f32, f32),
    pub self_speed: (f32, f32),
    pub scale: (f32, f32),
    pub angle: (f32, f32),
}

impl Default for BodyGenerator {
    fn default() -> Self {
        Self {
            count: 100,
            sun_scale: 4.0,
            sun_self_speed: 0.2,
            base_radius: 4.0,
            orbit_speed: (0.5, 1.5),
            self_speed: (0.3, 1.5),
            scale: (0.4, 1.5),
            angle: (0.0, 360.0),
        }
    }
}

impl BodyGenerator {
    /// The sun followed by `count` bodies. The sun is always first.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<SceneBody> {
        let mut bodies = Vec::with_capacity(self.count + 1);
        bodies.push(SceneBody::new(0.0, 0.0, self.sun_self_speed, self.sun_scale));

        for i in 0..self.count {
            let orbit_radius = (i / 2) as f32 + self.base_radius;
            bodies.push(SceneBody {
                orbit_radius,
                orbit_speed: uniform(rng, self.orbit_speed) / orbit_radius,
                self_speed: uniform(rng, self.self_speed),
                scale: uniform(rng, self.scale),
                orbit_angle: uniform(rng, self.angle),
                self_angle: uniform(rng, self.angle),
            });
        }
        bodies
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, (low, high): (f32, f32)) -> f32 {
    if high > low {
        rng.gen_range(low..=high)
    } else {
        low
    }
}
