use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Shape of the pointer interaction force.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerParams {
    /// Linear falloff per unit distance from the ray. The force vanishes at
    /// `1 / falloff`.
    pub falloff: f32,
    /// Peak magnitude, added straight to the force accumulator.
    pub strength: f32,
}

impl Default for PointerParams {
    fn default() -> Self {
        Self {
            falloff: 0.7,
            strength: 0.00002,
        }
    }
}

/// Pointer ray supplied by the input layer, usually cast from the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionRay {
    pub origin: Vec3,
    /// Expected to be normalized.
    pub direction: Vec3,
}

impl InteractionRay {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Distance from `point` to the closest point on the ray. Points behind
    /// the origin measure to the origin itself.
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        let t = (point - self.origin).dot(self.direction).max(0.0);
        (self.origin + self.direction * t).distance(point)
    }
}

/// Compute the pointer force for a single particle.
///
/// The ray is sampled at the particle's distance from the ray origin, and the
/// particle is pushed away from that sample point with a linear falloff.
pub fn compute_pointer_force(pos: Vec3, ray: &InteractionRay, params: &PointerParams) -> Vec3 {
    let projected = ray.origin + ray.direction * ray.origin.distance(pos);
    let delta = pos - projected;
    let dist = delta.length().max(1e-6);
    let falloff = (1.0 - params.falloff * dist).max(0.0);
    delta / dist * falloff * params.strength
}
