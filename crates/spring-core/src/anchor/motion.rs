use crate::forces::pointer::InteractionRay;
use crate::math::{hash11, hash12, snoise3};
use glam::{Affine3A, EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Owner pose sampled once per fixed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OwnerPose {
    pub transform: Affine3A,
    pub phase: f32,
    /// Excitement in `[0, 1]` built up by the pointer; renderers use it for
    /// glow.
    pub charge: f32,
    /// Set when the owner jumped instead of moving continuously; its anchors
    /// are then re-seeded out of band.
    pub teleported: bool,
}

impl Default for OwnerPose {
    fn default() -> Self {
        Self {
            transform: Affine3A::IDENTITY,
            phase: 0.0,
            charge: 0.0,
            teleported: false,
        }
    }
}

/// Drives an owner's transform and animation phase.
pub trait OwnerMotion {
    /// Pose before the first step.
    fn current(&self) -> OwnerPose;

    /// `ray` is the current pointer ray, if any.
    fn advance(&mut self, dt: f32, sim_time: f32, ray: Option<&InteractionRay>) -> OwnerPose;
}

/// Bounds of the swim volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwimBounds {
    /// Horizontal spawn extent around the origin.
    pub spread: f32,
    /// Height at which a creature respawns below.
    pub ceiling: f32,
    /// Respawn height.
    pub floor: f32,
}

impl Default for SwimBounds {
    fn default() -> Self {
        Self {
            spread: 10.0,
            ceiling: 20.0,
            floor: -25.0,
        }
    }
}

/// Jellyfish drift: noise-driven wobble, a pulse cycle of roughly five
/// seconds and thrust along the local up axis that peaks once per pulse.
/// Creatures that leave through the ceiling respawn at the floor.
///
/// A pointer ray passing close by charges the creature up, which speeds up
/// both its pulse and its thrust. The charge decays once the ray moves away.
#[derive(Debug, Clone)]
pub struct SwimMotion {
    pub bounds: SwimBounds,
    noise_seed: f32,
    local_time: f32,
    phase: f32,
    charge: f32,
    position: Vec3,
    rotation: Quat,
    respawns: u32,
}

/// Charge gained per 60 Hz frame while the ray is within `CHARGE_NEAR`.
const CHARGE_GAIN: f32 = 0.05;
/// Charge retained per 60 Hz frame.
const CHARGE_DECAY: f32 = 0.95;
/// Full gain inside this ray distance, none beyond `CHARGE_NEAR + 1`.
const CHARGE_NEAR: f32 = 0.5;

impl SwimMotion {
    /// `index` staggers creatures vertically; `seed` decorrelates runs.
    pub fn new(index: u32, seed: f32, bounds: SwimBounds) -> Self {
        let noise_seed = hash11(seed * 7.31 + index as f32 * 13.17) * 100.0;
        let jitter = hash12(noise_seed, 3.7);
        let position = Vec3::new(
            (hash12(noise_seed, 1.1) - 0.5) * bounds.spread,
            (index as f32 / 10.0 + jitter * 0.1 - 0.5) * 40.0,
            (hash12(noise_seed, 2.3) - 0.5) * bounds.spread,
        );
        let mut motion = Self {
            bounds,
            noise_seed,
            local_time: hash12(noise_seed, 4.9) * 5.0,
            phase: 0.0,
            charge: 0.0,
            position,
            rotation: Quat::IDENTITY,
            respawns: 0,
        };
        motion.phase = motion.phase_at(motion.local_time);
        motion.rotation = motion.rotation_at(motion.local_time);
        motion
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn respawns(&self) -> u32 {
        self.respawns
    }

    pub fn charge(&self) -> f32 {
        self.charge
    }

    /// Gain and decay are given per 60 Hz frame and rescaled to `dt`, so the
    /// response does not depend on the step rate.
    fn update_charge(&mut self, dt: f32, ray: Option<&InteractionRay>) {
        let frames = dt * 60.0;
        if let Some(ray) = ray {
            let dist = ray.distance_to_point(self.position);
            let proximity = 1.0 - (dist - CHARGE_NEAR).clamp(0.0, 1.0);
            self.charge = (self.charge + proximity * CHARGE_GAIN * frames).min(1.0);
        }
        self.charge *= CHARGE_DECAY.powf(frames);
    }

    fn phase_at(&self, local_time: f32) -> f32 {
        ((local_time * 0.2) % 1.0) * TAU
    }

    fn rotation_at(&self, local_time: f32) -> Quat {
        let t = local_time * 0.1;
        let s = self.noise_seed;
        let rot_x = snoise3(s, 13.37, t) * PI * 0.2;
        let rot_y = snoise3(s, 12.37, t * 0.1) * PI * 0.4;
        let rot_z = snoise3(s, 11.37, t) * PI * 0.2;
        Quat::from_euler(EulerRot::XZY, rot_x, rot_z, rot_y)
    }

    fn respawn(&mut self) {
        self.respawns += 1;
        let k = self.respawns as f32;
        self.position = Vec3::new(
            (hash12(self.noise_seed, k * 5.3) - 0.5) * self.bounds.spread,
            self.bounds.floor,
            (hash12(self.noise_seed, k * 7.9) - 0.5) * self.bounds.spread,
        );
    }

    fn pose(&self, teleported: bool) -> OwnerPose {
        OwnerPose {
            transform: Affine3A::from_rotation_translation(self.rotation, self.position),
            phase: self.phase,
            charge: self.charge,
            teleported,
        }
    }
}

impl OwnerMotion for SwimMotion {
    fn current(&self) -> OwnerPose {
        self.pose(false)
    }

    fn advance(&mut self, dt: f32, sim_time: f32, ray: Option<&InteractionRay>) -> OwnerPose {
        self.update_charge(dt, ray);
        let clock = 1.0 + snoise3(self.noise_seed, sim_time * 0.1, 0.0) * 0.1 + self.charge * 0.5;
        self.local_time += dt * clock;
        self.phase = self.phase_at(self.local_time);
        self.rotation = self.rotation_at(self.local_time);

        let speed = (1.0 + (self.phase + 4.4).sin() * 0.35 + self.charge) * dt;
        self.position += self.rotation * Vec3::new(0.0, speed, 0.0);

        let teleported = self.position.y > self.bounds.ceiling;
        if teleported {
            self.respawn();
        }
        self.pose(teleported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swimmer_rises() {
        let mut m = SwimMotion::new(0, 1.0, SwimBounds::default());
        let start = m.position();
        for i in 0..360 {
            m.advance(1.0 / 360.0, i as f32 / 360.0, None);
        }
        assert!(m.position().y > start.y, "creature sank: {start:?} -> {:?}", m.position());
    }

    #[test]
    fn test_respawn_below_after_ceiling() {
        let mut m = SwimMotion::new(0, 2.0, SwimBounds::default());
        m.bounds.ceiling = m.position().y + 0.05;
        let mut jumped = None;
        for i in 0..3600 {
            let pose = m.advance(1.0 / 360.0, i as f32 / 360.0, None);
            if pose.teleported {
                jumped = Some(pose);
                break;
            }
        }
        let pose = jumped.expect("never crossed the ceiling");
        assert_eq!(m.respawns(), 1);
        assert_eq!(pose.transform.translation.y, m.bounds.floor);
    }

    #[test]
    fn test_phase_stays_in_cycle() {
        let mut m = SwimMotion::new(3, 0.5, SwimBounds::default());
        for i in 0..2000 {
            let pose = m.advance(1.0 / 60.0, i as f32 / 60.0, None);
            assert!(pose.phase >= 0.0 && pose.phase < TAU + 1e-4);
        }
    }

    #[test]
    fn test_pointer_charge_speeds_up_swimming() {
        let mut idle = SwimMotion::new(2, 0.7, SwimBounds::default());
        let mut charged = idle.clone();
        let start = idle.position();

        for i in 0..360 {
            let t = i as f32 / 360.0;
            idle.advance(1.0 / 360.0, t, None);
            // keep the ray pointed straight through the creature
            let target = charged.position();
            let ray = InteractionRay::new(target + Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
            charged.advance(1.0 / 360.0, t, Some(&ray));
        }

        assert!(charged.charge() > 0.5, "charge never built up: {}", charged.charge());
        assert_eq!(idle.charge(), 0.0);
        let rise_idle = idle.position().y - start.y;
        let rise_charged = charged.position().y - start.y;
        assert!(
            rise_charged > rise_idle,
            "charged rose {rise_charged}, idle rose {rise_idle}"
        );
    }

    #[test]
    fn test_charge_decays_without_ray() {
        let mut m = SwimMotion::new(0, 1.0, SwimBounds::default());
        let ray = InteractionRay::new(m.position() + Vec3::Z, Vec3::NEG_Z);
        for i in 0..60 {
            m.advance(1.0 / 60.0, i as f32 / 60.0, Some(&ray));
        }
        let peak = m.charge();
        for i in 0..60 {
            m.advance(1.0 / 60.0, 1.0 + i as f32 / 60.0, None);
        }
        assert!(peak > 0.0 && m.charge() < peak * 0.1, "peak {peak}, after {}", m.charge());
    }
}
