use crate::math::{mix, noise3, smoothstep};
use glam::Vec3;
use std::f32::consts::{FRAC_PI_2, PI};

/// Procedural surface sampled by the anchor bridge's re-seed kernel.
///
/// Must be a pure function of its inputs: the same arguments always give the
/// same local-space position. `bottom_factor` is 1.0 for the underside of the
/// surface and 0.0 for the top.
pub trait SurfaceFormula: Send + Sync {
    fn position(&self, phase: f32, zenith: f32, azimuth: f32, bottom_factor: f32) -> Vec3;
}

impl<F> SurfaceFormula for F
where
    F: Fn(f32, f32, f32, f32) -> Vec3 + Send + Sync,
{
    fn position(&self, phase: f32, zenith: f32, azimuth: f32, bottom_factor: f32) -> Vec3 {
        self(phase, zenith, azimuth, bottom_factor)
    }
}

/// Pulsing jellyfish bell.
///
/// `zenith` runs from 0 at the apex to 1 at the rim, `azimuth` around the
/// vertical axis. The phase swells the rim radius and bends the bell's polar
/// sweep, and the contraction wave lags further behind towards the rim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BellSurface {
    /// Offset into the noise field, so bells can differ in shape.
    pub seed: f32,
    /// Relative zenith jitter around the rim.
    pub zenith_jitter: f32,
    /// Amplitude of the static surface bumps.
    pub bump: f32,
    /// Number of scallops along the rim.
    pub riffles: f32,
    pub riffle_depth: f32,
}

impl Default for BellSurface {
    fn default() -> Self {
        Self {
            seed: 0.0,
            zenith_jitter: 0.18,
            bump: 0.12,
            riffles: 16.0,
            riffle_depth: 0.02,
        }
    }
}

impl SurfaceFormula for BellSurface {
    fn position(&self, phase: f32, zenith: f32, azimuth: f32, bottom_factor: f32) -> Vec3 {
        let (sin_az, cos_az) = azimuth.sin_cos();

        let zenith_noise = noise3(sin_az * 2.0, cos_az * 2.0, 12.69 + self.seed);
        let zenith_mod = zenith * (zenith_noise * self.zenith_jitter + 0.9);

        let wave = phase - mix(0.0, zenith_mod * 0.95, zenith_mod) + FRAC_PI_2;
        let riffle = mix(
            1.0,
            (azimuth * self.riffles + FRAC_PI_2).sin() * self.riffle_depth + 1.0,
            smoothstep(0.5, 1.0, zenith),
        );
        let radius = (wave.sin() * 0.3 + 1.3) * riffle;
        let polar = ((wave + 3.0).sin() * 0.15 + 0.5) * zenith_mod * PI;

        let ring = polar.sin() * radius;
        let mut p = Vec3::new(sin_az * ring, polar.cos(), cos_az * ring);

        let bump = noise3(
            sin_az * zenith_mod * 2.0,
            cos_az * zenith_mod * 2.0,
            42.69 + self.seed,
        );
        p += Vec3::splat(bump * self.bump);

        // flatten the underside towards the apex
        let flatten = smoothstep(0.0, 0.95, 1.0 - zenith) * 0.1 * bottom_factor;
        p.y = mix(p.y, 0.0, flatten);
        p
    }
}
