use glam::{Vec3, Vec4};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Dense spring index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpringId(pub u32);

impl SpringId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Damped mass-spring links between particle pairs, stored SoA.
///
/// `rest_length` is measured once after bake from the particle positions at
/// that moment, scaled by `rest_length_factor`, and never re-measured.
#[derive(Default)]
pub struct SpringSet {
    /// Endpoint particle indices. Endpoint 0 receives the spring force with a
    /// positive sign, endpoint 1 with a negative sign.
    pub endpoints: Vec<[u32; 2]>,
    pub stiffness: Vec<f32>,
    pub rest_length_factor: Vec<f32>,
    pub rest_length: Vec<f32>,
    /// Output of the spring-force kernel, one entry per spring.
    pub force: Vec<Vec3>,
}

impl SpringSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn push(&mut self, a: u32, b: u32, stiffness: f32, rest_length_factor: f32) -> SpringId {
        let id = SpringId(self.endpoints.len() as u32);
        self.endpoints.push([a, b]);
        self.stiffness.push(stiffness);
        self.rest_length_factor.push(rest_length_factor);
        self.rest_length.push(0.0);
        self.force.push(Vec3::ZERO);
        id
    }
}

/// Measure every spring's rest length from the current positions.
pub fn init_rest_lengths(springs: &mut SpringSet, positions: &[Vec4]) {
    let SpringSet {
        endpoints,
        rest_length_factor,
        rest_length,
        ..
    } = springs;

    let measure = |([a, b], factor): (&[u32; 2], &f32)| {
        let p0 = positions[*a as usize].truncate();
        let p1 = positions[*b as usize].truncate();
        p0.distance(p1) * factor
    };

    #[cfg(feature = "parallel")]
    {
        endpoints
            .par_iter()
            .zip(rest_length_factor.par_iter())
            .map(measure)
            .collect_into_vec(rest_length);
    }

    #[cfg(not(feature = "parallel"))]
    {
        for (slot, item) in rest_length
            .iter_mut()
            .zip(endpoints.iter().zip(rest_length_factor.iter()))
        {
            *slot = measure(item);
        }
    }
}

/// Force exerted by one spring on endpoint 0 (endpoint 1 gets the negation).
///
/// `epsilon` clamps the measured length so a zero-length spring yields a
/// finite force instead of dividing by zero.
#[inline]
pub fn spring_force(p0: Vec3, p1: Vec3, rest_length: f32, stiffness: f32, epsilon: f32) -> Vec3 {
    let delta = p1 - p0;
    let dist = delta.length().max(epsilon);
    delta * ((dist - rest_length) * stiffness * 0.5 / dist)
}

/// Spring-force kernel: one independent evaluation per spring.
pub fn compute_spring_forces(springs: &mut SpringSet, positions: &[Vec4], epsilon: f32) {
    let SpringSet {
        endpoints,
        stiffness,
        rest_length,
        force,
        ..
    } = springs;

    let eval = |(out, ((ends, k), rest)): (&mut Vec3, ((&[u32; 2], &f32), &f32))| {
        let p0 = positions[ends[0] as usize].truncate();
        let p1 = positions[ends[1] as usize].truncate();
        *out = spring_force(p0, p1, *rest, *k, epsilon);
    };

    #[cfg(feature = "parallel")]
    {
        force
            .par_iter_mut()
            .zip(endpoints.par_iter().zip(stiffness.par_iter()).zip(rest_length.par_iter()))
            .for_each(eval);
    }

    #[cfg(not(feature = "parallel"))]
    {
        force
            .iter_mut()
            .zip(endpoints.iter().zip(stiffness.iter()).zip(rest_length.iter()))
            .for_each(eval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_zero_at_rest_length() {
        let f = spring_force(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), 2.0, 0.5, 1e-6);
        assert_eq!(f, Vec3::ZERO);
    }

    #[test]
    fn test_stretched_spring_pulls_endpoint0_toward_endpoint1() {
        let f = spring_force(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), 1.0, 0.1, 1e-6);
        // (3 - 1) * 0.1 * 0.5 along +x
        assert!((f.x - 0.1).abs() < 1e-6, "got {f:?}");
        assert_eq!(f.y, 0.0);
    }

    #[test]
    fn test_zero_length_spring_is_finite() {
        let f = spring_force(Vec3::ONE, Vec3::ONE, 1.0, 0.1, 1e-6);
        assert!(f.is_finite());
        assert_eq!(f, Vec3::ZERO);
    }
}
