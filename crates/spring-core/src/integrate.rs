use crate::forces::pointer::{compute_pointer_force, InteractionRay, PointerParams};
use crate::influence::{decode, InfluencerIndex};
use crate::particle::is_free;
use glam::{Vec3, Vec4};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Inputs shared by every particle in the vertex-force kernel.
pub struct VertexForceParams<'a> {
    pub damping: f32,
    pub ray: Option<&'a InteractionRay>,
    pub pointer: &'a PointerParams,
}

/// Vertex-force kernel: gather spring forces, then integrate free particles.
///
/// Each particle reads only its own influencer window and the immutable
/// spring-force buffer, and writes only its own force and position slots.
pub fn integrate_particles(
    positions: &mut [Vec4],
    forces: &mut [Vec3],
    index: &InfluencerIndex,
    spring_forces: &[Vec3],
    params: &VertexForceParams<'_>,
) {
    let kernel = |(i, (pos, force)): (usize, (&mut Vec4, &mut Vec3))| {
        let mut f = *force * params.damping;
        for &entry in index.entries_for(i) {
            let (spring, sign) = decode(entry);
            f += spring_forces[spring.index()] * sign.factor();
        }

        let xyz = pos.truncate();
        if let Some(ray) = params.ray {
            f += compute_pointer_force(xyz, ray, params.pointer);
        }
        *force = f;

        if is_free(*pos) {
            *pos = (xyz + f).extend(pos.w);
        }
    };

    #[cfg(feature = "parallel")]
    {
        positions
            .par_iter_mut()
            .zip(forces.par_iter_mut())
            .enumerate()
            .for_each(kernel);
    }

    #[cfg(not(feature = "parallel"))]
    {
        positions
            .iter_mut()
            .zip(forces.iter_mut())
            .enumerate()
            .for_each(kernel);
    }
}
