use crate::config::SolverConfig;
use crate::constraints::spring::{compute_spring_forces, init_rest_lengths, SpringId, SpringSet};
use crate::error::{Result, SolverError};
use crate::forces::pointer::InteractionRay;
use crate::influence::{InfluencerIndex, Sign};
use crate::integrate::{integrate_particles, VertexForceParams};
use crate::particle::{Particle, ParticleId, ParticleSet};
use glam::{Vec3, Vec4};

/// Particle and spring storage plus the two physics kernels.
///
/// Open for registration until sealed by the solver's bake; after that the
/// topology is frozen and only positions and forces change.
pub struct ParticleSystem {
    config: SolverConfig,
    particles: ParticleSet,
    springs: SpringSet,
    influencers: InfluencerIndex,
    ray: Option<InteractionRay>,
    baked: bool,
}

impl ParticleSystem {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            particles: ParticleSet::new(),
            springs: SpringSet::new(),
            influencers: InfluencerIndex::default(),
            ray: None,
            baked: false,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn is_baked(&self) -> bool {
        self.baked
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn spring_count(&self) -> usize {
        self.springs.len()
    }

    /// Register a particle. `fixed` particles are never moved by integration.
    pub fn add_particle(&mut self, position: Vec3, fixed: bool) -> Result<Particle> {
        if self.baked {
            return Err(SolverError::AlreadyBaked {
                operation: "add a particle",
            });
        }
        let id = self.particles.push(position, fixed);
        Ok(Particle { id, fixed })
    }

    /// Register a spring between `a` (endpoint 0) and `b` (endpoint 1).
    ///
    /// The rest length is `distance(a, b) * rest_length_factor`, measured at
    /// bake time.
    pub fn add_spring(
        &mut self,
        a: Particle,
        b: Particle,
        stiffness: f32,
        rest_length_factor: f32,
    ) -> Result<SpringId> {
        if self.baked {
            return Err(SolverError::AlreadyBaked {
                operation: "add a spring",
            });
        }
        for p in [a, b] {
            if p.id.index() >= self.particles.len() {
                return Err(SolverError::UnknownParticle(p.id.0));
            }
        }
        Ok(self.springs.push(a.id.0, b.id.0, stiffness, rest_length_factor))
    }

    // ==== READ-ONLY VIEWS ====

    /// Position buffer: xyz plus the free flag in `w`, indexed by particle id.
    pub fn positions(&self) -> &[Vec4] {
        &self.particles.position
    }

    /// Position buffer as raw bytes, ready for a GPU upload.
    pub fn positions_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.particles.position.as_slice())
    }

    pub fn position(&self, id: ParticleId) -> Option<Vec3> {
        self.particles.position.get(id.index()).map(|p| p.truncate())
    }

    pub fn forces(&self) -> &[Vec3] {
        &self.particles.force
    }

    pub fn spring_endpoints(&self) -> &[[u32; 2]] {
        &self.springs.endpoints
    }

    /// Rest length of a spring. Zero until bake.
    pub fn rest_length(&self, spring: SpringId) -> Option<f32> {
        self.springs.rest_length.get(spring.index()).copied()
    }

    pub fn spring_forces(&self) -> &[Vec3] {
        &self.springs.force
    }

    /// Influencer index; empty until bake.
    pub fn influencers(&self) -> &InfluencerIndex {
        &self.influencers
    }

    /// Springs acting on `particle` with the sign each contributes.
    pub fn influencers_of(
        &self,
        particle: ParticleId,
    ) -> impl Iterator<Item = (SpringId, Sign)> + '_ {
        let idx = particle.index();
        let in_range = idx < self.influencers.ranges.len();
        in_range
            .then(|| self.influencers.springs_of(idx))
            .into_iter()
            .flatten()
    }

    // ==== WRITES ====

    /// Overwrite a particle's xyz, keeping its fixed flag.
    ///
    /// Used by participants that own procedurally placed particles.
    pub fn set_position(&mut self, id: ParticleId, position: Vec3) -> Result<()> {
        if id.index() >= self.particles.len() {
            return Err(SolverError::UnknownParticle(id.0));
        }
        self.particles.set_xyz(id, position);
        Ok(())
    }

    pub fn set_interaction_ray(&mut self, ray: Option<InteractionRay>) {
        self.ray = ray;
    }

    pub fn interaction_ray(&self) -> Option<&InteractionRay> {
        self.ray.as_ref()
    }

    // ==== LIFECYCLE ====

    /// Freeze topology, build the influencer index and measure rest lengths.
    pub(crate) fn seal(&mut self) {
        let count = self.particles.len();
        self.influencers = InfluencerIndex::build(count, &self.springs.endpoints);
        init_rest_lengths(&mut self.springs, &self.particles.position);
        self.baked = true;
        log::info!(
            "spring system baked: {} particles, {} springs, {} influencer entries",
            count,
            self.springs.len(),
            self.influencers.entries.len()
        );
    }

    /// Spring-force dispatch followed by the vertex-force dispatch.
    pub(crate) fn run_kernels(&mut self) {
        compute_spring_forces(
            &mut self.springs,
            &self.particles.position,
            self.config.spring_epsilon,
        );

        let params = VertexForceParams {
            damping: self.config.damping,
            ray: self.ray.as_ref(),
            pointer: &self.config.pointer,
        };
        integrate_particles(
            &mut self.particles.position,
            &mut self.particles.force,
            &self.influencers,
            &self.springs.force,
            &params,
        );
    }
}
