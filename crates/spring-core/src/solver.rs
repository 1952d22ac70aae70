use crate::clock::FixedStepClock;
use crate::config::SolverConfig;
use crate::constraints::spring::SpringId;
use crate::error::{Result, SolverError};
use crate::forces::pointer::InteractionRay;
use crate::participant::{Participant, ParticipantHandle};
use crate::particle::{Particle, ParticleId};
use crate::system::ParticleSystem;
use glam::{Vec3, Vec4};

/// Fixed-step mass-spring solver.
///
/// Lifecycle: register particles, springs and participants, call [`Solver::bake`]
/// once, then drive it with [`Solver::update`] every frame. Any failure while
/// baking or stepping halts the simulation for good.
pub struct Solver {
    system: ParticleSystem,
    participants: Vec<Box<dyn Participant>>,
    clock: FixedStepClock,
    time: f64,
    poisoned: bool,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Result<Self> {
        config.validate()?;
        let clock = FixedStepClock::new(&config);
        Ok(Self {
            system: ParticleSystem::new(config),
            participants: Vec::new(),
            clock,
            time: 0.0,
            poisoned: false,
        })
    }

    pub fn with_defaults() -> Self {
        let config = SolverConfig::default();
        Self {
            clock: FixedStepClock::new(&config),
            system: ParticleSystem::new(config),
            participants: Vec::new(),
            time: 0.0,
            poisoned: false,
        }
    }

    // ==== REGISTRATION ====

    pub fn add_particle(&mut self, position: Vec3, fixed: bool) -> Result<Particle> {
        self.ensure_live()?;
        self.system.add_particle(position, fixed)
    }

    pub fn add_spring(
        &mut self,
        a: Particle,
        b: Particle,
        stiffness: f32,
        rest_length_factor: f32,
    ) -> Result<SpringId> {
        self.ensure_live()?;
        self.system.add_spring(a, b, stiffness, rest_length_factor)
    }

    /// [`Solver::add_spring`] with a rest length equal to the baked distance.
    pub fn add_spring_default(&mut self, a: Particle, b: Particle, stiffness: f32) -> Result<SpringId> {
        self.add_spring(a, b, stiffness, 1.0)
    }

    /// Register a collaborator. Participants are baked and updated in the
    /// order they were added.
    pub fn add_participant<P: Participant>(&mut self, participant: P) -> Result<ParticipantHandle<P>> {
        self.ensure_live()?;
        if self.system.is_baked() {
            return Err(SolverError::AlreadyBaked {
                operation: "add a participant",
            });
        }
        self.participants.push(Box::new(participant));
        Ok(ParticipantHandle::new(self.participants.len() - 1))
    }

    pub fn participant<P: Participant>(&self, handle: ParticipantHandle<P>) -> Result<&P> {
        self.participants
            .get(handle.index)
            .and_then(|p| (**p).as_any().downcast_ref::<P>())
            .ok_or(SolverError::UnknownParticipant(handle.index))
    }

    pub fn participant_mut<P: Participant>(&mut self, handle: ParticipantHandle<P>) -> Result<&mut P> {
        self.participants
            .get_mut(handle.index)
            .and_then(|p| (**p).as_any_mut().downcast_mut::<P>())
            .ok_or(SolverError::UnknownParticipant(handle.index))
    }

    // ==== LIFECYCLE ====

    /// Close registration and build the dispatch-ready buffers.
    ///
    /// Participants are baked first, while registration is still open, so
    /// they can contribute particles and springs and seed positions. Rest
    /// lengths are measured afterwards from whatever positions exist then.
    pub fn bake(&mut self) -> Result<()> {
        self.ensure_live()?;
        if self.system.is_baked() {
            return Err(SolverError::AlreadyBaked { operation: "bake" });
        }

        let mut participants = std::mem::take(&mut self.participants);
        let result = participants
            .iter_mut()
            .try_for_each(|p| p.bake(&mut self.system));
        self.participants = participants;

        if let Err(e) = result {
            return Err(self.poison(e));
        }
        self.system.seal();
        Ok(())
    }

    /// Advance by one frame's wall-clock delta. Returns the number of fixed
    /// steps run.
    pub fn update(&mut self, frame_delta: f32) -> Result<u32> {
        self.ensure_stepping("update")?;
        let steps = self.clock.advance(frame_delta);
        for _ in 0..steps {
            self.step_once()?;
        }
        Ok(steps)
    }

    /// Run exactly one fixed step: participant hooks, spring forces, then
    /// integration.
    pub fn step_once(&mut self) -> Result<()> {
        self.ensure_stepping("step")?;
        let dt = self.clock.step_interval();
        self.time += self.clock.step_seconds();
        let sim_time = self.time as f32;

        let result = self
            .participants
            .iter_mut()
            .try_for_each(|p| p.update(&mut self.system, dt, sim_time));
        if let Err(e) = result {
            return Err(self.poison(e));
        }

        self.system.run_kernels();
        Ok(())
    }

    // ==== INPUT ====

    pub fn set_interaction_ray(&mut self, origin: Vec3, direction: Vec3) {
        self.system
            .set_interaction_ray(Some(InteractionRay::new(origin, direction)));
    }

    pub fn clear_interaction_ray(&mut self) {
        self.system.set_interaction_ray(None);
    }

    // ==== VIEWS ====

    pub fn system(&self) -> &ParticleSystem {
        &self.system
    }

    pub fn positions(&self) -> &[Vec4] {
        self.system.positions()
    }

    pub fn position(&self, id: ParticleId) -> Option<Vec3> {
        self.system.position(id)
    }

    pub fn particle_count(&self) -> usize {
        self.system.particle_count()
    }

    pub fn spring_count(&self) -> usize {
        self.system.spring_count()
    }

    pub fn is_baked(&self) -> bool {
        self.system.is_baked()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Simulated seconds, advanced one fixed step at a time.
    pub fn sim_time(&self) -> f32 {
        self.time as f32
    }

    pub fn clock(&self) -> &FixedStepClock {
        &self.clock
    }

    // ---------- helper functions ----------

    fn ensure_live(&self) -> Result<()> {
        if self.poisoned {
            Err(SolverError::Poisoned)
        } else {
            Ok(())
        }
    }

    fn ensure_stepping(&self, operation: &'static str) -> Result<()> {
        self.ensure_live()?;
        if !self.system.is_baked() {
            return Err(SolverError::NotBaked { operation });
        }
        Ok(())
    }

    fn poison(&mut self, cause: SolverError) -> SolverError {
        log::error!("spring solver halted: {cause}");
        self.poisoned = true;
        cause
    }
}
