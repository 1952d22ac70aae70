use crate::error::Result;
use crate::system::ParticleSystem;
use std::any::Any;
use std::marker::PhantomData;

/// A collaborator driven by the solver's lifecycle.
///
/// `bake` runs once, in registration order, while the system is still open
/// for registration: participants may add particles and springs there and may
/// write positions of particles they own. `update` runs once per fixed step,
/// before the physics kernels.
pub trait Participant: AsAny {
    fn bake(&mut self, system: &mut ParticleSystem) -> Result<()>;

    fn update(&mut self, system: &mut ParticleSystem, dt: f32, sim_time: f32) -> Result<()>;
}

/// Downcasting support for boxed participants.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Typed handle to a participant owned by a [`crate::solver::Solver`].
pub struct ParticipantHandle<P> {
    pub(crate) index: usize,
    _marker: PhantomData<fn() -> P>,
}

impl<P> ParticipantHandle<P> {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl<P> Clone for ParticipantHandle<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for ParticipantHandle<P> {}

impl<P> std::fmt::Debug for ParticipantHandle<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ParticipantHandle").field(&self.index).finish()
    }
}
