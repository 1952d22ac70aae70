//! Fixed-step particle-spring solver for soft-bodied creatures.
//!
//! Geometry generators register particles and springs, optionally placing
//! particles through the [`anchor::AnchorBridge`]. [`solver::Solver::bake`]
//! flattens everything into contiguous buffers, after which each fixed step
//! runs the participants, a spring-force pass and a per-particle
//! force/integration pass. Renderers read [`solver::Solver::positions`].

pub mod anchor;
pub mod clock;
pub mod config;
pub mod constraints;
pub mod creature;
pub mod dispatch;
pub mod error;
pub mod forces;
pub mod influence;
pub mod integrate;
pub mod math;
pub mod participant;
pub mod particle;
pub mod rig;
pub mod solver;
pub mod system;

pub use config::SolverConfig;
pub use error::{Result, SolverError};
pub use participant::{Participant, ParticipantHandle};
pub use particle::{Particle, ParticleId};
pub use solver::Solver;
pub use system::ParticleSystem;
