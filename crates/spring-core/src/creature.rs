use crate::anchor::{AnchorBridge, OwnerId, SurfaceFormula, SwimBounds, SwimMotion};
use crate::error::Result;
use crate::participant::ParticipantHandle;
use crate::particle::Particle;
use crate::rig::{BellMargin, BellMarginRig, OralArmRig, OralArms, TentacleRig};
use crate::solver::Solver;
use serde::{Deserialize, Serialize};

/// Rig and motion parameters shared by every creature in a scene.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureConfig {
    pub margin: BellMarginRig,
    pub tentacles: TentacleRig,
    pub oral_arms: OralArmRig,
    pub bounds: SwimBounds,
}

impl CreatureConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CreatureConfig = serde_json::from_str(json)?;
        config.margin.validate()?;
        config.oral_arms.validate()?;
        Ok(config)
    }
}

/// One swimming jellyfish: a driven owner with a margin skirt, tentacles and
/// oral arms.
#[derive(Debug, Clone)]
pub struct Creature {
    pub owner: OwnerId,
    pub margin: BellMargin,
    pub tentacles: Vec<Vec<Particle>>,
    pub oral_arms: OralArms,
}

impl Creature {
    /// Register the creature's owner, particles and springs. Must run before
    /// the solver is baked.
    pub fn spawn<S: SurfaceFormula + 'static>(
        solver: &mut Solver,
        bridge: ParticipantHandle<AnchorBridge<S>>,
        index: u32,
        seed: f32,
        config: &CreatureConfig,
    ) -> Result<Self> {
        let motion = SwimMotion::new(index, seed, config.bounds);
        let owner = solver
            .participant_mut(bridge)?
            .register_driven_owner(Box::new(motion))?;

        let margin = config.margin.build(solver, bridge, owner)?;
        let tentacles = config
            .tentacles
            .build(solver, bridge, owner, &margin, seed + index as f32)?;
        let oral_arms = config
            .oral_arms
            .build(solver, bridge, owner, seed * 1.7 + index as f32)?;
        log::debug!(
            "creature {index}: {} margin rows, {} tentacles, {} oral arms",
            margin.rows.len(),
            tentacles.len(),
            oral_arms.arms.len()
        );

        Ok(Self {
            owner,
            margin,
            tentacles,
            oral_arms,
        })
    }
}
