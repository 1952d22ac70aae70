use crate::anchor::{add_anchored_particle, Anchor, AnchorBridge, OwnerId, SurfaceFormula};
use crate::constraints::spring::SpringId;
use crate::error::{Result, SolverError};
use crate::math::hash12;
use crate::participant::ParticipantHandle;
use crate::particle::Particle;
use crate::solver::Solver;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Soft skirt hanging from the bell rim.
///
/// Row 0 is pinned to the rim. Rows below hang free, connected by a lattice
/// of springs, and rows `1..=muscle_rows` are each tugged towards a pinned
/// "muscle" anchor that follows the rim's tangent as the bell pulses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BellMarginRig {
    /// Particles around the rim.
    pub width: usize,
    pub rows: usize,
    /// Vertical and outward distance between rows.
    pub row_spacing: f32,
    /// Zenith of the rim on the bell surface.
    pub rim_zenith: f32,
    pub lattice_stiffness: f32,
    /// Stiffness of the row-1 muscle spring; row `y` uses `muscle_stiffness / y^3`.
    pub muscle_stiffness: f32,
    pub muscle_rows: usize,
}

impl Default for BellMarginRig {
    fn default() -> Self {
        Self {
            width: 64,
            rows: 8,
            row_spacing: 0.042,
            rim_zenith: 1.0,
            lattice_stiffness: 0.002,
            muscle_stiffness: 0.01,
            muscle_rows: 3,
        }
    }
}

/// Particles registered by [`BellMarginRig::build`].
#[derive(Debug, Clone)]
pub struct BellMargin {
    /// `rows[y][x]`, row 0 at the rim.
    pub rows: Vec<Vec<Particle>>,
    /// Anchor each row particle was registered with.
    pub anchors: Vec<Vec<Anchor>>,
    pub muscles: Vec<Particle>,
}

impl BellMarginRig {
    pub fn validate(&self) -> Result<()> {
        if self.width < 2 || self.rows < 2 {
            return Err(SolverError::InvalidConfig(format!(
                "bell margin needs at least 2x2 particles, got {}x{}",
                self.width, self.rows
            )));
        }
        Ok(())
    }

    pub fn build<S: SurfaceFormula + 'static>(
        &self,
        solver: &mut Solver,
        bridge: ParticipantHandle<AnchorBridge<S>>,
        owner: OwnerId,
    ) -> Result<BellMargin> {
        self.validate()?;
        let mut rows = Vec::with_capacity(self.rows);
        let mut anchors = Vec::with_capacity(self.rows);
        let mut muscles = Vec::new();

        for y in 0..self.rows {
            let mut row = Vec::with_capacity(self.width);
            let mut row_anchors = Vec::with_capacity(self.width);
            for x in 0..self.width {
                let azimuth = x as f32 / self.width as f32 * TAU;
                let depth = y as f32 * self.row_spacing;
                let offset = Vec3::new(azimuth.sin() * depth, -depth, azimuth.cos() * depth);

                let anchor = Anchor::new(self.rim_zenith, azimuth)
                    .with_offset(offset)
                    .fixed(y == 0);
                let particle = add_anchored_particle(solver, bridge, owner, anchor)?;

                if y >= 1 && y <= self.muscle_rows {
                    let muscle_anchor = Anchor::new(self.rim_zenith, azimuth)
                        .with_directional_offset(-offset.y)
                        .fixed(true);
                    let muscle = add_anchored_particle(solver, bridge, owner, muscle_anchor)?;
                    let stiffness = self.muscle_stiffness / (y as f32).powi(3);
                    solver.add_spring(particle, muscle, stiffness, 0.0)?;
                    muscles.push(muscle);
                }

                row.push(particle);
                row_anchors.push(anchor);
            }
            rows.push(row);
            anchors.push(row_anchors);
        }

        for y in 1..self.rows {
            for x in 0..self.width {
                let right = (x + 1) % self.width;
                let v0 = rows[y][x];
                let v1 = rows[y - 1][x];
                let v2 = rows[y][right];
                let v3 = rows[y - 1][right];
                let k = self.lattice_stiffness;
                solver.add_spring_default(v0, v1, k)?;
                solver.add_spring_default(v0, v2, k)?;
                solver.add_spring_default(v1, v2, k)?;
                solver.add_spring_default(v0, v3, k)?;
            }
        }

        Ok(BellMargin {
            rows,
            anchors,
            muscles,
        })
    }
}

/// Chains of free particles hanging from the lowest margin rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TentacleRig {
    pub count: usize,
    /// Links per tentacle, counting the three margin particles it starts from.
    pub length: usize,
    pub segment_length: f32,
    /// Random extra length per tentacle, up to this much.
    pub segment_jitter: f32,
    pub stiffness: f32,
}

impl Default for TentacleRig {
    fn default() -> Self {
        Self {
            count: 16,
            length: 20,
            segment_length: 0.24,
            segment_jitter: 0.06,
            stiffness: 0.005,
        }
    }
}

impl TentacleRig {
    /// Grow tentacles below `margin`. Each new particle springs to the two
    /// before it, which also gives the chain some bending stiffness.
    pub fn build<S: SurfaceFormula + 'static>(
        &self,
        solver: &mut Solver,
        bridge: ParticipantHandle<AnchorBridge<S>>,
        owner: OwnerId,
        margin: &BellMargin,
        seed: f32,
    ) -> Result<Vec<Vec<Particle>>> {
        let rows = margin.rows.len();
        if self.count == 0 {
            return Ok(Vec::new());
        }
        if rows < 3 {
            return Err(SolverError::InvalidConfig(format!(
                "tentacles need at least 3 margin rows, got {rows}"
            )));
        }
        let width = margin.rows[0].len();

        let mut tentacles = Vec::with_capacity(self.count);
        for t in 0..self.count {
            let column = t * width / self.count;
            let mut chain = vec![
                margin.rows[rows - 3][column],
                margin.rows[rows - 2][column],
                margin.rows[rows - 1][column],
            ];
            let pivot = margin.anchors[rows - 1][column];
            let segment = self.segment_length + hash12(seed, t as f32 * 1.618) * self.segment_jitter;

            let mut offset = pivot.offset;
            for y in 3..self.length {
                offset.y -= segment;
                let anchor = Anchor::new(pivot.zenith, pivot.azimuth).with_offset(offset);
                let particle = add_anchored_particle(solver, bridge, owner, anchor)?;
                solver.add_spring_default(chain[y - 1], particle, self.stiffness)?;
                solver.add_spring_default(chain[y - 2], particle, self.stiffness)?;
                chain.push(particle);
            }
            tentacles.push(chain);
        }
        Ok(tentacles)
    }
}

/// Frilled ribbons hanging from the underside of the bell.
///
/// Each arm is a `rows x width` sheet of anchors on the bell's bottom surface.
/// Row 0 is pinned. Rows are tied by a lattice of neighbour and skip-one
/// springs, and every `contract_every` rows a weak spring with a shortened
/// rest length pulls the sheet together so the arm curls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OralArmRig {
    pub count: usize,
    pub rows: usize,
    pub width: usize,
    pub stiffness: f32,
    /// Zenith of the arm's centre line where it meets the bell.
    pub root_zenith: f32,
    /// Vertical distance between rows, before jitter.
    pub row_spacing: f32,
    /// Random extra row spacing, as a fraction of `row_spacing`.
    pub row_jitter: f32,
    /// Random sideways offset per particle, up to this much.
    pub lateral_jitter: f32,
    pub contract_every: usize,
    /// Contracting springs use `stiffness * contract_stiffness`.
    pub contract_stiffness: f32,
    /// Rest-length factor of contracting springs is drawn from
    /// `[contract_factor, contract_factor + contract_factor_range)`.
    pub contract_factor: f32,
    pub contract_factor_range: f32,
}

impl Default for OralArmRig {
    fn default() -> Self {
        Self {
            count: 4,
            rows: 35,
            width: 5,
            stiffness: 0.005,
            root_zenith: 0.2,
            row_spacing: 0.1,
            row_jitter: 0.5,
            lateral_jitter: 0.1,
            contract_every: 5,
            contract_stiffness: 0.2,
            contract_factor: 0.3,
            contract_factor_range: 0.2,
        }
    }
}

/// Particles and contracting springs registered by [`OralArmRig::build`].
#[derive(Debug, Clone)]
pub struct OralArms {
    /// `arms[arm][row][x]`, row 0 pinned to the bell.
    pub arms: Vec<Vec<Vec<Particle>>>,
    pub contracting: Vec<SpringId>,
}

impl OralArmRig {
    pub fn validate(&self) -> Result<()> {
        if self.count > 0 && (self.width < 2 || self.rows < 2 || self.contract_every == 0) {
            return Err(SolverError::InvalidConfig(format!(
                "oral arms need at least 2x2 particles and a contraction period, got {}x{} every {}",
                self.width, self.rows, self.contract_every
            )));
        }
        Ok(())
    }

    pub fn build<S: SurfaceFormula + 'static>(
        &self,
        solver: &mut Solver,
        bridge: ParticipantHandle<AnchorBridge<S>>,
        owner: OwnerId,
        seed: f32,
    ) -> Result<OralArms> {
        self.validate()?;
        let mut arms = Vec::with_capacity(self.count);
        let mut contracting = Vec::new();
        let k = self.stiffness;
        let period = self.contract_every;

        for a in 0..self.count {
            let azimuth = a as f32 / self.count as f32 * TAU;
            let arm_seed = seed + a as f32 * 3.17;
            let mut offset = Vec3::new(0.0, 0.05, 0.0);
            let mut arm: Vec<Vec<Particle>> = Vec::with_capacity(self.rows);

            for y in 0..self.rows {
                let taper = 0.05 + (1.0 - y as f32 / self.rows as f32) * 0.1;
                let mut row = Vec::with_capacity(self.width);
                for x in 0..self.width {
                    let across = (x as f32 / (self.width - 1) as f32 - 0.5) * 2.0;
                    let jitter = hash12(arm_seed, (y * self.width + x) as f32 * 0.73) - 0.5;
                    offset.x = jitter * self.lateral_jitter;
                    let anchor = Anchor::new(self.root_zenith + across * taper, azimuth)
                        .on_bottom()
                        .with_offset(offset)
                        .fixed(y == 0);
                    row.push(add_anchored_particle(solver, bridge, owner, anchor)?);
                }
                let stretch = hash12(arm_seed + 11.0, y as f32 * 1.37);
                offset.y -= self.row_spacing * (1.0 + stretch * self.row_jitter);
                arm.push(row);
            }

            for y in 1..self.rows {
                for x in 0..self.width {
                    let v0 = arm[y][x];
                    solver.add_spring_default(v0, arm[y - 1][x], k)?;
                    if x > 0 {
                        solver.add_spring_default(v0, arm[y][x - 1], k)?;
                    }
                    if x > 1 {
                        solver.add_spring_default(v0, arm[y][x - 2], k)?;
                    }
                    if y > 1 {
                        solver.add_spring_default(v0, arm[y - 2][x], k)?;
                    }
                    if y > period && y % period == 3 % period {
                        let draw = hash12(arm_seed + 23.0, (y * self.width + x) as f32 * 0.51);
                        let factor = self.contract_factor + draw * self.contract_factor_range;
                        let spring = solver.add_spring(
                            v0,
                            arm[y - period][x],
                            k * self.contract_stiffness,
                            factor,
                        )?;
                        contracting.push(spring);
                    }
                }
            }
            arms.push(arm);
        }

        Ok(OralArms { arms, contracting })
    }
}
