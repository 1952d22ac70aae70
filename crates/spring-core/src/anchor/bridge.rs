use crate::anchor::motion::{OwnerMotion, OwnerPose};
use crate::anchor::surface::SurfaceFormula;
use crate::dispatch::DispatchRange;
use crate::error::{Result, SolverError};
use crate::participant::{Participant, ParticipantHandle};
use crate::particle::{Particle, ParticleId};
use crate::solver::Solver;
use crate::system::ParticleSystem;
use glam::{Affine3A, Vec3, Vec4};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Zenith step used to estimate the surface tangent for directional offsets.
pub const ZENITH_STEP: f32 = 0.001;

/// Dense owner (creature) index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerId(pub u32);

impl OwnerId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Procedural placement of one particle on its owner's surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub zenith: f32,
    pub azimuth: f32,
    /// Sample the underside of the surface.
    pub bottom: bool,
    /// Local-space offset added to the surface point.
    pub offset: Vec3,
    /// When non-zero, replaces `offset` with this distance along the
    /// surface's zenith tangent, so the offset follows the animated surface.
    pub directional_offset: f32,
    /// Re-seeded every step; otherwise only when the owner requests it.
    pub fixed: bool,
}

impl Anchor {
    pub fn new(zenith: f32, azimuth: f32) -> Self {
        Self {
            zenith,
            azimuth,
            bottom: false,
            offset: Vec3::ZERO,
            directional_offset: 0.0,
            fixed: false,
        }
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_directional_offset(mut self, distance: f32) -> Self {
        self.directional_offset = distance;
        self
    }

    pub fn on_bottom(mut self) -> Self {
        self.bottom = true;
        self
    }

    pub fn fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }
}

/// One particle registered through the bridge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorRecord {
    pub particle: ParticleId,
    pub owner: OwnerId,
    pub anchor: Anchor,
}

/// Contiguous window of anchors in baked order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnchorRange {
    pub start: usize,
    pub count: usize,
}

/// Host-facing state of one owner.
pub struct OwnerRecord {
    pub id: OwnerId,
    pub transform: Affine3A,
    pub phase: f32,
    /// Pointer charge reported by the motion driver; zero for host-posed
    /// owners.
    pub charge: f32,
    /// Re-seed this owner's non-fixed anchors on the next step.
    pub needs_position_update: bool,
    motion: Option<Box<dyn OwnerMotion>>,
}

impl OwnerRecord {
    pub fn is_driven(&self) -> bool {
        self.motion.is_some()
    }
}

/// Places particles on procedurally animated owner surfaces.
///
/// Fixed anchors track their owner every step. Non-fixed anchors are left to
/// the physics and only re-seeded when their owner asks for it, e.g. after
/// spawning or teleporting.
pub struct AnchorBridge<S> {
    surface: S,
    owners: Vec<OwnerRecord>,
    records: Vec<AnchorRecord>,
    baked: bool,
    fixed_count: usize,
    owner_ranges: Vec<AnchorRange>,
    // Kernel-side tables, indexed by baked anchor order.
    ids: Vec<[u32; 2]>,
    params: Vec<Vec3>,
    offsets: Vec<Vec4>,
    // Kernel-side tables, indexed by owner.
    transforms: Vec<Affine3A>,
    phases: Vec<f32>,
}

impl<S: SurfaceFormula + 'static> AnchorBridge<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            owners: Vec::new(),
            records: Vec::new(),
            baked: false,
            fixed_count: 0,
            owner_ranges: Vec::new(),
            ids: Vec::new(),
            params: Vec::new(),
            offsets: Vec::new(),
            transforms: Vec::new(),
            phases: Vec::new(),
        }
    }

    // ==== REGISTRATION ====

    /// Register an owner posed by the host through [`Self::set_owner_pose`].
    pub fn register_owner(&mut self) -> Result<OwnerId> {
        self.push_owner(OwnerPose::default(), None)
    }

    /// Register an owner whose pose is advanced by `motion` every step.
    pub fn register_driven_owner(&mut self, motion: Box<dyn OwnerMotion>) -> Result<OwnerId> {
        let pose = motion.current();
        self.push_owner(pose, Some(motion))
    }

    pub fn register_particle(&mut self, owner: OwnerId, particle: Particle, anchor: Anchor) -> Result<()> {
        if self.baked {
            return Err(SolverError::AlreadyBaked {
                operation: "register an anchor",
            });
        }
        if owner.index() >= self.owners.len() {
            return Err(SolverError::UnknownOwner(owner.0));
        }
        // fixed anchors are overwritten every step; the particle must be pinned
        if anchor.fixed && !particle.fixed {
            return Err(SolverError::InvalidConfig(format!(
                "fixed anchor on free particle {}",
                particle.id.0
            )));
        }
        self.records.push(AnchorRecord {
            particle: particle.id,
            owner,
            anchor,
        });
        Ok(())
    }

    // ==== HOST API ====

    /// Replace an owner's pose. After bake this also updates the kernel
    /// tables, so a following re-seed sees the new pose immediately.
    pub fn set_owner_pose(&mut self, owner: OwnerId, transform: Affine3A, phase: f32) -> Result<()> {
        let record = self
            .owners
            .get_mut(owner.index())
            .ok_or(SolverError::UnknownOwner(owner.0))?;
        record.transform = transform;
        record.phase = phase;
        if self.baked {
            self.transforms[owner.index()] = transform;
            self.phases[owner.index()] = phase;
        }
        Ok(())
    }

    /// Flag an owner for an out-of-band re-seed on the next step.
    pub fn request_position_update(&mut self, owner: OwnerId) -> Result<()> {
        let record = self
            .owners
            .get_mut(owner.index())
            .ok_or(SolverError::UnknownOwner(owner.0))?;
        record.needs_position_update = true;
        Ok(())
    }

    pub fn owner(&self, owner: OwnerId) -> Option<&OwnerRecord> {
        self.owners.get(owner.index())
    }

    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    pub fn anchor_count(&self) -> usize {
        self.records.len()
    }

    /// Anchor records; in baked order once baked.
    pub fn anchors(&self) -> &[AnchorRecord] {
        &self.records
    }

    /// Window of an owner's non-fixed anchors. `None` before bake.
    pub fn owner_range(&self, owner: OwnerId) -> Option<AnchorRange> {
        self.owner_ranges.get(owner.index()).copied()
    }

    /// Number of fixed anchors, which occupy `[0, fixed_count)`.
    pub fn fixed_count(&self) -> usize {
        self.fixed_count
    }

    pub fn is_baked(&self) -> bool {
        self.baked
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    // ==== RE-SEEDING ====

    pub fn reseed_all(&self, system: &mut ParticleSystem) -> Result<()> {
        self.ensure_baked("re-seed anchors")?;
        self.reseed(system, DispatchRange::full(self.records.len()))
    }

    pub fn reseed_fixed(&self, system: &mut ParticleSystem) -> Result<()> {
        self.ensure_baked("re-seed fixed anchors")?;
        let range = DispatchRange::new(0, self.fixed_count, self.records.len())?;
        self.reseed(system, range)
    }

    pub fn reseed_owner(&self, system: &mut ParticleSystem, owner: OwnerId) -> Result<()> {
        self.ensure_baked("re-seed an owner")?;
        let window = self
            .owner_ranges
            .get(owner.index())
            .ok_or(SolverError::UnknownOwner(owner.0))?;
        let range = DispatchRange::new(window.start, window.count, self.records.len())?;
        log::debug!(
            "re-seeding owner {} anchors {}..{}",
            owner.0,
            window.start,
            window.start + window.count
        );
        self.reseed(system, range)
    }

    /// Re-seed kernel over a validated window of baked anchors.
    ///
    /// Positions are evaluated independently per anchor, then scattered into
    /// the particle buffer.
    fn reseed(&self, system: &mut ParticleSystem, range: DispatchRange) -> Result<()> {
        if range.is_empty() {
            return Ok(());
        }

        let surface = &self.surface;
        let ids = &self.ids;
        let params = &self.params;
        let offsets = &self.offsets;
        let transforms = &self.transforms;
        let phases = &self.phases;

        let eval = |i: usize| -> (u32, Vec3) {
            let [particle, owner] = ids[i];
            let owner = owner as usize;
            let (zenith, azimuth, bottom) = (params[i].x, params[i].y, params[i].z);
            let phase = phases[owner];

            let p = surface.position(phase, zenith, azimuth, bottom);
            let mut offset = offsets[i].truncate();
            let directional = offsets[i].w;
            if directional.abs() > 0.0 {
                let ahead = surface.position(phase, zenith + ZENITH_STEP, azimuth, bottom);
                offset = (ahead - p).normalize_or_zero() * directional;
            }
            (particle, transforms[owner].transform_point3(p + offset))
        };

        #[cfg(feature = "parallel")]
        let placed: Vec<(u32, Vec3)> = range.as_range().into_par_iter().map(eval).collect();

        #[cfg(not(feature = "parallel"))]
        let placed: Vec<(u32, Vec3)> = range.as_range().map(eval).collect();

        for (particle, position) in placed {
            system.set_position(ParticleId(particle), position)?;
        }
        Ok(())
    }

    // ---------- helper functions ----------

    fn push_owner(&mut self, pose: OwnerPose, motion: Option<Box<dyn OwnerMotion>>) -> Result<OwnerId> {
        if self.baked {
            return Err(SolverError::AlreadyBaked {
                operation: "register an owner",
            });
        }
        let id = OwnerId(self.owners.len() as u32);
        self.owners.push(OwnerRecord {
            id,
            transform: pose.transform,
            phase: pose.phase,
            charge: pose.charge,
            needs_position_update: false,
            motion,
        });
        Ok(id)
    }

    fn ensure_baked(&self, operation: &'static str) -> Result<()> {
        if self.baked {
            Ok(())
        } else {
            Err(SolverError::NotBaked { operation })
        }
    }

    /// Sort records fixed-first, then by owner, and build the kernel tables.
    fn partition(&mut self) {
        // stable: registration order survives within each group
        self.records.sort_by_key(|r| (!r.anchor.fixed, r.owner));

        let len = self.records.len();
        self.fixed_count = self
            .records
            .iter()
            .position(|r| !r.anchor.fixed)
            .unwrap_or(len);

        self.owner_ranges.clear();
        let mut cursor = self.fixed_count;
        for owner in 0..self.owners.len() {
            let start = cursor;
            while cursor < len && self.records[cursor].owner.index() == owner {
                cursor += 1;
            }
            self.owner_ranges.push(AnchorRange {
                start,
                count: cursor - start,
            });
        }

        self.ids = self
            .records
            .iter()
            .map(|r| [r.particle.0, r.owner.0])
            .collect();
        self.params = self
            .records
            .iter()
            .map(|r| {
                let bottom = if r.anchor.bottom { 1.0 } else { 0.0 };
                Vec3::new(r.anchor.zenith, r.anchor.azimuth, bottom)
            })
            .collect();
        self.offsets = self
            .records
            .iter()
            .map(|r| r.anchor.offset.extend(r.anchor.directional_offset))
            .collect();

        self.transforms = self.owners.iter().map(|o| o.transform).collect();
        self.phases = self.owners.iter().map(|o| o.phase).collect();
    }
}

impl<S: SurfaceFormula + 'static> Participant for AnchorBridge<S> {
    fn bake(&mut self, system: &mut ParticleSystem) -> Result<()> {
        if self.baked {
            return Err(SolverError::AlreadyBaked { operation: "bake" });
        }
        self.partition();
        self.baked = true;
        log::info!(
            "anchor bridge baked: {} owners, {} anchors ({} fixed)",
            self.owners.len(),
            self.records.len(),
            self.fixed_count
        );

        self.reseed_all(system)?;
        for owner in &mut self.owners {
            owner.needs_position_update = false;
        }
        Ok(())
    }

    fn update(&mut self, system: &mut ParticleSystem, dt: f32, sim_time: f32) -> Result<()> {
        self.ensure_baked("update anchors")?;
        let ray = system.interaction_ray().copied();

        for idx in 0..self.owners.len() {
            let owner = &mut self.owners[idx];
            if let Some(motion) = owner.motion.as_mut() {
                let pose = motion.advance(dt, sim_time, ray.as_ref());
                owner.transform = pose.transform;
                owner.phase = pose.phase;
                owner.charge = pose.charge;
                if pose.teleported {
                    log::debug!("owner {} teleported", owner.id.0);
                    owner.needs_position_update = true;
                }
            }
            self.transforms[idx] = owner.transform;
            self.phases[idx] = owner.phase;

            let reseed = std::mem::take(&mut owner.needs_position_update);
            let id = owner.id;
            if reseed {
                self.reseed_owner(system, id)?;
            }
        }

        self.reseed_fixed(system)
    }
}

/// Add a particle and anchor it to `owner` in one call.
///
/// The particle is fixed exactly when the anchor is. Its registration
/// position is irrelevant: the bridge seeds it during bake.
pub fn add_anchored_particle<S: SurfaceFormula + 'static>(
    solver: &mut Solver,
    bridge: ParticipantHandle<AnchorBridge<S>>,
    owner: OwnerId,
    anchor: Anchor,
) -> Result<Particle> {
    let particle = solver.add_particle(Vec3::ZERO, anchor.fixed)?;
    solver
        .participant_mut(bridge)?
        .register_particle(owner, particle, anchor)?;
    Ok(particle)
}
