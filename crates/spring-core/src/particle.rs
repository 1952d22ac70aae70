use glam::{Vec3, Vec4};

/// Dense particle index, assigned at registration and stable for the
/// solver's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticleId(pub u32);

impl ParticleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle returned by registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Particle {
    pub id: ParticleId,
    pub fixed: bool,
}

/// `w` component stored for particles the integrator must not move.
pub const FIXED_FLAG: f32 = 0.0;
/// `w` component stored for particles displaced by integration.
pub const FREE_FLAG: f32 = 1.0;

/// Whether a packed position belongs to a particle the integrator moves.
#[inline]
pub fn is_free(position: Vec4) -> bool {
    position.w > (FIXED_FLAG + FREE_FLAG) * 0.5
}

/// SoA particle storage.
///
/// Positions pack xyz with the fixed/free flag in `w` so a single buffer can
/// be handed to the renderer as-is.
#[derive(Default)]
pub struct ParticleSet {
    pub position: Vec<Vec4>,
    /// Persistent force accumulator. Decayed and accumulated every step and
    /// added straight to the position, so it acts as an implicit velocity.
    pub force: Vec<Vec3>,
}

impl ParticleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Append a particle and return its id.
    pub fn push(&mut self, position: Vec3, fixed: bool) -> ParticleId {
        let id = ParticleId(self.position.len() as u32);
        let flag = if fixed { FIXED_FLAG } else { FREE_FLAG };
        self.position.push(position.extend(flag));
        self.force.push(Vec3::ZERO);
        id
    }

    /// Overwrite xyz, keeping the fixed/free flag.
    #[inline]
    pub fn set_xyz(&mut self, id: ParticleId, p: Vec3) {
        let slot = &mut self.position[id.index()];
        *slot = p.extend(slot.w);
    }
}
