//! Anchor bridge: particles whose baseline position comes from an owner's
//! animated procedural surface rather than from the spring physics.

pub mod bridge;
pub mod motion;
pub mod surface;

pub use bridge::{
    add_anchored_particle, Anchor, AnchorBridge, AnchorRange, AnchorRecord, OwnerId, OwnerRecord,
};
pub use motion::{OwnerMotion, OwnerPose, SwimBounds, SwimMotion};
pub use surface::{BellSurface, SurfaceFormula};
