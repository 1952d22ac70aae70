use thiserror::Error;

/// Errors raised by the solver and the anchor bridge.
///
/// Protocol-order violations (`AlreadyBaked`, `NotBaked`) and out-of-range
/// dispatches are programmer errors: they are reported immediately and the
/// caller is expected to stop. Once a bake or a step has failed the solver is
/// poisoned and every further call reports [`SolverError::Poisoned`].
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("cannot {operation} after bake")]
    AlreadyBaked { operation: &'static str },
    #[error("cannot {operation} before bake")]
    NotBaked { operation: &'static str },
    #[error("simulation halted after an earlier failure")]
    Poisoned,
    #[error("unknown particle id: {0}")]
    UnknownParticle(u32),
    #[error("unknown owner id: {0}")]
    UnknownOwner(u32),
    #[error("unknown participant index: {0}")]
    UnknownParticipant(usize),
    #[error("dispatch range {start}..{start}+{count} exceeds buffer of length {len}")]
    DispatchOutOfBounds { start: usize, count: usize, len: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SolverError>;
