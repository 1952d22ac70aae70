use crate::error::{Result, SolverError};
use std::ops::Range;

/// A validated `[start, start + count)` window over a buffer of known length.
///
/// Construction is the only place bounds are checked; kernels take the range
/// on trust once it exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchRange {
    start: usize,
    count: usize,
}

impl DispatchRange {
    pub fn new(start: usize, count: usize, len: usize) -> Result<Self> {
        match start.checked_add(count) {
            Some(end) if end <= len => Ok(Self { start, count }),
            _ => Err(SolverError::DispatchOutOfBounds { start, count, len }),
        }
    }

    /// The whole buffer.
    pub fn full(len: usize) -> Self {
        Self { start: 0, count: len }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.start + self.count
    }
}
