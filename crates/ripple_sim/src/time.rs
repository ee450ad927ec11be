//! Simulation time: an abstract integer tick plus the delta cycle within it.
//!
//! Ticks carry no wall-clock meaning. [`SimTime`] orders events first by tick,
//! then by delta cycle, which is how the kernel reports where a step or an
//! error happened.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A simulation time point with delta cycle tracking.
///
/// Delta cycles are the zero-duration evaluate/commit rounds that run at a
/// single tick until no signal changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimTime {
    /// Abstract simulation tick.
    pub tick: u64,
    /// Delta cycle index within the current tick.
    pub delta: u32,
}

impl SimTime {
    /// Creates a time point at tick zero, delta zero.
    pub fn zero() -> Self {
        Self { tick: 0, delta: 0 }
    }

    /// Creates a time at the given tick with delta 0.
    pub fn at(tick: u64) -> Self {
        Self { tick, delta: 0 }
    }

    /// Returns the next delta cycle at the same tick.
    pub fn next_delta(&self) -> Self {
        Self {
            tick: self.tick,
            delta: self.delta + 1,
        }
    }

    /// Advances to a new tick, resetting the delta counter.
    pub fn advance_to(&self, tick: u64) -> Self {
        debug_assert!(
            tick >= self.tick,
            "cannot advance backwards: {} -> {}",
            self.tick,
            tick
        );
        Self { tick, delta: 0 }
    }
}

impl Default for SimTime {
    fn default() -> Self {
        Self::zero()
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tick.cmp(&other.tick).then(self.delta.cmp(&other.delta))
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tick)?;
        if self.delta > 0 {
            write!(f, "+d{}", self.delta)?;
        }
        Ok(())
    }
}
