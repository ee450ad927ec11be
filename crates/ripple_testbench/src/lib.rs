//! Reference models that exercise the Ripple simulation kernel.
//!
//! Each testbench builds its signals and processes into a caller-supplied
//! [`Simulation`](ripple_sim::Simulation) and returns the handles of the
//! signals worth observing. The caller decides how long to run and whether to
//! trace.
//!
//! - [`counter`]: a free-running clock and a counter incremented on each
//!   rising edge.
//! - [`divide`]: the Patterson-Hennessy restoring divider, unsigned or
//!   two's-complement, with a self-checking stimulus process.

#![warn(missing_docs)]

pub mod clock;
pub mod counter;
pub mod divide;

use std::fmt;
use std::str::FromStr;

pub use clock::Clock;
pub use counter::{CounterParams, CounterSignals};
pub use divide::{DivideParams, DivideSignals};

/// The bundled testbenches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bench {
    /// Clock and rising-edge counter.
    Counter,
    /// Iterative 32-bit divider.
    Divide,
}

impl Bench {
    /// Every bundled testbench.
    pub const ALL: [Bench; 2] = [Bench::Counter, Bench::Divide];

    /// Name used on the command line and for default output files.
    pub fn name(self) -> &'static str {
        match self {
            Bench::Counter => "counter",
            Bench::Divide => "divide",
        }
    }

    /// One-line description.
    pub fn description(self) -> &'static str {
        match self {
            Bench::Counter => "clock toggling every period, counter incremented on each rising edge",
            Bench::Divide => "32-bit restoring divider (unsigned or signed) with a self-checking stimulus",
        }
    }

    /// Run length used when none is configured.
    pub fn default_time(self) -> u64 {
        match self {
            Bench::Counter => 400,
            Bench::Divide => 2000,
        }
    }
}

impl fmt::Display for Bench {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown testbench name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown testbench '{0}' (expected one of: counter, divide)")]
pub struct UnknownBench(pub String);

impl FromStr for Bench {
    type Err = UnknownBench;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bench::ALL
            .into_iter()
            .find(|b| b.name() == s)
            .ok_or_else(|| UnknownBench(s.to_string()))
    }
}
