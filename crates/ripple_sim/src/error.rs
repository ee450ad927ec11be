//! Simulation error types for the delta-cycle kernel.
//!
//! All errors that can occur during model setup or execution are represented
//! as variants of [`SimError`]. Every variant is a model or programmer error:
//! the kernel fails fast instead of masking it.

use std::io;

use ripple_common::ValueError;

use crate::time::SimTime;

/// Errors that can occur during simulation setup or execution.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A signal ID does not belong to this simulation.
    #[error("unknown signal ID {0}")]
    UnknownSignal(u32),

    /// A process ID does not belong to this simulation.
    #[error("unknown process ID {0}")]
    UnknownProcess(u32),

    /// A value operation received an operand it cannot honor.
    #[error(transparent)]
    Value(#[from] ValueError),

    /// A continuous process asked to suspend on time or on signals.
    #[error("continuous process '{process}' cannot wait; return Yield or Finish")]
    ContinuousWait {
        /// Name of the offending process.
        process: String,
    },

    /// A timed wait would land past the end of representable time.
    #[error("process '{process}' waits {duration} ticks past tick {tick}, overflowing time")]
    TimeOverflow {
        /// Name of the waiting process.
        process: String,
        /// Tick at which the wait was requested.
        tick: u64,
        /// Requested wait duration.
        duration: u64,
    },

    /// Too many delta cycles at a single tick, indicating a combinational loop.
    #[error("delta cycle limit exceeded at {time} (max {max_deltas} deltas)")]
    DeltaCycleLimit {
        /// Where the limit was hit.
        time: SimTime,
        /// The maximum number of delta cycles allowed.
        max_deltas: u32,
    },

    /// A process body reported a failure of its own.
    #[error("process '{process}' failed at {time}: {reason}")]
    ProcessFailed {
        /// Name of the failing process.
        process: String,
        /// Where the failure happened.
        time: SimTime,
        /// What went wrong.
        reason: String,
    },

    /// An I/O error occurred while writing waveform data.
    #[error("waveform I/O error: {0}")]
    WaveformIo(#[from] io::Error),
}
