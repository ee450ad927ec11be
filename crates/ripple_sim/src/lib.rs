//! Delta-cycle discrete-event simulation kernel for digital-logic models.
//!
//! A model is a set of fixed-width signals and a set of cooperative processes.
//! Processes never write a signal directly: they enqueue drivers that the
//! scheduler commits after every process has been evaluated, so all processes
//! in a delta cycle observe the same pre-commit values. Signals that changed
//! reactivate the processes waiting on them in the next delta cycle, and once
//! nothing changes, time jumps to the earliest pending timed wait.
//!
//! # Architecture
//!
//! - [`Simulation`] owns signals, processes and the current time.
//! - A [`Process`] is an explicit resumable state machine: each evaluation
//!   runs to the next suspension point and returns a [`Suspend`] request.
//! - A [`Tracer`] is notified after the initial values and after every step.
//!
//! # Usage
//!
//! ```ignore
//! use ripple_sim::{from_fn, ProcessMode, Simulation, Suspend};
//!
//! let mut sim = Simulation::new();
//! let clk = sim.add_signal("clk", 1)?;
//! sim.add_process("clock", ProcessMode::Event, from_fn(move |ctx| {
//!     let next = !ctx.value(clk)?;
//!     ctx.assign(clk, next)?;
//!     Ok(Suspend::wait(10))
//! }));
//! let result = sim.run(100)?;
//! println!("Simulation ended at {}", result.final_time);
//! ```
//!
//! # Modules
//!
//! - `error`: Simulation error types
//! - `time`: Ticks with delta cycles
//! - `signal`: Signal state, driver queues, commit protocol
//! - `process`: Process trait, suspension requests, process context
//! - `kernel`: The scheduler
//! - `waveform`: Trace output (VCD and in-memory)

#![warn(missing_docs)]

pub mod error;
pub mod kernel;
pub mod process;
pub mod signal;
pub mod time;
pub mod waveform;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

pub use error::SimError;
pub use kernel::{RunResult, Simulation, StepResult, StopReason, DEFAULT_MAX_DELTAS};
pub use process::{
    from_fn, Process, ProcessContext, ProcessId, ProcessMode, ProcessState, Suspend, Transcript,
};
pub use ripple_common::Value;
pub use signal::{check_edge, Edge, Signal, SignalId, SignalTable};
pub use time::SimTime;
pub use waveform::{TraceEntry, TraceLog, Tracer, VcdTracer};

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Tick at which the run stops. If `None`, runs until no more events.
    pub time_limit: Option<u64>,
    /// Maximum delta cycles at a single time value.
    pub max_deltas: u32,
    /// Optional path for VCD output.
    pub waveform_path: Option<PathBuf>,
    /// Whether to record waveform data. Ignored if `waveform_path` is `None`.
    pub record_waveform: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            time_limit: None,
            max_deltas: DEFAULT_MAX_DELTAS,
            waveform_path: None,
            record_waveform: false,
        }
    }
}

/// High-level entry point: runs a built model under `config`.
///
/// Attaches a VCD tracer writing to `config.waveform_path` when recording is
/// enabled, applies the delta-cycle bound, and runs to the time limit or until
/// no more events exist.
pub fn simulate(sim: &mut Simulation, config: &SimConfig) -> Result<RunResult, SimError> {
    sim.set_max_deltas(config.max_deltas);

    if config.record_waveform {
        if let Some(path) = &config.waveform_path {
            let file = File::create(path)?;
            tracing::debug!(path = %path.display(), "recording waveform");
            sim.set_tracer(Box::new(VcdTracer::new(BufWriter::new(file))));
        }
    }

    match config.time_limit {
        Some(limit) => sim.run(limit),
        None => sim.run_to_completion(),
    }
}
