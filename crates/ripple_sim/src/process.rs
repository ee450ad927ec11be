//! Cooperative processes: resumable state machines with explicit suspension points.
//!
//! A process is evaluated by the scheduler, runs straight-line code, and
//! returns a [`Suspend`] request describing how it wants to be parked: a timed
//! wait, a wait on one or more signals or on one clock edge, or termination. Everything a process
//! needs to resume where it left off lives in the process value itself,
//! typically as an enum stage field, so re-entry after a suspension is just
//! another call to [`Process::eval`].
//!
//! While it runs, a process sees the world through a [`ProcessContext`]: it
//! reads committed signal values, inspects which signal woke it, and enqueues
//! drivers that become visible only after the delta's commit phase.

use ripple_common::Value;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::signal::{Edge, Signal, SignalId, SignalTable};
use crate::time::SimTime;

/// Opaque ID for a process registered with a simulation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct ProcessId(u32);

impl ProcessId {
    /// Creates a `ProcessId` from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// How a process is scheduled when it is not suspended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessMode {
    /// Starts idle, then runs only when its wait condition is satisfied.
    Event,
    /// Re-evaluated every delta cycle (pure combinational logic).
    Continuous,
}

/// Scheduling state of a process, driven by the scheduler and by the
/// suspension requests the process returns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessState {
    /// Runs unconditionally in the next delta it is visited.
    Idle,
    /// Parked until simulation time reaches `wake`.
    WaitingTime {
        /// Absolute tick at which the process resumes.
        wake: u64,
    },
    /// Parked until one of `watched` changes. An empty list never wakes.
    WaitingEvent {
        /// Watched signals in wake-priority order.
        watched: Vec<SignalId>,
    },
    /// Parked until a 1-bit signal goes through `edge`. Other changes of the
    /// signal are ignored.
    WaitingEdge {
        /// The watched clock or strobe.
        signal: SignalId,
        /// The transition that wakes the process.
        edge: Edge,
    },
    /// Finished; never evaluated again.
    Done,
    /// Evaluated every delta cycle.
    Continuous,
}

impl ProcessState {
    /// Initial state for a process of the given mode.
    pub fn initial(mode: ProcessMode) -> Self {
        match mode {
            ProcessMode::Event => Self::Idle,
            ProcessMode::Continuous => Self::Continuous,
        }
    }
}

/// A suspension request returned by a process evaluation.
///
/// The wait primitives are `Wait`, `On` and `Finish`; `OnEdge` is `On`
/// restricted to one transition of a single-bit signal. `Yield` is not a
/// wait: it re-arms the process without parking it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Suspend {
    /// Resume after the given number of ticks.
    Wait(u64),
    /// Resume when any of the signals changes; earlier entries win ties.
    On(Vec<SignalId>),
    /// Resume when a 1-bit signal goes through the given edge.
    OnEdge(SignalId, Edge),
    /// Re-arm without waiting. A continuous process stays continuous and
    /// runs again next delta; an event process becomes idle. This is the
    /// only request a continuous process may return besides `Finish`.
    Yield,
    /// Terminate the process.
    Finish,
}

impl Suspend {
    /// Timed wait of `ticks`.
    pub fn wait(ticks: u64) -> Self {
        Self::Wait(ticks)
    }

    /// Wait on a single signal.
    pub fn on(signal: SignalId) -> Self {
        Self::On(vec![signal])
    }

    /// Wait for the next rising edge of a 1-bit signal.
    pub fn posedge(signal: SignalId) -> Self {
        Self::OnEdge(signal, Edge::Posedge)
    }

    /// Wait for the next falling edge of a 1-bit signal.
    pub fn negedge(signal: SignalId) -> Self {
        Self::OnEdge(signal, Edge::Negedge)
    }

    /// Wait on a set of signals, keeping first-occurrence order.
    pub fn on_any(signals: impl IntoIterator<Item = SignalId>) -> Self {
        let mut watched: Vec<SignalId> = Vec::new();
        for s in signals {
            if !watched.contains(&s) {
                watched.push(s);
            }
        }
        Self::On(watched)
    }
}

/// A unit of sequential behavior driven by the scheduler.
pub trait Process {
    /// Runs from the current resumption point to the next suspension.
    fn eval(&mut self, ctx: &mut ProcessContext<'_>) -> Result<Suspend, SimError>;
}

impl<F> Process for F
where
    F: FnMut(&mut ProcessContext<'_>) -> Result<Suspend, SimError>,
{
    fn eval(&mut self, ctx: &mut ProcessContext<'_>) -> Result<Suspend, SimError> {
        self(ctx)
    }
}

/// Pins a closure to the [`Process`] signature so its argument type is inferred.
pub fn from_fn<F>(f: F) -> F
where
    F: FnMut(&mut ProcessContext<'_>) -> Result<Suspend, SimError>,
{
    f
}

/// Display lines and assertion failures produced by processes during a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transcript {
    /// Lines emitted through [`ProcessContext::display`].
    pub display: Vec<String>,
    /// Messages of failed [`ProcessContext::check`] calls.
    pub failures: Vec<String>,
}

/// The view a process has of the simulation while it is being evaluated.
pub struct ProcessContext<'a> {
    name: &'a str,
    now: SimTime,
    trigger: Option<SignalId>,
    signals: &'a mut SignalTable,
    transcript: &'a mut Transcript,
}

impl<'a> ProcessContext<'a> {
    pub(crate) fn new(
        name: &'a str,
        now: SimTime,
        trigger: Option<SignalId>,
        signals: &'a mut SignalTable,
        transcript: &'a mut Transcript,
    ) -> Self {
        Self {
            name,
            now,
            trigger,
            signals,
            transcript,
        }
    }

    /// Current simulation tick.
    pub fn time(&self) -> u64 {
        self.now.tick
    }

    /// Current tick and delta cycle.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Name of the running process.
    pub fn name(&self) -> &str {
        self.name
    }

    /// The watched signal that woke this process, if it was woken by an event.
    pub fn trigger(&self) -> Option<SignalId> {
        self.trigger
    }

    /// Returns a registered signal.
    pub fn signal(&self, id: SignalId) -> Result<&Signal, SimError> {
        self.signals.get(id)
    }

    /// Returns a signal's committed value.
    pub fn value(&self, id: SignalId) -> Result<Value, SimError> {
        Ok(self.signals.get(id)?.value())
    }

    /// Returns true if the signal changed in the commit that preceded this delta.
    pub fn changed(&self, id: SignalId) -> Result<bool, SimError> {
        Ok(self.signals.get(id)?.changed())
    }

    /// Returns true on a 0 -> 1 transition of a 1-bit signal in the last commit.
    pub fn pos_edge(&self, id: SignalId) -> Result<bool, SimError> {
        Ok(self.signals.get(id)?.pos_edge()?)
    }

    /// Returns true on a 1 -> 0 transition of a 1-bit signal in the last commit.
    pub fn neg_edge(&self, id: SignalId) -> Result<bool, SimError> {
        Ok(self.signals.get(id)?.neg_edge()?)
    }

    /// Requests a new value for a signal, visible after this delta's commit.
    ///
    /// Assigning the value the signal already holds is a no-op.
    pub fn assign(&mut self, id: SignalId, value: impl Into<Value>) -> Result<(), SimError> {
        let value = value.into();
        tracing::trace!(
            time = %self.now,
            process = self.name,
            signal = id.as_raw(),
            %value,
            "assign"
        );
        self.signals.drive(id, value)
    }

    /// Emits a display line (the `$display` of HDL testbenches).
    pub fn display(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::info!(time = %self.now, process = self.name, "{msg}");
        self.transcript.display.push(msg);
    }

    /// Records an assertion failure if `cond` is false; the run continues.
    pub fn check(&mut self, cond: bool, msg: impl Into<String>) {
        if !cond {
            let msg = format!("{} at {}: {}", self.name, self.now, msg.into());
            tracing::warn!("assertion failed: {msg}");
            self.transcript.failures.push(msg);
        }
    }

    /// Builds a fatal error attributed to this process.
    pub fn fail(&self, reason: impl Into<String>) -> SimError {
        SimError::ProcessFailed {
            process: self.name.to_string(),
            time: self.now,
            reason: reason.into(),
        }
    }
}
