//! The delta-cycle scheduler.
//!
//! [`Simulation`] owns every signal and process of a model together with the
//! current time. A [`step`](Simulation::step) runs delta cycles at the current
//! time until no signal changes, then jumps to the earliest pending timed wait.
//! [`run`](Simulation::run) repeats steps until a target time is reached or no
//! process is waiting on time any more, notifying a [`Tracer`] after the
//! initial values and after every step.

use ripple_common::{Value, ValueError};

use crate::error::SimError;
use crate::process::{Process, ProcessContext, ProcessId, ProcessMode, ProcessState, Suspend, Transcript};
use crate::signal::{check_edge, Signal, SignalId, SignalTable};
use crate::time::SimTime;
use crate::waveform::Tracer;

/// Default bound on delta cycles at a single time value.
pub const DEFAULT_MAX_DELTAS: u32 = 10_000;

/// A registered process with its scheduling bookkeeping.
struct SimProcess {
    /// Diagnostic name.
    name: String,
    /// Event-driven or continuous.
    mode: ProcessMode,
    /// Current scheduling state.
    state: ProcessState,
    /// Watched signal that caused the most recent wake, if any.
    trigger: Option<SignalId>,
    /// How many times the body has been evaluated.
    evaluations: u64,
    /// The resumable body.
    body: Box<dyn Process>,
}

/// Why a run returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Current time reached the requested target.
    TargetReached,
    /// No process is waiting on time; the model is quiescent.
    NoMoreEvents,
}

/// The outcome of a single [`Simulation::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    /// The tick at which the delta cycles ran.
    pub time: u64,
    /// Delta cycles executed in this step.
    pub deltas: u32,
    /// The tick time advanced to, or `None` if no process waits on time.
    pub next_event: Option<u64>,
}

/// The result of a completed run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Simulation time when the run ended.
    pub final_time: u64,
    /// Why the run ended.
    pub stop: StopReason,
    /// Steps executed over the lifetime of the simulation.
    pub steps: u64,
    /// Delta cycles executed over the lifetime of the simulation.
    pub total_deltas: u64,
    /// All display output collected so far.
    pub display_output: Vec<String>,
    /// Assertion failure messages collected so far.
    pub assertion_failures: Vec<String>,
}

impl RunResult {
    /// Returns true if no assertion failed.
    pub fn passed(&self) -> bool {
        self.assertion_failures.is_empty()
    }
}

/// A simulation model and the scheduler that drives it.
///
/// Setup is an explicit call sequence: [`add_signal`](Self::add_signal),
/// optionally [`set_initial`](Self::set_initial), then
/// [`add_process`](Self::add_process) for each process in the order they
/// should be evaluated within a delta cycle.
pub struct Simulation {
    /// Current tick and the delta cycles already run at it, across steps.
    time: SimTime,
    /// Maximum delta cycles per time value.
    max_deltas: u32,
    /// All signals plus the pending set.
    signals: SignalTable,
    /// All processes in registration order.
    processes: Vec<SimProcess>,
    /// Optional tracer notified by [`run`](Self::run).
    tracer: Option<Box<dyn Tracer>>,
    /// Display lines and assertion failures.
    transcript: Transcript,
    /// Steps executed.
    steps: u64,
    /// Delta cycles executed.
    total_deltas: u64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    /// Creates an empty simulation at tick zero.
    pub fn new() -> Self {
        Self {
            time: SimTime::zero(),
            max_deltas: DEFAULT_MAX_DELTAS,
            signals: SignalTable::new(),
            processes: Vec::new(),
            tracer: None,
            transcript: Transcript::default(),
            steps: 0,
            total_deltas: 0,
        }
    }

    /// Registers a zero-initialized signal.
    pub fn add_signal(&mut self, name: impl Into<String>, width: u32) -> Result<SignalId, SimError> {
        let signal = Signal::new(name, width)?;
        Ok(self.signals.alloc(signal))
    }

    /// Sets a signal's starting value. Not reported as a change.
    pub fn set_initial(&mut self, id: SignalId, value: impl Into<Value>) -> Result<(), SimError> {
        self.signals.set_initial(id, value.into())
    }

    /// Registers a process. Processes run in registration order within a delta.
    pub fn add_process(
        &mut self,
        name: impl Into<String>,
        mode: ProcessMode,
        body: impl Process + 'static,
    ) -> ProcessId {
        let id = ProcessId::from_raw(self.processes.len() as u32);
        let name = name.into();
        tracing::debug!(process = %name, ?mode, "register process");
        self.processes.push(SimProcess {
            name,
            mode,
            state: ProcessState::initial(mode),
            trigger: None,
            evaluations: 0,
            body: Box::new(body),
        });
        id
    }

    /// Attaches a tracer that [`run`](Self::run) notifies.
    pub fn set_tracer(&mut self, tracer: Box<dyn Tracer>) {
        self.tracer = Some(tracer);
    }

    /// Sets the maximum number of delta cycles per time value.
    pub fn set_max_deltas(&mut self, max: u32) {
        self.max_deltas = max;
    }

    /// Returns the current simulation tick.
    pub fn current_time(&self) -> u64 {
        self.time.tick
    }

    /// Returns the current tick and the number of delta cycles run at it.
    pub fn now(&self) -> SimTime {
        self.time
    }

    /// Returns a signal's committed value.
    pub fn value(&self, id: SignalId) -> Result<Value, SimError> {
        Ok(self.signals.get(id)?.value())
    }

    /// Returns a registered signal.
    pub fn signal(&self, id: SignalId) -> Result<&Signal, SimError> {
        self.signals.get(id)
    }

    /// Finds a signal by name.
    pub fn find_signal(&self, name: &str) -> Option<SignalId> {
        self.signals.find(name)
    }

    /// Returns the signal registry.
    pub fn signals(&self) -> &SignalTable {
        &self.signals
    }

    /// Returns the number of registered signals.
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Returns the number of registered processes.
    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    fn process(&self, id: ProcessId) -> Result<&SimProcess, SimError> {
        self.processes
            .get(id.as_raw() as usize)
            .ok_or(SimError::UnknownProcess(id.as_raw()))
    }

    /// Returns a process's scheduling state.
    pub fn process_state(&self, id: ProcessId) -> Result<&ProcessState, SimError> {
        Ok(&self.process(id)?.state)
    }

    /// Returns how many times a process body has been evaluated.
    pub fn process_evaluations(&self, id: ProcessId) -> Result<u64, SimError> {
        Ok(self.process(id)?.evaluations)
    }

    /// Returns the watched signal that last woke a process.
    pub fn process_trigger(&self, id: ProcessId) -> Result<Option<SignalId>, SimError> {
        Ok(self.process(id)?.trigger)
    }

    /// Returns the display lines and assertion failures collected so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Runs delta cycles at the current time until stable, then advances time.
    ///
    /// When no process waits on time the step reports `next_event: None` and
    /// time stays where it is.
    pub fn step(&mut self) -> Result<StepResult, SimError> {
        let tick = self.time.tick;
        let mut deltas = 0u32;
        let mut changed: Vec<SignalId> = Vec::new();

        loop {
            let now = self.time;
            self.time = now.next_delta();
            if self.time.delta > self.max_deltas {
                return Err(SimError::DeltaCycleLimit {
                    time: now,
                    max_deltas: self.max_deltas,
                });
            }
            deltas += 1;
            self.total_deltas += 1;

            self.evaluate_processes(now)?;
            // The evaluation above has seen the previous commit's changes.
            self.signals.clear_changed(&changed);
            changed = self.signals.commit();
            if changed.is_empty() {
                break;
            }
        }
        self.steps += 1;

        let next_event = self
            .processes
            .iter()
            .filter_map(|p| match p.state {
                ProcessState::WaitingTime { wake } => Some(wake),
                _ => None,
            })
            .min();

        match next_event {
            Some(next) => {
                // A zero wait keeps counting deltas against the same tick.
                if next > tick {
                    self.time = self.time.advance_to(next);
                }
                tracing::debug!(time = tick, deltas, next, "step");
            }
            None => tracing::debug!(time = tick, deltas, "step; no more events"),
        }

        Ok(StepResult {
            time: tick,
            deltas,
            next_event,
        })
    }

    /// Evaluates every eligible process once, in registration order.
    fn evaluate_processes(&mut self, now: SimTime) -> Result<(), SimError> {
        let Self {
            processes,
            signals,
            transcript,
            ..
        } = self;

        for proc in processes.iter_mut() {
            let runnable = match &proc.state {
                ProcessState::Idle | ProcessState::Continuous => true,
                ProcessState::Done => false,
                ProcessState::WaitingTime { wake } => {
                    if *wake == now.tick {
                        proc.trigger = None;
                        proc.state = ProcessState::Idle;
                        true
                    } else {
                        false
                    }
                }
                ProcessState::WaitingEvent { watched } => {
                    let hit = watched
                        .iter()
                        .copied()
                        .find(|&id| signals.get(id).is_ok_and(Signal::changed));
                    match hit {
                        Some(id) => {
                            proc.trigger = Some(id);
                            proc.state = ProcessState::Idle;
                            true
                        }
                        None => false,
                    }
                }
                ProcessState::WaitingEdge { signal, edge } => {
                    let (signal, edge) = (*signal, *edge);
                    let sig = signals.get(signal)?;
                    if check_edge(sig.previous(), sig.value(), edge)? {
                        proc.trigger = Some(signal);
                        proc.state = ProcessState::Idle;
                        true
                    } else {
                        false
                    }
                }
            };
            if !runnable {
                continue;
            }

            tracing::trace!(time = %now, process = %proc.name, "resume");
            proc.evaluations += 1;
            let mut ctx = ProcessContext::new(&proc.name, now, proc.trigger, signals, transcript);
            let request = proc.body.eval(&mut ctx)?;
            proc.state = resolve_suspend(&proc.name, proc.mode, now.tick, request, signals)?;
        }
        Ok(())
    }

    /// Runs until `until` is reached or no more events exist, notifying the
    /// attached tracer.
    pub fn run(&mut self, until: u64) -> Result<RunResult, SimError> {
        let mut tracer = self.tracer.take();
        let result = match tracer {
            Some(ref mut t) => self.run_traced(until, Some(&mut **t)),
            None => self.run_traced(until, None),
        };
        self.tracer = tracer;
        result
    }

    /// Like [`run`](Self::run), but notifies the given tracer instead of the
    /// attached one.
    pub fn run_with(&mut self, until: u64, tracer: &mut dyn Tracer) -> Result<RunResult, SimError> {
        self.run_traced(until, Some(tracer))
    }

    /// Runs until no process waits on time.
    ///
    /// A free-running clock keeps the model alive forever; bound such models
    /// with [`run`](Self::run).
    pub fn run_to_completion(&mut self) -> Result<RunResult, SimError> {
        self.run(u64::MAX)
    }

    fn run_traced(
        &mut self,
        until: u64,
        mut tracer: Option<&mut dyn Tracer>,
    ) -> Result<RunResult, SimError> {
        if let Some(t) = tracer.as_deref_mut() {
            t.dump(self.time.tick, &self.signals)?;
        }

        let mut stop = StopReason::TargetReached;
        while self.time.tick < until {
            let step = self.step()?;
            if let Some(t) = tracer.as_deref_mut() {
                t.dump(step.time, &self.signals)?;
            }
            if step.next_event.is_none() {
                stop = StopReason::NoMoreEvents;
                break;
            }
        }

        if let Some(t) = tracer {
            t.finalize()?;
        }

        tracing::info!(
            time = self.time.tick,
            steps = self.steps,
            deltas = self.total_deltas,
            ?stop,
            "run finished"
        );

        Ok(RunResult {
            final_time: self.time.tick,
            stop,
            steps: self.steps,
            total_deltas: self.total_deltas,
            display_output: self.transcript.display.clone(),
            assertion_failures: self.transcript.failures.clone(),
        })
    }
}

/// Maps a suspension request to the process's next state.
fn resolve_suspend(
    process: &str,
    mode: ProcessMode,
    tick: u64,
    request: Suspend,
    signals: &SignalTable,
) -> Result<ProcessState, SimError> {
    match (mode, request) {
        (_, Suspend::Finish) => Ok(ProcessState::Done),
        (ProcessMode::Continuous, Suspend::Yield) => Ok(ProcessState::Continuous),
        (ProcessMode::Continuous, _) => Err(SimError::ContinuousWait {
            process: process.to_string(),
        }),
        (ProcessMode::Event, Suspend::Yield) => Ok(ProcessState::Idle),
        (ProcessMode::Event, Suspend::Wait(duration)) => tick
            .checked_add(duration)
            .map(|wake| ProcessState::WaitingTime { wake })
            .ok_or_else(|| SimError::TimeOverflow {
                process: process.to_string(),
                tick,
                duration,
            }),
        (ProcessMode::Event, Suspend::On(watched)) => {
            for &id in &watched {
                signals.get(id)?;
            }
            Ok(ProcessState::WaitingEvent { watched })
        }
        (ProcessMode::Event, Suspend::OnEdge(signal, edge)) => {
            let width = signals.get(signal)?.width();
            if width != 1 {
                return Err(ValueError::NotSingleBit { width }.into());
            }
            Ok(ProcessState::WaitingEdge { signal, edge })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::from_fn;
    use crate::signal::Edge;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn add_clock(sim: &mut Simulation, period: u64) -> SignalId {
        let clk = sim.add_signal("clk", 1).unwrap();
        sim.add_process(
            "clock",
            ProcessMode::Event,
            from_fn(move |ctx| {
                let next = !ctx.value(clk)?;
                ctx.assign(clk, next)?;
                Ok(Suspend::wait(period))
            }),
        );
        clk
    }

    #[test]
    fn new_simulation_is_empty() {
        let sim = Simulation::new();
        assert_eq!(sim.current_time(), 0);
        assert_eq!(sim.signal_count(), 0);
        assert_eq!(sim.process_count(), 0);
    }

    #[test]
    fn add_signal_rejects_bad_width() {
        let mut sim = Simulation::new();
        assert!(matches!(sim.add_signal("x", 0), Err(SimError::Value(_))));
        assert!(matches!(sim.add_signal("x", 65), Err(SimError::Value(_))));
    }

    #[test]
    fn find_signal_by_name() {
        let mut sim = Simulation::new();
        let a = sim.add_signal("a", 1).unwrap();
        let b = sim.add_signal("b", 8).unwrap();
        assert_eq!(sim.find_signal("a"), Some(a));
        assert_eq!(sim.find_signal("b"), Some(b));
        assert_eq!(sim.find_signal("c"), None);
    }

    #[test]
    fn set_initial_is_resized_and_unchanged() {
        let mut sim = Simulation::new();
        let a = sim.add_signal("a", 4).unwrap();
        sim.set_initial(a, Value::from_int(0x1f)).unwrap();
        assert_eq!(sim.value(a).unwrap().as_u64(), 0xf);
        assert!(!sim.signal(a).unwrap().changed());
    }

    #[test]
    fn unknown_process_is_an_error() {
        let sim = Simulation::new();
        let ghost = ProcessId::from_raw(3);
        assert!(matches!(sim.process_state(ghost), Err(SimError::UnknownProcess(3))));
    }

    #[test]
    fn clock_toggles_every_period() {
        let mut sim = Simulation::new();
        let clk = add_clock(&mut sim, 10);

        let step = sim.step().unwrap();
        assert_eq!(step.time, 0);
        assert_eq!(step.next_event, Some(10));
        assert_eq!(sim.value(clk).unwrap(), Value::from_bool(true));
        assert_eq!(sim.current_time(), 10);

        sim.step().unwrap();
        assert_eq!(sim.value(clk).unwrap(), Value::from_bool(false));
        assert_eq!(sim.current_time(), 20);
    }

    #[test]
    fn run_stops_at_target() {
        let mut sim = Simulation::new();
        let clk = add_clock(&mut sim, 10);
        let result = sim.run(100).unwrap();
        assert_eq!(result.stop, StopReason::TargetReached);
        assert_eq!(result.final_time, 100);
        assert_eq!(result.steps, 10);
        assert_eq!(sim.value(clk).unwrap(), Value::from_bool(false));
    }

    #[test]
    fn run_already_at_target_does_nothing() {
        let mut sim = Simulation::new();
        add_clock(&mut sim, 10);
        let result = sim.run(0).unwrap();
        assert_eq!(result.steps, 0);
        assert_eq!(result.stop, StopReason::TargetReached);
    }

    #[test]
    fn no_more_events_stops_run() {
        let mut sim = Simulation::new();
        let a = sim.add_signal("a", 1).unwrap();
        let p = sim.add_process(
            "once",
            ProcessMode::Event,
            from_fn(move |ctx| {
                ctx.assign(a, true)?;
                Ok(Suspend::Finish)
            }),
        );
        let result = sim.run(1_000).unwrap();
        assert_eq!(result.stop, StopReason::NoMoreEvents);
        assert_eq!(result.final_time, 0);
        assert_eq!(result.steps, 1);
        assert_eq!(sim.process_state(p).unwrap(), &ProcessState::Done);
        assert_eq!(sim.value(a).unwrap(), Value::from_bool(true));
    }

    #[test]
    fn time_jumps_to_earliest_wake() {
        let mut sim = Simulation::new();
        for (name, d) in [("slow", 70u64), ("fast", 30)] {
            let mut first = true;
            sim.add_process(
                name,
                ProcessMode::Event,
                from_fn(move |_| {
                    if first {
                        first = false;
                        Ok(Suspend::wait(d))
                    } else {
                        Ok(Suspend::Finish)
                    }
                }),
            );
        }
        assert_eq!(sim.step().unwrap().next_event, Some(30));
        assert_eq!(sim.step().unwrap().next_event, Some(70));
        assert_eq!(sim.step().unwrap().next_event, None);
        assert_eq!(sim.current_time(), 70);
    }

    #[test]
    fn processes_see_pre_commit_values() {
        // Swap through non-blocking assignment.
        let mut sim = Simulation::new();
        let a = sim.add_signal("a", 8).unwrap();
        let b = sim.add_signal("b", 8).unwrap();
        sim.set_initial(a, Value::new(8, 1)).unwrap();
        sim.set_initial(b, Value::new(8, 2)).unwrap();
        sim.add_process(
            "a_from_b",
            ProcessMode::Event,
            from_fn(move |ctx| {
                let v = ctx.value(b)?;
                ctx.assign(a, v)?;
                Ok(Suspend::Finish)
            }),
        );
        sim.add_process(
            "b_from_a",
            ProcessMode::Event,
            from_fn(move |ctx| {
                let v = ctx.value(a)?;
                ctx.assign(b, v)?;
                Ok(Suspend::Finish)
            }),
        );
        sim.step().unwrap();
        assert_eq!(sim.value(a).unwrap().as_u64(), 2);
        assert_eq!(sim.value(b).unwrap().as_u64(), 1);
    }

    #[test]
    fn last_registered_driver_wins() {
        let mut sim = Simulation::new();
        let bus = sim.add_signal("bus", 8).unwrap();
        for v in [3u64, 9] {
            sim.add_process(
                format!("drive{v}"),
                ProcessMode::Event,
                from_fn(move |ctx| {
                    ctx.assign(bus, Value::new(8, v))?;
                    Ok(Suspend::Finish)
                }),
            );
        }
        sim.step().unwrap();
        assert_eq!(sim.value(bus).unwrap().as_u64(), 9);
    }

    #[test]
    fn event_wait_wakes_on_change_with_trigger() {
        let mut sim = Simulation::new();
        let a = sim.add_signal("a", 1).unwrap();
        let b = sim.add_signal("b", 1).unwrap();
        let woke = Rc::new(Cell::new(0u32));
        let seen = woke.clone();
        let mut armed = false;
        let watcher = sim.add_process(
            "watcher",
            ProcessMode::Event,
            from_fn(move |_| {
                if armed {
                    seen.set(seen.get() + 1);
                }
                armed = true;
                Ok(Suspend::on_any([a, b]))
            }),
        );
        let mut fired = false;
        sim.add_process(
            "driver",
            ProcessMode::Event,
            from_fn(move |ctx| {
                if fired {
                    return Ok(Suspend::Finish);
                }
                fired = true;
                ctx.assign(b, true)?;
                ctx.assign(a, true)?;
                Ok(Suspend::wait(5))
            }),
        );
        sim.step().unwrap();
        assert_eq!(woke.get(), 1);
        // Both changed; the first watched one is the trigger.
        assert_eq!(sim.process_trigger(watcher).unwrap(), Some(a));
        assert!(matches!(
            sim.process_state(watcher).unwrap(),
            ProcessState::WaitingEvent { .. }
        ));
    }

    #[test]
    fn empty_watch_list_never_wakes() {
        let mut sim = Simulation::new();
        add_clock(&mut sim, 5);
        let p = sim.add_process(
            "sleeper",
            ProcessMode::Event,
            from_fn(|_| Ok(Suspend::On(Vec::new()))),
        );
        sim.run(50).unwrap();
        assert_eq!(sim.process_evaluations(p).unwrap(), 1);
    }

    fn edge_waiter(
        sim: &mut Simulation,
        clk: SignalId,
        request: Suspend,
    ) -> (ProcessId, Rc<RefCell<Vec<u64>>>) {
        let wakes = Rc::new(RefCell::new(Vec::new()));
        let seen = wakes.clone();
        let p = sim.add_process(
            "waiter",
            ProcessMode::Event,
            from_fn(move |ctx| {
                if ctx.trigger() == Some(clk) {
                    seen.borrow_mut().push(ctx.time());
                }
                Ok(request.clone())
            }),
        );
        (p, wakes)
    }

    #[test]
    fn posedge_wait_ignores_falling_edges() {
        let mut sim = Simulation::new();
        let clk = add_clock(&mut sim, 10);
        let (p, wakes) = edge_waiter(&mut sim, clk, Suspend::posedge(clk));
        sim.run(100).unwrap();
        assert_eq!(*wakes.borrow(), vec![0, 20, 40, 60, 80]);
        // One initial evaluation plus one per rising edge.
        assert_eq!(sim.process_evaluations(p).unwrap(), 6);
        assert_eq!(
            sim.process_state(p).unwrap(),
            &ProcessState::WaitingEdge {
                signal: clk,
                edge: Edge::Posedge
            }
        );
    }

    #[test]
    fn negedge_wait_ignores_rising_edges() {
        let mut sim = Simulation::new();
        let clk = add_clock(&mut sim, 10);
        let (_, wakes) = edge_waiter(&mut sim, clk, Suspend::negedge(clk));
        sim.run(100).unwrap();
        assert_eq!(*wakes.borrow(), vec![10, 30, 50, 70, 90]);
    }

    #[test]
    fn edge_wait_on_bus_is_rejected() {
        let mut sim = Simulation::new();
        let bus = sim.add_signal("bus", 4).unwrap();
        sim.add_process(
            "bad",
            ProcessMode::Event,
            from_fn(move |_| Ok(Suspend::posedge(bus))),
        );
        assert!(matches!(
            sim.step(),
            Err(SimError::Value(ValueError::NotSingleBit { width: 4 }))
        ));
    }

    #[test]
    fn continuous_edge_wait_is_rejected() {
        let mut sim = Simulation::new();
        let clk = sim.add_signal("clk", 1).unwrap();
        sim.add_process(
            "comb",
            ProcessMode::Continuous,
            from_fn(move |_| Ok(Suspend::posedge(clk))),
        );
        assert!(matches!(sim.step(), Err(SimError::ContinuousWait { .. })));
    }

    #[test]
    fn now_counts_deltas_until_time_advances() {
        let mut sim = Simulation::new();
        let mut n = 0u32;
        sim.add_process(
            "spin",
            ProcessMode::Event,
            from_fn(move |_| {
                n += 1;
                Ok(if n < 3 { Suspend::wait(0) } else { Suspend::wait(10) })
            }),
        );
        let first = sim.step().unwrap();
        assert_eq!(first.next_event, Some(0));
        assert_eq!(sim.now(), SimTime { tick: 0, delta: 1 });
        sim.step().unwrap();
        assert_eq!(sim.now(), SimTime { tick: 0, delta: 2 });
        sim.step().unwrap();
        assert_eq!(sim.now(), SimTime::at(10));
    }

    #[test]
    fn finished_process_is_never_evaluated_again() {
        let mut sim = Simulation::new();
        add_clock(&mut sim, 10);
        let p = sim.add_process("done", ProcessMode::Event, from_fn(|_| Ok(Suspend::Finish)));
        sim.run(200).unwrap();
        assert_eq!(sim.process_evaluations(p).unwrap(), 1);
        assert_eq!(sim.process_state(p).unwrap(), &ProcessState::Done);
    }

    #[test]
    fn continuous_runs_every_delta() {
        let mut sim = Simulation::new();
        let a = sim.add_signal("a", 4).unwrap();
        let b = sim.add_signal("b", 4).unwrap();
        sim.add_process(
            "stim",
            ProcessMode::Event,
            from_fn(move |ctx| {
                ctx.assign(a, Value::new(4, 5))?;
                Ok(Suspend::Finish)
            }),
        );
        let comb = sim.add_process(
            "comb",
            ProcessMode::Continuous,
            from_fn(move |ctx| {
                let v = ctx.value(a)? + Value::new(4, 1);
                ctx.assign(b, v)?;
                Ok(Suspend::Yield)
            }),
        );
        let watcher = sim.add_process(
            "watch_b",
            ProcessMode::Event,
            from_fn(move |_| Ok(Suspend::on(b))),
        );
        let step = sim.step().unwrap();
        // d0: a, b commit; d1: b follows a; d2: stable.
        assert_eq!(step.deltas, 3);
        assert_eq!(sim.process_evaluations(comb).unwrap(), 3);
        assert_eq!(sim.process_evaluations(watcher).unwrap(), 3);
        assert_eq!(sim.value(b).unwrap().as_u64(), 6);
        assert_eq!(sim.process_state(comb).unwrap(), &ProcessState::Continuous);
    }

    #[test]
    fn event_process_does_not_rerun_without_change() {
        let mut sim = Simulation::new();
        let a = sim.add_signal("a", 1).unwrap();
        let p = sim.add_process("idle", ProcessMode::Event, from_fn(move |_| Ok(Suspend::on(a))));
        let comb = sim.add_process("comb", ProcessMode::Continuous, from_fn(|_| Ok(Suspend::Yield)));
        sim.step().unwrap();
        sim.step().unwrap();
        assert_eq!(sim.process_evaluations(p).unwrap(), 1);
        assert_eq!(sim.process_evaluations(comb).unwrap(), 2);
    }

    #[test]
    fn continuous_wait_is_rejected() {
        let mut sim = Simulation::new();
        sim.add_process("comb", ProcessMode::Continuous, from_fn(|_| Ok(Suspend::wait(1))));
        let err = sim.step().unwrap_err();
        assert!(matches!(err, SimError::ContinuousWait { process } if process == "comb"));
    }

    #[test]
    fn waiting_on_unknown_signal_is_rejected() {
        let mut sim = Simulation::new();
        sim.add_process(
            "bad",
            ProcessMode::Event,
            from_fn(|_| Ok(Suspend::on(SignalId::from_raw(42)))),
        );
        assert!(matches!(sim.step(), Err(SimError::UnknownSignal(42))));
    }

    #[test]
    fn wake_time_overflow_is_rejected() {
        let mut sim = Simulation::new();
        let mut first = true;
        sim.add_process(
            "far",
            ProcessMode::Event,
            from_fn(move |_| {
                let d = if first { 10 } else { u64::MAX };
                first = false;
                Ok(Suspend::wait(d))
            }),
        );
        sim.step().unwrap();
        assert!(matches!(sim.step(), Err(SimError::TimeOverflow { tick: 10, .. })));
    }

    #[test]
    fn combinational_loop_hits_delta_limit() {
        let mut sim = Simulation::new();
        sim.set_max_deltas(50);
        let a = sim.add_signal("a", 1).unwrap();
        sim.add_process(
            "osc",
            ProcessMode::Continuous,
            from_fn(move |ctx| {
                let v = !ctx.value(a)?;
                ctx.assign(a, v)?;
                Ok(Suspend::Yield)
            }),
        );
        let err = sim.step().unwrap_err();
        assert!(matches!(
            err,
            SimError::DeltaCycleLimit { time, max_deltas: 50 } if time.tick == 0 && time.delta == 50
        ));
    }

    #[test]
    fn zero_wait_resumes_at_same_time() {
        let mut sim = Simulation::new();
        let count = sim.add_signal("count", 8).unwrap();
        let mut n = 0u64;
        sim.add_process(
            "spin",
            ProcessMode::Event,
            from_fn(move |ctx| {
                n += 1;
                if n > 3 {
                    ctx.assign(count, Value::new(8, n))?;
                    return Ok(Suspend::Finish);
                }
                Ok(Suspend::wait(0))
            }),
        );
        let result = sim.run(10).unwrap();
        assert_eq!(result.final_time, 0);
        assert_eq!(result.stop, StopReason::NoMoreEvents);
        assert_eq!(sim.value(count).unwrap().as_u64(), 4);
    }

    #[test]
    fn zero_wait_loop_hits_delta_limit() {
        let mut sim = Simulation::new();
        sim.set_max_deltas(20);
        sim.add_process("spin", ProcessMode::Event, from_fn(|_| Ok(Suspend::wait(0))));
        assert!(matches!(
            sim.run(10),
            Err(SimError::DeltaCycleLimit { max_deltas: 20, .. })
        ));
    }

    #[test]
    fn process_failure_propagates() {
        let mut sim = Simulation::new();
        sim.add_process("stim", ProcessMode::Event, from_fn(|ctx| Err(ctx.fail("bad stimulus"))));
        let err = sim.run(10).unwrap_err();
        assert_eq!(err.to_string(), "process 'stim' failed at 0: bad stimulus");
    }

    #[test]
    fn display_and_assertions_reach_run_result() {
        let mut sim = Simulation::new();
        sim.add_process(
            "tb",
            ProcessMode::Event,
            from_fn(|ctx| {
                ctx.display("hello");
                ctx.check(false, "expected failure");
                Ok(Suspend::Finish)
            }),
        );
        let result = sim.run(10).unwrap();
        assert_eq!(result.display_output, vec!["hello".to_string()]);
        assert_eq!(result.assertion_failures.len(), 1);
        assert!(!result.passed());
    }

    #[test]
    fn total_deltas_accumulate() {
        let mut sim = Simulation::new();
        add_clock(&mut sim, 10);
        let result = sim.run(30).unwrap();
        // Each step: one delta toggles, one delta settles.
        assert_eq!(result.total_deltas, 6);
        assert_eq!(sim.now(), SimTime { tick: 30, delta: 0 });
    }
}
