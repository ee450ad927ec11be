//! Clock and rising-edge counter.
//!
//! The smallest model that exercises timed waits, event waits, edge
//! detection, and wrap-around arithmetic together: `clk` toggles every
//! `period` ticks and `counter` increments once per rising edge.

use ripple_sim::{
    Process, ProcessContext, ProcessMode, SignalId, SimError, Simulation, Suspend, Value,
};

use crate::clock::Clock;

/// Parameters of the counter model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterParams {
    /// Ticks between clock toggles.
    pub period: u64,
    /// Counter width in bits; the count wraps at `2^width`.
    pub width: u32,
}

impl Default for CounterParams {
    fn default() -> Self {
        Self {
            period: 10,
            width: 8,
        }
    }
}

/// Handles of the counter model's signals.
#[derive(Clone, Copy, Debug)]
pub struct CounterSignals {
    /// The clock.
    pub clk: SignalId,
    /// The count.
    pub counter: SignalId,
}

/// Increments `counter` on every rising edge of `clk`.
struct EdgeCounter {
    signals: CounterSignals,
}

impl Process for EdgeCounter {
    fn eval(&mut self, ctx: &mut ProcessContext<'_>) -> Result<Suspend, SimError> {
        let CounterSignals { clk, counter } = self.signals;
        if ctx.trigger() == Some(clk) {
            let current = ctx.value(counter)?;
            ctx.assign(counter, current + Value::new(current.width(), 1))?;
        }
        Ok(Suspend::posedge(clk))
    }
}

/// Adds the counter model to `sim`.
pub fn build(sim: &mut Simulation, params: &CounterParams) -> Result<CounterSignals, SimError> {
    let clk = sim.add_signal("clk", 1)?;
    let counter = sim.add_signal("counter", params.width)?;
    let signals = CounterSignals { clk, counter };

    sim.add_process("clock_gen", ProcessMode::Event, Clock::new(clk, params.period));
    sim.add_process("counter", ProcessMode::Event, EdgeCounter { signals });
    tracing::debug!(period = params.period, width = params.width, "built counter model");
    Ok(signals)
}

/// Rising edges of a clock started at 0 and toggled every `period` ticks,
/// counted over a run to `until`.
///
/// A zero period never leaves tick 0 (the run ends in a delta-cycle limit
/// error), so no count is expected and this returns 0.
pub fn expected_count(params: &CounterParams, until: u64) -> u64 {
    if params.period == 0 {
        return 0;
    }
    // Toggles at 0, period, 2*period, ... strictly before `until`; every
    // other one rises, starting with the first.
    let toggles = until.div_ceil(params.period);
    toggles.div_ceil(2)
}
