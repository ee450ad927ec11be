//! Free-running clock generator.

use ripple_sim::{Process, ProcessContext, SignalId, SimError, Suspend};

/// Inverts a 1-bit signal, then sleeps for `half_period` ticks, forever.
///
/// Starting from 0 the first rising edge happens at tick 0.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    signal: SignalId,
    half_period: u64,
}

impl Clock {
    /// Creates a generator driving `signal`.
    pub fn new(signal: SignalId, half_period: u64) -> Self {
        Self {
            signal,
            half_period,
        }
    }
}

impl Process for Clock {
    fn eval(&mut self, ctx: &mut ProcessContext<'_>) -> Result<Suspend, SimError> {
        let next = !ctx.value(self.signal)?;
        ctx.assign(self.signal, next)?;
        Ok(Suspend::wait(self.half_period))
    }
}
