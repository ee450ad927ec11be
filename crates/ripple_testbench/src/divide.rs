//! Iterative 32-bit restoring divider (Patterson and Hennessy).
//!
//! The divider takes 32 clock cycles per division. On a rising edge with
//! `start` high and no division in flight it loads the operand magnitudes:
//! the dividend into the low half of a 64-bit register and the divider into
//! bits 62..31 of another. Each following rising edge subtracts, shifts the
//! divider right by one, and shifts one quotient bit in. With `sign` set the
//! operands are two's complement and the outputs are negated when the
//! operand signs differ.
//!
//! The remainder and `ready` are combinational and modeled by a continuous
//! process. A stimulus process applies the operands after three clock
//! cycles, waits for `ready`, then displays and checks the results.

use ripple_sim::{
    from_fn, Process, ProcessContext, ProcessMode, SignalId, SimError, Simulation, Suspend, Value,
};

use crate::clock::Clock;

/// Half period of the divider clock.
const HALF_PERIOD: u64 = 10;

/// Rising edges the stimulus lets pass before applying operands.
const SETTLE_EDGES: u32 = 3;

/// Parameters of the divider model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DivideParams {
    /// Dividend; truncated to 32 bits.
    pub dividend: i64,
    /// Divider; truncated to 32 bits. Zero produces an all-ones quotient.
    pub divider: i64,
    /// Two's-complement operands and results.
    pub signed: bool,
}

impl Default for DivideParams {
    fn default() -> Self {
        Self {
            dividend: 1000,
            divider: 23,
            signed: false,
        }
    }
}

impl DivideParams {
    /// The quotient and remainder the hardware produces.
    ///
    /// The quotient truncates toward zero. The remainder has the magnitude of
    /// `|dividend| % |divider|` and is negative exactly when the quotient's
    /// sign is, so `1000 / -23` leaves `-11`. A zero divider yields an
    /// all-ones quotient magnitude and the dividend as remainder.
    pub fn expected(&self) -> (i64, i64) {
        let a = Value::from_signed(self.dividend, 32);
        let b = Value::from_signed(self.divider, 32);
        let negative = self.signed && a.msb() != b.msb();
        let magnitude = |v: Value| {
            if self.signed && v.msb() {
                negate(v).as_u64()
            } else {
                v.as_u64()
            }
        };
        let (qa, qb) = (magnitude(a), magnitude(b));
        let (q, r) = match qb {
            0 => (u64::from(u32::MAX), qa),
            _ => (qa / qb, qa % qb),
        };
        let output = |m: u64| {
            let v = Value::new(32, m);
            self.read(if negative { negate(v) } else { v })
        };
        (output(q), output(r))
    }

    /// Reinterprets a raw operand as the 32-bit value the hardware sees.
    fn operand(&self, raw: i64) -> i64 {
        let v = Value::from_signed(raw, 32);
        if self.signed {
            v.as_i64()
        } else {
            v.as_u64() as i64
        }
    }

    /// Renders a 32-bit output register the way the stimulus reports it.
    fn read(&self, v: Value) -> i64 {
        if self.signed {
            v.as_i64()
        } else {
            v.as_u64() as i64
        }
    }
}

/// Handles of the divider model's signals.
#[derive(Clone, Copy, Debug)]
pub struct DivideSignals {
    /// Clock.
    pub clk: SignalId,
    /// Signed-mode select.
    pub sign: SignalId,
    /// 32-bit dividend input.
    pub dividend: SignalId,
    /// 32-bit divider input.
    pub divider: SignalId,
    /// 32-bit quotient output.
    pub quotient: SignalId,
    /// Unsigned quotient accumulator.
    pub quotient_temp: SignalId,
    /// 32-bit remainder output.
    pub remainder: SignalId,
    /// High when no division is in flight.
    pub ready: SignalId,
    /// Starts a division on the next rising edge.
    pub start: SignalId,
    /// 64-bit shifted divider.
    pub divider_copy: SignalId,
    /// 64-bit partial remainder.
    pub dividend_copy: SignalId,
    /// Outputs must be negated.
    pub negative_output: SignalId,
    /// Remaining iterations.
    pub bit: SignalId,
}

impl DivideSignals {
    fn register(sim: &mut Simulation) -> Result<Self, SimError> {
        Ok(Self {
            clk: sim.add_signal("clk", 1)?,
            sign: sim.add_signal("sign", 1)?,
            dividend: sim.add_signal("dividend", 32)?,
            divider: sim.add_signal("divider", 32)?,
            quotient: sim.add_signal("quotient", 32)?,
            quotient_temp: sim.add_signal("quotient_temp", 32)?,
            remainder: sim.add_signal("remainder", 32)?,
            ready: sim.add_signal("ready", 1)?,
            start: sim.add_signal("start", 1)?,
            divider_copy: sim.add_signal("divider_copy", 64)?,
            dividend_copy: sim.add_signal("dividend_copy", 64)?,
            negative_output: sim.add_signal("negative_output", 1)?,
            bit: sim.add_signal("bit", 6)?,
        })
    }
}

/// Two's-complement negation within the value's width.
fn negate(v: Value) -> Value {
    !v + Value::new(v.width(), 1)
}

/// The clocked datapath.
struct DividerCore {
    s: DivideSignals,
}

impl DividerCore {
    fn load(&self, ctx: &mut ProcessContext<'_>) -> Result<(), SimError> {
        let s = &self.s;
        let sign = ctx.value(s.sign)?.to_bool();
        let dividend = ctx.value(s.dividend)?;
        let divider = ctx.value(s.divider)?;
        let magnitude = |v: Value| if sign && v.msb() { negate(v) } else { v };

        let dividend_copy = Value::concat(Value::zero(32), magnitude(dividend))?;
        let divider_copy = Value::concat(
            Value::concat(Value::zero(1), magnitude(divider))?,
            Value::zero(31),
        )?;

        ctx.assign(s.bit, Value::new(6, 32))?;
        ctx.assign(s.quotient, Value::zero(32))?;
        ctx.assign(s.quotient_temp, Value::zero(32))?;
        ctx.assign(s.dividend_copy, dividend_copy)?;
        ctx.assign(s.divider_copy, divider_copy)?;
        ctx.assign(s.negative_output, sign && dividend.msb() != divider.msb())?;
        Ok(())
    }

    fn iterate(&self, ctx: &mut ProcessContext<'_>, bit: Value) -> Result<(), SimError> {
        let s = &self.s;
        let dividend_copy = ctx.value(s.dividend_copy)?;
        let divider_copy = ctx.value(s.divider_copy)?;
        let diff = dividend_copy - divider_copy;

        let mut quotient_temp = ctx.value(s.quotient_temp)? << 1;
        if !diff.msb() {
            ctx.assign(s.dividend_copy, diff)?;
            quotient_temp = quotient_temp | Value::new(32, 1);
        }
        let quotient = if ctx.value(s.negative_output)?.to_bool() {
            negate(quotient_temp)
        } else {
            quotient_temp
        };

        ctx.assign(s.quotient_temp, quotient_temp)?;
        ctx.assign(s.quotient, quotient)?;
        ctx.assign(s.divider_copy, divider_copy >> 1)?;
        ctx.assign(s.bit, bit - Value::new(6, 1))?;
        Ok(())
    }
}

impl Process for DividerCore {
    fn eval(&mut self, ctx: &mut ProcessContext<'_>) -> Result<Suspend, SimError> {
        // The first evaluation only parks on the clock.
        if ctx.trigger() == Some(self.s.clk) {
            let bit = ctx.value(self.s.bit)?;
            if ctx.value(self.s.start)?.to_bool() && bit.is_zero() {
                self.load(ctx)?;
            } else if !bit.is_zero() {
                self.iterate(ctx, bit)?;
            }
        }
        Ok(Suspend::posedge(self.s.clk))
    }
}

/// Where the stimulus is in its script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    /// Not yet waiting on the clock.
    Begin,
    /// Counting rising edges before applying operands.
    Settle(u32),
    /// Operands applied with `start` high; drop it on the next edge.
    Release,
    /// Polling `ready` on each rising edge.
    AwaitReady,
}

/// Applies operands, waits for the result, reports and checks it.
struct Stimulus {
    s: DivideSignals,
    params: DivideParams,
    stage: Stage,
}

impl Stimulus {
    fn apply_operands(&self, ctx: &mut ProcessContext<'_>) -> Result<(), SimError> {
        let s = &self.s;
        ctx.assign(s.dividend, Value::from_signed(self.params.dividend, 32))?;
        ctx.assign(s.divider, Value::from_signed(self.params.divider, 32))?;
        ctx.assign(s.sign, self.params.signed)?;
        ctx.assign(s.start, true)?;
        Ok(())
    }

    fn report(&self, ctx: &mut ProcessContext<'_>) -> Result<(), SimError> {
        let p = &self.params;
        let (a, b) = (p.operand(p.dividend), p.operand(p.divider));
        let quotient = p.read(ctx.value(self.s.quotient)?);
        let remainder = p.read(ctx.value(self.s.remainder)?);
        let (want_q, want_r) = p.expected();

        ctx.display(format!("{a} / {b} = {quotient} (should be {want_q})"));
        ctx.display(format!("{a} % {b} = {remainder} (should be {want_r})"));
        ctx.check(
            quotient == want_q,
            format!("quotient of {a} / {b} is {quotient}, expected {want_q}"),
        );
        ctx.check(
            remainder == want_r,
            format!("remainder of {a} / {b} is {remainder}, expected {want_r}"),
        );
        Ok(())
    }
}

impl Process for Stimulus {
    fn eval(&mut self, ctx: &mut ProcessContext<'_>) -> Result<Suspend, SimError> {
        let clk = self.s.clk;
        match self.stage {
            Stage::Begin => {
                self.stage = Stage::Settle(0);
            }
            Stage::Settle(seen) if seen + 1 < SETTLE_EDGES => {
                self.stage = Stage::Settle(seen + 1);
            }
            Stage::Settle(_) => {
                self.apply_operands(ctx)?;
                self.stage = Stage::Release;
            }
            Stage::Release => {
                ctx.assign(self.s.start, false)?;
                self.stage = Stage::AwaitReady;
            }
            Stage::AwaitReady => {
                if ctx.value(self.s.ready)?.to_bool() {
                    self.report(ctx)?;
                    return Ok(Suspend::Finish);
                }
            }
        }
        Ok(Suspend::posedge(clk))
    }
}

/// Adds the divider model and its stimulus to `sim`.
pub fn build(sim: &mut Simulation, params: &DivideParams) -> Result<DivideSignals, SimError> {
    let s = DivideSignals::register(sim)?;

    sim.add_process("clock_gen", ProcessMode::Event, Clock::new(s.clk, HALF_PERIOD));
    sim.add_process(
        "comb",
        ProcessMode::Continuous,
        from_fn(move |ctx| {
            let low = ctx.value(s.dividend_copy)?.range(31, 0)?;
            let remainder = if ctx.value(s.negative_output)?.to_bool() {
                negate(low)
            } else {
                low
            };
            ctx.assign(s.remainder, remainder)?;
            let ready = ctx.value(s.bit)?.logical_not();
            ctx.assign(s.ready, ready)?;
            Ok(Suspend::Yield)
        }),
    );
    sim.add_process("divider", ProcessMode::Event, DividerCore { s });
    sim.add_process(
        "stimulus",
        ProcessMode::Event,
        Stimulus {
            s,
            params: *params,
            stage: Stage::Begin,
        },
    );
    tracing::debug!(
        dividend = params.dividend,
        divider = params.divider,
        signed = params.signed,
        "built divider model"
    );
    Ok(s)
}
