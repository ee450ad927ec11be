//! Waveform tracing for simulation output.
//!
//! The [`Tracer`] trait is the kernel's only view of trace output: it is
//! notified with the signal registry after the initial values and after every
//! step. [`VcdTracer`] writes the IEEE 1364 Value Change Dump format, viewable
//! in GTKWave, Surfer, or other waveform viewers. [`TraceLog`] keeps the
//! changes in memory.

use std::io::Write;

use ripple_common::Value;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::signal::{SignalId, SignalTable};

/// Receives the committed signal values at each notification.
pub trait Tracer {
    /// Records the state of every signal at `time`.
    ///
    /// The first call sees the registry for the first time and may emit a
    /// header from it; signal identities and widths never change afterwards.
    fn dump(&mut self, time: u64, signals: &SignalTable) -> Result<(), SimError>;

    /// Finalizes the output (flush, trailer, etc.).
    fn finalize(&mut self) -> Result<(), SimError>;
}

/// VCD (Value Change Dump) writer.
///
/// The header is written at the first dump, followed by a `$dumpvars` block
/// holding every signal. Later dumps write only the signals whose value
/// differs from the previous dump, and nothing at all when none does.
/// Identifier codes use printable ASCII starting from `!` (0x21).
pub struct VcdTracer<W: Write> {
    writer: W,
    timescale: String,
    /// Per signal: (id code, width, last dumped value).
    vars: Vec<(String, u32, Value)>,
    header_written: bool,
    current_time: Option<u64>,
}

impl<W: Write> VcdTracer<W> {
    /// Creates a VCD tracer writing to the given output, one tick per `1ns`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            timescale: "1ns".into(),
            vars: Vec::new(),
            header_written: false,
            current_time: None,
        }
    }

    /// Sets the `$timescale` unit a tick maps to.
    pub fn with_timescale(mut self, timescale: impl Into<String>) -> Self {
        self.timescale = timescale.into();
        self
    }

    /// Consumes the tracer and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Generates a VCD identifier code from a sequential index.
    ///
    /// Multi-character codes are generated for indices >= 94.
    fn make_id_code(index: u32) -> String {
        let mut result = String::new();
        let mut idx = index;
        loop {
            let c = (b'!' + (idx % 94) as u8) as char;
            result.push(c);
            idx /= 94;
            if idx == 0 {
                break;
            }
            idx -= 1;
        }
        result
    }

    /// Formats a value as a VCD value-change line body.
    fn format_change(value: Value, code: &str) -> String {
        if value.width() == 1 {
            format!("{}{code}", u8::from(value.to_bool()))
        } else {
            format!("b{} {code}", value.to_binary_string())
        }
    }

    fn write_header(&mut self, signals: &SignalTable) -> Result<(), SimError> {
        writeln!(self.writer, "$version")?;
        writeln!(self.writer, "  Ripple simulation kernel")?;
        writeln!(self.writer, "$end")?;
        writeln!(self.writer, "$timescale")?;
        writeln!(self.writer, "  {}", self.timescale)?;
        writeln!(self.writer, "$end")?;
        writeln!(self.writer, "$scope module top $end")?;
        for (id, sig) in signals.iter() {
            let code = Self::make_id_code(id.as_raw());
            let width = sig.width();
            if width == 1 {
                writeln!(self.writer, "$var reg 1 {code} {} $end", sig.name())?;
            } else {
                writeln!(
                    self.writer,
                    "$var reg {width} {code} {} [{}:0] $end",
                    sig.name(),
                    width - 1
                )?;
            }
            self.vars.push((code, width, sig.value()));
        }
        writeln!(self.writer, "$upscope $end")?;
        writeln!(self.writer, "$enddefinitions $end")?;
        Ok(())
    }
}

impl<W: Write> Tracer for VcdTracer<W> {
    fn dump(&mut self, time: u64, signals: &SignalTable) -> Result<(), SimError> {
        if !self.header_written {
            self.write_header(signals)?;
            self.header_written = true;
            writeln!(self.writer, "#{time}")?;
            writeln!(self.writer, "$dumpvars")?;
            for (code, _, value) in &self.vars {
                writeln!(self.writer, "{}", Self::format_change(*value, code))?;
            }
            writeln!(self.writer, "$end")?;
            self.current_time = Some(time);
            return Ok(());
        }

        for (id, sig) in signals.iter() {
            let Some((code, _, last)) = self.vars.get_mut(id.as_raw() as usize) else {
                return Err(SimError::UnknownSignal(id.as_raw()));
            };
            let value = sig.value();
            if value == *last {
                continue;
            }
            *last = value;
            if self.current_time != Some(time) {
                writeln!(self.writer, "#{time}")?;
                self.current_time = Some(time);
            }
            writeln!(self.writer, "{}", Self::format_change(value, code))?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SimError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// One recorded value of a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Tick of the dump that saw the value.
    pub time: u64,
    /// The signal.
    pub signal: SignalId,
    /// The committed value.
    pub value: Value,
}

/// In-memory tracer: the initial value of every signal, then each change.
#[derive(Clone, Debug, Default)]
pub struct TraceLog {
    entries: Vec<TraceEntry>,
    last: Vec<Value>,
}

impl TraceLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries in dump order.
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// The `(time, value)` history of one signal.
    pub fn history(&self, signal: SignalId) -> impl Iterator<Item = (u64, Value)> + '_ {
        self.entries
            .iter()
            .filter(move |e| e.signal == signal)
            .map(|e| (e.time, e.value))
    }
}

impl Tracer for TraceLog {
    fn dump(&mut self, time: u64, signals: &SignalTable) -> Result<(), SimError> {
        for (id, sig) in signals.iter() {
            let value = sig.value();
            let idx = id.as_raw() as usize;
            match self.last.get_mut(idx) {
                Some(last) if *last == value => continue,
                Some(last) => *last = value,
                None => self.last.push(value),
            }
            self.entries.push(TraceEntry {
                time,
                signal: id,
                value,
            });
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SimError> {
        Ok(())
    }
}
