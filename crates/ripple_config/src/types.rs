//! Configuration types deserialized from `ripple.toml`.

use serde::Deserialize;
use std::path::PathBuf;

/// The top-level run configuration parsed from `ripple.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RippleConfig {
    /// Kernel limits.
    #[serde(default)]
    pub sim: SimSection,
    /// Waveform output.
    #[serde(default)]
    pub waveform: WaveformSection,
    /// Clock/counter testbench parameters.
    #[serde(default)]
    pub counter: CounterSection,
    /// Iterative divider testbench parameters.
    #[serde(default)]
    pub divide: DivideSection,
}

/// `[sim]`: kernel limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimSection {
    /// Tick at which runs stop. The testbench's own default applies if absent.
    pub time_limit: Option<u64>,
    /// Maximum delta cycles at a single time value.
    pub max_deltas: u32,
}

impl Default for SimSection {
    fn default() -> Self {
        Self {
            time_limit: None,
            max_deltas: 10_000,
        }
    }
}

/// `[waveform]`: VCD output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WaveformSection {
    /// Whether to write a VCD file.
    pub enabled: bool,
    /// Output path. Defaults to `<testbench>.vcd` in the working directory.
    pub path: Option<PathBuf>,
}

impl Default for WaveformSection {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// `[counter]`: the clock/counter model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CounterSection {
    /// Ticks between clock toggles.
    pub period: u64,
    /// Counter width in bits.
    pub width: u32,
}

impl Default for CounterSection {
    fn default() -> Self {
        Self {
            period: 10,
            width: 8,
        }
    }
}

/// `[divide]`: the iterative divider model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DivideSection {
    /// 32-bit dividend.
    pub dividend: i64,
    /// 32-bit divider; must be non-zero.
    pub divider: i64,
    /// Two's-complement operands and results.
    pub signed: bool,
}

impl Default for DivideSection {
    fn default() -> Self {
        Self {
            dividend: 1000,
            divider: 23,
            signed: false,
        }
    }
}
