//! `ripple run`: build a bundled testbench and simulate it.
//!
//! Loads `ripple.toml`, applies command-line overrides, builds the chosen
//! model, and runs the kernel. Display lines go to stdout, assertion
//! failures to stderr, and the waveform to a VCD file unless disabled.

use std::path::{Path, PathBuf};

use ripple_config::{ConfigError, RippleConfig};
use ripple_sim::{SimConfig, Simulation};
use ripple_testbench::{counter, divide, Bench, CounterParams, DivideParams};

use crate::{GlobalArgs, RunArgs};

/// Fully resolved parameters of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// The model to build.
    pub bench: Bench,
    /// Tick at which the run stops.
    pub time_limit: u64,
    /// Delta-cycle bound per time value.
    pub max_deltas: u32,
    /// VCD destination, or `None` when recording is off.
    pub waveform_path: Option<PathBuf>,
    /// Counter model parameters.
    pub counter: CounterParams,
    /// Divider model parameters.
    pub divide: DivideParams,
}

/// Runs the `ripple run` command.
///
/// Returns exit code 0 if every check passed, 1 otherwise.
pub fn run(args: &RunArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = match &global.config {
        Some(path) => ripple_config::load_config_file(Path::new(path))?,
        None => ripple_config::load_config(&std::env::current_dir()?)?,
    };
    let settings = resolve_settings(args, &config)?;
    tracing::debug!(?settings, "resolved run settings");

    if !global.quiet {
        eprintln!("   Simulating {}", settings.bench);
    }

    let mut sim = Simulation::new();
    match settings.bench {
        Bench::Counter => {
            counter::build(&mut sim, &settings.counter)?;
        }
        Bench::Divide => {
            divide::build(&mut sim, &settings.divide)?;
        }
    }

    let sim_config = SimConfig {
        time_limit: Some(settings.time_limit),
        max_deltas: settings.max_deltas,
        waveform_path: settings.waveform_path.clone(),
        record_waveform: settings.waveform_path.is_some(),
    };
    let result = ripple_sim::simulate(&mut sim, &sim_config)?;

    for line in &result.display_output {
        println!("{line}");
    }
    for failure in &result.assertion_failures {
        eprintln!("ASSERTION FAILED: {failure}");
    }

    if args.signals {
        for (_, signal) in sim.signals().iter() {
            println!("{} = {}", signal.name(), signal.value());
        }
    }

    if !global.quiet {
        eprintln!(
            "   Simulation finished at {} ({} steps, {} delta cycles)",
            result.final_time, result.steps, result.total_deltas
        );
        if let Some(ref path) = settings.waveform_path {
            eprintln!("   Waveform: {}", path.display());
        }
    }

    if result.passed() {
        Ok(0)
    } else {
        if !global.quiet {
            eprintln!(
                "   FAILED: {} assertion(s) failed",
                result.assertion_failures.len()
            );
        }
        Ok(1)
    }
}

/// Merges command-line overrides into `config` and validates the result.
///
/// Command-line values win over the file, and the file wins over the
/// testbench defaults.
pub fn resolve_settings(args: &RunArgs, config: &RippleConfig) -> Result<RunSettings, ConfigError> {
    let mut merged = config.clone();
    if let Some(period) = args.period {
        merged.counter.period = period;
    }
    if let Some(width) = args.width {
        merged.counter.width = width;
    }
    if let Some(dividend) = args.dividend {
        merged.divide.dividend = dividend;
    }
    if let Some(divider) = args.divider {
        merged.divide.divider = divider;
    }
    if args.signed {
        merged.divide.signed = true;
    }
    ripple_config::validate_config(&merged)?;

    let bench = args.bench;
    let time_limit = args
        .time
        .or(merged.sim.time_limit)
        .unwrap_or_else(|| bench.default_time());

    let waveform_path = if args.no_waveform || !merged.waveform.enabled {
        None
    } else {
        Some(match (&args.output, &merged.waveform.path) {
            (Some(out), _) => PathBuf::from(out),
            (None, Some(path)) => path.clone(),
            (None, None) => PathBuf::from(format!("{bench}.vcd")),
        })
    };

    Ok(RunSettings {
        bench,
        time_limit,
        max_deltas: merged.sim.max_deltas,
        waveform_path,
        counter: CounterParams {
            period: merged.counter.period,
            width: merged.counter.width,
        },
        divide: DivideParams {
            dividend: merged.divide.dividend,
            divider: merged.divide.divider,
            signed: merged.divide.signed,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cli, Command};
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["ripple", "run"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Command::Run(args) => args,
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn defaults_come_from_bench() {
        let s = resolve_settings(&run_args(&["counter"]), &RippleConfig::default()).unwrap();
        assert_eq!(s.bench, Bench::Counter);
        assert_eq!(s.time_limit, 400);
        assert_eq!(s.max_deltas, 10_000);
        assert_eq!(s.waveform_path, Some(PathBuf::from("counter.vcd")));
        assert_eq!(s.counter, CounterParams::default());
    }

    #[test]
    fn config_overrides_defaults() {
        let config = ripple_config::load_config_from_str(
            r#"
[sim]
time_limit = 900
max_deltas = 50

[waveform]
path = "waves/div.vcd"

[divide]
dividend = 77
divider = 7
"#,
        )
        .unwrap();
        let s = resolve_settings(&run_args(&["divide"]), &config).unwrap();
        assert_eq!(s.time_limit, 900);
        assert_eq!(s.max_deltas, 50);
        assert_eq!(s.waveform_path, Some(PathBuf::from("waves/div.vcd")));
        assert_eq!(s.divide.dividend, 77);
        assert_eq!(s.divide.divider, 7);
        assert!(!s.divide.signed);
    }

    #[test]
    fn flags_override_config() {
        let config = ripple_config::load_config_from_str(
            "[sim]\ntime_limit = 900\n[counter]\nperiod = 4\n",
        )
        .unwrap();
        let args = run_args(&["counter", "--time", "100", "--period", "6", "-o", "c.vcd"]);
        let s = resolve_settings(&args, &config).unwrap();
        assert_eq!(s.time_limit, 100);
        assert_eq!(s.counter.period, 6);
        assert_eq!(s.waveform_path, Some(PathBuf::from("c.vcd")));
    }

    #[test]
    fn waveform_can_be_disabled() {
        let s = resolve_settings(
            &run_args(&["counter", "--no-waveform"]),
            &RippleConfig::default(),
        )
        .unwrap();
        assert!(s.waveform_path.is_none());

        let config = ripple_config::load_config_from_str("[waveform]\nenabled = false\n").unwrap();
        let s = resolve_settings(&run_args(&["counter", "-o", "x.vcd"]), &config).unwrap();
        assert!(s.waveform_path.is_none());
    }

    #[test]
    fn signed_flag_sets_signed_mode() {
        let args = run_args(&["divide", "--signed", "--dividend", "-1000"]);
        let s = resolve_settings(&args, &RippleConfig::default()).unwrap();
        assert!(s.divide.signed);
        assert_eq!(s.divide.dividend, -1000);
        assert_eq!(s.divide.divider, 23);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = run_args(&["divide", "--divider", "0"]);
        let err = resolve_settings(&args, &RippleConfig::default()).unwrap_err();
        assert!(err.to_string().contains("divider"));

        let args = run_args(&["divide", "--dividend", "-5"]);
        assert!(resolve_settings(&args, &RippleConfig::default()).is_err());

        let args = run_args(&["counter", "--width", "65"]);
        assert!(resolve_settings(&args, &RippleConfig::default()).is_err());
    }

    #[test]
    fn run_end_to_end_writes_waveform() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("ripple.toml");
        fs::write(&config_path, "[divide]\ndividend = 100\ndivider = 7\n").unwrap();
        let vcd = tmp.path().join("div.vcd");

        let args = run_args(&["divide", "-o", vcd.to_str().unwrap()]);
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            config: Some(config_path.to_str().unwrap().to_string()),
        };
        let code = run(&args, &global).unwrap();
        assert_eq!(code, 0);

        let text = fs::read_to_string(&vcd).unwrap();
        assert!(text.contains("$enddefinitions $end"));
        assert!(text.contains(" quotient [31:0] $end"));
    }

    #[test]
    fn run_missing_config_file_fails() {
        let tmp = TempDir::new().unwrap();
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            config: Some(tmp.path().join("absent.toml").to_str().unwrap().to_string()),
        };
        assert!(run(&run_args(&["counter", "--no-waveform"]), &global).is_err());
    }
}
