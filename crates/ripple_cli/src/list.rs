//! `ripple list`: show the bundled testbenches.

use ripple_testbench::Bench;

use crate::GlobalArgs;

/// Runs the `ripple list` command.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    for line in lines() {
        println!("{line}");
    }
    if !global.quiet {
        eprintln!("   {} testbenches", Bench::ALL.len());
    }
    Ok(0)
}

fn lines() -> Vec<String> {
    Bench::ALL
        .iter()
        .map(|b| {
            format!(
                "{:<10} {} (default time {})",
                b.name(),
                b.description(),
                b.default_time()
            )
        })
        .collect()
}
