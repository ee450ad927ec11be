//! Parsing and validation of `ripple.toml` run configuration files.
//!
//! This crate reads the optional run configuration and produces a
//! strongly-typed [`RippleConfig`] with simulation limits, waveform output
//! settings, and the parameters of the bundled testbenches. Every section is
//! optional; missing values take their defaults.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{
    load_config, load_config_file, load_config_from_str, validate_config, CONFIG_FILE_NAME,
};
pub use types::*;
