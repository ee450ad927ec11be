//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::RippleConfig;
use ripple_common::MAX_WIDTH;
use std::path::Path;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE_NAME: &str = "ripple.toml";

/// Loads `<dir>/ripple.toml`, or the defaults if the file does not exist.
pub fn load_config(dir: &Path) -> Result<RippleConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.is_file() {
        return Ok(RippleConfig::default());
    }
    load_config_file(&path)
}

/// Loads and validates a configuration from an explicit file path.
pub fn load_config_file(path: &Path) -> Result<RippleConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<RippleConfig, ConfigError> {
    let config: RippleConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks value ranges that the types alone cannot express.
pub fn validate_config(config: &RippleConfig) -> Result<(), ConfigError> {
    if config.sim.max_deltas == 0 {
        return Err(ConfigError::invalid("sim.max_deltas", "must be positive"));
    }
    if config.counter.period == 0 {
        return Err(ConfigError::invalid("counter.period", "must be positive"));
    }
    if config.counter.width == 0 || config.counter.width > MAX_WIDTH {
        return Err(ConfigError::invalid(
            "counter.width",
            format!("must be between 1 and {MAX_WIDTH}, got {}", config.counter.width),
        ));
    }

    let divide = &config.divide;
    if divide.divider == 0 {
        return Err(ConfigError::invalid("divide.divider", "must be non-zero"));
    }
    let (range, kind) = if divide.signed {
        (i64::from(i32::MIN)..=i64::from(i32::MAX), "signed")
    } else {
        (0..=i64::from(u32::MAX), "unsigned")
    };
    for (field, value) in [
        ("divide.dividend", divide.dividend),
        ("divide.divider", divide.divider),
    ] {
        if !range.contains(&value) {
            return Err(ConfigError::invalid(
                field,
                format!("{value} does not fit in {kind} 32 bits"),
            ));
        }
    }
    Ok(())
}
