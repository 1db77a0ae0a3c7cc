//! Configuration module for erdprobe.
//!
//! Handles the settings file, environment variables, and synthesis defaults.

mod settings;

pub use settings::{
    expand_env_vars, OutputSettings, ParamSettings, ProbeSettings, Settings, SettingsError,
    SqlDialect, SqlSettings, TextSettings,
};
