//! Configuration management module
//!
//! Loads and saves the JSON configuration that supplies default selections
//! and logging settings.

pub mod manager;
pub mod models;

pub use manager::ConfigManager;
pub use models::{LoggingConfig, RegScopeConfig, SelectionDefaults};
