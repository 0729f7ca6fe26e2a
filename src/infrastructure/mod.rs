// Ambient services: configuration and logging
pub mod config;
pub mod logging;

pub use config::{Config, LogFormat, LogSettings, PythonConfig, CONFIG_ENV};
pub use logging::{init_logging, LogConfig, LOG_ENV};
