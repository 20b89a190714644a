//! Core module
//!
//! Contains world configuration

mod config;

pub use config::{ConfigError, DefaultCamera, WorldConfig};
