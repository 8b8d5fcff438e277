//! Trigger CLI library
//!
//! Host side of the trigger beacon: argument parsing, configuration files,
//! the timer-driven event loop and status output.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod display;
pub mod error;

pub use app::{AppCommand, BeaconApp};
pub use cli::{Cli, Commands};
pub use config::AppConfig;
pub use display::StatusRenderer;
pub use error::{CliError, Result};
