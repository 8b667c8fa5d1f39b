//! Geoping CLI library.
//!
//! This library provides the core functionality for the Geoping command-line interface,
//! including configuration management, command execution, the interactive watch
//! session and output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod sink;
pub mod watch;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
pub use sink::ConsoleSink;
