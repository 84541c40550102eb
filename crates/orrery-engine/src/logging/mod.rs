//! Logging utilities.
//!
//! The engine logs through the `log` facade only. This module wires up
//! `env_logger` for binaries that do not bring their own logger.

mod init;

pub use init::{init_logging, LoggingConfig};
