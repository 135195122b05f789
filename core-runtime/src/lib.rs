//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the PCM workspace binaries:
//! - Logging and tracing setup
//! - Runtime error type
//!
//! ## Overview
//!
//! Library crates only emit `tracing` events. Binaries call
//! [`logging::init_logging`] once at startup to decide where those events go.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
