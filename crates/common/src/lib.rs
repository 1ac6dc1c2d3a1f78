//! Masker Common Utilities
//!
//! Shared infrastructure for all Masker crates:
//! - Error taxonomy and result alias
//! - Service configuration loaded from the environment
//! - Tracing/logging initialization

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
