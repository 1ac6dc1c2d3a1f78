//! Masker Retention
//!
//! The only garbage collector for uploaded and transcoded files. Files are
//! removed purely by age; nothing tracks whether a request still needs
//! them.

pub mod sweeper;

pub use sweeper::{is_expired, RetentionSweeper, SweepReport};
