//! Masker Model
//!
//! Defines the data contracts of a masking request:
//! - **Rects:** caller-supplied rectangles and their clamped, frame-safe form
//! - **Filter chain:** the ordered stages handed to the transcoding engine
//! - **Assets:** uploaded and transcoded files on disk
//!
//! All coordinates are source-video pixels with the origin at the top-left.
//! This crate does no I/O.

pub mod asset;
pub mod filter;
pub mod rect;

pub use asset::*;
pub use filter::*;
pub use rect::*;
