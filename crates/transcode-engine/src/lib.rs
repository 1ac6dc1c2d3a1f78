//! Masker Transcode Engine
//!
//! Turns an uploaded video and a list of rectangles into a masked MP4 by
//! driving external tools.
//!
//! # Pipeline Architecture
//!
//! ```text
//! upload.mp4 ──► ffprobe ──► frame size (optional)
//!                                 │
//! rects ─────────────────────► clamp ──► filter chain
//!                                              │
//!                                              ▼
//!                              ffmpeg -vf scale?,delogo…,format
//!                                              │
//!                                              ▼
//!                                         output.mp4
//! ```

pub mod encode;
pub mod job;
pub mod pipeline;
pub mod probe;
pub mod runner;

pub use encode::EncodeParams;
pub use job::{TranscodeJob, TranscodeOutcome};
pub use pipeline::MaskPipeline;
pub use probe::{DimensionProbe, FfprobeProbe};
pub use runner::{command_exists, FfmpegRunner, JobRunner};
