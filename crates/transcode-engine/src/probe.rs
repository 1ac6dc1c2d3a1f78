//! Frame-size probing.
//!
//! Probing is advisory. A failed probe never fails a request; the caller
//! falls back to unclamped rectangles.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use masker_common::error::{MaskerError, MaskerResult};
use masker_model::FrameDimensions;

/// Reads the frame size of a stored video.
#[async_trait]
pub trait DimensionProbe: Send + Sync {
    /// `Ok(None)` means the file was readable but has no video stream with
    /// a positive size.
    async fn probe(&self, path: &Path) -> MaskerResult<Option<FrameDimensions>>;

    /// Probe name, for logs.
    fn name(&self) -> &str;
}

/// Probe backed by the `ffprobe` command-line tool.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: PathBuf,
}

impl FfprobeProbe {
    /// Use `binary` if given, otherwise `ffprobe` from `PATH`.
    pub fn new(binary: Option<PathBuf>) -> Self {
        Self {
            binary: binary.unwrap_or_else(|| PathBuf::from("ffprobe")),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl DimensionProbe for FfprobeProbe {
    async fn probe(&self, path: &Path) -> MaskerResult<Option<FrameDimensions>> {
        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v",
                "-show_entries",
                "stream=width,height",
                "-of",
                "csv=p=0:s=x",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                MaskerError::probe(format!(
                    "Failed to start {}: {e}",
                    self.binary.display()
                ))
            })?;

        if !output.status.success() {
            return Err(MaskerError::probe(format!(
                "ffprobe failed (status {}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(parse_dimensions(&String::from_utf8_lossy(&output.stdout)))
    }

    fn name(&self) -> &str {
        "ffprobe"
    }
}

/// First `WIDTHxHEIGHT` line with two positive values.
pub fn parse_dimensions(raw: &str) -> Option<FrameDimensions> {
    raw.lines().find_map(|line| {
        let mut fields = line.trim().split('x');
        let width = fields.next()?.trim().parse::<u32>().ok()?;
        let height = fields.next()?.trim().parse::<u32>().ok()?;
        FrameDimensions::new(width, height)
    })
}

/// Probe, downgrading any failure to a warning.
pub async fn probe_or_warn(probe: &dyn DimensionProbe, path: &Path) -> Option<FrameDimensions> {
    match probe.probe(path).await {
        Ok(Some(dims)) => {
            tracing::debug!(
                path = %path.display(),
                width = dims.width,
                height = dims.height,
                "Probed frame size"
            );
            Some(dims)
        }
        Ok(None) => {
            tracing::warn!(
                path = %path.display(),
                probe = probe.name(),
                "No sized video stream found, proceeding without clamp"
            );
            None
        }
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                probe = probe.name(),
                error = %err,
                "Probe failed, proceeding without clamp"
            );
            None
        }
    }
}
