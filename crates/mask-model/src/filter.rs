//! Ordered filter chain applied to every frame.
//!
//! The stage order is fixed: optional even-size correction, one masking
//! stage per rectangle, then pixel-format normalization. libx264 with
//! yuv420p needs even frame sizes, so odd inputs are scaled up first.

use std::fmt;

use masker_common::error::{MaskerError, MaskerResult, ValidationKind};

use crate::rect::{ClampedRect, FrameDimensions};

/// Output chroma layout expected by the encoder.
pub const PIXEL_FORMAT: &str = "yuv420p";

/// A single stage in the filter chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    /// Scale to the given even-aligned frame size.
    EvenDimensionCorrection { width: u32, height: u32 },
    /// Obscure one rectangle.
    MaskRegion(ClampedRect),
    /// Convert to [`PIXEL_FORMAT`].
    PixelFormatNormalize,
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EvenDimensionCorrection { width, height } => {
                write!(f, "scale={width}:{height}")
            }
            Self::MaskRegion(r) => {
                write!(f, "delogo=x={}:y={}:w={}:h={}:show=0", r.x, r.y, r.w, r.h)
            }
            Self::PixelFormatNormalize => write!(f, "format={PIXEL_FORMAT}"),
        }
    }
}

/// A validated, ordered sequence of stages.
///
/// Always holds at least one [`FilterStage::MaskRegion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChain {
    stages: Vec<FilterStage>,
}

impl FilterChain {
    /// Assemble the chain for the given rectangles.
    ///
    /// Correction is only added when both dimensions are known and one of
    /// them is odd.
    pub fn build(rects: &[ClampedRect], dims: Option<FrameDimensions>) -> MaskerResult<Self> {
        let mut stages = Vec::with_capacity(rects.len() + 2);

        if let Some(dims) = dims.filter(FrameDimensions::has_odd_axis) {
            let target = dims.even_aligned();
            stages.push(FilterStage::EvenDimensionCorrection {
                width: target.width,
                height: target.height,
            });
        }

        stages.extend(rects.iter().copied().map(FilterStage::MaskRegion));
        stages.push(FilterStage::PixelFormatNormalize);

        let chain = Self { stages };
        if chain.mask_count() == 0 {
            return Err(MaskerError::validation(ValidationKind::EmptyFilter));
        }
        Ok(chain)
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Number of masking stages.
    pub fn mask_count(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| matches!(s, FilterStage::MaskRegion(_)))
            .count()
    }

    /// The even-aligned target size, if a correction stage is present.
    pub fn correction_target(&self) -> Option<FrameDimensions> {
        match self.stages.first() {
            Some(FilterStage::EvenDimensionCorrection { width, height }) => {
                FrameDimensions::new(*width, *height)
            }
            _ => None,
        }
    }

    /// Render as an ffmpeg `-vf` filter graph.
    pub fn to_graph(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{stage}")?;
        }
        Ok(())
    }
}
