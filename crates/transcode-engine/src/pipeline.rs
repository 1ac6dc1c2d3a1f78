//! Per-request orchestration: probe, clamp, build, run.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use masker_common::error::{MaskerError, MaskerResult, ValidationKind};
use masker_model::{
    clamp_rects, output_file_name, FilterChain, OutputAsset, RawRect, UploadedAsset,
};

use crate::encode::EncodeParams;
use crate::job::TranscodeJob;
use crate::probe::{probe_or_warn, DimensionProbe};
use crate::runner::JobRunner;

/// The masking pipeline shared by all requests.
///
/// Holds no per-request state; concurrent calls are independent.
#[derive(Clone)]
pub struct MaskPipeline {
    probe: Arc<dyn DimensionProbe>,
    runner: Arc<dyn JobRunner>,
    encode: EncodeParams,
    output_dir: PathBuf,
}

impl MaskPipeline {
    pub fn new(
        probe: Arc<dyn DimensionProbe>,
        runner: Arc<dyn JobRunner>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            probe,
            runner,
            encode: EncodeParams::default(),
            output_dir: output_dir.into(),
        }
    }

    /// Mask `raws` in `asset` and return the encoded result.
    ///
    /// Every validation error is raised before the engine starts. The
    /// input file is left in place whatever the outcome.
    #[tracing::instrument(skip_all, fields(input = %asset.path.display(), rects = raws.len()))]
    pub async fn process(
        &self,
        asset: &UploadedAsset,
        raws: &[RawRect],
    ) -> MaskerResult<OutputAsset> {
        if raws.is_empty() {
            return Err(MaskerError::validation(ValidationKind::NoRects));
        }

        let dims = probe_or_warn(self.probe.as_ref(), &asset.path).await;

        let rects = clamp_rects(raws, dims)?;
        if rects.len() < raws.len() {
            tracing::debug!(
                dropped = raws.len() - rects.len(),
                "Dropped rectangles that do not fit the frame"
            );
        }

        let filter_chain = FilterChain::build(&rects, dims)?;
        let job = TranscodeJob {
            input: asset.clone(),
            filter_chain,
            encode: self.encode.clone(),
            output_path: self.output_dir.join(output_file_name()),
        };

        tracing::info!(
            runner = self.runner.name(),
            graph = %job.filter_chain,
            "Starting transcode"
        );

        let output_path = self.runner.run(job).await.into_result().map_err(|err| {
            tracing::error!(error = %err, "Transcode failed");
            err
        })?;

        Ok(OutputAsset {
            path: output_path,
            created_at: Utc::now(),
        })
    }
}
