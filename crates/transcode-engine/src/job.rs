//! A single transcode request and its outcome.

use std::ffi::OsString;
use std::path::PathBuf;

use masker_common::error::{MaskerError, MaskerResult};
use masker_model::{FilterChain, UploadedAsset};

use crate::encode::EncodeParams;

/// Everything the engine needs for one run. Lives only as long as the
/// request; nothing is persisted or retried.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub input: UploadedAsset,
    pub filter_chain: FilterChain,
    pub encode: EncodeParams,
    pub output_path: PathBuf,
}

impl TranscodeJob {
    /// Full ffmpeg argument list for this job.
    pub fn ffmpeg_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(self.input.path.clone().into_os_string());
        args.push("-vf".into());
        args.push(self.filter_chain.to_graph().into());
        args.extend(self.encode.to_args().into_iter().map(OsString::from));
        args.push(self.output_path.clone().into_os_string());
        args
    }
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeOutcome {
    /// The output file is in place.
    Success { output_path: PathBuf },
    /// The engine reported a problem; `message` is its diagnostic text.
    Failure { message: String },
}

impl TranscodeOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Map to a result, with failures becoming [`MaskerError::Transcode`].
    pub fn into_result(self) -> MaskerResult<PathBuf> {
        match self {
            Self::Success { output_path } => Ok(output_path),
            Self::Failure { message } => Err(MaskerError::transcode(message)),
        }
    }
}
