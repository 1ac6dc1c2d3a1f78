//! Error types shared across Masker crates.

use std::fmt;

/// Client-fixable request problems, each with a stable wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationKind {
    /// The multipart body carried no `file` field.
    NoFile,
    /// The `rects` field was not valid JSON.
    BadRectsJson,
    /// The rectangle list was empty or not an array.
    NoRects,
    /// Every rectangle was dropped while clamping to the frame.
    NoRectsAfterClamp,
    /// The filter chain ended up without a masking stage.
    EmptyFilter,
    /// The multipart stream itself could not be read.
    BadMultipart,
}

impl ValidationKind {
    /// The snake_case code reported to HTTP clients.
    pub fn code(self) -> &'static str {
        match self {
            Self::NoFile => "no_file",
            Self::BadRectsJson => "bad_rects_json",
            Self::NoRects => "no_rects",
            Self::NoRectsAfterClamp => "no_rects_after_clamp",
            Self::EmptyFilter => "empty_filter",
            Self::BadMultipart => "bad_multipart",
        }
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Top-level error type for Masker operations.
#[derive(Debug, thiserror::Error)]
pub enum MaskerError {
    #[error("Validation error: {0}")]
    Validation(ValidationKind),

    #[error("Upload exceeds the {limit_bytes} byte limit")]
    SizeLimit { limit_bytes: u64 },

    #[error("Probe error: {message}")]
    Probe { message: String },

    #[error("Transcode error: {message}")]
    Transcode { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using MaskerError.
pub type MaskerResult<T> = Result<T, MaskerError>;

impl MaskerError {
    pub fn validation(kind: ValidationKind) -> Self {
        Self::Validation(kind)
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe {
            message: msg.into(),
        }
    }

    pub fn transcode(msg: impl Into<String>) -> Self {
        Self::Transcode {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// The validation kind, if this is a client-fixable error.
    pub fn validation_kind(&self) -> Option<ValidationKind> {
        match self {
            Self::Validation(kind) => Some(*kind),
            _ => None,
        }
    }
}
