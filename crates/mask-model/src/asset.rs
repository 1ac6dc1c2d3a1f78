//! Stored files handled by a request.
//!
//! Neither record owns deletion. Both files stay on disk until the
//! retention sweep removes them by age.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Extension used when the uploaded file name has none.
pub const DEFAULT_UPLOAD_EXTENSION: &str = ".mp4";

/// Extension of every transcoded output.
pub const OUTPUT_EXTENSION: &str = ".mp4";

const MAX_EXTENSION_LEN: usize = 16;

/// An upload written to the upload directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedAsset {
    /// Where the file was stored.
    pub path: PathBuf,
    /// Extension of the client's file name, including the dot.
    pub original_extension: String,
    /// Bytes written.
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// A transcoded result written to the output directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputAsset {
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
}

/// Extension to keep for an upload, with the leading dot.
///
/// Falls back to [`DEFAULT_UPLOAD_EXTENSION`] when the client name has no
/// extension or one that is not plain alphanumeric.
pub fn upload_extension(original_name: Option<&str>) -> String {
    original_name
        .map(Path::new)
        .and_then(Path::extension)
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{ext}"))
        .unwrap_or_else(|| DEFAULT_UPLOAD_EXTENSION.to_string())
}

/// Fresh file name for an upload: `upload_<millis>_<hex><ext>`.
pub fn upload_file_name(extension: &str) -> String {
    format!("upload_{}{extension}", unique_stem())
}

/// Fresh file name for an output: `output_<millis>_<hex>.mp4`.
pub fn output_file_name() -> String {
    format!("output_{}{OUTPUT_EXTENSION}", unique_stem())
}

fn unique_stem() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", Utc::now().timestamp_millis(), &id[..12])
}
