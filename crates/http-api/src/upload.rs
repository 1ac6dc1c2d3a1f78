//! Streaming reader for the `POST /mask` multipart form.

use std::path::Path;

use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::http::StatusCode;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use masker_common::error::{MaskerError, MaskerResult, ValidationKind};
use masker_model::{upload_extension, upload_file_name, UploadedAsset};

/// Form field carrying the video.
pub const FILE_FIELD: &str = "file";
/// Form field carrying the JSON rectangle list.
pub const RECTS_FIELD: &str = "rects";

/// The parts of the form the mask endpoint cares about.
#[derive(Debug, Default)]
pub struct MaskForm {
    /// The stored upload, if a `file` field was sent.
    pub asset: Option<UploadedAsset>,
    /// Raw text of the `rects` field.
    pub rects: Option<String>,
}

/// Read every field, storing the first `file` part that carries a
/// filename in `upload_dir`.
///
/// Fields may arrive in any order; unknown fields are skipped. A file
/// larger than `max_file_bytes` is deleted and reported as
/// [`MaskerError::SizeLimit`].
pub async fn read_mask_form(
    mut multipart: Multipart,
    upload_dir: &Path,
    max_file_bytes: u64,
) -> MaskerResult<MaskForm> {
    let mut form = MaskForm::default();

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|err| multipart_error(err, max_file_bytes))?;
        let Some(field) = field else { break };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            // A `file` part without a filename is a plain text field.
            FILE_FIELD if form.asset.is_none() && field.file_name().is_some() => {
                form.asset = Some(store_file(field, upload_dir, max_file_bytes).await?);
            }
            RECTS_FIELD => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| multipart_error(err, max_file_bytes))?;
                form.rects = Some(text);
            }
            other => tracing::debug!(field = other, "Ignoring form field"),
        }
    }

    Ok(form)
}

async fn store_file(
    mut field: Field<'_>,
    upload_dir: &Path,
    max_file_bytes: u64,
) -> MaskerResult<UploadedAsset> {
    let extension = upload_extension(field.file_name());
    let path = upload_dir.join(upload_file_name(&extension));
    let mut file = tokio::fs::File::create(&path).await?;
    let mut size_bytes = 0u64;

    let written = async {
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|err| multipart_error(err, max_file_bytes))?
        {
            size_bytes += chunk.len() as u64;
            if size_bytes > max_file_bytes {
                return Err(MaskerError::SizeLimit {
                    limit_bytes: max_file_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok::<(), MaskerError>(())
    }
    .await;

    if let Err(err) = written {
        drop(file);
        if let Err(remove_err) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %remove_err, "Failed to remove partial upload");
        }
        return Err(err);
    }

    tracing::info!(path = %path.display(), size_bytes, "Stored upload");
    Ok(UploadedAsset {
        path,
        original_extension: extension,
        size_bytes,
        created_at: Utc::now(),
    })
}

fn multipart_error(err: MultipartError, max_file_bytes: u64) -> MaskerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return MaskerError::SizeLimit {
            limit_bytes: max_file_bytes,
        };
    }
    tracing::debug!(error = %err.body_text(), "Malformed multipart body");
    MaskerError::validation(ValidationKind::BadMultipart)
}
