//! Job execution against the external engine.
//!
//! There is no admission control: every call starts its own ffmpeg
//! process immediately. A concurrency cap or queue belongs behind the
//! [`JobRunner`] trait.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;

use crate::job::{TranscodeJob, TranscodeOutcome};

/// How many trailing stderr lines end up in a failure message.
const STDERR_TAIL_LINES: usize = 8;

/// Trait for transcode backends.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Run the job to completion. Never cancelled, never timed out.
    async fn run(&self, job: TranscodeJob) -> TranscodeOutcome;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Runs jobs with the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    binary: PathBuf,
}

impl FfmpegRunner {
    /// Use `binary` if given, otherwise `ffmpeg` from `PATH`.
    pub fn new(binary: Option<PathBuf>) -> Self {
        Self {
            binary: binary.unwrap_or_else(|| PathBuf::from("ffmpeg")),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl JobRunner for FfmpegRunner {
    async fn run(&self, job: TranscodeJob) -> TranscodeOutcome {
        // Detached task: dropping the request future does not stop ffmpeg.
        let handle = tokio::spawn(run_ffmpeg(self.binary.clone(), job));
        match handle.await {
            Ok(outcome) => outcome,
            Err(err) => TranscodeOutcome::failure(format!("ffmpeg task failed: {err}")),
        }
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

async fn run_ffmpeg(binary: PathBuf, job: TranscodeJob) -> TranscodeOutcome {
    let args = job.ffmpeg_args();
    tracing::debug!(args = ?args, "Running ffmpeg");

    let start = Instant::now();
    let child = Command::new(&binary)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn();
    let child = match child {
        Ok(child) => child,
        Err(err) => {
            return TranscodeOutcome::failure(format!(
                "Failed to start {}: {err}",
                binary.display()
            ))
        }
    };

    tracing::info!(
        pid = child.id(),
        input = %job.input.path.display(),
        output = %job.output_path.display(),
        stages = job.filter_chain.len(),
        "ffmpeg process started"
    );

    // Collects stderr while waiting so a chatty ffmpeg never blocks on a
    // full pipe.
    let output = match child.wait_with_output().await {
        Ok(output) => output,
        Err(err) => return TranscodeOutcome::failure(format!("Failed to wait on ffmpeg: {err}")),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = format!(
            "ffmpeg exited with {}: {}",
            output.status,
            stderr_tail(&stderr, STDERR_TAIL_LINES)
        );
        tracing::warn!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            error = %message,
            "ffmpeg failed"
        );
        return TranscodeOutcome::failure(message);
    }

    if let Err(err) = tokio::fs::metadata(&job.output_path).await {
        return TranscodeOutcome::failure(format!(
            "ffmpeg reported success but {} is missing: {err}",
            job.output_path.display()
        ));
    }

    tracing::info!(
        elapsed_secs = start.elapsed().as_secs_f64(),
        output = %job.output_path.display(),
        "ffmpeg finished"
    );
    TranscodeOutcome::Success {
        output_path: job.output_path,
    }
}

/// Last `max_lines` non-blank lines of `stderr`.
fn stderr_tail(stderr: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();
    let skip = lines.len().saturating_sub(max_lines);
    lines[skip..].join("\n")
}

/// Whether `binary` resolves to an executable, either as a path or
/// through `PATH`.
pub fn command_exists(binary: &Path) -> bool {
    which::which(binary).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use masker_model::{ClampedRect, FilterChain, FrameDimensions, UploadedAsset};

    use crate::encode::EncodeParams;

    fn job(output_path: PathBuf) -> TranscodeJob {
        let rects = [ClampedRect {
            x: 4,
            y: 4,
            w: 10,
            h: 10,
        }];
        TranscodeJob {
            input: UploadedAsset {
                path: PathBuf::from("input.mp4"),
                original_extension: ".mp4".to_string(),
                size_bytes: 10,
                created_at: chrono::Utc::now(),
            },
            filter_chain: FilterChain::build(&rects, FrameDimensions::new(64, 64)).unwrap(),
            encode: EncodeParams::default(),
            output_path,
        }
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let stderr = "a\n\nb\nc  \n\n";
        assert_eq!(stderr_tail(stderr, 2), "b\nc");
        assert_eq!(stderr_tail(stderr, 10), "a\nb\nc");
        assert_eq!(stderr_tail("", 3), "");
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_failure() {
        let runner = FfmpegRunner::new(Some(PathBuf::from("/nonexistent/ffmpeg")));
        let outcome = runner.run(job(PathBuf::from("out.mp4"))).await;
        match outcome {
            TranscodeOutcome::Failure { message } => {
                assert!(message.contains("Failed to start"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_command_exists_rejects_missing() {
        assert!(!command_exists(Path::new("/nonexistent/ffmpeg")));
    }

    #[cfg(unix)]
    mod with_fake_tool {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn fake_tool(dir: &Path, script: &str) -> PathBuf {
            let path = dir.join("fake-ffmpeg");
            std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn test_success_writes_output() {
            let dir = tempfile::tempdir().unwrap();
            // Touch the last argument, like ffmpeg writing its output.
            let tool = fake_tool(dir.path(), "for last; do :; done; : > \"$last\"");
            let output = dir.path().join("output.mp4");

            let outcome = FfmpegRunner::new(Some(tool)).run(job(output.clone())).await;
            assert_eq!(
                outcome,
                TranscodeOutcome::Success {
                    output_path: output.clone()
                }
            );
            assert!(output.exists());
        }

        #[tokio::test]
        async fn test_nonzero_exit_carries_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let tool = fake_tool(
                dir.path(),
                "echo 'input.mp4: Invalid data found when processing input' >&2; exit 1",
            );

            let outcome = FfmpegRunner::new(Some(tool))
                .run(job(dir.path().join("output.mp4")))
                .await;
            match outcome {
                TranscodeOutcome::Failure { message } => {
                    assert!(message.starts_with("ffmpeg exited with"));
                    assert!(message.contains("Invalid data found"));
                }
                other => panic!("expected failure, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_success_without_output_is_a_failure() {
            let dir = tempfile::tempdir().unwrap();
            let tool = fake_tool(dir.path(), "exit 0");

            let outcome = FfmpegRunner::new(Some(tool))
                .run(job(dir.path().join("output.mp4")))
                .await;
            assert!(!outcome.is_success());
        }
    }
}
