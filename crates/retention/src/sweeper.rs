//! Periodic deletion of files older than the retention TTL.
//!
//! Best effort throughout: a file or directory that cannot be listed,
//! inspected, or removed is logged and skipped. The sweep takes no locks,
//! so a request that runs longer than the TTL can lose its own files.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};

use masker_common::config::ServiceConfig;

/// Counters for one pass over all directories.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Regular files looked at.
    pub scanned: usize,
    /// Files deleted because they outlived the TTL.
    pub removed: usize,
    /// Listing, metadata, or deletion failures.
    pub failed: usize,
}

/// Deletes expired files from a fixed set of directories.
#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    dirs: Vec<PathBuf>,
    ttl: Duration,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(dirs: Vec<PathBuf>, ttl: Duration, interval: Duration) -> Self {
        Self {
            dirs,
            ttl,
            interval,
        }
    }

    /// Sweeper over the upload and output directories.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            vec![config.upload_dir.clone(), config.output_dir.clone()],
            config.ttl(),
            config.sweep_interval(),
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// One pass, using the current wall clock.
    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(SystemTime::now()).await
    }

    /// One pass, treating `now` as the current time.
    pub async fn sweep_at(&self, now: SystemTime) -> SweepReport {
        let mut report = SweepReport::default();
        for dir in &self.dirs {
            self.sweep_dir(dir, now, &mut report).await;
        }
        report
    }

    async fn sweep_dir(&self, dir: &Path, now: SystemTime, report: &mut SweepReport) {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(dir = %dir.display(), error = %err, "Failed to list directory");
                report.failed += 1;
                return;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(dir = %dir.display(), error = %err, "Failed to read directory entry");
                    report.failed += 1;
                    break;
                }
            };

            let path = entry.path();
            let modified = match entry.metadata().await {
                Ok(meta) if meta.is_dir() => continue,
                Ok(meta) => meta.modified(),
                Err(err) => Err(err),
            };
            report.scanned += 1;

            let modified = match modified {
                Ok(modified) => modified,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Failed to read modification time");
                    report.failed += 1;
                    continue;
                }
            };

            if !is_expired(modified, now, self.ttl) {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "Removed expired file");
                    report.removed += 1;
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Failed to remove expired file");
                    report.failed += 1;
                }
            }
        }
    }

    /// Sweep every `interval` until `shutdown` fires or its sender is
    /// dropped. The first sweep happens one interval after start.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            ttl_secs = self.ttl.as_secs(),
            dirs = ?self.dirs,
            "Retention sweeper started"
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.sweep().await;
                    if report.removed > 0 || report.failed > 0 {
                        tracing::info!(
                            scanned = report.scanned,
                            removed = report.removed,
                            failed = report.failed,
                            "Retention sweep finished"
                        );
                    } else {
                        tracing::debug!(scanned = report.scanned, "Retention sweep finished");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Retention sweeper shutting down");
                    break;
                }
            }
        }
    }
}

/// Whether a file last modified at `modified` has outlived `ttl`.
///
/// Modification times in the future count as age zero.
pub fn is_expired(modified: SystemTime, now: SystemTime, ttl: Duration) -> bool {
    now.duration_since(modified)
        .map(|age| age > ttl)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    fn touch(path: &Path, modified: SystemTime) {
        let file = std::fs::File::create(path).unwrap();
        file.set_modified(modified).unwrap();
    }

    #[test]
    fn test_is_expired() {
        let now = SystemTime::now();
        assert!(is_expired(now - 20 * MINUTE, now, 15 * MINUTE));
        assert!(!is_expired(now - 5 * MINUTE, now, 15 * MINUTE));
        assert!(!is_expired(now - 15 * MINUTE, now, 15 * MINUTE));
        assert!(!is_expired(now + MINUTE, now, 15 * MINUTE));
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_files() {
        let uploads = tempfile::tempdir().unwrap();
        let outputs = tempfile::tempdir().unwrap();
        let now = SystemTime::now();

        let old = outputs.path().join("output_old.mp4");
        let fresh = outputs.path().join("output_fresh.mp4");
        touch(&old, now - 20 * MINUTE);
        touch(&fresh, now - 5 * MINUTE);

        let sweeper = RetentionSweeper::new(
            vec![uploads.path().to_path_buf(), outputs.path().to_path_buf()],
            15 * MINUTE,
            MINUTE,
        );
        let report = sweeper.sweep_at(now).await;

        assert_eq!(
            report,
            SweepReport {
                scanned: 2,
                removed: 1,
                failed: 0
            }
        );
        assert!(!old.exists());
        assert!(fresh.exists());
    }

    #[tokio::test]
    async fn test_sweep_leaves_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();

        let sweeper = RetentionSweeper::new(vec![dir.path().to_path_buf()], MINUTE, MINUTE);
        let report = sweeper.sweep_at(SystemTime::now() + 60 * MINUTE).await;

        assert_eq!(report.scanned, 0);
        assert!(nested.exists());
    }

    #[tokio::test]
    async fn test_missing_directory_does_not_stop_sweep() {
        let missing = PathBuf::from("/nonexistent/mask_uploads");
        let outputs = tempfile::tempdir().unwrap();
        let now = SystemTime::now();
        let old = outputs.path().join("output_old.mp4");
        touch(&old, now - 30 * MINUTE);

        let sweeper = RetentionSweeper::new(
            vec![missing, outputs.path().to_path_buf()],
            15 * MINUTE,
            MINUTE,
        );
        let report = sweeper.sweep_at(now).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.removed, 1);
        assert!(!old.exists());
    }

    #[test]
    fn test_from_config_covers_both_directories() {
        let config = ServiceConfig::default();
        let sweeper = RetentionSweeper::from_config(&config);
        assert_eq!(sweeper.dirs(), &[config.upload_dir, config.output_dir]);
        assert_eq!(sweeper.ttl(), 15 * MINUTE);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let sweeper =
            RetentionSweeper::new(vec![dir.path().to_path_buf()], MINUTE, Duration::from_millis(10));
        let (tx, rx) = broadcast::channel(1);

        let handle = tokio::spawn(sweeper.run(rx));
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper should stop")
            .unwrap();
    }
}
