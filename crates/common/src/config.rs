//! Service configuration.
//!
//! Read once from the environment at startup and treated as immutable
//! afterwards. Components receive it through their constructors.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{MaskerError, MaskerResult};

/// Global service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// TCP port the HTTP server listens on.
    pub port: u16,

    /// Age after which uploads and outputs are swept.
    pub ttl_minutes: u64,

    /// Maximum accepted upload size, in MiB.
    pub max_file_mb: u64,

    /// Directory where uploads are stored.
    pub upload_dir: PathBuf,

    /// Directory where transcoded outputs are written.
    pub output_dir: PathBuf,

    /// Override for the dimension-probing tool.
    pub ffprobe_path: Option<PathBuf>,

    /// Override for the transcoding engine.
    pub ffmpeg_path: Option<PathBuf>,

    /// Period of the retention sweep, in seconds.
    pub sweep_interval_secs: u64,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "masker=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            ttl_minutes: 15,
            max_file_mb: 300,
            upload_dir: PathBuf::from("/tmp/mask_uploads"),
            output_dir: PathBuf::from("/tmp/mask_outputs"),
            ffprobe_path: None,
            ffmpeg_path: None,
            sweep_interval_secs: 60,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ServiceConfig {
    /// Load config from the process environment, falling back to defaults
    /// for unset variables.
    pub fn from_env() -> MaskerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load config through an arbitrary variable lookup.
    ///
    /// Empty values count as unset. A value that is set but cannot be
    /// parsed is a configuration error.
    pub fn from_lookup<F>(lookup: F) -> MaskerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(port) = get("PORT") {
            config.port = parse_var("PORT", &port)?;
        }
        if let Some(ttl) = get("TTL_MINUTES") {
            config.ttl_minutes = parse_var("TTL_MINUTES", &ttl)?;
        }
        if let Some(max) = get("MAX_FILE_MB") {
            config.max_file_mb = parse_var("MAX_FILE_MB", &max)?;
        }
        if let Some(dir) = get("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        config.ffprobe_path = get("FFPROBE_PATH").map(PathBuf::from);
        config.ffmpeg_path = get("FFMPEG_PATH").map(PathBuf::from);
        if let Some(secs) = get("SWEEP_INTERVAL_SECS") {
            config.sweep_interval_secs = parse_var("SWEEP_INTERVAL_SECS", &secs)?;
            if config.sweep_interval_secs == 0 {
                return Err(MaskerError::config("SWEEP_INTERVAL_SECS must be positive"));
            }
        }
        if let Some(level) = get("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(json) = get("LOG_JSON") {
            config.logging.json = parse_var("LOG_JSON", &json)?;
        }

        Ok(config)
    }

    /// Retention age as a duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes.saturating_mul(60))
    }

    /// Upload cap in bytes.
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_mb.saturating_mul(1024 * 1024)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Create the upload and output directories if missing.
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(&self.upload_dir)?;
        std::fs::create_dir_all(&self.output_dir)
    }
}

fn parse_var<T>(key: &str, raw: &str) -> MaskerResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| MaskerError::config(format!("invalid {key}={raw:?}: {e}")))
}
