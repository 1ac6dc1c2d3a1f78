//! Masker server: blanks out rectangular regions of uploaded videos.
//!
//! Usage:
//!   masker-server [--verbose] [--json-logs] [--port <PORT>]
//!   masker-server --check
//!
//! Everything else is configured through the environment (`PORT`,
//! `TTL_MINUTES`, `MAX_FILE_MB`, `UPLOAD_DIR`, `OUTPUT_DIR`, `FFPROBE_PATH`,
//! `FFMPEG_PATH`, `SWEEP_INTERVAL_SECS`, `LOG_LEVEL`, `LOG_JSON`).

use clap::Parser;

use masker_common::config::ServiceConfig;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "masker-server",
    about = "HTTP service that masks rectangular regions of uploaded videos",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Listen port (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Report configuration and tool availability, then exit
    #[arg(long)]
    check: bool,
}

impl Cli {
    /// Flags win over the environment.
    fn apply(&self, config: &mut ServiceConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
        if self.json_logs {
            config.logging.json = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ServiceConfig::from_env()?;
    cli.apply(&mut config);

    masker_common::logging::init_logging(&config.logging);

    if cli.check {
        return commands::check::run(&config);
    }
    commands::serve::run(config).await
}
