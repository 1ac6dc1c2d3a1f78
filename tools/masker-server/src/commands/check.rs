//! Report configuration and external tool availability.

use std::path::Path;

use masker_common::config::ServiceConfig;
use masker_transcode_engine::{command_exists, FfmpegRunner, FfprobeProbe};

pub fn run(config: &ServiceConfig) -> anyhow::Result<()> {
    println!("Masker System Check");
    println!("{}", "=".repeat(50));

    println!("Port:            {}", config.port);
    println!("Upload dir:      {}", config.upload_dir.display());
    println!("Output dir:      {}", config.output_dir.display());
    println!("TTL:             {} min", config.ttl_minutes);
    println!("Max upload:      {} MiB", config.max_file_mb);
    println!("Sweep interval:  {} s", config.sweep_interval_secs);
    println!();

    let probe = FfprobeProbe::new(config.ffprobe_path.clone());
    let runner = FfmpegRunner::new(config.ffmpeg_path.clone());
    let probe_ok = report_tool("ffprobe", probe.binary());
    let runner_ok = report_tool("ffmpeg", runner.binary());

    println!();
    if probe_ok && runner_ok {
        println!("All required tools are available. Masker is ready.");
        Ok(())
    } else {
        anyhow::bail!("required tools are missing; set FFMPEG_PATH / FFPROBE_PATH or install ffmpeg")
    }
}

fn report_tool(label: &str, binary: &Path) -> bool {
    let found = command_exists(binary);
    let status = if found { "OK" } else { "MISSING" };
    println!("[{status}] {label}: {}", binary.display());
    found
}
