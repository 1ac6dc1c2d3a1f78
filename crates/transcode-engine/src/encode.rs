//! Output encode parameters.

use serde::{Deserialize, Serialize};

/// Codec and container settings for the single supported output
/// (H.264/AAC in MP4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeParams {
    pub video_codec: String,
    /// Constant rate factor; lower is higher quality.
    pub crf: u8,
    /// Encoder preset; slower presets compress better.
    pub preset: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    /// Move the index to the front of the file for progressive playback.
    pub faststart: bool,
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            crf: 18,
            preset: "slow".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            faststart: true,
        }
    }
}

impl EncodeParams {
    /// ffmpeg output options, in order.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-preset".to_string(),
            self.preset.clone(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ];
        if self.faststart {
            args.push("-movflags".to_string());
            args.push("+faststart".to_string());
        }
        args
    }
}
