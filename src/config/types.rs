use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of static UI assets. Served with an index.html fallback
    /// when it exists.
    #[serde(default = "default_static_dir")]
    pub static_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_static_dir() -> Option<PathBuf> {
    Some(PathBuf::from("public"))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// Where converted audio files land. Created on startup if absent.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Target audio format passed to the conversion tool.
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Target audio quality (bitrate) passed to the conversion tool.
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloads")
}
fn default_audio_format() -> String {
    "mp3".to_string()
}
fn default_audio_quality() -> String {
    "192K".to_string()
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            audio_format: default_audio_format(),
            audio_quality: default_audio_quality(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Path or name of the yt-dlp binary.
    #[serde(default = "default_ytdlp")]
    pub ytdlp: String,

    /// Explicit ffmpeg location, forwarded to yt-dlp when set. Otherwise
    /// yt-dlp finds ffmpeg on PATH itself.
    #[serde(default)]
    pub ffmpeg: Option<PathBuf>,
}

fn default_ytdlp() -> String {
    "yt-dlp".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp: default_ytdlp(),
            ffmpeg: None,
        }
    }
}
