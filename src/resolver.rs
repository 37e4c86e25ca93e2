//! Playlist metadata resolution via yt-dlp's JSON dump mode.
//!
//! Resolution is best-effort by design: the job must be able to start even
//! when the upfront metadata probe fails, so [`PlaylistResolver::resolve`]
//! never returns an error. A probe that produces no parseable JSON yields
//! [`PlaylistInfo::Degraded`] and the caller proceeds with unknown counts.

use serde::Deserialize;
use tokio::process::Command;

/// Title used when the probe could not determine one.
pub const FALLBACK_TITLE: &str = "Unknown Playlist";

/// Outcome of a metadata probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistInfo {
    /// The tool produced a parseable metadata dump.
    Resolved { title: String, item_count: usize },
    /// No usable metadata; the job proceeds without counts.
    Degraded,
}

impl PlaylistInfo {
    pub fn title(&self) -> &str {
        match self {
            PlaylistInfo::Resolved { title, .. } => title,
            PlaylistInfo::Degraded => FALLBACK_TITLE,
        }
    }

    pub fn item_count(&self) -> Option<usize> {
        match self {
            PlaylistInfo::Resolved { item_count, .. } => Some(*item_count),
            PlaylistInfo::Degraded => None,
        }
    }
}

/// Shape of the `--dump-single-json` output we care about. A playlist has
/// `entries`; a bare video has none and counts as a single item.
#[derive(Debug, Deserialize)]
struct PlaylistDump {
    title: Option<String>,
    entries: Option<Vec<serde_json::Value>>,
}

/// Resolves playlist metadata by invoking the external tool in a flattened,
/// quiet, non-downloading mode.
pub struct PlaylistResolver {
    tool: String,
}

impl PlaylistResolver {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    /// Probe the playlist for its title and item count.
    ///
    /// yt-dlp may exit non-zero while still having dumped valid JSON (e.g.
    /// some playlist entries are restricted), so the exit status is ignored
    /// and only the captured stdout decides the outcome.
    pub async fn resolve(&self, url: &str) -> PlaylistInfo {
        let output = Command::new(&self.tool)
            .arg(url)
            .args([
                "--dump-single-json",
                "--flat-playlist",
                "--ignore-errors",
                "--no-warnings",
                "--quiet",
            ])
            .output()
            .await;

        let output = match output {
            Ok(o) => o,
            Err(e) => {
                tracing::warn!("Playlist metadata probe failed to run: {}", e);
                return PlaylistInfo::Degraded;
            }
        };

        if !output.status.success() {
            tracing::debug!(
                "Metadata probe exited with {:?}, trying to parse output anyway",
                output.status.code()
            );
        }

        match serde_json::from_slice::<PlaylistDump>(&output.stdout) {
            Ok(dump) => PlaylistInfo::Resolved {
                title: dump.title.unwrap_or_else(|| FALLBACK_TITLE.to_string()),
                item_count: dump.entries.map(|e| e.len()).unwrap_or(1),
            },
            Err(e) => {
                tracing::warn!("Could not parse playlist metadata: {}", e);
                PlaylistInfo::Degraded
            }
        }
    }
}
