//! Heuristic classification of yt-dlp output lines.
//!
//! yt-dlp has no structured progress mode, so each line of its stdout and
//! stderr is matched against a small rule table. The rules are ordered and
//! the first match wins. All of the tool-specific phrasing lives here so the
//! rest of the crate only sees [`ClassifiedLine`] variants.

use regex::Regex;
use std::sync::LazyLock;

/// Phrases that mark an individual item as unavailable rather than the tool
/// being broken. Each entry pairs the needle with the short reason reported
/// in the final accounting block.
const SKIP_PHRASES: &[(&str, &str)] = &[
    ("Sign in to confirm your age", "age-restricted"),
    ("Private video", "private"),
    ("Video unavailable", "unavailable"),
    ("This video is unavailable", "unavailable"),
];

/// stderr chatter that is never worth forwarding.
const IGNORED_CHATTER: &[&str] = &["Deprecated Feature"];

/// Marker yt-dlp prints on every per-item transfer line.
const DOWNLOAD_MARKER: &str = "[download]";

/// Marker printed once the playlist enumeration is done.
const PLAYLIST_FINISHED_MARKER: &str = "Finished downloading playlist";

/// Prefix of the path yt-dlp prints when it writes an output file.
const DESTINATION_MARKER: &str = "Destination:";

/// Item identifier as it appears in extractor messages, e.g.
/// `ERROR: [youtube] dQw4w9WgXcQ: Private video. ...`
static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[youtube\]\s+([A-Za-z0-9_-]{11}):").expect("valid regex"));

/// What one line of subprocess output means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedLine {
    /// A per-item transfer progress line, forwarded as-is.
    DownloadProgress(String),
    /// The tool finished writing an output file; carries the file name.
    ConversionDone(String),
    /// One item could not be processed. Carries the short reason and the
    /// source URL reconstructed from the extractor's item identifier.
    ItemSkipped { reason: String, source_url: String },
    /// The batch enumeration finished.
    Completion(String),
    /// An error line that is not a per-item skip.
    ToolError(String),
    /// Non-empty informational chatter, forwarded at info severity.
    Chatter(String),
    /// Dropped.
    Noise,
}

/// Line classifier parameterised by the expected output extension.
pub struct LineClassifier {
    destination_suffix: String,
}

impl LineClassifier {
    /// Create a classifier for output files with the given extension
    /// (without the dot, e.g. `mp3`).
    pub fn new(audio_format: &str) -> Self {
        Self {
            destination_suffix: format!(".{}", audio_format),
        }
    }

    /// Classify one line of output. The line is expected to already be
    /// split on line boundaries; trailing whitespace is stripped here.
    pub fn classify(&self, line: &str) -> ClassifiedLine {
        let line = line.trim_end();
        if line.trim().is_empty() {
            return ClassifiedLine::Noise;
        }
        let line = line.trim();

        // Rule 1: transfer progress ("[download]  42.3% of ...").
        if line.contains(DOWNLOAD_MARKER) && line.contains('%') {
            return ClassifiedLine::DownloadProgress(line.to_string());
        }

        // Rule 2: output file written.
        if let Some(idx) = line.find(DESTINATION_MARKER) {
            let path = line[idx + DESTINATION_MARKER.len()..].trim();
            if path.ends_with(&self.destination_suffix) {
                let name = path.rsplit('/').next().unwrap_or(path);
                return ClassifiedLine::ConversionDone(name.to_string());
            }
        }

        // Rule 3: playlist enumeration finished.
        if line.contains(PLAYLIST_FINISHED_MARKER) {
            return ClassifiedLine::Completion(line.to_string());
        }

        // Rule 4: per-item unavailability. Takes priority over the generic
        // error rule so a restricted item is never reported as a failure.
        for (needle, reason) in SKIP_PHRASES {
            if line.contains(needle) {
                if let Some(caps) = VIDEO_ID_RE.captures(line) {
                    return ClassifiedLine::ItemSkipped {
                        reason: (*reason).to_string(),
                        source_url: format!("https://www.youtube.com/watch?v={}", &caps[1]),
                    };
                }
            }
        }

        // Rule 5: anything else the tool flags as an error.
        if line.starts_with("ERROR:") {
            return ClassifiedLine::ToolError(line.to_string());
        }

        // Rule 6: chatter, unless it is on the ignore list.
        if IGNORED_CHATTER.iter().any(|n| line.contains(n)) {
            return ClassifiedLine::Noise;
        }
        ClassifiedLine::Chatter(line.to_string())
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new("mp3")
    }
}
