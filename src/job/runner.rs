//! Batch download supervision.
//!
//! [`JobRunner`] drives one submission through the full lifecycle: metadata
//! resolution (degraded-mode tolerant), subprocess spawn, line-by-line
//! classification of the tool's output, skip accounting, and the terminal
//! transition. All progress is communicated through the [`EventBus`]; after
//! the submission has been acknowledged, nothing here returns an error to
//! the caller.

use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::classify::{ClassifiedLine, LineClassifier};
use crate::config::Config;
use crate::events::{EventBus, Severity};
use crate::job::JobHandle;
use crate::job::JobStatus;
use crate::resolver::{PlaylistInfo, PlaylistResolver};

const BANNER: &str = "========================================";

/// How the subprocess ended, kept separate from the raw exit code because
/// yt-dlp exits non-zero when any item in the batch was skipped. The
/// terminal state is decided from output evidence, not the code.
#[derive(Debug, Clone, Copy)]
struct ProcessOutcome {
    code: Option<i32>,
    /// The playlist-finished marker was observed in the output.
    saw_completion: bool,
    /// Both output streams reached EOF without a read error (graceful
    /// closure).
    streams_closed: bool,
}

impl ProcessOutcome {
    fn indicates_completion(&self) -> bool {
        self.saw_completion || self.streams_closed
    }
}

/// Supervises one batch conversion job.
pub struct JobRunner {
    config: Arc<Config>,
    bus: Arc<EventBus>,
    classifier: LineClassifier,
    resolver: PlaylistResolver,
}

impl JobRunner {
    pub fn new(config: Arc<Config>, bus: Arc<EventBus>) -> Self {
        let classifier = LineClassifier::new(&config.download.audio_format);
        let resolver = PlaylistResolver::new(config.tools.ytdlp.clone());
        Self {
            config,
            bus,
            classifier,
            resolver,
        }
    }

    /// Resolution phase. Runs before the submission is acknowledged so the
    /// acknowledgment can carry the title and item count.
    ///
    /// Resolution failure is not an error: the job continues in degraded
    /// mode with unknown counts and a placeholder title.
    pub async fn resolve_metadata(&self, handle: &JobHandle, include_metadata: bool) {
        let url = {
            let mut state = handle.write();
            state.status = JobStatus::Resolving;
            state.playlist_url.clone()
        };

        self.bus
            .publish(Severity::Info, "Fetching playlist information...");
        self.bus.publish(Severity::Info, format!("URL: {}", url));

        let info = self.resolver.resolve(&url).await;

        match &info {
            PlaylistInfo::Resolved { title, item_count } => {
                self.bus
                    .publish(Severity::Success, format!("Playlist Title: {}", title));
                self.bus
                    .publish(Severity::Success, format!("Total Videos: {}", item_count));
            }
            PlaylistInfo::Degraded => {
                self.bus.publish(
                    Severity::Info,
                    "Could not fetch playlist info, proceeding with download...",
                );
            }
        }

        self.bus.publish(
            Severity::Info,
            format!(
                "Metadata: {}",
                if include_metadata { "Enabled" } else { "Disabled" }
            ),
        );

        let mut state = handle.write();
        state.title = info.title().to_string();
        state.expected_items = info.item_count();
    }

    /// Download phase. Spawns the conversion subprocess and supervises it to
    /// a terminal state. Intended to run as a detached task after the
    /// submission has been acknowledged.
    pub async fn download(self, handle: JobHandle, include_metadata: bool) {
        let (url, title, expected) = {
            let mut state = handle.write();
            state.status = JobStatus::Running;
            (
                state.playlist_url.clone(),
                state.title.clone(),
                state.expected_items,
            )
        };

        self.bus.publish(Severity::Info, BANNER);
        match expected {
            Some(n) => self
                .bus
                .publish(Severity::Info, format!("Starting download of {} videos", n)),
            None => self.bus.publish(Severity::Info, "Starting download"),
        }
        self.bus
            .publish(Severity::Info, format!("Playlist: {}", title));
        self.bus.publish(Severity::Info, BANNER);

        if let Err(e) = std::fs::create_dir_all(&self.config.download.output_dir) {
            self.fail(&handle, format!("Could not create output directory: {}", e));
            return;
        }

        let mut child = match self.spawn_tool(&url, include_metadata) {
            Ok(child) => child,
            Err(e) => {
                self.fail(&handle, format!("Download failed to start: {}", e));
                return;
            }
        };

        // Fan both output streams into one channel so events are published
        // in the order lines are classified. stdout/stderr interleaving is
        // accepted as the process produces it.
        let (tx, mut rx) = mpsc::channel::<String>(64);
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(forward_lines(stdout, tx.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(forward_lines(stderr, tx.clone())));
        }
        drop(tx);

        let mut saw_completion = false;
        while let Some(line) = rx.recv().await {
            match self.classifier.classify(&line) {
                ClassifiedLine::DownloadProgress(line) => {
                    self.bus.publish(Severity::Info, line);
                }
                ClassifiedLine::ConversionDone(name) => {
                    handle.write().converted += 1;
                    self.bus
                        .publish(Severity::Success, format!("Converted: {}", name));
                }
                ClassifiedLine::ItemSkipped { reason, source_url } => {
                    handle.write().skipped.push(source_url.clone());
                    self.bus.publish(
                        Severity::Warning,
                        format!("Skipping {} ({})", source_url, reason),
                    );
                }
                ClassifiedLine::Completion(line) => {
                    saw_completion = true;
                    self.bus.publish(Severity::Info, line);
                }
                ClassifiedLine::ToolError(line) => {
                    self.bus.publish(Severity::Error, line);
                }
                ClassifiedLine::Chatter(line) => {
                    self.bus.publish(Severity::Info, line);
                }
                ClassifiedLine::Noise => {}
            }
        }

        // The channel closed, so both forwarders are done; collect their
        // EOF-versus-read-error verdicts.
        let mut streams_closed = true;
        for reader in readers {
            streams_closed &= reader.await.unwrap_or(false);
        }

        let code = match child.wait().await {
            Ok(status) => status.code(),
            Err(e) => {
                tracing::error!("Failed to collect subprocess exit status: {}", e);
                None
            }
        };

        let outcome = ProcessOutcome {
            code,
            saw_completion,
            streams_closed,
        };
        self.finish(&handle, outcome);
    }

    fn spawn_tool(&self, url: &str, include_metadata: bool) -> std::io::Result<tokio::process::Child> {
        let template = self.config.download.output_dir.join("%(title)s.%(ext)s");

        let mut cmd = Command::new(&self.config.tools.ytdlp);
        cmd.arg(url)
            .args([
                "--extract-audio",
                "--audio-format",
                self.config.download.audio_format.as_str(),
                "--audio-quality",
                self.config.download.audio_quality.as_str(),
                "--output",
            ])
            .arg(&template)
            // Line-buffered progress and keep going past per-item failures.
            .args(["--newline", "--ignore-errors"]);

        if include_metadata {
            cmd.arg("--add-metadata");
        }
        if let Some(ref ffmpeg) = self.config.tools.ffmpeg {
            cmd.arg("--ffmpeg-location").arg(ffmpeg);
        }

        tracing::info!("Spawning {} for {}", self.config.tools.ytdlp, url);

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Host shutdown must not orphan the conversion process.
            .kill_on_drop(true)
            .spawn()
    }

    /// Terminal transition plus the final accounting block.
    fn finish(&self, handle: &JobHandle, outcome: ProcessOutcome) {
        if !outcome.indicates_completion() {
            self.fail(handle, "Download ended without producing output".to_string());
            return;
        }

        if let Some(code) = outcome.code {
            if code != 0 {
                // Expected when items were skipped; worth a note, not a failure.
                self.bus.publish(
                    Severity::Warning,
                    format!("yt-dlp exited with status {}", code),
                );
            }
        }

        let skipped = {
            let mut state = handle.write();
            state.complete();
            state.skipped.clone()
        };

        self.bus.publish(Severity::Success, BANNER);
        self.bus
            .publish(Severity::Success, "Playlist download completed!");
        self.bus.publish(Severity::Success, BANNER);

        if !skipped.is_empty() {
            self.bus.publish(
                Severity::Warning,
                format!(
                    "Skipped {} video(s) due to access restrictions or availability:",
                    skipped.len()
                ),
            );
            for url in &skipped {
                self.bus.publish(Severity::Warning, url.clone());
            }
        }

        tracing::info!(
            "Job finished: {} skipped, exit code {:?}",
            skipped.len(),
            outcome.code
        );
    }

    fn fail(&self, handle: &JobHandle, message: String) {
        tracing::error!("{}", message);
        self.bus.publish(Severity::Error, message);
        handle.write().fail();
    }
}

/// Read one output stream line by line into the shared channel.
///
/// Returns `true` when the stream reached EOF cleanly, `false` when reading
/// failed or the receiving side went away mid-stream.
async fn forward_lines<R>(reader: R, tx: mpsc::Sender<String>) -> bool
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(line).await.is_err() {
                    return false;
                }
            }
            Ok(None) => return true,
            Err(e) => {
                tracing::warn!("Subprocess output stream read failed: {}", e);
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_needs_marker_or_clean_eof() {
        let broken = ProcessOutcome {
            code: Some(1),
            saw_completion: false,
            streams_closed: false,
        };
        assert!(!broken.indicates_completion());

        let marker_only = ProcessOutcome {
            code: None,
            saw_completion: true,
            streams_closed: false,
        };
        assert!(marker_only.indicates_completion());

        let clean_eof = ProcessOutcome {
            code: Some(0),
            saw_completion: false,
            streams_closed: true,
        };
        assert!(clean_eof.indicates_completion());
    }

    #[tokio::test]
    async fn forward_lines_reports_clean_eof() {
        let (tx, mut rx) = mpsc::channel(8);
        let clean = forward_lines(&b"one\ntwo\n"[..], tx).await;

        assert!(clean);
        assert_eq!(rx.recv().await.unwrap(), "one");
        assert_eq!(rx.recv().await.unwrap(), "two");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn forward_lines_reports_dropped_receiver() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        assert!(!forward_lines(&b"orphan line\n"[..], tx).await);
    }
}
