//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds a full [`AppContext`] around a fake
//! yt-dlp (a shell script written into a temp dir), so no network access or
//! real tool install is needed. The [`with_server`] constructor starts Axum
//! on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tapedeck::config::Config;
use tapedeck::server::{create_router, AppContext};

/// A fake-yt-dlp script body that resolves a 3-item playlist and then
/// "downloads" it with item 2 private. Everything is printed on stdout so
/// event ordering is deterministic in tests.
pub const THREE_ITEM_PLAYLIST: &str = r#"
case "$*" in
  *--dump-single-json*)
    echo '{"title":"Test Mix","entries":[{},{},{}]}'
    ;;
  *)
    echo '[youtube] aaaaaaaaaa1: Downloading webpage'
    echo '[download] Destination: downloads/First Song.webm'
    echo '[download]  50.0% of 4.00MiB at 1.00MiB/s ETA 00:02'
    echo '[download] 100% of 4.00MiB in 00:04'
    echo '[ExtractAudio] Destination: downloads/First Song.mp3'
    echo 'ERROR: [youtube] bbbbbbbbbb2: Private video. Sign in if you have been granted access'
    echo '[youtube] cccccccccc3: Downloading webpage'
    echo '[download] 100% of 3.00MiB in 00:03'
    echo '[ExtractAudio] Destination: downloads/Third Song.mp3'
    echo '[download] Finished downloading playlist: Test Mix'
    exit 1
    ;;
esac
"#;

pub struct TestHarness {
    pub ctx: AppContext,
    // Holds the fake tool and output dir for the lifetime of the test.
    _tmp: tempfile::TempDir,
}

impl TestHarness {
    /// Create a harness whose yt-dlp is a shell script with the given body.
    pub fn with_fake_tool(script_body: &str) -> Self {
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        let tool = write_fake_tool(tmp.path(), script_body);

        let mut config = Config::default();
        config.tools.ytdlp = tool.to_string_lossy().into_owned();
        config.download.output_dir = tmp.path().join("downloads");
        config.server.static_dir = None;

        Self {
            ctx: AppContext::new(config),
            _tmp: tmp,
        }
    }

    /// Harness around the standard 3-item fixture.
    pub fn new() -> Self {
        Self::with_fake_tool(THREE_ITEM_PLAYLIST)
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server(script_body: &str) -> (Self, SocketAddr) {
        let harness = Self::with_fake_tool(script_body);
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }
}

/// Write an executable shell script acting as the external tool.
pub fn write_fake_tool(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("yt-dlp");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("failed to write fake tool");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("failed to chmod fake tool");
    path
}
