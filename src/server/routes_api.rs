use crate::job::{JobRunner, JobState, SubmitError};
use crate::server::AppContext;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/download", post(submit_download))
        .route("/job", get(current_job))
}

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub playlist_url: String,
    #[serde(default)]
    pub include_metadata: bool,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub accepted: bool,
    pub job_id: uuid::Uuid,
    pub playlist_title: String,
    pub total_videos: Option<usize>,
}

/// Accept a playlist submission and start the batch job.
///
/// The response only reflects whether the job could be started; everything
/// downstream (skips, tool errors, even total failure mid-run) is reported
/// over the event stream.
///
/// Once the slot is claimed the whole job runs as a detached task. The
/// handler only waits for the post-resolution snapshot, so a client that
/// disconnects mid-probe cancels nothing: the job still runs to a terminal
/// state and the slot frees as usual.
async fn submit_download(
    State(ctx): State<AppContext>,
    Json(payload): Json<DownloadRequest>,
) -> Result<(StatusCode, Json<DownloadResponse>), (StatusCode, String)> {
    let handle = ctx
        .jobs
        .try_begin(&payload.playlist_url)
        .map_err(reject)?;

    let runner = JobRunner::new(ctx.config.clone(), ctx.bus.clone());
    let include_metadata = payload.include_metadata;
    let (ack_tx, ack_rx) = oneshot::channel();

    tokio::spawn(async move {
        // Resolve before acknowledging so the response can carry the title
        // and count. Degraded resolution still acknowledges.
        runner.resolve_metadata(&handle, include_metadata).await;
        let _ = ack_tx.send(handle.read().clone());
        runner.download(handle, include_metadata).await;
    });

    let snapshot = ack_rx.await.map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Job task ended before acknowledgment".to_string(),
        )
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DownloadResponse {
            accepted: true,
            job_id: snapshot.id,
            playlist_title: snapshot.title,
            total_videos: snapshot.expected_items,
        }),
    ))
}

/// Snapshot of the current (or most recent) job.
async fn current_job(State(ctx): State<AppContext>) -> Result<Json<JobState>, StatusCode> {
    ctx.jobs.current().map(Json).ok_or(StatusCode::NOT_FOUND)
}

fn reject(err: SubmitError) -> (StatusCode, String) {
    let status = match err {
        SubmitError::EmptySource => StatusCode::BAD_REQUEST,
        SubmitError::JobInProgress => StatusCode::CONFLICT,
    };
    (status, err.to_string())
}
