/// Route handlers for the Kairos clip server.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};
use uuid::Uuid;

use kairos_shared::errors::{ExtractError, KairosError, KairosResult, TrimError};
use kairos_shared::models::MediaFormat;
use kairos_shared::timecode::{format_timecode, ClipRange};

use crate::AppState;

// ====== REQUEST / RESPONSE TYPES ======

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadBody {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub format: String,
    #[serde(default = "default_quality")]
    pub quality: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

fn default_quality() -> String {
    "best".to_string()
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

// Response texts the web client displays verbatim.
const ERR_INVALID_INPUT: &str = "Invalid input: URL and format are required.";
const ERR_RANGE_ORDER: &str = "Invalid time range: end time must be greater than start time.";
const ERR_DOWNLOAD_FAILED: &str =
    "Failed to download or process video. Please check the URL and format.";
const ERR_FILE_MISSING: &str = "File not found after initial download. Check logs.";
const ERR_FINAL_MISSING: &str = "Final file not found after processing. Check logs.";
const ERR_INTERNAL: &str = "An internal server error occurred.";

// ====== DOWNLOAD ROUTE ======

/// POST /download
///
/// Validates the request, runs the fetch and optional trim pipeline,
/// and streams the produced file back as an attachment.
pub async fn download(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DownloadBody>, JsonRejection>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let Json(body) = payload.map_err(|rejection| {
        warn!("Rejected request body: {}", rejection);
        bad_request(ERR_INVALID_INPUT)
    })?;

    // Tag all log lines of one request with a short id.
    let request_id = Uuid::new_v4().to_string();
    let rid: String = request_id.chars().take(8).collect();

    let format = match MediaFormat::parse(&body.format) {
        Some(format) if !body.url.is_empty() => format,
        _ => {
            warn!("[{}] Rejected request: url or format missing", rid);
            return Err(bad_request(ERR_INVALID_INPUT));
        }
    };

    let range = ClipRange::from_inputs(body.start_time.as_deref(), body.end_time.as_deref());
    if !range.is_ordered() {
        warn!(
            "[{}] Rejected request: end {:?} not after start {:?}",
            rid, body.end_time, body.start_time
        );
        return Err(bad_request(ERR_RANGE_ORDER));
    }

    let clip = match (range.start, range.end) {
        (None, None) => "full".to_string(),
        (start, end) => format!(
            "{}..{}",
            start.map(format_timecode).unwrap_or_default(),
            end.map(format_timecode).unwrap_or_default()
        ),
    };
    info!(
        "[{}] Download request: url={} format={} quality={} clip={}",
        rid, body.url, format, body.quality, clip
    );

    let path = produce_file(&state, &rid, &body.url, format, &body.quality, range)
        .await
        .map_err(|err| error_response(&rid, &err))?;

    if !path.exists() {
        error!("[{}] Produced file missing on disk: {}", rid, path.display());
        return Err(internal(ERR_FINAL_MISSING));
    }

    stream_file(&rid, &path, format).await
}

/// Run the fetch, the optional trim, and the source cleanup, returning
/// the file to send back.
async fn produce_file(
    state: &AppState,
    rid: &str,
    url: &str,
    format: MediaFormat,
    quality: &str,
    range: ClipRange,
) -> KairosResult<PathBuf> {
    let source = state.extractor.fetch(url, format, quality).await?;

    if range.is_unbounded() {
        return Ok(source);
    }

    let trimmed = state.trimmer.trim(&source, format, range).await?;

    // The untrimmed original is no longer needed.
    if let Err(e) = tokio::fs::remove_file(&source).await {
        warn!(
            "[{}] Could not remove untrimmed source {}: {}",
            rid,
            source.display(),
            e
        );
    }

    Ok(trimmed)
}

/// Stream the produced file as an attachment named after it.
async fn stream_file(
    rid: &str,
    path: &Path,
    format: MediaFormat,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download");

    let file = tokio::fs::File::open(path).await.map_err(|e| {
        error!("[{}] Cannot open produced file {}: {}", rid, path.display(), e);
        internal(ERR_INTERNAL)
    })?;

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', "_"));
    info!("[{}] Sending {}", rid, filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

// ====== ERROR TRANSLATION ======

/// Map pipeline errors onto the JSON bodies the web client expects.
fn error_response(rid: &str, err: &KairosError) -> (StatusCode, Json<ErrorBody>) {
    match err {
        KairosError::Extract(e) => {
            error!("[{}] yt-dlp download error: {}", rid, e);
            match e {
                ExtractError::Failed(_) | ExtractError::Timeout(_) => {
                    internal(ERR_DOWNLOAD_FAILED)
                }
                ExtractError::MissingOutputPath | ExtractError::FileNotFound(_) => {
                    internal(ERR_FILE_MISSING)
                }
                ExtractError::SpawnFailed(_) => internal(ERR_INTERNAL),
            }
        }
        KairosError::Trim(e) => {
            error!("[{}] FFmpeg error: {}", rid, e);
            match e {
                TrimError::Failed(detail) => {
                    internal(&format!("Failed to trim video: {}", detail))
                }
                TrimError::SpawnFailed(_) | TrimError::Timeout(_) => internal(ERR_INTERNAL),
            }
        }
    }
}

fn bad_request(message: &str) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody { error: message.to_string() }),
    )
}

fn internal(message: &str) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody { error: message.to_string() }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    use kairos_engine::extractor::Extractor;
    use kairos_engine::trimmer::Trimmer;

    /// App wired to nonexistent tool binaries. Validation failures never
    /// reach the tools; anything that does fails with a spawn error.
    fn test_app() -> Router {
        let state = Arc::new(AppState {
            extractor: Extractor::new(
                PathBuf::from("kairos-test-missing-ytdlp"),
                PathBuf::from("downloads"),
                Duration::from_secs(5),
            ),
            trimmer: Trimmer::new(
                PathBuf::from("kairos-test-missing-ffmpeg"),
                Duration::from_secs(5),
            ),
        });
        Router::new()
            .route("/download", post(download))
            .with_state(state)
    }

    async fn post_raw(body: String) -> (StatusCode, String) {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/download")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    async fn post_download(body: serde_json::Value) -> (StatusCode, String) {
        post_raw(body.to_string()).await
    }

    #[tokio::test]
    async fn test_rejects_missing_url() {
        let (status, body) = post_download(serde_json::json!({ "format": "mp3" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains(ERR_INVALID_INPUT));
    }

    #[tokio::test]
    async fn test_rejects_unknown_format() {
        let (status, body) = post_download(serde_json::json!({
            "url": "https://example.com/v",
            "format": "avi"
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains(ERR_INVALID_INPUT));
    }

    #[tokio::test]
    async fn test_rejects_malformed_json() {
        let (status, body) = post_raw("not json".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains(ERR_INVALID_INPUT));
    }

    #[tokio::test]
    async fn test_rejects_unordered_range() {
        let (status, body) = post_download(serde_json::json!({
            "url": "https://example.com/v",
            "format": "mp4",
            "startTime": "2:00",
            "endTime": "1:00"
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains(ERR_RANGE_ORDER));
    }

    #[tokio::test]
    async fn test_invalid_times_do_not_reject_request() {
        // Bad timecodes are dropped, so the request proceeds to the
        // extractor, which cannot be spawned in tests.
        let (status, body) = post_download(serde_json::json!({
            "url": "https://example.com/v",
            "format": "mp3",
            "startTime": "garbage",
            "endTime": ""
        }))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains(ERR_INTERNAL));
    }

    #[test]
    fn test_body_defaults() {
        let body: DownloadBody = serde_json::from_str(r#"{"url":"u","format":"mp3"}"#).unwrap();
        assert_eq!(body.quality, "best");
        assert!(body.start_time.is_none());
        assert!(body.end_time.is_none());
    }

    #[test]
    fn test_body_camel_case_fields() {
        let body: DownloadBody = serde_json::from_str(
            r#"{"url":"u","format":"mp4","quality":"720","startTime":"1:00","endTime":"2:00"}"#,
        )
        .unwrap();
        assert_eq!(body.quality, "720");
        assert_eq!(body.start_time.as_deref(), Some("1:00"));
        assert_eq!(body.end_time.as_deref(), Some("2:00"));
    }

    #[test]
    fn test_extract_failure_maps_to_download_message() {
        let err = KairosError::Extract(ExtractError::Failed("boom".into()));
        let (status, Json(body)) = error_response("test", &err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, ERR_DOWNLOAD_FAILED);
    }

    #[test]
    fn test_missing_output_maps_to_file_message() {
        let err = KairosError::Extract(ExtractError::MissingOutputPath);
        let (status, Json(body)) = error_response("test", &err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, ERR_FILE_MISSING);
    }

    #[test]
    fn test_trim_failure_embeds_stderr_detail() {
        let err = KairosError::Trim(TrimError::Failed("Invalid data found".into()));
        let (status, Json(body)) = error_response("test", &err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Failed to trim video: Invalid data found");
    }

    #[test]
    fn test_spawn_failures_stay_generic() {
        let err = KairosError::Extract(ExtractError::SpawnFailed("no such file".into()));
        let (_, Json(body)) = error_response("test", &err);
        assert_eq!(body.error, ERR_INTERNAL);

        let err = KairosError::Trim(TrimError::SpawnFailed("no such file".into()));
        let (_, Json(body)) = error_response("test", &err);
        assert_eq!(body.error, ERR_INTERNAL);
    }
}
