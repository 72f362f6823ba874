/// Kairos Clip Server
///
/// Web service that downloads online media through yt-dlp, optionally
/// trims it to a clip range with ffmpeg, and streams the result back as
/// a file attachment. Also serves the bundled web UI.
mod routes;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::post;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use kairos_engine::extractor::Extractor;
use kairos_engine::tools;
use kairos_engine::trimmer::Trimmer;

/// Shared application state for all handlers.
pub struct AppState {
    pub extractor: Extractor,
    pub trimmer: Trimmer,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "kairos_server=info,kairos_engine=info,kairos_shared=info,tower_http=info".into()
            }),
        )
        .init();

    // Config
    let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("SERVER_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);
    let download_dir = PathBuf::from(
        std::env::var("DOWNLOAD_DIR").unwrap_or_else(|_| "./downloads".to_string()),
    );
    let www_dir = std::env::var("WWW_DIR").unwrap_or_else(|_| "./www".to_string());
    let extract_timeout: u64 = std::env::var("EXTRACT_TIMEOUT_SECS")
        .unwrap_or_else(|_| "600".to_string())
        .parse()
        .unwrap_or(600);
    let trim_timeout: u64 = std::env::var("TRIM_TIMEOUT_SECS")
        .unwrap_or_else(|_| "300".to_string())
        .parse()
        .unwrap_or(300);

    std::fs::create_dir_all(&download_dir)?;
    info!("Download directory: {}", download_dir.display());

    // External tools
    let ytdlp_bin = tools::resolve_tool("YTDLP_BIN", "yt-dlp");
    let ffmpeg_bin = tools::resolve_tool("FFMPEG_BIN", "ffmpeg");
    match tools::probe_version(&ytdlp_bin, "--version").await {
        Some(version) => info!("yt-dlp {} at {:?}", version, ytdlp_bin),
        None => warn!("yt-dlp not runnable at {:?}, downloads will fail", ytdlp_bin),
    }
    match tools::probe_version(&ffmpeg_bin, "-version").await {
        Some(version) => info!("{} at {:?}", version, ffmpeg_bin),
        None => warn!("ffmpeg not runnable at {:?}, trimming will fail", ffmpeg_bin),
    }

    // App state
    let state = Arc::new(AppState {
        extractor: Extractor::new(
            ytdlp_bin,
            download_dir,
            Duration::from_secs(extract_timeout),
        ),
        trimmer: Trimmer::new(ffmpeg_bin, Duration::from_secs(trim_timeout)),
    });

    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Router: the API route plus static file service for the web UI
    let app = Router::new()
        .route("/download", post(routes::download))
        .fallback_service(ServeDir::new(&www_dir))
        .layer(cors)
        .with_state(state);

    // Bind
    let addr = format!("{}:{}", host, port);
    info!("Kairos listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
