/// Media extraction via the yt-dlp command line.
///
/// Builds the argument list for the requested format and quality, runs
/// the tool bounded by a timeout, and resolves the path of the file it
/// produced.
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use kairos_shared::errors::ExtractError;
use kairos_shared::models::MediaFormat;

/// Quality value meaning "let the tool pick".
pub const QUALITY_BEST: &str = "best";

/// Runs the extraction tool and locates its output file.
pub struct Extractor {
    bin: PathBuf,
    output_dir: PathBuf,
    timeout: Duration,
}

impl Extractor {
    pub fn new(bin: PathBuf, output_dir: PathBuf, timeout: Duration) -> Self {
        Self { bin, output_dir, timeout }
    }

    /// Download `url` as `format`, returning the path of the produced
    /// file. Files are named from the media title inside the output
    /// directory.
    pub async fn fetch(
        &self,
        url: &str,
        format: MediaFormat,
        quality: &str,
    ) -> Result<PathBuf, ExtractError> {
        let template = self.output_dir.join("%(title)s.%(ext)s");
        let args = build_fetch_args(&template, url, format, quality);
        debug!("Running {:?} {:?}", self.bin, args);

        let result = Command::new(&self.bin)
            .args(&args)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, result)
            .await
            .map_err(|_| ExtractError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| {
                ExtractError::SpawnFailed(format!("Failed to run {:?}: {}", self.bin, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            if detail.is_empty() {
                return Err(ExtractError::Failed(format!("exit status {}", output.status)));
            }
            return Err(ExtractError::Failed(detail.to_string()));
        }

        // The final path is printed last, after any progress output.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let printed = stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or(ExtractError::MissingOutputPath)?;

        let path = ensure_extension(PathBuf::from(printed), format);
        if !path.exists() {
            return Err(ExtractError::FileNotFound(path.display().to_string()));
        }

        info!("Extractor produced {}", path.display());
        Ok(path)
    }
}

/// Build the yt-dlp argument list. The URL always goes last.
fn build_fetch_args(
    template: &Path,
    url: &str,
    format: MediaFormat,
    quality: &str,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--no-warnings".into(),
        "--no-playlist".into(),
        "-o".into(),
        template.display().to_string(),
        "--print".into(),
        "after_move:filepath".into(),
        "--no-simulate".into(),
    ];

    match format {
        MediaFormat::Mp3 => {
            args.extend([
                "-f".into(),
                "bestaudio/best".into(),
                "--extract-audio".into(),
                "--audio-format".into(),
                "mp3".into(),
            ]);
            // The flag wants a bitrate or VBR level; "best" means leave
            // the encoder default alone.
            if quality != QUALITY_BEST {
                args.extend(["--audio-quality".into(), quality.into()]);
            }
        }
        MediaFormat::Mp4 => {
            let selector = if quality == QUALITY_BEST {
                "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".to_string()
            } else {
                format!(
                    "bestvideo[height<={}][ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best",
                    quality
                )
            };
            args.extend([
                "-f".into(),
                selector,
                "--recode-video".into(),
                "mp4".into(),
            ]);
        }
    }

    args.push(url.into());
    args
}

/// Normalize the reported path to the requested container extension.
/// Post-processing can change the container after the path was formed.
fn ensure_extension(path: PathBuf, format: MediaFormat) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext == format.ext() => path,
        _ => path.with_extension(format.ext()),
    }
}
