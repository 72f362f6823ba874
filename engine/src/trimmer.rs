/// Clip trimming via ffmpeg.
///
/// Derives the `_trimmed` output path next to the source file and builds
/// the cut arguments for the requested range.
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use kairos_shared::errors::TrimError;
use kairos_shared::models::MediaFormat;
use kairos_shared::timecode::ClipRange;

/// Runs the trim tool against an already downloaded file.
pub struct Trimmer {
    bin: PathBuf,
    timeout: Duration,
}

impl Trimmer {
    pub fn new(bin: PathBuf, timeout: Duration) -> Self {
        Self { bin, timeout }
    }

    /// Cut `source` down to `range`, producing a `_trimmed` sibling file
    /// and returning its path. The source file is left in place.
    pub async fn trim(
        &self,
        source: &Path,
        format: MediaFormat,
        range: ClipRange,
    ) -> Result<PathBuf, TrimError> {
        let output_path = trimmed_path(source);
        let args = build_trim_args(source, &output_path, format, range);
        info!("Running {:?} {:?}", self.bin, args);

        let result = Command::new(&self.bin)
            .args(&args)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, result)
            .await
            .map_err(|_| TrimError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| {
                TrimError::SpawnFailed(format!("Failed to run {:?}: {}", self.bin, e))
            })?;

        if !output.status.success() {
            return Err(TrimError::Failed(last_stderr_line(&output.stderr)));
        }

        debug!("ffmpeg stdout: {}", String::from_utf8_lossy(&output.stdout).trim());
        debug!("ffmpeg stderr: {}", String::from_utf8_lossy(&output.stderr).trim());
        debug!("Trim finished: {}", output_path.display());
        Ok(output_path)
    }
}

/// `<stem>_trimmed.<ext>` next to the source file, so both files of a
/// request share a base name.
fn trimmed_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("clip");
    let name = match source.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_trimmed.{}", stem, ext),
        None => format!("{}_trimmed", stem),
    };
    source.with_file_name(name)
}

/// ffmpeg argument list for the cut.
///
/// Seeking stays after `-i` so the cut lands on the requested second
/// instead of snapping to a keyframe. Audio is stream-copied; video is
/// re-encoded so the clip plays everywhere.
fn build_trim_args(
    source: &Path,
    output: &Path,
    format: MediaFormat,
    range: ClipRange,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-hide_banner".into(),
        "-i".into(),
        source.display().to_string(),
    ];

    if let Some(start) = range.start {
        args.extend(["-ss".into(), start.to_string()]);
    }
    if let Some(duration) = range.duration() {
        args.extend(["-t".into(), duration.to_string()]);
    } else if let Some(end) = range.end {
        args.extend(["-to".into(), end.to_string()]);
    }

    if format.is_audio() {
        args.extend(["-c".into(), "copy".into()]);
    } else {
        args.extend([
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            "veryfast".into(),
            "-crf".into(),
            "23".into(),
            "-c:a".into(),
            "copy".into(),
        ]);
    }

    args.push(output.display().to_string());
    args
}

/// ffmpeg reports the cause on its last stderr line; progress lines use
/// bare carriage returns, so split on both.
fn last_stderr_line(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or("Unknown FFmpeg error")
        .to_string()
}
