/// Unified error types for the Kairos system.
use thiserror::Error;

/// Top-level error type for the download pipeline.
#[derive(Debug, Error)]
pub enum KairosError {
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Trim error: {0}")]
    Trim(#[from] TrimError),
}

/// Errors from the media extraction subprocess.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to spawn extractor: {0}")]
    SpawnFailed(String),

    #[error("Extractor exited with an error: {0}")]
    Failed(String),

    #[error("Extractor reported no output path")]
    MissingOutputPath,

    #[error("Extractor output missing on disk: {0}")]
    FileNotFound(String),

    #[error("Extraction timed out after {0}s")]
    Timeout(u64),
}

/// Errors from the trim subprocess.
#[derive(Debug, Error)]
pub enum TrimError {
    #[error("Failed to spawn ffmpeg: {0}")]
    SpawnFailed(String),

    #[error("ffmpeg exited with an error: {0}")]
    Failed(String),

    #[error("Trim timed out after {0}s")]
    Timeout(u64),
}

/// Result type alias for Kairos operations.
pub type KairosResult<T> = Result<T, KairosError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsystem_errors_convert() {
        let err: KairosError = ExtractError::MissingOutputPath.into();
        assert!(matches!(err, KairosError::Extract(_)));

        let err: KairosError = TrimError::Timeout(300).into();
        assert!(matches!(err, KairosError::Trim(_)));
    }

    #[test]
    fn test_display_carries_detail() {
        let err = KairosError::Trim(TrimError::Failed("Invalid data found".into()));
        assert_eq!(
            err.to_string(),
            "Trim error: ffmpeg exited with an error: Invalid data found"
        );
    }
}
