/// Request-level domain types shared across the Kairos crates.

/// Output container requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Mp3,
    Mp4,
}

impl MediaFormat {
    /// Parse the client-supplied format string. Only the two supported
    /// containers are accepted; anything else is rejected up front.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mp3" => Some(MediaFormat::Mp3),
            "mp4" => Some(MediaFormat::Mp4),
            _ => None,
        }
    }

    /// File extension without the dot.
    pub fn ext(&self) -> &'static str {
        match self {
            MediaFormat::Mp3 => "mp3",
            MediaFormat::Mp4 => "mp4",
        }
    }

    /// MIME type for the download response.
    pub fn content_type(&self) -> &'static str {
        match self {
            MediaFormat::Mp3 => "audio/mpeg",
            MediaFormat::Mp4 => "video/mp4",
        }
    }

    /// Whether this is the audio-only container.
    pub fn is_audio(&self) -> bool {
        matches!(self, MediaFormat::Mp3)
    }
}

impl std::fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ext())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_supported_formats() {
        assert_eq!(MediaFormat::parse("mp3"), Some(MediaFormat::Mp3));
        assert_eq!(MediaFormat::parse("mp4"), Some(MediaFormat::Mp4));
    }

    #[test]
    fn test_parse_rejects_everything_else() {
        assert_eq!(MediaFormat::parse("avi"), None);
        assert_eq!(MediaFormat::parse("MP3"), None);
        assert_eq!(MediaFormat::parse(""), None);
        assert_eq!(MediaFormat::parse("mp3 "), None);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(MediaFormat::Mp3.content_type(), "audio/mpeg");
        assert_eq!(MediaFormat::Mp4.content_type(), "video/mp4");
    }

    #[test]
    fn test_display_matches_extension() {
        assert_eq!(MediaFormat::Mp3.to_string(), "mp3");
        assert_eq!(MediaFormat::Mp4.to_string(), "mp4");
    }
}
