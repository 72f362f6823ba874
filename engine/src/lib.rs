/// Kairos media engine.
///
/// Subprocess layer around the external tools: yt-dlp for extraction
/// and ffmpeg for trimming. Nothing here touches HTTP; the server crate
/// drives these and translates their errors into responses.
pub mod extractor;
pub mod tools;
pub mod trimmer;
