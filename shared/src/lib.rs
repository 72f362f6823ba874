/// Shared building blocks for the Kairos clip server.
///
/// Holds the pieces both the engine and the HTTP server need: the
/// request-level domain types, clip timecode parsing, and the unified
/// error types.
pub mod errors;
pub mod models;
pub mod timecode;
