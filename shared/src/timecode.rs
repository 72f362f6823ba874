/// Clip timecode parsing and validation.
///
/// Accepts the `MM:SS` and `H:MM:SS` strings the web form sends.
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Accepted shape: optional hours, one or two minute digits capped at 59,
/// exactly two second digits capped at 59.
static TIMECODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+:)?[0-5]?\d:[0-5]\d$").unwrap()
});

/// Parse a timecode string into whole seconds.
///
/// Returns `None` for anything that does not match the accepted shape,
/// including values that would overflow.
pub fn parse_timecode(input: &str) -> Option<u32> {
    if !TIMECODE_RE.is_match(input) {
        return None;
    }

    let mut total: u32 = 0;
    for part in input.split(':') {
        let value: u32 = part.parse().ok()?;
        total = total.checked_mul(60)?.checked_add(value)?;
    }
    Some(total)
}

/// Format whole seconds back into the accepted shape, for log lines.
pub fn format_timecode(total: u32) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Clip boundaries in whole seconds, both optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClipRange {
    pub start: Option<u32>,
    pub end: Option<u32>,
}

impl ClipRange {
    /// Build a range from the raw form inputs.
    ///
    /// Strings that fail validation are ignored as if the field had been
    /// left empty, so a bad timecode never blocks the download itself.
    pub fn from_inputs(start: Option<&str>, end: Option<&str>) -> Self {
        ClipRange {
            start: resolve_bound("startTime", start),
            end: resolve_bound("endTime", end),
        }
    }

    /// True when neither boundary is set and no trim step is needed.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// False only when both boundaries are set and the end does not come
    /// after the start.
    pub fn is_ordered(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => end > start,
            _ => true,
        }
    }

    /// Clip length in seconds, available once both boundaries are set.
    pub fn duration(&self) -> Option<u32> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if end > start => Some(end - start),
            _ => None,
        }
    }
}

fn resolve_bound(field: &str, raw: Option<&str>) -> Option<u32> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    match parse_timecode(raw) {
        Some(seconds) => Some(seconds),
        None => {
            warn!("Ignoring invalid {} value: {:?}", field, raw);
            None
        }
    }
}
