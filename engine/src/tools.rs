/// External tool resolution.
///
/// Locates the yt-dlp and ffmpeg binaries from an env override, common
/// install locations, or a plain PATH lookup at spawn time.
use std::path::{Path, PathBuf};

use tokio::process::Command;

/// Common install locations checked before falling back to PATH.
const COMMON_DIRS: [&str; 5] = [
    "/usr/local/bin",
    "/usr/bin",
    "/snap/bin",
    "/opt/homebrew/bin",
    "/home/linuxbrew/.linuxbrew/bin",
];

/// Resolve the binary for an external tool.
///
/// An env override wins when set and nonempty. Otherwise the common
/// install directories are probed, and if none has the tool the bare
/// name is returned so the spawn resolves it through PATH.
pub fn resolve_tool(env_key: &str, name: &str) -> PathBuf {
    if let Ok(overridden) = std::env::var(env_key) {
        if !overridden.trim().is_empty() {
            return PathBuf::from(overridden);
        }
    }

    for dir in COMMON_DIRS {
        let candidate = PathBuf::from(dir).join(name);
        if candidate.exists() {
            return candidate;
        }
    }

    PathBuf::from(name)
}

/// Probe a tool with its version flag, returning the first output line.
///
/// `None` means the tool could not be run at all or reported failure.
pub async fn probe_version(bin: &Path, version_arg: &str) -> Option<String> {
    let output = Command::new(bin).arg(version_arg).output().await.ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next()?.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_override_wins() {
        std::env::set_var("KAIROS_TEST_TOOL_BIN", "/opt/custom/mytool");
        let resolved = resolve_tool("KAIROS_TEST_TOOL_BIN", "mytool");
        std::env::remove_var("KAIROS_TEST_TOOL_BIN");
        assert_eq!(resolved, PathBuf::from("/opt/custom/mytool"));
    }

    #[test]
    fn test_empty_override_is_ignored() {
        std::env::set_var("KAIROS_TEST_EMPTY_BIN", "  ");
        let resolved = resolve_tool("KAIROS_TEST_EMPTY_BIN", "kairos-no-such-tool");
        std::env::remove_var("KAIROS_TEST_EMPTY_BIN");
        // Not installed anywhere, so the bare name falls through to PATH.
        assert_eq!(resolved, PathBuf::from("kairos-no-such-tool"));
    }

    #[test]
    fn test_unknown_tool_falls_back_to_bare_name() {
        let resolved = resolve_tool("KAIROS_TEST_UNSET_BIN", "kairos-no-such-tool");
        assert_eq!(resolved, PathBuf::from("kairos-no-such-tool"));
    }

    #[tokio::test]
    async fn test_probe_version_missing_tool() {
        let version = probe_version(Path::new("kairos-no-such-tool"), "--version").await;
        assert!(version.is_none());
    }
}
