//! Log file location, ANSI stripping and timestamps.
use std::fs;
use std::path::{Path, PathBuf};

/// Directory under the cache root holding lego's log files.
const LOG_DIR: &str = "lego";

/// Remove CSI escape sequences (colours, cursor movement) from `s`.
///
/// A lone `ESC` not followed by `[` is dropped together with the next
/// character.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        if chars.next() == Some('[') {
            // Parameters and intermediates run until the final byte.
            chars.by_ref().find(|ch| ('@'..='~').contains(ch));
        }
    }
    out
}

/// Cache root: `$XDG_CACHE_HOME`, else `$HOME/.cache`, else `./.cache`.
fn cache_root(xdg_cache_home: Option<&str>, home: Option<&str>) -> PathBuf {
    match (xdg_cache_home, home) {
        (Some(xdg), _) if !xdg.is_empty() => PathBuf::from(xdg),
        (_, Some(home)) if !home.is_empty() => Path::new(home).join(".cache"),
        _ => PathBuf::from(".cache"),
    }
}

/// Path of the log file for `command`, e.g. `~/.cache/lego/build.log`.
///
/// Returns `None` when the log directory cannot be created; logging then
/// stays console-only.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    let xdg = std::env::var("XDG_CACHE_HOME").ok();
    let home = std::env::var("HOME").ok();
    let dir = cache_root(xdg.as_deref(), home.as_deref()).join(LOG_DIR);
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join(format!("{command}.log")))
}

/// Current UTC time as `YYYY-MM-DD HH:MM:SS`, used in the log file header.
pub(super) fn format_utc_datetime() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Current UTC time as `HH:MM:SS`, prefixed to every log file line.
pub(super) fn format_utc_time() -> String {
    chrono::Utc::now().format("%H:%M:%S").to_string()
}
