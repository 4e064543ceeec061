//! Utility functions for text shaping, URL rewriting, and file system checks.
//!
//! - Card text truncation
//! - Video page URLs rewritten to their embeddable form
//! - Log-friendly truncation of response bodies
//! - File system validation for output directories

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Shorten `text` to at most `n` characters, ending in `…` when cut.
///
/// Counts characters, not bytes, so multi-byte text is never split.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate("Andromeda", 5), "Andr…");
/// assert_eq!(truncate("M31", 5), "M31");
/// ```
pub fn truncate(text: &str, n: usize) -> String {
    if text.chars().count() <= n {
        return text.to_string();
    }
    let mut out: String = text.chars().take(n.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Rewrite a YouTube watch or short link into its `/embed/` form.
///
/// Anything else, including URLs that fail to parse, comes back unchanged.
pub fn make_embed_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return url.to_string();
    };

    if host.contains("youtube.com") {
        if let Some((_, id)) = parsed.query_pairs().find(|(k, _)| k == "v") {
            return format!("https://www.youtube.com/embed/{id}");
        }
    }
    if host == "youtu.be" {
        let id = parsed.path().trim_start_matches('/');
        return format!("https://www.youtube.com/embed/{id}");
    }
    url.to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` bytes (backing off to a character boundary)
/// with `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a scratch file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let scratch = format!("{}/..__write_check__", path.trim_end_matches('/'));
    stdfs::File::create(&scratch)?;
    let _ = stdfs::remove_file(&scratch);
    info!("Output directory is writable");
    Ok(())
}
