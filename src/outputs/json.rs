//! JSON output of the resolved record.
//!
//! One file per archive day, named after the record's own date. When retries
//! replaced the requested day, the file is named after the day actually shown.

use crate::dates::format_date;
use crate::models::ApodRecord;
use crate::utils::ensure_writable_dir;
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

/// Write `record` to `{json_output_dir}/{date}.json` and return the path.
///
/// # Errors
///
/// Directory creation, the write check, or the file write failing.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_record(
    record: &ApodRecord,
    json_output_dir: &str,
) -> Result<String, Box<dyn Error>> {
    ensure_writable_dir(json_output_dir).await?;

    let json = serde_json::to_string_pretty(record)?;
    let path = format!(
        "{}/{}.json",
        json_output_dir.trim_end_matches('/'),
        format_date(record.date)
    );

    info!(path = %path, "Writing JSON");
    fs::write(&path, json).await?;
    info!(path = %path, "Wrote JSON record");
    Ok(path)
}
