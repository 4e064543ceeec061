//! Markdown project card for a resolved record.
//!
//! The card mirrors what the widget showed next to the background: a
//! thumbnail, the title and date, a short explanation, where the backdrop came
//! from, and a link to the day's archive page.

use crate::api::Resolved;
use crate::dates::format_date;
use crate::models::{ApodRecord, Backdrop, MediaType};
use crate::utils::{ensure_writable_dir, make_embed_url, truncate};
use chrono::{Datelike, NaiveDate};
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

/// Explanation length on the card, in characters.
pub const SNIPPET_CHARS: usize = 280;

/// Archive page for a day, e.g. `https://apod.nasa.gov/apod/ap041019.html`.
pub fn archive_page_url(date: NaiveDate) -> String {
    format!(
        "https://apod.nasa.gov/apod/ap{:02}{:02}{:02}.html",
        date.year() % 100,
        date.month(),
        date.day()
    )
}

/// Render the card.
pub fn render_card(resolved: &Resolved) -> String {
    let record = &resolved.record;
    let mut lines = Vec::new();

    let title: &str = if record.title.is_empty() {
        "Astronomy Picture of the Day"
    } else {
        &record.title
    };
    lines.push(format!("# {title}"));
    lines.push(String::new());
    lines.push(format!("*{}*", format_date(record.date)));
    lines.push(String::new());
    lines.push(format!("![{}]({})", title, record.card_thumbnail()));
    lines.push(String::new());

    if !record.explanation.is_empty() {
        lines.push(truncate(&record.explanation, SNIPPET_CHARS));
        lines.push(String::new());
    }

    lines.push(format!("**Backdrop:** {}", backdrop_line(record)));
    if resolved.retries > 0 {
        lines.push(String::new());
        lines.push(format!(
            "<small>Skipped {} video date(s) in {} attempt(s).</small>",
            resolved.retries, resolved.attempts
        ));
    }
    lines.push(String::new());

    if let (MediaType::Video, Some(url)) = (&record.media_type, &record.url) {
        lines.push(format!("[Watch video]({})", make_embed_url(url)));
        lines.push(String::new());
    }

    if let Some(credit) = &record.copyright {
        lines.push(format!("Credit: {}", credit.trim()));
        lines.push(String::new());
    }

    lines.push(format!("[Learn More →]({})", archive_page_url(record.date)));
    lines.push(String::new());
    lines.join("\n")
}

fn backdrop_line(record: &ApodRecord) -> String {
    match record.backdrop() {
        Backdrop::Image(url) => format!("[image]({url})"),
        Backdrop::Thumbnail(url) => format!("[video thumbnail]({url})"),
        Backdrop::Clear => "cleared (video without thumbnail)".to_string(),
        Backdrop::Unsupported => format!("cleared (unsupported media type `{}`)", record.media_type),
    }
}

/// Write the card to `{markdown_output_dir}/{date}.md` and return the path.
#[instrument(level = "info", skip_all, fields(%markdown_output_dir))]
pub async fn write_card(
    resolved: &Resolved,
    markdown_output_dir: &str,
) -> Result<String, Box<dyn Error>> {
    ensure_writable_dir(markdown_output_dir).await?;
    let path = format!(
        "{}/{}.md",
        markdown_output_dir.trim_end_matches('/'),
        format_date(resolved.record.date)
    );
    fs::write(&path, render_card(resolved)).await?;
    info!(path = %path, "Wrote Markdown card");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(media_type: MediaType, retries: usize) -> Resolved {
        Resolved {
            record: ApodRecord {
                date: NaiveDate::from_ymd_opt(2004, 10, 19).unwrap(),
                title: "Saturn's Rings".to_string(),
                explanation: "x".repeat(1000),
                media_type,
                url: Some("https://www.youtube.com/watch?v=abc".to_string()),
                hdurl: None,
                thumbnail_url: Some("https://img.youtube.com/vi/abc/0.jpg".to_string()),
                copyright: Some("\nA. Photographer\n".to_string()),
                service_version: None,
            },
            attempts: retries + 1,
            retries,
        }
    }

    #[test]
    fn test_archive_page_url() {
        let date = NaiveDate::from_ymd_opt(2004, 10, 19).unwrap();
        assert_eq!(
            archive_page_url(date),
            "https://apod.nasa.gov/apod/ap041019.html"
        );
        let date = NaiveDate::from_ymd_opt(1995, 6, 16).unwrap();
        assert_eq!(
            archive_page_url(date),
            "https://apod.nasa.gov/apod/ap950616.html"
        );
    }

    #[test]
    fn test_image_card() {
        let md = render_card(&resolved(MediaType::Image, 0));
        assert!(md.starts_with("# Saturn's Rings\n"));
        assert!(md.contains("*2004-10-19*"));
        assert!(md.contains("**Backdrop:** [image](https://www.youtube.com/watch?v=abc)"));
        assert!(md.contains(&format!("{}…", "x".repeat(SNIPPET_CHARS - 1))));
        assert!(!md.contains("Skipped"));
        assert!(!md.contains("Watch video"));
        assert!(md.contains("Credit: A. Photographer"));
        assert!(md.contains("[Learn More →](https://apod.nasa.gov/apod/ap041019.html)"));
    }

    #[test]
    fn test_exhausted_video_card() {
        let md = render_card(&resolved(MediaType::Video, 10));
        assert!(md.contains("[video thumbnail](https://img.youtube.com/vi/abc/0.jpg)"));
        assert!(md.contains("Skipped 10 video date(s) in 11 attempt(s)."));
        assert!(md.contains("[Watch video](https://www.youtube.com/embed/abc)"));
        assert!(md.contains(crate::models::PLACEHOLDER_THUMB));
    }

    #[test]
    fn test_unsupported_card() {
        let md = render_card(&resolved(MediaType::Other("other".to_string()), 0));
        assert!(md.contains("cleared (unsupported media type `other`)"));
    }

    #[tokio::test]
    async fn test_write_card() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("cards");
        let path = write_card(&resolved(MediaType::Image, 0), out.to_str().unwrap())
            .await
            .unwrap();
        assert!(path.ends_with("2004-10-19.md"));
        assert!(std::fs::read_to_string(path).unwrap().contains("Saturn"));
    }
}
