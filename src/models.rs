//! Data models for APOD records and what the widget shows for them.
//!
//! - [`ApodRecord`]: one archive entry as returned by the API
//! - [`MediaType`]: the entry's media tag; only images make a usable backdrop
//! - [`Backdrop`]: the background decision derived from a record
//! - [`WidgetState`]: what the display currently holds (loading, ready, error)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Card thumbnail used when the record itself has nothing displayable.
pub const PLACEHOLDER_THUMB: &str = "https://apod.nasa.gov/apod/image/2402/placeholder.jpg";

/// Media tag of an archive entry.
///
/// The API mostly reports `"image"` or `"video"`, but older entries carry
/// other values (e.g. `"other"` for interactive pages). Those are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MediaType {
    Image,
    Video,
    Other(String),
}

impl From<String> for MediaType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "image" => MediaType::Image,
            "video" => MediaType::Video,
            _ => MediaType::Other(s),
        }
    }
}

impl From<MediaType> for String {
    fn from(m: MediaType) -> Self {
        m.to_string()
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Image => f.write_str("image"),
            MediaType::Video => f.write_str("video"),
            MediaType::Other(s) => f.write_str(s),
        }
    }
}

/// A single APOD archive entry.
///
/// Only `date` and `media_type` are required; everything else defaults so
/// that sparse historical entries still deserialize. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApodRecord {
    /// Archive day this entry belongs to.
    pub date: NaiveDate,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub explanation: String,
    pub media_type: MediaType,
    /// Standard resolution image, or the video page for videos.
    #[serde(default)]
    pub url: Option<String>,
    /// High resolution image (images only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdurl: Option<String>,
    /// Still frame for videos; only sent when the request asks for `thumbs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_version: Option<String>,
}

impl ApodRecord {
    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }

    /// Background decision for this record.
    pub fn backdrop(&self) -> Backdrop {
        Backdrop::for_record(self)
    }

    /// Image for the project card: the record's own image when it has one,
    /// otherwise the placeholder.
    pub fn card_thumbnail(&self) -> &str {
        match (&self.media_type, &self.url) {
            (MediaType::Image, Some(url)) => url,
            _ => PLACEHOLDER_THUMB,
        }
    }
}

/// What goes behind the page for a resolved record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backdrop {
    /// Full image; prefers `hdurl` over `url`.
    Image(String),
    /// Video still, used after the video-skip retries ran out.
    Thumbnail(String),
    /// Nothing to show; the background is cleared.
    Clear,
    /// Media type the widget cannot render; the background is cleared.
    Unsupported,
}

impl Backdrop {
    pub fn for_record(record: &ApodRecord) -> Self {
        match record.media_type {
            MediaType::Image => match record.hdurl.as_ref().or(record.url.as_ref()) {
                Some(url) => Backdrop::Image(url.clone()),
                None => Backdrop::Clear,
            },
            MediaType::Video => match &record.thumbnail_url {
                Some(thumb) => Backdrop::Thumbnail(thumb.clone()),
                None => Backdrop::Clear,
            },
            MediaType::Other(_) => Backdrop::Unsupported,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Backdrop::Image(url) | Backdrop::Thumbnail(url) => Some(url),
            Backdrop::Clear | Backdrop::Unsupported => None,
        }
    }
}

impl fmt::Display for Backdrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backdrop::Image(url) => write!(f, "image {url}"),
            Backdrop::Thumbnail(url) => write!(f, "video thumbnail {url}"),
            Backdrop::Clear => f.write_str("cleared"),
            Backdrop::Unsupported => f.write_str("unsupported media type"),
        }
    }
}

/// What the display currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetState {
    Loading { date: NaiveDate },
    Ready { record: ApodRecord, backdrop: Backdrop },
    Error { message: String },
}

impl fmt::Display for WidgetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetState::Loading { date } => write!(f, "Loading {date}…"),
            WidgetState::Ready { record, backdrop } => {
                write!(f, "{} ({}), backdrop: {}", record.title, record.date, backdrop)
            }
            WidgetState::Error { message } => f.write_str(message),
        }
    }
}
