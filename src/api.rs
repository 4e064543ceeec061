//! APOD API access with a video-skipping retry policy.
//!
//! This module talks to the astronomy picture of the day endpoint and makes
//! sure callers end up with something they can put behind the page.
//!
//! # Architecture
//!
//! The module uses a trait-based design so the network can be swapped out:
//! - [`FetchApod`]: Core trait, "give me the record for this day"
//! - [`ApodClient`]: The reqwest-backed implementation
//! - [`VideoSkip`]: Decorator that re-rolls the date when a video comes back
//!
//! # Retry Strategy
//!
//! Retries only ever happen for the *wrong media type* condition:
//! - A video record triggers a fresh random date from the configured range
//! - At most `max_retries` re-rolls (10 by default), after which the last
//!   video record is accepted and shown through its thumbnail
//! - Transport, status and parse errors are never retried; they abort the
//!   whole request immediately

use crate::config::Settings;
use crate::dates::{DateRange, format_date, random_date_in_range};
use crate::models::ApodRecord;
use crate::utils::truncate_for_log;
use chrono::NaiveDate;
use rand::Rng;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Upper bound on consecutive video re-rolls per request.
pub const MAX_RETRIES: usize = 10;

/// Errors surfaced by the fetch pipeline.
#[derive(thiserror::Error, Debug)]
pub enum ApodError {
    #[error("APOD request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("APOD returned HTTP {status} for {date}")]
    Status { status: u16, date: NaiveDate },
    #[error("malformed APOD response for {date}: {source}")]
    Parse {
        date: NaiveDate,
        #[source]
        source: serde_json::Error,
    },
    #[error("{date} is outside the archive range {range}")]
    DateOutOfRange { date: NaiveDate, range: DateRange },
    #[error("invalid date range: {min} is after {max}")]
    InvalidRange { min: NaiveDate, max: NaiveDate },
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid APOD endpoint {0:?}")]
    InvalidEndpoint(String),
}

impl ApodError {
    /// Network failure or non-success HTTP status.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApodError::Transport(_) | ApodError::Status { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, ApodError::Parse { .. })
    }
}

/// Trait for fetching the archive record of a single day.
///
/// Implementors only fetch; they never retry. Retry policy lives in
/// [`VideoSkip`] so that any source (real or scripted) gets the same behavior.
pub trait FetchApod {
    /// Fetch the record for `date`.
    ///
    /// # Errors
    ///
    /// Transport, status or parse failures, as [`ApodError`].
    async fn fetch(&self, date: NaiveDate) -> Result<ApodRecord, ApodError>;
}

/// reqwest-backed [`FetchApod`] implementation.
pub struct ApodClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    thumbs: bool,
}

impl ApodClient {
    /// Build a client from resolved settings.
    ///
    /// # Errors
    ///
    /// Returns [`ApodError::Transport`] if the TLS backend cannot be initialized.
    pub fn new(settings: &Settings) -> Result<Self, ApodError> {
        let http = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(settings.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            thumbs: settings.thumbs,
        })
    }

    /// Full request URL for `date`, query values percent-encoded.
    pub fn request_url(&self, date: NaiveDate) -> String {
        let mut url = format!(
            "{}?api_key={}&date={}",
            self.endpoint,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&format_date(date))
        );
        if self.thumbs {
            url.push_str("&thumbs=true");
        }
        url
    }
}

impl fmt::Debug for ApodClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApodClient")
            .field("endpoint", &self.endpoint)
            .field("thumbs", &self.thumbs)
            .finish_non_exhaustive()
    }
}

impl FetchApod for ApodClient {
    #[instrument(level = "info", skip_all, fields(date = %date))]
    async fn fetch(&self, date: NaiveDate) -> Result<ApodRecord, ApodError> {
        let t0 = Instant::now();
        let res = self.http.get(self.request_url(date)).send().await;
        let resp = match res {
            Ok(resp) => resp,
            Err(e) => {
                warn!(elapsed_ms = t0.elapsed().as_millis(), error = %e, "APOD request failed");
                return Err(e.into());
            }
        };

        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "APOD returned non-success status");
            return Err(ApodError::Status {
                status: status.as_u16(),
                date,
            });
        }

        let body = resp.text().await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "APOD response received"
        );
        parse_record(&body, date)
    }
}

/// Deserialize an API response body.
pub fn parse_record(body: &str, date: NaiveDate) -> Result<ApodRecord, ApodError> {
    serde_json::from_str::<ApodRecord>(body).map_err(|source| {
        warn!(
            %date,
            error = %source,
            body_preview = %truncate_for_log(body, 300),
            "APOD response did not match the record schema"
        );
        ApodError::Parse { date, source }
    })
}

/// Outcome of a completed [`VideoSkip::fetch_with_retry`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub record: ApodRecord,
    /// Fetch calls made, first one included.
    pub attempts: usize,
    /// Video re-rolls taken.
    pub retries: usize,
}

impl Resolved {
    /// True when retries ran out and the record is still a video.
    pub fn exhausted(&self) -> bool {
        self.record.is_video()
    }
}

/// Lifecycle of one top-level fetch request.
///
/// `Resolved` and `Failed` are terminal.
#[derive(Debug)]
pub enum FetchState {
    Idle,
    Fetching { date: NaiveDate, retries: usize },
    RetryPending { retries: usize },
    Resolved { record: ApodRecord, retries: usize },
    Failed(ApodError),
}

/// Wrapper that re-rolls the date whenever the inner source returns a video.
///
/// Each call to [`fetch_with_retry`](VideoSkip::fetch_with_retry) starts a
/// fresh retry counter. Re-rolled dates come from `range`.
pub struct VideoSkip<T> {
    /// The underlying source to wrap.
    inner: T,
    /// Where replacement dates are drawn from.
    range: DateRange,
    /// Maximum number of re-rolls before settling for a video.
    max_retries: usize,
}

impl<T> VideoSkip<T>
where
    T: FetchApod,
{
    /// Wrap `inner`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = ApodClient::new(&settings)?;
    /// let skip = VideoSkip::new(client, DateRange::archive(MIN_DATE, today())?, MAX_RETRIES);
    /// ```
    pub fn new(inner: T, range: DateRange, max_retries: usize) -> Self {
        Self {
            inner,
            range,
            max_retries,
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Fetch `start`, re-rolling on videos.
    ///
    /// Runs the [`FetchState`] machine as a plain loop:
    /// Idle → Fetching → (RetryPending → Fetching)* → Resolved | Failed.
    ///
    /// # Returns
    ///
    /// The first non-video record, or the last video record once
    /// `max_retries` re-rolls are spent. A source that only serves videos is
    /// therefore called exactly `max_retries + 1` times.
    ///
    /// # Errors
    ///
    /// The first transport, status or parse error, with no further attempts.
    #[instrument(level = "info", skip_all, fields(start = %start))]
    pub async fn fetch_with_retry<R: Rng + ?Sized>(
        &self,
        start: NaiveDate,
        rng: &mut R,
    ) -> Result<Resolved, ApodError> {
        let total_t0 = Instant::now();
        let mut attempts = 0usize;
        let mut state = FetchState::Idle;

        loop {
            state = match state {
                FetchState::Idle => FetchState::Fetching {
                    date: start,
                    retries: 0,
                },
                FetchState::Fetching { date, retries } => {
                    attempts += 1;
                    debug!(attempt = attempts, %date, retries, "Fetching APOD record");
                    match self.inner.fetch(date).await {
                        Err(e) => FetchState::Failed(e),
                        Ok(record) if record.is_video() && retries < self.max_retries => {
                            info!(
                                %date,
                                retries,
                                max = self.max_retries,
                                "Video found; re-rolling date for an image"
                            );
                            FetchState::RetryPending { retries }
                        }
                        Ok(record) => {
                            if record.is_video() {
                                warn!(
                                    %date,
                                    max = self.max_retries,
                                    "Max retries reached; using video thumbnail"
                                );
                            }
                            FetchState::Resolved { record, retries }
                        }
                    }
                }
                FetchState::RetryPending { retries } => FetchState::Fetching {
                    date: random_date_in_range(&self.range, rng),
                    retries: retries + 1,
                },
                FetchState::Resolved { record, retries } => {
                    info!(
                        date = %record.date,
                        media_type = %record.media_type,
                        attempts,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        "APOD record resolved"
                    );
                    return Ok(Resolved {
                        record,
                        attempts,
                        retries,
                    });
                }
                FetchState::Failed(e) => {
                    error!(
                        attempts,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        error = %e,
                        "APOD fetch failed"
                    );
                    return Err(e);
                }
            };
        }
    }
}

impl<T> fmt::Debug for VideoSkip<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoSkip")
            .field("range", &self.range)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}
