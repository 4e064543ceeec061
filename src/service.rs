//! The widget's control object.
//!
//! [`ApodService`] is built once at startup and handed to whoever drives the
//! display. It owns the date range, the RNG, the video-skip fetcher and the
//! current [`WidgetState`].
//!
//! # Racing requests
//!
//! Requests are not cancelled when a newer one starts. Instead every request
//! gets a [`RequestToken`] from a monotonically increasing counter, and a
//! result is only applied if its token is still the latest one issued. Older
//! results come back as [`Delivery::Superseded`] and leave the display alone,
//! so the most recently *requested* date always wins.

use crate::api::{ApodError, FetchApod, Resolved, VideoSkip};
use crate::dates::{DateRange, random_date_in_range, today};
use crate::models::{Backdrop, WidgetState};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

/// Identifies one request; higher is newer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// What happened to a finished request.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// The result was shown.
    Applied(Resolved),
    /// A newer request was issued meanwhile; the result was dropped.
    Superseded { token: RequestToken, latest: RequestToken },
}

/// Latest issued token and what is on screen, guarded together so a token
/// check and the write it allows cannot be interleaved with a newer request.
#[derive(Debug, Default)]
struct Display {
    latest: u64,
    state: Option<WidgetState>,
}

pub struct ApodService<F> {
    fetcher: VideoSkip<F>,
    rng: Mutex<StdRng>,
    display: Mutex<Display>,
}

impl<F: FetchApod> ApodService<F> {
    /// `seed` makes every random pick reproducible; `None` seeds from the OS.
    pub fn new(fetcher: VideoSkip<F>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            fetcher,
            rng: Mutex::new(rng),
            display: Mutex::new(Display::default()),
        }
    }

    pub fn fetcher(&self) -> &VideoSkip<F> {
        &self.fetcher
    }

    pub fn range(&self) -> &DateRange {
        self.fetcher.range()
    }

    /// Snapshot of what the display currently shows.
    pub fn state(&self) -> Option<WidgetState> {
        self.display().state.clone()
    }

    /// Current background, if a record is showing.
    pub fn backdrop(&self) -> Option<Backdrop> {
        match self.state()? {
            WidgetState::Ready { backdrop, .. } => Some(backdrop),
            _ => None,
        }
    }

    /// A uniformly random day from the service range.
    pub fn random_date(&self) -> NaiveDate {
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        random_date_in_range(self.fetcher.range(), &mut *rng)
    }

    /// Today's picture, clamped to the range end.
    pub async fn today(&self) -> Result<Delivery, ApodError> {
        let date = today().min(self.range().max());
        self.run(date).await
    }

    /// The picture for `date`.
    ///
    /// # Errors
    ///
    /// [`ApodError::DateOutOfRange`] before any fetch if `date` is outside the
    /// range; otherwise whatever the fetch itself fails with.
    pub async fn fetch_for_date(&self, date: NaiveDate) -> Result<Delivery, ApodError> {
        let range = *self.range();
        if !range.contains(date) {
            warn!(%date, %range, "Requested date outside archive range");
            return Err(ApodError::DateOutOfRange { date, range });
        }
        self.run(date).await
    }

    /// A random day's picture.
    pub async fn random(&self) -> Result<Delivery, ApodError> {
        let date = self.random_date();
        info!(%date, "Surprise date picked");
        self.run(date).await
    }

    /// Issue a new token and show the loading state.
    pub fn begin(&self, date: NaiveDate) -> RequestToken {
        let token = {
            let mut display = self.display();
            display.latest += 1;
            display.state = Some(WidgetState::Loading { date });
            RequestToken(display.latest)
        };
        debug!(token = token.0, %date, "Request started");
        token
    }

    /// Apply `result` if `token` is still the latest request.
    ///
    /// Errors from a current request are recorded as [`WidgetState::Error`]
    /// and returned; errors from a superseded request are dropped like any
    /// other stale result.
    pub fn complete(
        &self,
        token: RequestToken,
        result: Result<Resolved, ApodError>,
    ) -> Result<Delivery, ApodError> {
        let mut display = self.display();
        let latest = RequestToken(display.latest);
        if token != latest {
            info!(token = token.0, latest = latest.0, "Discarding stale response");
            return Ok(Delivery::Superseded { token, latest });
        }

        match result {
            Ok(resolved) => {
                let backdrop = resolved.record.backdrop();
                info!(date = %resolved.record.date, %backdrop, "Backdrop updated");
                display.state = Some(WidgetState::Ready {
                    record: resolved.record.clone(),
                    backdrop,
                });
                Ok(Delivery::Applied(resolved))
            }
            Err(e) => {
                display.state = Some(WidgetState::Error {
                    message: "Error loading APOD.".to_string(),
                });
                Err(e)
            }
        }
    }

    #[instrument(level = "info", skip_all, fields(date = %date))]
    async fn run(&self, date: NaiveDate) -> Result<Delivery, ApodError> {
        let token = self.begin(date);
        // Per-request RNG so no lock is held across the fetch.
        let mut rng = {
            let mut master = self.rng.lock().unwrap_or_else(|p| p.into_inner());
            StdRng::seed_from_u64(master.random())
        };
        let result = self.fetcher.fetch_with_retry(date, &mut rng).await;
        self.complete(token, result)
    }

    fn display(&self) -> MutexGuard<'_, Display> {
        self.display.lock().unwrap_or_else(|p| p.into_inner())
    }
}
