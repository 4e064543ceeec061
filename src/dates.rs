//! Calendar helpers for the APOD archive.
//!
//! This module owns everything date-shaped:
//! - [`DateRange`]: an inclusive pair of days that bounds valid requests
//! - [`MIN_DATE`]: the first day the archive has a picture for
//! - ISO-8601 (`YYYY-MM-DD`) formatting and parsing, the only format the API accepts
//! - [`random_date_in_range`]: the uniform random day used by "surprise me" and
//!   by the video-skip retry policy

use crate::api::ApodError;
use chrono::{Duration, Local, NaiveDate};
use rand::Rng;
use std::fmt;

/// First day with an entry in the APOD archive.
pub const MIN_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1995, 6, 16) {
    Some(date) => date,
    None => panic!("invalid archive start date"),
};

const MS_PER_DAY: i64 = 86_400_000;

/// An inclusive range of calendar days.
///
/// Construction guarantees `min <= max`; the fields are private so the
/// invariant cannot be broken afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    min: NaiveDate,
    max: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `min > max`.
    pub fn new(min: NaiveDate, max: NaiveDate) -> Result<Self, ApodError> {
        if min > max {
            return Err(ApodError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// The archive window ending at `today`. A configured `min` earlier than
    /// [`MIN_DATE`] is raised to it, since the archive has nothing before then.
    pub fn archive(min: NaiveDate, today: NaiveDate) -> Result<Self, ApodError> {
        Self::new(min.max(MIN_DATE), today)
    }

    pub fn min(&self) -> NaiveDate {
        self.min
    }

    pub fn max(&self) -> NaiveDate {
        self.max
    }

    /// Inclusive on both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.min <= date && date <= self.max
    }

    /// Number of days covered, counting both endpoints.
    pub fn len_days(&self) -> i64 {
        (self.max - self.min).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", format_date(self.min), format_date(self.max))
    }
}

/// Local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Format as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` string.
pub fn parse_date(s: &str) -> Result<NaiveDate, ApodError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ApodError::InvalidDate(s.to_string()))
}

/// Pick a day uniformly at random from `range`, both ends included.
///
/// A millisecond offset is drawn across the whole span, last day included in
/// full, and truncated to its day. Every day therefore gets the same weight.
///
/// Pass a seeded RNG (`StdRng::seed_from_u64`) for reproducible picks.
pub fn random_date_in_range<R: Rng + ?Sized>(range: &DateRange, rng: &mut R) -> NaiveDate {
    let span_ms = range.len_days() * MS_PER_DAY - 1;
    let offset_ms = rng.random_range(0..=span_ms);
    range.min + Duration::days(offset_ms / MS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_min_date_is_archive_start() {
        assert_eq!(format_date(MIN_DATE), "1995-06-16");
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        let err = DateRange::new(d(2024, 1, 2), d(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, ApodError::InvalidRange { .. }));
    }

    #[test]
    fn test_range_contains_is_inclusive() {
        let range = DateRange::new(d(2020, 1, 1), d(2020, 1, 31)).unwrap();
        assert!(range.contains(d(2020, 1, 1)));
        assert!(range.contains(d(2020, 1, 31)));
        assert!(!range.contains(d(2019, 12, 31)));
        assert!(!range.contains(d(2020, 2, 1)));
        assert_eq!(range.len_days(), 31);
    }

    #[test]
    fn test_archive_range() {
        let range = DateRange::archive(MIN_DATE, d(2024, 1, 1)).unwrap();
        assert_eq!(range.min(), d(1995, 6, 16));
        assert_eq!(range.max(), d(2024, 1, 1));
        assert!(DateRange::archive(MIN_DATE, d(1990, 1, 1)).is_err());
    }

    #[test]
    fn test_archive_raises_min_before_first_entry() {
        let range = DateRange::archive(d(1990, 1, 1), d(2024, 1, 1)).unwrap();
        assert_eq!(range.min(), MIN_DATE);

        let later = DateRange::archive(d(2000, 1, 1), d(2024, 1, 1)).unwrap();
        assert_eq!(later.min(), d(2000, 1, 1));

        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..1_000 {
            assert!(random_date_in_range(&range, &mut rng) >= MIN_DATE);
        }
    }

    #[test]
    fn test_archive_rejects_min_after_today() {
        let err = DateRange::archive(d(2024, 6, 1), d(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, ApodError::InvalidRange { .. }));
    }

    #[test]
    fn test_format_and_parse() {
        assert_eq!(format_date(d(2024, 3, 7)), "2024-03-07");
        assert_eq!(parse_date("2024-03-07").unwrap(), d(2024, 3, 7));
        assert_eq!(parse_date(" 1995-06-16\n").unwrap(), d(1995, 6, 16));
        assert!(matches!(
            parse_date("2024-13-01"),
            Err(ApodError::InvalidDate(_))
        ));
        assert!(parse_date("07/03/2024").is_err());
    }

    #[test]
    fn test_display_range() {
        let range = DateRange::new(d(1995, 6, 16), d(2024, 1, 1)).unwrap();
        assert_eq!(range.to_string(), "1995-06-16..=2024-01-01");
    }

    #[test]
    fn test_random_date_stays_in_range() {
        let range = DateRange::new(d(1995, 6, 16), d(2024, 1, 1)).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..5_000 {
            let picked = random_date_in_range(&range, &mut rng);
            assert!(range.contains(picked), "{picked} outside {range}");
        }
    }

    #[test]
    fn test_random_date_single_day() {
        let day = d(2001, 9, 9);
        let range = DateRange::new(day, day).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            assert_eq!(random_date_in_range(&range, &mut rng), day);
        }
    }

    #[test]
    fn test_random_date_reaches_both_ends() {
        let range = DateRange::new(d(2020, 1, 1), d(2020, 1, 3)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let picks: Vec<_> = (0..300)
            .map(|_| random_date_in_range(&range, &mut rng))
            .collect();
        assert!(picks.contains(&d(2020, 1, 1)));
        assert!(picks.contains(&d(2020, 1, 2)));
        assert!(picks.contains(&d(2020, 1, 3)));
    }

    #[test]
    fn test_random_date_is_deterministic_under_seed() {
        let range = DateRange::new(MIN_DATE, d(2024, 1, 1)).unwrap();
        let a: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(99);
            (0..10).map(|_| random_date_in_range(&range, &mut rng)).collect()
        };
        let b: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(99);
            (0..10).map(|_| random_date_in_range(&range, &mut rng)).collect()
        };
        assert_eq!(a, b);
    }
}
