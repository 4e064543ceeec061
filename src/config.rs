//! Runtime configuration.
//!
//! Settings come from three layers, later ones winning:
//! 1. Built-in defaults ([`Settings::default`])
//! 2. An optional YAML file (`--config path/to/config.yaml`)
//! 3. Command-line flags and environment variables (see [`crate::cli::Cli`])
//!
//! # Example file
//!
//! ```yaml
//! api_key: DEMO_KEY
//! endpoint: https://api.nasa.gov/planetary/apod
//! min_date: 1995-06-16
//! max_retries: 10
//! timeout_secs: 20
//! thumbs: true
//! ```

use crate::api::{ApodError, MAX_RETRIES};
use crate::cli::Cli;
use crate::dates::MIN_DATE;
use chrono::NaiveDate;
use serde::Deserialize;
use std::error::Error;
use tokio::fs;
use tracing::{debug, info, instrument};
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://api.nasa.gov/planetary/apod";
/// Shared rate-limited key the API hands out for trying things.
pub const DEMO_KEY: &str = "DEMO_KEY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Shape of the YAML file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub min_date: Option<NaiveDate>,
    pub max_retries: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub thumbs: Option<bool>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: String,
    pub endpoint: String,
    /// Lower bound for random and user-supplied dates.
    pub min_date: NaiveDate,
    pub max_retries: usize,
    pub timeout_secs: u64,
    /// Ask the API for video thumbnails.
    pub thumbs: bool,
    /// Seed for the date RNG; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: DEMO_KEY.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            min_date: MIN_DATE,
            max_retries: MAX_RETRIES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            thumbs: true,
            seed: None,
        }
    }
}

impl Settings {
    /// Layer `file` then `cli` over the defaults and validate the endpoint.
    pub fn resolve(file: FileConfig, cli: &Cli) -> Result<Self, ApodError> {
        let defaults = Settings::default();
        let settings = Settings {
            api_key: cli
                .api_key
                .clone()
                .or(file.api_key)
                .unwrap_or(defaults.api_key),
            endpoint: cli
                .endpoint
                .clone()
                .or(file.endpoint)
                .unwrap_or(defaults.endpoint),
            min_date: file.min_date.unwrap_or(defaults.min_date),
            max_retries: cli
                .max_retries
                .or(file.max_retries)
                .unwrap_or(defaults.max_retries),
            timeout_secs: file.timeout_secs.unwrap_or(defaults.timeout_secs),
            thumbs: if cli.no_thumbs {
                false
            } else {
                file.thumbs.unwrap_or(defaults.thumbs)
            },
            seed: cli.seed,
        };

        match Url::parse(&settings.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(ApodError::InvalidEndpoint(settings.endpoint)),
        }

        debug!(
            endpoint = %settings.endpoint,
            min_date = %settings.min_date,
            max_retries = settings.max_retries,
            demo_key = settings.api_key == DEMO_KEY,
            "Resolved settings"
        );
        Ok(settings)
    }
}

/// Parse YAML configuration text.
pub fn parse_config(text: &str) -> Result<FileConfig, serde_yaml::Error> {
    // An empty file is a valid "no overrides" config.
    if text.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(text)
}

/// Load the YAML file at `path`, or defaults when no path is given.
#[instrument(level = "info")]
pub async fn load_config(path: Option<&str>) -> Result<FileConfig, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let text = fs::read_to_string(path).await?;
    let config = parse_config(&text)?;
    info!(path, "Loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["apod_backdrop"];
        argv.extend_from_slice(args);
        argv.push("today");
        Cli::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let s = Settings::resolve(FileConfig::default(), &cli(&[])).unwrap();
        assert_eq!(s.api_key, DEMO_KEY);
        assert_eq!(s.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(s.max_retries, 10);
        assert_eq!(s.min_date, NaiveDate::from_ymd_opt(1995, 6, 16).unwrap());
        assert!(s.thumbs);
        assert_eq!(s.seed, None);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = "api_key: abc\nmin_date: 2000-01-01\nmax_retries: 3\nthumbs: false\n";
        let fc = parse_config(yaml).unwrap();
        assert_eq!(fc.api_key.as_deref(), Some("abc"));
        assert_eq!(fc.min_date, NaiveDate::from_ymd_opt(2000, 1, 1));
        assert_eq!(fc.max_retries, Some(3));
        assert_eq!(fc.thumbs, Some(false));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(parse_config("  \n").unwrap(), FileConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(parse_config("api_kee: typo\n").is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let fc = parse_config("api_key: from-file\nmax_retries: 3\ntimeout_secs: 5\n").unwrap();
        let s = Settings::resolve(
            fc,
            &cli(&["--api-key", "from-cli", "--max-retries", "7", "--seed", "4"]),
        )
        .unwrap();
        assert_eq!(s.api_key, "from-cli");
        assert_eq!(s.max_retries, 7);
        assert_eq!(s.timeout_secs, 5);
        assert_eq!(s.seed, Some(4));
    }

    #[test]
    fn test_no_thumbs_flag() {
        let s = Settings::resolve(FileConfig::default(), &cli(&["--no-thumbs"])).unwrap();
        assert!(!s.thumbs);
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        let fc = parse_config("endpoint: not a url\n").unwrap();
        let err = Settings::resolve(fc, &cli(&[])).unwrap_err();
        assert!(matches!(err, ApodError::InvalidEndpoint(_)));

        let fc = parse_config("endpoint: ftp://example.com/apod\n").unwrap();
        assert!(Settings::resolve(fc, &cli(&[])).is_err());
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "endpoint: http://localhost:8080/apod\n").unwrap();

        let fc = load_config(path.to_str()).await.unwrap();
        assert_eq!(fc.endpoint.as_deref(), Some("http://localhost:8080/apod"));
        assert_eq!(load_config(None).await.unwrap(), FileConfig::default());
    }
}
