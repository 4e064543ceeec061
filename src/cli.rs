//! Command-line interface definitions for APOD Backdrop.
//!
//! Global options configure the client; the subcommand picks the date.
//! The API key can be provided via `--api-key` or the `NASA_API_KEY`
//! environment variable.

use clap::{Parser, Subcommand};

/// Command-line arguments for the APOD Backdrop application.
///
/// # Examples
///
/// ```sh
/// # Today's picture
/// apod_backdrop today
///
/// # A specific day, written out as JSON and a Markdown card
/// apod_backdrop -j ./json -m ./cards date 2004-10-19
///
/// # Surprise me, reproducibly
/// apod_backdrop --seed 42 random
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// APOD API key (defaults to DEMO_KEY)
    #[arg(long, env = "NASA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Override the APOD endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Maximum number of times a video result is swapped for another random date
    #[arg(long)]
    pub max_retries: Option<usize>,

    /// Seed for random date selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Do not ask the API for video thumbnails
    #[arg(long)]
    pub no_thumbs: bool,

    /// Output directory for the JSON record file
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Output directory for the Markdown card
    #[arg(short, long)]
    pub markdown_output_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Which day to fetch.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Today's picture
    Today,
    /// The picture for a given day (YYYY-MM-DD)
    Date {
        /// Day to fetch
        date: String,
    },
    /// A uniformly random day from the archive
    Random,
}
