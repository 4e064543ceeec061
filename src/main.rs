//! # APOD Backdrop
//!
//! Fetches the astronomy picture of the day for today, a chosen date, or a
//! random archive date, and works out what to put behind the page.
//!
//! ## Features
//!
//! - Uniform random dates from the archive (1995-06-16 through today)
//! - Video entries are skipped by re-rolling the date, up to 10 times, after
//!   which the video's thumbnail is used
//! - Transport and parse failures are reported immediately, never retried
//! - Optional JSON record and Markdown card outputs
//!
//! ## Usage
//!
//! ```sh
//! apod_backdrop random
//! apod_backdrop -j ./json -m ./cards date 2004-10-19
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: defaults, then `config.yaml`, then CLI flags
//! 2. **Service**: one [`service::ApodService`] built at startup
//! 3. **Fetch**: [`api::VideoSkip`] around [`api::ApodClient`]
//! 4. **Output**: terminal summary, plus JSON and Markdown when requested

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod dates;
mod models;
mod outputs;
mod service;
mod utils;

use api::{ApodClient, VideoSkip};
use cli::{Cli, Command};
use config::{Settings, load_config};
use dates::{DateRange, format_date, parse_date};
use outputs::{json, markdown};
use service::{ApodService, Delivery};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("apod_backdrop starting up");

    let args = Cli::parse();
    debug!(command = ?args.command, "Parsed CLI arguments");

    // ---- Configuration ----
    let file_config = load_config(args.config.as_deref()).await?;
    let settings = Settings::resolve(file_config, &args)?;

    // ---- Service ----
    let range = DateRange::archive(settings.min_date, dates::today())?;
    let client = ApodClient::new(&settings)?;
    let service = ApodService::new(
        VideoSkip::new(client, range, settings.max_retries),
        settings.seed,
    );
    info!(
        min_date = %service.range().min(),
        max_date = %service.range().max(),
        max_retries = service.fetcher().max_retries(),
        "Service ready"
    );
    debug!(client = ?service.fetcher().inner(), "HTTP client configured");

    let delivery = match &args.command {
        Command::Today => service.today().await,
        Command::Date { date } => service.fetch_for_date(parse_date(date)?).await,
        Command::Random => service.random().await,
    };

    let resolved = match delivery {
        Ok(Delivery::Applied(resolved)) => resolved,
        Ok(Delivery::Superseded { token, latest }) => {
            // Only one request is issued per run.
            debug!(?token, ?latest, "Response superseded");
            return Ok(());
        }
        Err(e) => {
            error!(
                error = %e,
                transport = e.is_transport(),
                parse = e.is_parse(),
                "Error loading APOD"
            );
            if let Some(state) = service.state() {
                eprintln!("{state}");
            }
            return Err(e.into());
        }
    };

    // ---- Terminal summary ----
    let record = &resolved.record;
    println!("{}  {}", format_date(record.date), record.title);
    println!("media:    {}", record.media_type);
    if let Some(backdrop) = service.backdrop() {
        println!("backdrop: {backdrop}");
        if let Some(url) = backdrop.url() {
            debug!(%url, "Background image");
        }
    }
    if resolved.retries > 0 {
        println!(
            "skipped {} video date(s) in {} attempt(s)",
            resolved.retries, resolved.attempts
        );
    }

    // ---- Outputs ----
    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = json::write_record(record, dir).await {
            error!(path = %dir, error = %e, "Failed to write JSON");
        }
    }

    if let Some(dir) = &args.markdown_output_dir {
        if let Err(e) = markdown::write_card(&resolved, dir).await {
            error!(path = %dir, error = %e, "Failed writing Markdown");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        attempts = resolved.attempts,
        exhausted = resolved.exhausted(),
        "Execution complete"
    );

    Ok(())
}
