//! Output generation for resolved records.
//!
//! # Submodules
//!
//! - [`json`]: Writes the raw [`ApodRecord`](crate::models::ApodRecord) for API-style consumption
//! - [`markdown`]: Renders the project card with the backdrop decision
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2004-10-19.json
//!
//! markdown_output_dir/
//! └── 2004-10-19.md
//! ```

pub mod json;
pub mod markdown;
