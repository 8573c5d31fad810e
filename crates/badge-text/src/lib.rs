//! Badge Text - text measurement and formatting
//!
//! This crate provides:
//! - Font metrics for the built-in Helvetica faces and for TrueType fonts
//! - Width-based line wrapping shared by every rendering backend
//! - Long date formatting and segment name capitalisation
//!
//! # Example
//!
//! ```
//! use badge_text::{wrap_to_width, StandardFont};
//!
//! let font = StandardFont::Helvetica;
//! let lines = wrap_to_width("Jane Appleseed", 12.0, Some(60.0), &font);
//! assert_eq!(lines, vec!["Jane", "Appleseed"]);
//! ```

mod formatter;
mod linebreak;
mod metrics;

pub use formatter::{capitalize_first, format_long_date};
pub use linebreak::wrap_to_width;
pub use metrics::{FontMetrics, StandardFont, TrueTypeMetrics};

use thiserror::Error;

/// Errors that can occur during text processing
#[derive(Debug, Error)]
pub enum TextError {
    #[error("Failed to parse font: {0}")]
    FontParseError(String),
}

/// Result type for text operations
pub type Result<T> = std::result::Result<T, TextError>;
