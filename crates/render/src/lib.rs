//! Badge Render - layout, element rendering and document composition
//!
//! This crate provides:
//! - Template element types validated at the JSON boundary
//! - The layout resolver (centimetres, origin top-left)
//! - Element rendering for text, QR codes, logos and backgrounds
//! - The document compositor producing PDF or PNG at true physical size
//! - Asset sources (memory, directory, HTTP, data URLs)
//!
//! Layout is computed once and handed to a [`Surface`]; the PDF and raster
//! backends never repeat anchoring math.
//!
//! # Example
//!
//! ```ignore
//! use badge_render::{compose, BadgeTemplate, MemoryAssets, RenderContext, RenderOptions};
//!
//! let template = BadgeTemplate::from_json(template_json)?;
//! let assets = MemoryAssets::new();
//! let ctx = RenderContext::new(&attendee, &event, &template, &assets);
//! let document = compose(&ctx, &RenderOptions::default())?;
//! std::fs::write("badge.pdf", &document.bytes)?;
//! ```

pub mod assets;
mod binding;
mod color;
mod compositor;
mod fonts;
pub mod layout;
mod options;
pub mod qr;
mod renderer;
mod schema;
pub mod surface;
mod validation;

pub use assets::{AssetFetchError, AssetSource, DirectoryAssets, MemoryAssets, RoutedAssets};
#[cfg(feature = "http")]
pub use assets::HttpAssets;
pub use binding::bind_field;
pub use color::{parse_hex_color, Rgb};
pub use compositor::{compose, RenderContext};
pub use fonts::{FontFaces, FontLibrary, ResolvedFont};
pub use layout::{resolve, BoundingBox};
pub use options::{OutputFormat, RenderOptions};
pub use renderer::{render, ElementError, ElementErrorKind};
pub use schema::*;
pub use surface::Surface;
pub use validation::{parse_elements, validate_element};

use thiserror::Error;

/// Errors that abort a compose call
#[derive(Debug, Error)]
pub enum BadgeError {
    /// Structural template misconfiguration, fatal and not retried
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The backend could not finalize the document
    #[error("Output error: {0}")]
    Output(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for badge operations
pub type Result<T> = std::result::Result<T, BadgeError>;
