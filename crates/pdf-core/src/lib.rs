//! PDF Core - single page PDF writing
//!
//! This crate provides functionality for:
//! - Creating a one-page PDF of an exact physical size
//! - Filling rectangles and clipping
//! - Inserting images (JPEG, PNG with alpha)
//! - Inserting text with the standard Helvetica faces or embedded TrueType fonts
//!
//! All coordinates are in points with the origin at the top-left corner of
//! the page; conversion to PDF's bottom-left origin happens internally.
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{BaseFont, Color, PdfDocument, Rect, TextFont};
//!
//! let mut doc = PdfDocument::new(241.0, 354.0)?;
//! doc.fill_rect(Rect::new(0.0, 0.0, 241.0, 354.0), Color::white());
//! doc.insert_text("Hello", 20.0, 40.0, &TextFont::Base(BaseFont::Helvetica), 12.0, Color::black())?;
//! let bytes = doc.to_bytes()?;
//! ```

mod document;
mod font;
mod image;
mod text;

pub use document::{Color, PdfDocument, Rect, TextFont};
pub use font::{BaseFont, FontData, FontFamily, FontFamilyBuilder, FontWeight};
pub use image::{ImageFormat, ImageXObject};
pub use text::{generate_text_operators, pdf_number, TextRenderContext};

use thiserror::Error;

/// PDF points per centimetre (72 points per inch, 2.54 cm per inch)
pub const POINTS_PER_CM: f64 = 72.0 / 2.54;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Invalid page size: {0} x {1} points")]
    InvalidPageSize(f64, f64),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("Font already exists: {0}")]
    FontAlreadyExists(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Convert centimetres to PDF points
pub fn cm_to_points(cm: f64) -> f64 {
    cm * POINTS_PER_CM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_per_cm() {
        assert!((POINTS_PER_CM - 28.3465).abs() < 1e-4);
    }

    #[test]
    fn test_cm_to_points() {
        assert!((cm_to_points(2.54) - 72.0).abs() < 1e-9);
        assert!((cm_to_points(8.5) - 240.9449).abs() < 1e-3);
    }
}
