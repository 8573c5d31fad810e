//! Drawing backends
//!
//! Layout and line breaking happen before a surface is reached: every call
//! carries final positions in centimetres from the top-left page corner.
//! A backend only converts units and paints.

pub mod pdf;
pub mod raster;

pub use pdf::PdfSurface;
pub use raster::RasterSurface;

use crate::{BoundingBox, ResolvedFont, Rgb};
use image::ImageReader;
use pdf_core::PdfError;
use std::io::Cursor;
use thiserror::Error;

/// Errors raised by a backend
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("image error: {0}")]
    Image(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("raster text needs a TrueType font family")]
    MissingFont,
}

/// How an image is resampled when scaled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    /// Photos and logos
    Smooth,
    /// Hard module edges (QR codes)
    Crisp,
}

/// Encoded image with its pixel dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub bytes: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl ImageAsset {
    /// Read the dimensions from the image header without decoding pixels
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, SurfaceError> {
        let (width_px, height_px) = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| SurfaceError::Image(e.to_string()))?
            .into_dimensions()
            .map_err(|e| SurfaceError::Image(e.to_string()))?;

        if width_px == 0 || height_px == 0 {
            return Err(SurfaceError::Image("image has no pixels".to_string()));
        }

        Ok(Self {
            bytes,
            width_px,
            height_px,
        })
    }
}

/// One positioned line of text
#[derive(Debug, Clone)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub left_cm: f64,
    pub baseline_cm: f64,
    pub font: ResolvedFont<'a>,
    pub size_pt: f64,
    pub color: Rgb,
}

/// A page being drawn
pub trait Surface {
    /// Paint an opaque rectangle
    fn fill_rect(&mut self, rect: BoundingBox, color: Rgb);

    /// Paint `image` scaled to `dest`, keeping only the part inside `clip`
    fn draw_image(
        &mut self,
        image: &ImageAsset,
        dest: BoundingBox,
        clip: Option<BoundingBox>,
        sampling: Sampling,
    ) -> Result<(), SurfaceError>;

    /// Paint one line of text
    fn draw_text(&mut self, run: &TextRun<'_>) -> Result<(), SurfaceError>;

    /// Encode the finished page
    fn finish(self: Box<Self>) -> Result<Vec<u8>, SurfaceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    #[test]
    fn test_image_asset_reads_png_header() {
        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(40, 20))
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();

        let asset = ImageAsset::from_bytes(png.into_inner()).unwrap();
        assert_eq!((asset.width_px, asset.height_px), (40, 20));
    }

    #[test]
    fn test_image_asset_rejects_garbage() {
        assert!(matches!(
            ImageAsset::from_bytes(b"not an image".to_vec()),
            Err(SurfaceError::Image(_))
        ));
    }
}
