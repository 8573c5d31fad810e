//! QR payload codec
//!
//! Every QR code on a badge, whichever backend draws it, is produced with
//! the print profile below so that badges from any path scan the same.

use image::{DynamicImage, GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

/// Error correction level of the print profile (~30% damage tolerance)
pub const PRINT_EC_LEVEL: ErrorCorrection = ErrorCorrection::H;

/// Minimum edge length in pixels of the print profile
pub const PRINT_PIXEL_SIZE: u32 = 800;

/// Light modules around the symbol
pub const QUIET_ZONE_MODULES: u32 = 1;

/// QR error correction level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ErrorCorrection {
    L,
    M,
    Q,
    #[default]
    H,
}

impl From<ErrorCorrection> for EcLevel {
    fn from(ec: ErrorCorrection) -> Self {
        match ec {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

/// Errors that can occur while encoding a payload
#[derive(Debug, Error)]
pub enum QrError {
    #[error("QR payload is empty")]
    EmptyPayload,

    #[error("QR encoding failed: {0}")]
    Encode(String),

    #[error("QR image encoding failed: {0}")]
    Image(String),
}

/// Rendered QR symbol, quiet zone included
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixImage {
    /// Modules per side including the quiet zone
    modules: u32,
    /// Pixels per module
    module_px: u32,
    image: GrayImage,
}

impl MatrixImage {
    /// Modules per side including the quiet zone
    pub fn modules(&self) -> u32 {
        self.modules
    }

    /// Pixels per module
    pub fn module_px(&self) -> u32 {
        self.module_px
    }

    /// Edge length in pixels
    pub fn size_px(&self) -> u32 {
        self.image.width()
    }

    /// Grayscale pixels (0 dark, 255 light)
    pub fn as_luma(&self) -> &GrayImage {
        &self.image
    }

    /// Encode as 8-bit grayscale PNG without metadata chunks
    pub fn to_png(&self) -> Result<Vec<u8>, QrError> {
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(self.image.clone())
            .write_to(&mut bytes, image::ImageFormat::Png)
            .map_err(|e| QrError::Image(e.to_string()))?;
        Ok(bytes.into_inner())
    }
}

/// Encode a payload into a QR matrix image
///
/// # Arguments
/// * `payload` - Text to encode (the attendee's stable identifier)
/// * `error_correction` - Error correction level
/// * `pixel_size` - Minimum edge length in pixels; every module gets
///   `ceil(pixel_size / modules)` pixels
pub fn encode(payload: &str, error_correction: ErrorCorrection, pixel_size: u32) -> Result<MatrixImage, QrError> {
    if payload.is_empty() {
        return Err(QrError::EmptyPayload);
    }

    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::from(error_correction))
        .map_err(|e| QrError::Encode(e.to_string()))?;

    let symbol = code.width() as u32;
    let colors = code.to_colors();
    let modules = symbol + 2 * QUIET_ZONE_MODULES;
    let module_px = pixel_size.div_ceil(modules).max(1);

    let image = GrayImage::from_fn(modules * module_px, modules * module_px, |x, y| {
        let (mx, my) = (x / module_px, y / module_px);
        let inside = |m: u32| m >= QUIET_ZONE_MODULES && m < QUIET_ZONE_MODULES + symbol;
        if inside(mx) && inside(my) {
            let index = ((my - QUIET_ZONE_MODULES) * symbol + (mx - QUIET_ZONE_MODULES)) as usize;
            if colors[index] == Color::Dark {
                return Luma([0]);
            }
        }
        Luma([255])
    });

    Ok(MatrixImage {
        modules,
        module_px,
        image,
    })
}

/// Encode with the shared print profile
pub fn encode_for_print(payload: &str) -> Result<MatrixImage, QrError> {
    encode(payload, PRINT_EC_LEVEL, PRINT_PIXEL_SIZE)
}
