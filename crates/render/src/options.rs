//! Per-call render configuration

use crate::FontLibrary;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Output encoding
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pdf,
    Png,
}

impl OutputFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Png => "png",
        }
    }
}

fn default_dpi() -> u32 {
    300
}

fn default_asset_timeout_ms() -> u64 {
    10_000
}

fn default_line_height_factor() -> f64 {
    1.15
}

/// Immutable options passed to every [`crate::compose`] call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    #[serde(default)]
    pub format: OutputFormat,

    /// Raster density in dots per inch
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Upper bound for each asset fetch
    #[serde(default = "default_asset_timeout_ms")]
    pub asset_timeout_ms: u64,

    /// Baseline distance as a multiple of the font size
    #[serde(default = "default_line_height_factor")]
    pub line_height_factor: f64,

    #[serde(skip)]
    pub fonts: FontLibrary,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            dpi: default_dpi(),
            asset_timeout_ms: default_asset_timeout_ms(),
            line_height_factor: default_line_height_factor(),
            fonts: FontLibrary::default(),
        }
    }
}

impl RenderOptions {
    /// PDF output with defaults
    pub fn pdf() -> Self {
        Self::default()
    }

    /// PNG output at `dpi`
    pub fn png(dpi: u32) -> Self {
        Self {
            format: OutputFormat::Png,
            dpi,
            ..Self::default()
        }
    }

    pub fn with_fonts(mut self, fonts: FontLibrary) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn asset_timeout(&self) -> Duration {
        Duration::from_millis(self.asset_timeout_ms)
    }
}
