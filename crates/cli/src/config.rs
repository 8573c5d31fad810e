//! TOML configuration file
//!
//! ```toml
//! format = "png"
//! dpi = 300
//! asset_timeout_ms = 5000
//! assets = "storage"
//! fallback_font = "inter"
//!
//! [fonts.inter]
//! regular = "fonts/Inter-Regular.ttf"
//! bold = "fonts/Inter-Bold.ttf"
//! ```
//!
//! Relative paths are resolved against the directory of the config file.

use anyhow::{Context, Result};
use badge_render::{FontLibrary, OutputFormat};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// TrueType files of one family
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FontPaths {
    pub regular: PathBuf,
    #[serde(default)]
    pub bold: Option<PathBuf>,
}

/// Contents of `--config`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub format: Option<OutputFormat>,
    pub dpi: Option<u32>,
    pub asset_timeout_ms: Option<u64>,
    pub line_height_factor: Option<f64>,
    /// Root directory for local asset references
    pub assets: Option<PathBuf>,
    /// Family used by templates that name none
    pub fallback_font: Option<String>,
    pub fonts: BTreeMap<String, FontPaths>,
}

impl Config {
    /// Parse a config file and make its paths absolute
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading config '{}'", path.display()))?;
        let mut config = Self::parse(&content).with_context(|| format!("parsing config '{}'", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.rebase(base);
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn rebase(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(assets) = &mut self.assets {
            join(assets);
        }
        for paths in self.fonts.values_mut() {
            join(&mut paths.regular);
            if let Some(bold) = &mut paths.bold {
                join(bold);
            }
        }
    }

    /// Load every configured font family
    pub fn load_fonts(&self) -> Result<FontLibrary> {
        let mut library = FontLibrary::new();
        for (name, paths) in &self.fonts {
            let regular = fs::read(&paths.regular)
                .with_context(|| format!("reading font '{}'", paths.regular.display()))?;
            let bold = match &paths.bold {
                Some(path) => Some(fs::read(path).with_context(|| format!("reading font '{}'", path.display()))?),
                None => None,
            };
            library
                .add_family(name, regular, bold)
                .with_context(|| format!("loading font family '{name}'"))?;
        }

        match &self.fallback_font {
            Some(name) => library.set_fallback(name),
            // A single family serves as the fallback
            None if self.fonts.len() == 1 => {
                if let Some(name) = self.fonts.keys().next() {
                    library.set_fallback(name);
                }
            }
            None => {}
        }

        Ok(library)
    }
}
