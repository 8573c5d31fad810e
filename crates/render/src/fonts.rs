//! Font library handed to the renderer through [`crate::RenderOptions`]

use crate::FontWeight;
use badge_text::{FontMetrics, StandardFont, TextError, TrueTypeMetrics};
use std::collections::BTreeMap;
use std::sync::Arc;

/// TrueType bytes of one family
#[derive(Clone)]
pub struct FontFaces {
    pub regular: Arc<[u8]>,
    pub bold: Option<Arc<[u8]>>,
}

impl FontFaces {
    /// Bytes for a weight, bold falls back to regular
    pub fn face(&self, weight: FontWeight) -> &[u8] {
        match (weight, &self.bold) {
            (FontWeight::Bold, Some(bold)) => bold.as_ref(),
            _ => self.regular.as_ref(),
        }
    }
}

impl std::fmt::Debug for FontFaces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFaces")
            .field("regular_len", &self.regular.len())
            .field("bold_len", &self.bold.as_ref().map(|b| b.len()))
            .finish()
    }
}

/// Registered font families by name
#[derive(Debug, Clone, Default)]
pub struct FontLibrary {
    families: BTreeMap<String, FontFaces>,
    fallback: Option<String>,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a family, validating that the bytes parse
    pub fn add_family(&mut self, name: &str, regular: Vec<u8>, bold: Option<Vec<u8>>) -> Result<(), TextError> {
        TrueTypeMetrics::parse(&regular)?;
        if let Some(bold) = &bold {
            TrueTypeMetrics::parse(bold)?;
        }

        self.families.insert(
            name.to_string(),
            FontFaces {
                regular: regular.into(),
                bold: bold.map(Into::into),
            },
        );
        Ok(())
    }

    /// Family used when a template names none or an unknown one
    pub fn set_fallback(&mut self, name: &str) {
        self.fallback = Some(name.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&FontFaces> {
        self.families.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Pick the face for a text element
    ///
    /// Tries the requested family, then the fallback family, then the
    /// built-in Helvetica faces.
    pub fn resolve(&self, family: Option<&str>, weight: FontWeight) -> ResolvedFont<'_> {
        let lookup = |name: &str| self.families.get_key_value(name);

        match family.and_then(lookup).or_else(|| self.fallback.as_deref().and_then(lookup)) {
            Some((name, faces)) => ResolvedFont::TrueType {
                family: name,
                faces,
                weight,
            },
            None => ResolvedFont::Standard(match weight {
                FontWeight::Normal => StandardFont::Helvetica,
                FontWeight::Bold => StandardFont::HelveticaBold,
            }),
        }
    }
}

/// Face chosen for one text element
#[derive(Debug, Clone, Copy)]
pub enum ResolvedFont<'a> {
    /// Built-in PDF face, no font file
    Standard(StandardFont),
    /// Registered TrueType family
    TrueType {
        family: &'a str,
        faces: &'a FontFaces,
        weight: FontWeight,
    },
}

impl ResolvedFont<'_> {
    /// TrueType bytes, `None` for the standard faces
    pub fn face_bytes(&self) -> Option<&[u8]> {
        match self {
            ResolvedFont::Standard(_) => None,
            ResolvedFont::TrueType { faces, weight, .. } => Some(faces.face(*weight)),
        }
    }

    /// Run `f` with the metrics of this face
    pub fn with_metrics<R>(&self, f: impl FnOnce(&dyn FontMetrics) -> R) -> R {
        match self {
            ResolvedFont::Standard(font) => f(font),
            ResolvedFont::TrueType { faces, weight, .. } => match TrueTypeMetrics::parse(faces.face(*weight)) {
                Ok(metrics) => f(&metrics),
                // Bytes were validated on registration
                Err(_) => f(&StandardFont::Helvetica),
            },
        }
    }
}
