//! Single page PDF document

use crate::image::{deflate, generate_image_operators, ImageXObject};
use crate::text::{encode_win_ansi, generate_text_operators, hex_string, pdf_number, TextRenderContext};
use crate::{BaseFont, FontFamily, FontFamilyBuilder, FontWeight, PdfError, Result};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// White color
    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Rectangle in points, origin at the top-left corner of the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// Font used for a text run
#[derive(Debug, Clone, PartialEq)]
pub enum TextFont {
    /// One of the standard 14 fonts
    Base(BaseFont),
    /// A registered TrueType family
    Family { name: String, weight: FontWeight },
}

/// Key identifying one font resource on the page
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum FontKey {
    Base(BaseFont),
    Embedded { family: String, variant: String },
}

/// PDF Document wrapper providing high-level drawing operations
///
/// Content is appended in call order, so later calls paint over earlier
/// ones. Nothing is written until [`PdfDocument::to_bytes`].
pub struct PdfDocument {
    /// Page width in points
    width: f64,
    /// Page height in points
    height: f64,
    /// Registered font families
    font_families: BTreeMap<String, FontFamily>,
    /// Font resources in first-use order (key -> resource name)
    font_resources: BTreeMap<FontKey, String>,
    /// Images in insertion order (resource name, xobject)
    images: Vec<(String, ImageXObject)>,
    /// Embedded images (data hash -> resource name)
    image_cache: BTreeMap<(u64, bool), String>,
    /// Page content operators
    content: Vec<u8>,
}

impl PdfDocument {
    /// Create an empty one-page document
    ///
    /// # Arguments
    /// * `width` - Page width in points
    /// * `height` - Page height in points
    pub fn new(width: f64, height: f64) -> Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(PdfError::InvalidPageSize(width, height));
        }

        Ok(Self {
            width,
            height,
            font_families: BTreeMap::new(),
            font_resources: BTreeMap::new(),
            images: Vec::new(),
            image_cache: BTreeMap::new(),
            content: Vec::new(),
        })
    }

    /// Page size in points
    pub fn page_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Register a font family with its variants
    ///
    /// # Example
    /// ```ignore
    /// doc.register_font_family("noto",
    ///     FontFamilyBuilder::new()
    ///         .regular(std::fs::read("NotoSans-Regular.ttf")?)
    ///         .bold(std::fs::read("NotoSans-Bold.ttf")?)
    /// )?;
    /// ```
    pub fn register_font_family(&mut self, name: &str, builder: FontFamilyBuilder) -> Result<()> {
        if self.font_families.contains_key(name) {
            return Err(PdfError::FontAlreadyExists(name.to_string()));
        }

        let family = builder.build(name)?;
        self.font_families.insert(name.to_string(), family);

        Ok(())
    }

    /// Check whether a family has been registered
    pub fn has_font_family(&self, name: &str) -> bool {
        self.font_families.contains_key(name)
    }

    /// Convert a top-left based y coordinate to PDF's bottom-left origin
    fn flip_y(&self, y: f64) -> f64 {
        self.height - y
    }

    /// Convert a top-left based rectangle to PDF `(x, y, width, height)`
    fn to_pdf_rect(&self, rect: Rect) -> (f64, f64, f64, f64) {
        (rect.x, self.flip_y(rect.y + rect.height), rect.width, rect.height)
    }

    /// Fill a rectangle with a solid color
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let (x, y, w, h) = self.to_pdf_rect(rect);
        let ops = format!(
            "q\n{} {} {} rg\n{} {} {} {} re f\nQ\n",
            pdf_number(color.r as f64),
            pdf_number(color.g as f64),
            pdf_number(color.b as f64),
            pdf_number(x),
            pdf_number(y),
            pdf_number(w),
            pdf_number(h)
        );
        self.content.extend_from_slice(ops.as_bytes());
    }

    /// Insert an image stretched to `dest`
    ///
    /// # Arguments
    /// * `data` - JPEG or PNG bytes
    /// * `dest` - Where the full image lands, may extend past the page
    /// * `clip` - Only the part inside this rectangle is painted
    /// * `interpolate` - Allow viewers to smooth the image (off for QR codes)
    ///
    /// Identical bytes are embedded once and referenced again.
    pub fn insert_image(&mut self, data: &[u8], dest: Rect, clip: Option<Rect>, interpolate: bool) -> Result<()> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let key = (hasher.finish(), interpolate);

        let name = match self.image_cache.get(&key) {
            Some(name) => name.clone(),
            None => {
                let mut xobject = ImageXObject::from_bytes(data)?;
                xobject.interpolate = interpolate;
                let name = format!("Im{}", self.images.len() + 1);
                self.images.push((name.clone(), xobject));
                self.image_cache.insert(key, name.clone());
                name
            }
        };

        let (x, y, w, h) = self.to_pdf_rect(dest);
        let clip = clip.map(|c| self.to_pdf_rect(c));
        let ops = generate_image_operators(&name, x, y, w, h, clip);
        self.content.extend_from_slice(&ops);

        Ok(())
    }

    /// Insert one line of text
    ///
    /// # Arguments
    /// * `text` - Text to draw, no line breaking is applied
    /// * `x` - Left edge of the line in points
    /// * `baseline_y` - Baseline position in points from the top of the page
    /// * `font` - Standard font or registered family
    /// * `font_size` - Font size in points
    /// * `color` - Fill color
    pub fn insert_text(
        &mut self,
        text: &str,
        x: f64,
        baseline_y: f64,
        font: &TextFont,
        font_size: f64,
        color: Color,
    ) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        let (key, operand) = match font {
            TextFont::Base(base) => (FontKey::Base(*base), hex_string(&encode_win_ansi(text))),
            TextFont::Family { name, weight } => {
                let family = self
                    .font_families
                    .get_mut(name)
                    .ok_or_else(|| PdfError::FontNotFound(name.clone()))?;
                let variant = family.get_variant_mut(*weight);
                variant.add_chars(text);
                let operand = variant.encode_text_hex(text);
                let key = FontKey::Embedded {
                    family: name.clone(),
                    variant: variant.name.clone(),
                };
                (key, operand)
            }
        };

        let next = format!("F{}", self.font_resources.len() + 1);
        let font_name = self.font_resources.entry(key).or_insert(next).clone();

        let ctx = TextRenderContext {
            font_name,
            font_size,
            color,
        };
        let ops = generate_text_operators(&operand, x, self.flip_y(baseline_y), &ctx);
        self.content.extend_from_slice(&ops);

        Ok(())
    }

    /// Serialize the document
    ///
    /// The output carries no timestamps or random identifiers: the same
    /// sequence of calls always yields the same bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        let mut font_entries: Vec<(&FontKey, &String)> = self.font_resources.iter().collect();
        font_entries.sort_by_key(|(_, name)| resource_index(name));
        for (key, resource) in font_entries {
            let font_id = match key {
                FontKey::Base(base) => doc.add_object(base.to_dictionary()),
                FontKey::Embedded { family, variant } => {
                    let family = self
                        .font_families
                        .get(family)
                        .ok_or_else(|| PdfError::FontNotFound(family.clone()))?;
                    let data = if family.regular.name == *variant {
                        &family.regular
                    } else {
                        family.bold.as_ref().unwrap_or(&family.regular)
                    };
                    data.embed(&mut doc)?
                }
            };
            fonts.set(resource.as_bytes().to_vec(), Object::Reference(font_id));
        }

        let mut xobjects = Dictionary::new();
        for (name, xobject) in &self.images {
            let smask_id = xobject
                .smask
                .as_ref()
                .map(|mask| doc.add_object(mask.to_pdf_stream(None)));
            let image_id = doc.add_object(xobject.to_pdf_stream(smask_id));
            xobjects.set(name.as_bytes().to_vec(), Object::Reference(image_id));
        }

        let mut resources = Dictionary::new();
        if !fonts.is_empty() {
            resources.set("Font", fonts);
        }
        if !xobjects.is_empty() {
            resources.set("XObject", xobjects);
        }

        let content = Stream::new(dictionary! { "Filter" => "FlateDecode" }, deflate(&self.content)?);
        let content_id = doc.add_object(content);

        let media_box: Vec<Object> = vec![
            0.into(),
            0.into(),
            Object::Real(self.width as f32),
            Object::Real(self.height as f32),
        ];
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box,
            "Resources" => resources,
            "Contents" => content_id,
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(bytes)
    }
}

/// Numeric part of a resource name such as "F12"
fn resource_index(name: &str) -> u32 {
    name.trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .unwrap_or(u32::MAX)
}
