//! Font handling for PDF documents

use crate::text::hex_string;
use crate::{PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::BTreeSet;

/// Font weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

/// Built-in PDF base fonts (no embedding required)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum BaseFont {
    #[default]
    Helvetica,
    HelveticaBold,
}

impl BaseFont {
    /// PDF BaseFont name
    pub fn name(&self) -> &'static str {
        match self {
            BaseFont::Helvetica => "Helvetica",
            BaseFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Simple Type1 font dictionary
    pub(crate) fn to_dictionary(self) -> Dictionary {
        Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type1".into()),
            ("BaseFont", Object::Name(self.name().into())),
            ("Encoding", "WinAnsiEncoding".into()),
        ])
    }
}

/// Font data structure for embedded fonts
#[derive(Debug, Clone)]
pub struct FontData {
    /// Font name/identifier
    pub name: String,
    /// Raw TTF data
    pub ttf_data: Vec<u8>,
    /// Characters drawn with this font, kept ordered for stable output
    pub used_chars: BTreeSet<char>,
}

/// Font family with a required regular face and an optional bold face
#[derive(Debug, Clone)]
pub struct FontFamily {
    /// Regular variant
    pub regular: FontData,
    /// Bold variant
    pub bold: Option<FontData>,
}

impl FontFamily {
    /// Get the font data for the specified weight
    /// Falls back to regular if the bold variant is not available
    pub fn get_variant_mut(&mut self, weight: FontWeight) -> &mut FontData {
        match (weight, self.bold.is_some()) {
            (FontWeight::Bold, true) => self.bold.as_mut().unwrap_or(&mut self.regular),
            _ => &mut self.regular,
        }
    }
}

/// Builder for registering font families
#[derive(Default)]
pub struct FontFamilyBuilder {
    regular: Option<Vec<u8>>,
    bold: Option<Vec<u8>>,
}

impl FontFamilyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regular(mut self, ttf_data: Vec<u8>) -> Self {
        self.regular = Some(ttf_data);
        self
    }

    pub fn bold(mut self, ttf_data: Vec<u8>) -> Self {
        self.bold = Some(ttf_data);
        self
    }

    /// Build the FontFamily from the provided TTF data
    pub fn build(self, family_name: &str) -> Result<FontFamily> {
        let regular = match self.regular {
            Some(data) => FontData::from_ttf(&format!("{family_name}-regular"), data)?,
            None => {
                return Err(PdfError::FontParseError(
                    "FontFamily must have at least a regular variant".to_string(),
                ))
            }
        };

        let bold = self
            .bold
            .map(|data| FontData::from_ttf(&format!("{family_name}-bold"), data))
            .transpose()?;

        Ok(FontFamily { regular, bold })
    }
}

impl FontData {
    /// Create font data from TTF bytes
    ///
    /// # Arguments
    /// * `name` - Font identifier
    /// * `ttf_data` - TrueType font file bytes
    pub fn from_ttf(name: &str, ttf_data: Vec<u8>) -> Result<Self> {
        ttf_parser::Face::parse(&ttf_data, 0).map_err(|e| PdfError::FontParseError(format!("{name}: {e}")))?;

        Ok(Self {
            name: name.to_string(),
            ttf_data,
            used_chars: BTreeSet::new(),
        })
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.ttf_data, 0).ok()
    }

    /// Add characters to the used set
    pub fn add_chars(&mut self, text: &str) {
        self.used_chars.extend(text.chars());
    }

    /// Get font units per em
    pub fn units_per_em(&self) -> u16 {
        self.face().map(|face| face.units_per_em()).unwrap_or(1000)
    }

    /// Get font ascender
    pub fn ascender(&self) -> i16 {
        self.face().map(|face| face.ascender()).unwrap_or(800)
    }

    /// Get font descender
    pub fn descender(&self) -> i16 {
        self.face().map(|face| face.descender()).unwrap_or(-200)
    }

    /// Scale a value in font units to the 1000 unit glyph space
    fn to_glyph_space(&self, value: f64) -> i64 {
        (value * 1000.0 / self.units_per_em() as f64).round() as i64
    }

    /// Encode text as hex string for PDF Tj operator (two bytes per glyph)
    pub fn encode_text_hex(&self, text: &str) -> String {
        let face = self.face();
        let bytes: Vec<u8> = text
            .chars()
            .flat_map(|c| {
                let gid = face.as_ref().and_then(|f| f.glyph_index(c)).map(|g| g.0).unwrap_or(0);
                gid.to_be_bytes()
            })
            .collect();
        hex_string(&bytes)
    }

    /// Add the Type0 font with its descendant CIDFont, descriptor, font
    /// file and ToUnicode CMap to `doc`, returning the Type0 font id
    pub(crate) fn embed(&self, doc: &mut Document) -> Result<ObjectId> {
        let font_name = Object::Name(self.name.clone().into_bytes());

        let font_file_id = doc.add_object(Stream::new(
            Dictionary::from_iter(vec![("Length1", (self.ttf_data.len() as i64).into())]),
            self.ttf_data.clone(),
        ));

        let ascent = self.to_glyph_space(self.ascender() as f64);
        let descent = self.to_glyph_space(self.descender() as f64);
        let cap_height = self
            .face()
            .and_then(|f| f.capital_height())
            .map(|h| self.to_glyph_space(h as f64))
            .unwrap_or(ascent);

        let descriptor_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", "FontDescriptor".into()),
            ("FontName", font_name.clone()),
            ("Flags", 4.into()),
            (
                "FontBBox",
                vec![0.into(), descent.into(), 1000.into(), ascent.into()].into(),
            ),
            ("ItalicAngle", 0.into()),
            ("Ascent", ascent.into()),
            ("Descent", descent.into()),
            ("CapHeight", cap_height.into()),
            ("StemV", 80.into()),
            ("FontFile2", Object::Reference(font_file_id)),
        ]));

        let cid_system_info = Dictionary::from_iter(vec![
            ("Registry", Object::string_literal("Adobe")),
            ("Ordering", Object::string_literal("Identity")),
            ("Supplement", 0.into()),
        ]);

        let cid_font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "CIDFontType2".into()),
            ("BaseFont", font_name.clone()),
            ("CIDSystemInfo", cid_system_info.into()),
            ("FontDescriptor", Object::Reference(descriptor_id)),
            ("W", self.generate_widths_array().into()),
            ("DW", 1000.into()),
            ("CIDToGIDMap", "Identity".into()),
        ]));

        let cmap = self.generate_tounicode_cmap();
        let tounicode_id = doc.add_object(Stream::new(Dictionary::new(), cmap.into_bytes()));

        let type0_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type0".into()),
            ("BaseFont", font_name),
            ("Encoding", "Identity-H".into()),
            ("DescendantFonts", vec![Object::Reference(cid_font_id)].into()),
            ("ToUnicode", Object::Reference(tounicode_id)),
        ]));

        Ok(type0_id)
    }

    /// Generate /W array for the glyphs used in the document
    fn generate_widths_array(&self) -> Vec<Object> {
        let mut widths = Vec::new();
        let face = match self.face() {
            Some(f) => f,
            None => return widths,
        };

        let gids: BTreeSet<u16> = self
            .used_chars
            .iter()
            .filter_map(|&c| face.glyph_index(c).map(|g| g.0))
            .collect();

        // Individual mapping format: [gid1 [width1] gid2 [width2] ...]
        for gid in gids {
            let advance = face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0);
            widths.push((gid as i64).into());
            widths.push(vec![self.to_glyph_space(advance as f64).into()].into());
        }

        widths
    }

    /// Generate ToUnicode CMap stream content
    fn generate_tounicode_cmap(&self) -> String {
        let mut cmap = String::new();

        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        let face = self.face();
        let chars: Vec<char> = self.used_chars.iter().copied().collect();

        // At most 100 entries per bfchar section
        for chunk in chars.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for c in chunk {
                let gid = face.as_ref().and_then(|f| f.glyph_index(*c)).map(|g| g.0).unwrap_or(0);
                let mut utf16 = [0u16; 2];
                let unicode: String = c.encode_utf16(&mut utf16).iter().map(|u| format!("{u:04X}")).collect();
                cmap.push_str(&format!("<{gid:04X}> <{unicode}>\n"));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");

        cmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Font data whose bytes are not a parseable face
    fn unparsed_font() -> FontData {
        FontData {
            name: "test".to_string(),
            ttf_data: vec![0u8; 100],
            used_chars: BTreeSet::new(),
        }
    }

    #[test]
    fn test_from_ttf_rejects_garbage() {
        let result = FontData::from_ttf("broken", vec![0u8; 100]);
        assert!(matches!(result, Err(PdfError::FontParseError(_))));
    }

    #[test]
    fn test_builder_requires_regular() {
        let result = FontFamilyBuilder::new().build("empty");
        assert!(matches!(result, Err(PdfError::FontParseError(_))));
    }

    #[test]
    fn test_add_chars() {
        let mut font = unparsed_font();
        font.add_chars("Hello");
        assert_eq!(font.used_chars.len(), 4); // H, e, l, o
        assert!(font.used_chars.contains(&'H'));
        assert!(font.used_chars.contains(&'l'));
    }

    #[test]
    fn test_add_chars_arabic() {
        let mut font = unparsed_font();
        font.add_chars("سارة");
        assert_eq!(font.used_chars.len(), 4);
        assert!(font.used_chars.contains(&'س'));
    }

    #[test]
    fn test_metrics_defaults_without_face() {
        let font = unparsed_font();
        assert_eq!(font.units_per_em(), 1000);
        assert_eq!(font.ascender(), 800);
        assert_eq!(font.descender(), -200);
    }

    #[test]
    fn test_encode_text_hex_no_face() {
        let font = unparsed_font();
        assert_eq!(font.encode_text_hex(""), "<>");
        // Without a face, all characters map to GID 0
        assert_eq!(font.encode_text_hex("AB"), "<00000000>");
    }

    #[test]
    fn test_widths_array_empty_without_face() {
        let mut font = unparsed_font();
        font.add_chars("AB");
        assert!(font.generate_widths_array().is_empty());
    }

    #[test]
    fn test_generate_tounicode_cmap() {
        let mut font = unparsed_font();
        font.add_chars("BA");

        let cmap = font.generate_tounicode_cmap();

        assert!(cmap.contains("/CIDInit"));
        assert!(cmap.contains("1 begincodespacerange"));
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.find("<0000> <0041>").unwrap() < cmap.find("<0000> <0042>").unwrap());
        assert!(cmap.ends_with("end\nend\n"));
    }

    #[test]
    fn test_generate_tounicode_cmap_empty() {
        let cmap = unparsed_font().generate_tounicode_cmap();
        assert!(cmap.contains("begincmap"));
        assert!(!cmap.contains("beginbfchar"));
    }

    #[test]
    fn test_embed_adds_objects() {
        let mut doc = Document::with_version("1.7");
        let mut font = unparsed_font();
        font.add_chars("Hi");

        let id = font.embed(&mut doc).unwrap();
        let type0 = doc.get_dictionary(id).unwrap();

        assert_eq!(type0.get(b"Subtype").unwrap().as_name().unwrap(), b"Type0");
        assert_eq!(type0.get(b"Encoding").unwrap().as_name().unwrap(), b"Identity-H");
        // Type0, CIDFont, descriptor, font file, ToUnicode
        assert_eq!(doc.objects.len(), 5);
    }

    #[test]
    fn test_base_font_dictionary() {
        let dict = BaseFont::HelveticaBold.to_dictionary();
        assert_eq!(dict.get(b"BaseFont").unwrap().as_name().unwrap(), b"Helvetica-Bold");
        assert_eq!(dict.get(b"Encoding").unwrap().as_name().unwrap(), b"WinAnsiEncoding");
    }

    #[test]
    fn test_family_bold_falls_back_to_regular() {
        let mut family = FontFamily {
            regular: unparsed_font(),
            bold: None,
        };
        assert_eq!(family.get_variant_mut(FontWeight::Bold).name, "test");
    }
}
