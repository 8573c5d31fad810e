//! Font metrics used for line wrapping and alignment

use crate::{Result, TextError};

/// Horizontal and vertical metrics of a font face
///
/// All values are in em units (1.0 equals the font size), so a width in
/// points is `advance * font_size_pt`.
pub trait FontMetrics {
    /// Advance width of a character
    fn advance(&self, c: char) -> f64;

    /// Height of capital letters above the baseline
    fn cap_height(&self) -> f64;

    /// Distance from the baseline to the top of the tallest glyphs
    fn ascent(&self) -> f64;

    /// Distance from the baseline to the bottom of descenders (negative)
    fn descent(&self) -> f64;

    /// Width of a string in points at the given size
    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|c| self.advance(c)).sum::<f64>() * font_size
    }
}

/// Helvetica glyph widths for U+0020..=U+007E (AFM units per 1000 em)
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

/// Helvetica-Bold glyph widths for U+0020..=U+007E
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    333, 333, 584, 584, 584, 611, 975, // :..@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    333, 278, 333, 584, 556, 333, // [..`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a..m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n..z
    389, 280, 389, 584, // {..~
];

/// WinAnsi characters above Latin-1: (char, Helvetica, Helvetica-Bold)
const WIN_ANSI_HIGH_WIDTHS: [(char, u16, u16); 27] = [
    ('\u{20AC}', 556, 556),   // Euro
    ('\u{201A}', 222, 278),   // quotesinglbase
    ('\u{0192}', 556, 556),   // florin
    ('\u{201E}', 333, 500),   // quotedblbase
    ('\u{2026}', 1000, 1000), // ellipsis
    ('\u{2020}', 556, 556),   // dagger
    ('\u{2021}', 556, 556),   // daggerdbl
    ('\u{02C6}', 333, 333),   // circumflex
    ('\u{2030}', 1000, 1000), // perthousand
    ('\u{0160}', 667, 667),   // Scaron
    ('\u{2039}', 333, 333),   // guilsinglleft
    ('\u{0152}', 1000, 1000), // OE
    ('\u{017D}', 611, 611),   // Zcaron
    ('\u{2018}', 222, 278),   // quoteleft
    ('\u{2019}', 222, 278),   // quoteright
    ('\u{201C}', 333, 500),   // quotedblleft
    ('\u{201D}', 333, 500),   // quotedblright
    ('\u{2022}', 350, 350),   // bullet
    ('\u{2013}', 556, 556),   // endash
    ('\u{2014}', 1000, 1000), // emdash
    ('\u{02DC}', 333, 333),   // tilde
    ('\u{2122}', 1000, 1000), // trademark
    ('\u{0161}', 500, 556),   // scaron
    ('\u{203A}', 333, 333),   // guilsinglright
    ('\u{0153}', 944, 944),   // oe
    ('\u{017E}', 500, 500),   // zcaron
    ('\u{0178}', 667, 667),   // Ydieresis
];

/// Width used for characters outside the tables
const DEFAULT_WIDTH: u16 = 556;

/// Built-in PDF base fonts
///
/// These need no font file: every PDF viewer ships them. They only cover
/// WinAnsi characters, anything else prints as `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StandardFont {
    #[default]
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// PDF BaseFont name
    pub fn base_font_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    fn widths(&self) -> &'static [u16; 95] {
        match self {
            StandardFont::Helvetica => &HELVETICA_WIDTHS,
            StandardFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        }
    }
}

impl FontMetrics for StandardFont {
    fn advance(&self, c: char) -> f64 {
        let code = c as u32;
        let width = if (0x20..=0x7E).contains(&code) {
            self.widths()[(code - 0x20) as usize]
        } else if c == '\u{00A0}' {
            278
        } else if let Some((_, regular, bold)) = WIN_ANSI_HIGH_WIDTHS.iter().find(|(ch, _, _)| *ch == c) {
            match self {
                StandardFont::Helvetica => *regular,
                StandardFont::HelveticaBold => *bold,
            }
        } else {
            DEFAULT_WIDTH
        };
        width as f64 / 1000.0
    }

    fn cap_height(&self) -> f64 {
        0.718
    }

    fn ascent(&self) -> f64 {
        0.718
    }

    fn descent(&self) -> f64 {
        -0.207
    }
}

/// Metrics read from a TrueType/OpenType font file
#[derive(Clone)]
pub struct TrueTypeMetrics<'a> {
    face: ttf_parser::Face<'a>,
    units_per_em: f64,
}

impl<'a> TrueTypeMetrics<'a> {
    /// Parse metrics from raw font bytes
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let face = ttf_parser::Face::parse(data, 0)
            .map_err(|e| TextError::FontParseError(format!("{e:?}")))?;
        let units_per_em = face.units_per_em() as f64;

        Ok(Self { face, units_per_em })
    }
}

impl FontMetrics for TrueTypeMetrics<'_> {
    fn advance(&self, c: char) -> f64 {
        self.face
            .glyph_index(c)
            .and_then(|id| self.face.glyph_hor_advance(id))
            .map(|w| w as f64 / self.units_per_em)
            .unwrap_or(0.0)
    }

    fn cap_height(&self) -> f64 {
        // Not every font has an OS/2 cap height
        self.face
            .capital_height()
            .map(|h| h as f64 / self.units_per_em)
            .unwrap_or_else(|| self.ascent())
    }

    fn ascent(&self) -> f64 {
        self.face.ascender() as f64 / self.units_per_em
    }

    fn descent(&self) -> f64 {
        self.face.descender() as f64 / self.units_per_em
    }
}

impl std::fmt::Debug for TrueTypeMetrics<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrueTypeMetrics")
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}
