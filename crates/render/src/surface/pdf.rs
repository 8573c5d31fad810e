//! Vector backend on top of `pdf-core`

use super::{ImageAsset, Sampling, Surface, SurfaceError, TextRun};
use crate::{BoundingBox, FontWeight, PageSize, ResolvedFont, Rgb};
use badge_text::StandardFont;
use pdf_core::{cm_to_points, BaseFont, FontFamilyBuilder, PdfDocument, Rect, TextFont};

/// One-page PDF whose MediaBox is the badge size
pub struct PdfSurface {
    doc: PdfDocument,
}

impl PdfSurface {
    pub fn new(page: PageSize) -> Result<Self, SurfaceError> {
        let (width, height) = page.to_points();
        Ok(Self {
            doc: PdfDocument::new(width, height)?,
        })
    }

    /// Map a resolved face to a `pdf-core` font, embedding TrueType families on first use
    fn text_font(&mut self, font: &ResolvedFont<'_>) -> Result<TextFont, SurfaceError> {
        match font {
            ResolvedFont::Standard(standard) => Ok(TextFont::Base(match standard {
                StandardFont::Helvetica => BaseFont::Helvetica,
                StandardFont::HelveticaBold => BaseFont::HelveticaBold,
            })),
            ResolvedFont::TrueType { family, faces, weight } => {
                if !self.doc.has_font_family(family) {
                    let mut builder = FontFamilyBuilder::new().regular(faces.regular.to_vec());
                    if let Some(bold) = &faces.bold {
                        builder = builder.bold(bold.to_vec());
                    }
                    self.doc.register_font_family(family, builder)?;
                }

                Ok(TextFont::Family {
                    name: family.to_string(),
                    weight: match weight {
                        FontWeight::Normal => pdf_core::FontWeight::Regular,
                        FontWeight::Bold => pdf_core::FontWeight::Bold,
                    },
                })
            }
        }
    }
}

fn to_rect(b: BoundingBox) -> Rect {
    Rect::new(
        cm_to_points(b.left),
        cm_to_points(b.top),
        cm_to_points(b.width),
        cm_to_points(b.height),
    )
}

impl Surface for PdfSurface {
    fn fill_rect(&mut self, rect: BoundingBox, color: Rgb) {
        self.doc.fill_rect(to_rect(rect), color.to_pdf());
    }

    fn draw_image(
        &mut self,
        image: &ImageAsset,
        dest: BoundingBox,
        clip: Option<BoundingBox>,
        sampling: Sampling,
    ) -> Result<(), SurfaceError> {
        self.doc.insert_image(
            &image.bytes,
            to_rect(dest),
            clip.map(to_rect),
            sampling == Sampling::Smooth,
        )?;
        Ok(())
    }

    fn draw_text(&mut self, run: &TextRun<'_>) -> Result<(), SurfaceError> {
        let font = self.text_font(&run.font)?;
        self.doc.insert_text(
            run.text,
            cm_to_points(run.left_cm),
            cm_to_points(run.baseline_cm),
            &font,
            run.size_pt,
            run.color.to_pdf(),
        )?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, SurfaceError> {
        Ok(self.doc.to_bytes()?)
    }
}
