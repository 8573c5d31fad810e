//! Raster backend producing a PNG at a fixed density

use super::{ImageAsset, Sampling, Surface, SurfaceError, TextRun};
use crate::{BoundingBox, PageSize, Rgb};
use ab_glyph::{point, Font, FontRef, PxScale, ScaleFont};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbImage, RgbaImage};

const CM_PER_INCH: f64 = 2.54;
const METRES_PER_INCH: f64 = 0.0254;

/// Scaled images may not exceed the page by more than this factor per side
const MAX_OVERSCAN: u32 = 8;

/// Highest supported raster density
pub const MAX_DPI: u32 = 2400;

/// Largest canvas allocated, in pixels (about 400 MB of RGBA)
pub const MAX_PIXELS: u64 = 100_000_000;

/// RGBA canvas sized `round(cm / 2.54 * dpi)` on each side
pub struct RasterSurface {
    canvas: RgbaImage,
    dpi: u32,
}

impl RasterSurface {
    pub fn new(page: PageSize, dpi: u32) -> Result<Self, SurfaceError> {
        if dpi == 0 || dpi > MAX_DPI {
            return Err(SurfaceError::Image(format!("dpi must be between 1 and {MAX_DPI}, got {dpi}")));
        }
        let too_large = || {
            SurfaceError::Image(format!(
                "{} x {} cm at {dpi} dpi exceeds {MAX_PIXELS} pixels",
                page.width_cm, page.height_cm
            ))
        };
        let (width, height) = page.to_pixels(dpi).ok_or_else(too_large)?;
        match (width as u64).checked_mul(height as u64) {
            Some(pixels) if pixels <= MAX_PIXELS => {}
            _ => return Err(too_large()),
        }
        Ok(Self {
            canvas: RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])),
            dpi,
        })
    }

    fn px(&self, cm: f64) -> f64 {
        cm / CM_PER_INCH * self.dpi as f64
    }

    /// Pixel rectangle `(x0, y0, x1, y1)` of a box, clamped to the canvas
    fn pixel_bounds(&self, b: BoundingBox) -> (u32, u32, u32, u32) {
        let clamp_x = |v: f64| v.round().clamp(0.0, self.canvas.width() as f64) as u32;
        let clamp_y = |v: f64| v.round().clamp(0.0, self.canvas.height() as f64) as u32;
        (
            clamp_x(self.px(b.left)),
            clamp_y(self.px(b.top)),
            clamp_x(self.px(b.right())),
            clamp_y(self.px(b.bottom())),
        )
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgb, coverage: f32) {
        if x < 0 || y < 0 || x >= self.canvas.width() as i64 || y >= self.canvas.height() as i64 {
            return;
        }
        let alpha = coverage.clamp(0.0, 1.0);
        let pixel = self.canvas.get_pixel_mut(x as u32, y as u32);
        let target = color.to_rgba();
        for channel in 0..3 {
            let old = pixel[channel] as f32;
            let new = target[channel] as f32;
            pixel[channel] = (new * alpha + old * (1.0 - alpha)).round() as u8;
        }
    }
}

impl Surface for RasterSurface {
    fn fill_rect(&mut self, rect: BoundingBox, color: Rgb) {
        let (x0, y0, x1, y1) = self.pixel_bounds(rect);
        let pixel = color.to_rgba();
        for y in y0..y1 {
            for x in x0..x1 {
                self.canvas.put_pixel(x, y, pixel);
            }
        }
    }

    fn draw_image(
        &mut self,
        image: &ImageAsset,
        dest: BoundingBox,
        clip: Option<BoundingBox>,
        sampling: Sampling,
    ) -> Result<(), SurfaceError> {
        let width = self.px(dest.width).round().max(1.0) as u32;
        let height = self.px(dest.height).round().max(1.0) as u32;
        if width > self.canvas.width() * MAX_OVERSCAN || height > self.canvas.height() * MAX_OVERSCAN {
            return Err(SurfaceError::Image(format!("image scaled to {width}x{height} px")));
        }

        let decoded = image::load_from_memory(&image.bytes)
            .map_err(|e| SurfaceError::Image(e.to_string()))?
            .to_rgba8();
        let filter = match sampling {
            Sampling::Smooth => FilterType::Triangle,
            Sampling::Crisp => FilterType::Nearest,
        };
        let scaled = imageops::resize(&decoded, width, height, filter);

        let left = self.px(dest.left).round() as i64;
        let top = self.px(dest.top).round() as i64;

        // Keep only the part inside the clip and the canvas
        let visible = clip.unwrap_or(dest);
        let (cx0, cy0, cx1, cy1) = self.pixel_bounds(visible);
        let x0 = (cx0 as i64).max(left);
        let y0 = (cy0 as i64).max(top);
        let x1 = (cx1 as i64).min(left + width as i64);
        let y1 = (cy1 as i64).min(top + height as i64);
        if x1 <= x0 || y1 <= y0 {
            return Ok(());
        }

        let part = imageops::crop_imm(
            &scaled,
            (x0 - left) as u32,
            (y0 - top) as u32,
            (x1 - x0) as u32,
            (y1 - y0) as u32,
        )
        .to_image();
        imageops::overlay(&mut self.canvas, &part, x0, y0);

        Ok(())
    }

    fn draw_text(&mut self, run: &TextRun<'_>) -> Result<(), SurfaceError> {
        let bytes = run.font.face_bytes().ok_or(SurfaceError::MissingFont)?;
        let font = FontRef::try_from_slice(bytes).map_err(|e| SurfaceError::Font(e.to_string()))?;

        let units_per_em = font
            .units_per_em()
            .ok_or_else(|| SurfaceError::Font("font has no units per em".to_string()))?;
        // PxScale is relative to ascent - descent, not to the em
        let px_per_em = (run.size_pt / 72.0 * self.dpi as f64) as f32;
        let scale = PxScale::from(px_per_em * font.height_unscaled() / units_per_em);
        let scaled = font.as_scaled(scale);

        let baseline = self.px(run.baseline_cm) as f32;
        let mut caret = self.px(run.left_cm) as f32;

        for c in run.text.chars() {
            let id = font.glyph_id(c);
            let glyph = id.with_scale_and_position(scale, point(caret, baseline));
            caret += scaled.h_advance(id);

            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let x = bounds.min.x as i64 + gx as i64;
                    let y = bounds.min.y as i64 + gy as i64;
                    self.blend(x, y, run.color, coverage);
                });
            }
        }

        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, SurfaceError> {
        let RasterSurface { canvas, dpi } = *self;
        let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
        encode_png(&rgb, dpi).map_err(|e| SurfaceError::Image(e.to_string()))
    }
}

/// Encode 8-bit RGB with a `pHYs` chunk declaring `dpi`
fn encode_png(rgb: &RgbImage, dpi: u32) -> Result<Vec<u8>, png::EncodingError> {
    let ppm = (dpi as f64 / METRES_PER_INCH).round() as u32;

    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, rgb.width(), rgb.height());
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: ppm,
        yppu: ppm,
        unit: png::Unit::Meter,
    }));

    let mut writer = encoder.write_header()?;
    writer.write_image_data(rgb.as_raw())?;
    writer.finish()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResolvedFont;
    use badge_text::StandardFont;
    use std::io::Cursor;

    fn page() -> PageSize {
        PageSize {
            width_cm: 8.5,
            height_cm: 12.5,
        }
    }

    fn phys_chunk(png: &[u8]) -> Option<&[u8]> {
        png.windows(4).position(|w| w == b"pHYs").map(|i| &png[i + 4..i + 13])
    }

    #[test]
    fn test_canvas_size_follows_dpi() {
        let surface = Box::new(RasterSurface::new(page(), 300).unwrap());
        let png = surface.finish().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1004, 1476));
    }

    #[test]
    fn test_phys_declares_density() {
        let surface = Box::new(RasterSurface::new(page(), 300).unwrap());
        let png = surface.finish().unwrap();
        let chunk = phys_chunk(&png).unwrap();
        assert_eq!(u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]), 11811);
        assert_eq!(u32::from_be_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]), 11811);
        assert_eq!(chunk[8], 1);
    }

    #[test]
    fn test_oversized_canvas_is_rejected() {
        let huge = PageSize {
            width_cm: 1e9,
            height_cm: 1e9,
        };
        assert!(RasterSurface::new(huge, 300).is_err());

        // 100 x 100 m fits in u32 per side but not in the pixel budget
        let wide = PageSize {
            width_cm: 10_000.0,
            height_cm: 10_000.0,
        };
        assert!(RasterSurface::new(wide, 300).is_err());
    }

    #[test]
    fn test_dpi_is_bounded() {
        assert!(RasterSurface::new(page(), 0).is_err());
        assert!(RasterSurface::new(page(), MAX_DPI + 1).is_err());
        let small = PageSize {
            width_cm: 1.0,
            height_cm: 1.0,
        };
        assert!(RasterSurface::new(small, MAX_DPI).is_ok());
    }

    #[test]
    fn test_fill_rect_is_clamped() {
        let mut surface = RasterSurface::new(page(), 100).unwrap();
        surface.fill_rect(BoundingBox::new(-1.0, -1.0, 2.0, 2.0), Rgb::BLACK);
        assert_eq!(surface.canvas.get_pixel(0, 0)[0], 0);
        assert_eq!(surface.canvas.get_pixel(100, 100)[0], 255);
    }

    #[test]
    fn test_draw_image_respects_clip() {
        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])))
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        let asset = ImageAsset::from_bytes(png.into_inner()).unwrap();

        let mut surface = RasterSurface::new(page(), 254).unwrap();
        surface
            .draw_image(
                &asset,
                BoundingBox::new(0.0, 0.0, 2.0, 2.0),
                Some(BoundingBox::new(0.0, 0.0, 1.0, 1.0)),
                Sampling::Crisp,
            )
            .unwrap();

        // 254 dpi = 100 px per cm
        assert_eq!(surface.canvas.get_pixel(50, 50)[0], 0);
        assert_eq!(surface.canvas.get_pixel(150, 150)[0], 255);
    }

    #[test]
    fn test_standard_font_cannot_be_rasterized() {
        let mut surface = RasterSurface::new(page(), 100).unwrap();
        let result = surface.draw_text(&TextRun {
            text: "Jane",
            left_cm: 1.0,
            baseline_cm: 2.0,
            font: ResolvedFont::Standard(StandardFont::Helvetica),
            size_pt: 12.0,
            color: Rgb::BLACK,
        });
        assert!(matches!(result, Err(SurfaceError::MissingFont)));
    }
}
