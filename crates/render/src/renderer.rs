//! Element renderer
//!
//! Draws one resolved element onto a [`Surface`]. Errors are scoped to the
//! element; the compositor decides what to do with them.

use crate::layout::{contain_fit, cover_fit, line_left, square_fit};
use crate::surface::{ImageAsset, Sampling, TextRun};
use crate::{
    bind_field, parse_hex_color, qr, AssetFetchError, BackgroundElement, BoundingBox, LogoElement, RenderContext,
    RenderOptions, Rgb, Surface, TemplateElement, TextElement,
};
use badge_text::wrap_to_width;
use log::debug;
use pdf_core::{cm_to_points, POINTS_PER_CM};
use thiserror::Error;

/// Failure of a single element
#[derive(Debug, Error)]
#[error("element '{element_id}': {kind}")]
pub struct ElementError {
    pub element_id: String,
    pub kind: ElementErrorKind,
}

/// Cause of an [`ElementError`]
#[derive(Debug, Error)]
pub enum ElementErrorKind {
    #[error(transparent)]
    AssetFetch(#[from] AssetFetchError),

    #[error("render failed: {0}")]
    Render(String),

    #[error("encoding failed: {0}")]
    Encoding(String),
}

impl From<crate::surface::SurfaceError> for ElementErrorKind {
    fn from(e: crate::surface::SurfaceError) -> Self {
        ElementErrorKind::Render(e.to_string())
    }
}

type ElementResult = std::result::Result<(), ElementErrorKind>;

/// Draw `element` into its resolved box
///
/// # Arguments
/// * `surface` - Backend to paint on
/// * `bbox` - Box from [`crate::resolve`]
/// * `element` - Visible element to draw
/// * `ctx` - Records, template and asset source
/// * `options` - Fonts, timeouts and line height
pub fn render(
    surface: &mut dyn Surface,
    bbox: BoundingBox,
    element: &TemplateElement,
    ctx: &RenderContext<'_>,
    options: &RenderOptions,
) -> Result<(), ElementError> {
    debug!("rendering {} element '{}' at {:?}", element.kind(), element.id(), bbox);

    let result = match element {
        TemplateElement::Text(e) => render_text(surface, bbox, e, ctx, options),
        TemplateElement::QrCode(_) => render_qrcode(surface, bbox, ctx),
        TemplateElement::Logo(e) => render_logo(surface, bbox, e, ctx, options),
        TemplateElement::Background(e) => render_background(surface, bbox, e, ctx, options),
    };

    result.map_err(|kind| ElementError {
        element_id: element.id().to_string(),
        kind,
    })
}

/// Text color: element color, else template primary color, else black
fn text_color(element: &TextElement, ctx: &RenderContext<'_>) -> Rgb {
    match element.color.as_deref() {
        Some(value) => parse_hex_color(value).unwrap_or(Rgb::BLACK),
        None => ctx
            .template
            .primary_color
            .as_deref()
            .and_then(parse_hex_color)
            .unwrap_or(Rgb::BLACK),
    }
}

fn render_text(
    surface: &mut dyn Surface,
    bbox: BoundingBox,
    element: &TextElement,
    ctx: &RenderContext<'_>,
    options: &RenderOptions,
) -> ElementResult {
    let text = match element.field.as_deref() {
        Some(key) => bind_field(key, ctx.attendee, ctx.event),
        None => String::new(),
    };
    if text.is_empty() {
        return Ok(());
    }

    let font = options
        .fonts
        .resolve(ctx.template.font_family.as_deref(), element.font_weight);
    let size = element.font_size;
    let max_width_pt = element.max_width.filter(|w| *w > 0.0).map(cm_to_points);

    let lines = font.with_metrics(|m| wrap_to_width(&text, size, max_width_pt, m));
    let color = text_color(element, ctx);
    let line_advance_cm = size * options.line_height_factor / POINTS_PER_CM;

    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let width_cm = font.with_metrics(|m| m.text_width(line, size)) / POINTS_PER_CM;
        surface.draw_text(&TextRun {
            text: line,
            left_cm: line_left(bbox, width_cm, element.align.factor()),
            baseline_cm: bbox.top + i as f64 * line_advance_cm,
            font,
            size_pt: size,
            color,
        })?;
    }

    Ok(())
}

fn render_qrcode(surface: &mut dyn Surface, bbox: BoundingBox, ctx: &RenderContext<'_>) -> ElementResult {
    let matrix = qr::encode_for_print(&ctx.attendee.qr_uuid).map_err(|e| ElementErrorKind::Encoding(e.to_string()))?;
    let image = ImageAsset {
        bytes: matrix.to_png().map_err(|e| ElementErrorKind::Encoding(e.to_string()))?,
        width_px: matrix.size_px(),
        height_px: matrix.size_px(),
    };

    surface.draw_image(&image, square_fit(bbox), None, Sampling::Crisp)?;
    Ok(())
}

/// Fetch and measure an image asset
fn fetch_image(reference: &str, ctx: &RenderContext<'_>, options: &RenderOptions) -> Result<ImageAsset, ElementErrorKind> {
    let bytes = ctx.assets.fetch(reference, options.asset_timeout())?;
    ImageAsset::from_bytes(bytes)
        .map_err(|e| ElementErrorKind::AssetFetch(AssetFetchError::Invalid(format!("{reference}: {e}"))))
}

fn non_empty(reference: Option<&str>) -> Option<&str> {
    reference.filter(|r| !r.trim().is_empty())
}

fn render_logo(
    surface: &mut dyn Surface,
    bbox: BoundingBox,
    element: &LogoElement,
    ctx: &RenderContext<'_>,
    options: &RenderOptions,
) -> ElementResult {
    let Some(reference) = non_empty(element.src.as_deref()).or(non_empty(ctx.event.logo_ref.as_deref())) else {
        return Ok(());
    };

    let image = fetch_image(reference, ctx, options)?;
    let dest = contain_fit(image.width_px as f64, image.height_px as f64, bbox);
    surface.draw_image(&image, dest, None, Sampling::Smooth)?;
    Ok(())
}

fn render_background(
    surface: &mut dyn Surface,
    bbox: BoundingBox,
    element: &BackgroundElement,
    ctx: &RenderContext<'_>,
    options: &RenderOptions,
) -> ElementResult {
    let Some(reference) =
        non_empty(element.src.as_deref()).or(non_empty(ctx.template.background_image_ref.as_deref()))
    else {
        return Ok(());
    };

    let image = fetch_image(reference, ctx, options)?;
    let dest = cover_fit(image.width_px as f64, image.height_px as f64, bbox);
    surface.draw_image(&image, dest, Some(bbox), Sampling::Smooth)?;
    Ok(())
}
