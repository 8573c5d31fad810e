//! Document compositor

use crate::surface::{PdfSurface, RasterSurface};
use crate::{
    render, resolve, validate_element, AssetSource, AttendeeRecord, BackgroundElement, BadgeError, BadgeTemplate,
    BoundingBox, ElementError, ElementFailure, EventRecord, OutputFormat, RenderOptions, RenderedDocument, Result,
    Rgb, Surface, TemplateElement,
};
use log::{debug, info, warn};

/// Id reported for the template-level background image
const TEMPLATE_BACKGROUND_ID: &str = "template_background";

/// Everything one badge is drawn from
///
/// All inputs are borrowed read-only; `compose` never mutates them.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub attendee: &'a AttendeeRecord,
    pub event: &'a EventRecord,
    pub template: &'a BadgeTemplate,
    pub assets: &'a dyn AssetSource,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        attendee: &'a AttendeeRecord,
        event: &'a EventRecord,
        template: &'a BadgeTemplate,
        assets: &'a dyn AssetSource,
    ) -> Self {
        Self {
            attendee,
            event,
            template,
            assets,
        }
    }
}

fn absorb(skipped: &mut Vec<ElementFailure>, result: std::result::Result<(), ElementError>) {
    if let Err(e) = result {
        warn!("skipping {e}");
        skipped.push(ElementFailure {
            element_id: e.element_id,
            error: e.kind.to_string(),
        });
    }
}

/// Compose one badge
///
/// The page is filled white, then the background layer is drawn (the first
/// visible `background` element, else the template background image), then
/// every other visible element in array order. A failing element is logged,
/// left blank and listed in [`RenderedDocument::skipped`].
///
/// # Errors
/// * [`BadgeError::Configuration`] - invalid page size, dpi or element
///   geometry, raised before anything is fetched or drawn
/// * [`BadgeError::Output`] - the backend could not encode the document
pub fn compose(ctx: &RenderContext<'_>, options: &RenderOptions) -> Result<RenderedDocument> {
    let page = ctx.template.page_size();
    let valid = |cm: f64| cm.is_finite() && cm > 0.0;
    if !valid(page.width_cm) || !valid(page.height_cm) {
        return Err(BadgeError::Configuration(format!(
            "invalid badge size {} x {} cm",
            page.width_cm, page.height_cm
        )));
    }
    if options.format == OutputFormat::Png && options.dpi == 0 {
        return Err(BadgeError::Configuration("dpi must be positive".to_string()));
    }

    let elements = ctx.template.effective_elements();
    let visible: Vec<&TemplateElement> = elements.iter().filter(|e| e.is_visible()).collect();
    for element in &visible {
        validate_element(element)?;
    }

    let mut surface: Box<dyn Surface> = match options.format {
        OutputFormat::Pdf => Box::new(PdfSurface::new(page).map_err(|e| BadgeError::Configuration(e.to_string()))?),
        OutputFormat::Png => Box::new(
            RasterSurface::new(page, options.dpi).map_err(|e| BadgeError::Configuration(e.to_string()))?,
        ),
    };

    let page_box = BoundingBox::new(0.0, 0.0, page.width_cm, page.height_cm);
    surface.fill_rect(page_box, Rgb::WHITE);

    let mut skipped = Vec::new();

    let background = visible
        .iter()
        .copied()
        .find(|e| matches!(e, TemplateElement::Background(_)));
    match background {
        Some(element) => absorb(&mut skipped, render(surface.as_mut(), page_box, element, ctx, options)),
        None if ctx.template.background_image_ref.is_some() => {
            let implicit = TemplateElement::Background(BackgroundElement {
                id: TEMPLATE_BACKGROUND_ID.to_string(),
                x: 0.0,
                y: 0.0,
                visible: true,
                label: None,
                locked: None,
                src: None,
            });
            absorb(&mut skipped, render(surface.as_mut(), page_box, &implicit, ctx, options));
        }
        None => {}
    }

    for element in &visible {
        if let TemplateElement::Background(_) = element {
            if !background.is_some_and(|b| std::ptr::eq(b, *element)) {
                debug!("ignoring extra background element '{}'", element.id());
            }
            continue;
        }

        let bbox = resolve(element, page.width_cm, page.height_cm);
        absorb(&mut skipped, render(surface.as_mut(), bbox, element, ctx, options));
    }

    let bytes = surface.finish().map_err(|e| BadgeError::Output(e.to_string()))?;

    info!(
        "composed {} badge {} x {} cm for '{}': {} elements, {} skipped, {} bytes",
        options.format.extension(),
        page.width_cm,
        page.height_cm,
        ctx.attendee.qr_uuid,
        visible.len(),
        skipped.len(),
        bytes.len()
    );

    Ok(RenderedDocument {
        bytes,
        mime_type: options.format.mime_type(),
        page_size: page,
        dpi: (options.format == OutputFormat::Png).then_some(options.dpi),
        skipped,
    })
}
