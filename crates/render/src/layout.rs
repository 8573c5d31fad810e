//! Layout resolver
//!
//! Turns an element's declared position into an absolute box in
//! centimetres with the origin at the top-left corner of the page. Pure
//! geometry: no I/O, no font metrics, no clipping.

use crate::TemplateElement;

/// Absolute placement in centimetres, origin top-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Resolve an element's box on a page of the given size
///
/// - `qrcode`, `logo`: `(x, y)` is the centre of the box.
/// - `text`: `(x, y)` is the baseline anchor. The box spans `maxWidth`
///   (0 when absent) positioned by `align`, has zero height and its `top`
///   is the first baseline.
/// - `background`: the full page.
pub fn resolve(element: &TemplateElement, page_width_cm: f64, page_height_cm: f64) -> BoundingBox {
    match element {
        TemplateElement::QrCode(e) => centered(e.x, e.y, e.width, e.height),
        TemplateElement::Logo(e) => centered(e.x, e.y, e.width, e.height),
        TemplateElement::Text(e) => {
            let width = e.max_width.filter(|w| *w > 0.0).unwrap_or(0.0);
            BoundingBox::new(e.x - width * e.align.factor(), e.y, width, 0.0)
        }
        TemplateElement::Background(_) => BoundingBox::new(0.0, 0.0, page_width_cm, page_height_cm),
    }
}

fn centered(x: f64, y: f64, width: f64, height: f64) -> BoundingBox {
    BoundingBox::new(x - width / 2.0, y - height / 2.0, width, height)
}

/// Scale `src_w x src_h` to fit inside `target`, centred, never cropped
pub fn contain_fit(src_w: f64, src_h: f64, target: BoundingBox) -> BoundingBox {
    if src_w <= 0.0 || src_h <= 0.0 {
        return target;
    }
    let scale = (target.width / src_w).min(target.height / src_h);
    scaled_center(src_w * scale, src_h * scale, target)
}

/// Scale `src_w x src_h` to cover `target`, centred, overflow to be clipped
pub fn cover_fit(src_w: f64, src_h: f64, target: BoundingBox) -> BoundingBox {
    if src_w <= 0.0 || src_h <= 0.0 {
        return target;
    }
    let scale = (target.width / src_w).max(target.height / src_h);
    scaled_center(src_w * scale, src_h * scale, target)
}

/// Largest square centred in `target`
pub fn square_fit(target: BoundingBox) -> BoundingBox {
    let side = target.width.min(target.height);
    scaled_center(side, side, target)
}

fn scaled_center(width: f64, height: f64, target: BoundingBox) -> BoundingBox {
    BoundingBox::new(
        target.left + (target.width - width) / 2.0,
        target.top + (target.height - height) / 2.0,
        width,
        height,
    )
}

/// Left edge of a text line of `line_width` inside a resolved text box
pub fn line_left(text_box: BoundingBox, line_width: f64, align_factor: f64) -> f64 {
    text_box.left + (text_box.width - line_width) * align_factor
}
