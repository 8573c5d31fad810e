//! End-to-end tests for badge composition
//!
//! Documents are composed from JSON templates and read back with lopdf and
//! the image crate.

use badge_render::{
    bind_field, compose, resolve, AssetFetchError, AssetSource, AttendeeRecord, BadgeError, BadgeTemplate,
    BoundingBox, EventRecord, FontLibrary, MemoryAssets, RenderContext, RenderOptions,
};
use lopdf::content::Content;
use chrono::NaiveDate;
use image::{DynamicImage, Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const POINTS_PER_CM: f64 = 72.0 / 2.54;

const DEJAVU_SANS: &[u8] = include_bytes!("fixtures/DejaVuSans.ttf");

/// Counts fetches before delegating to an in-memory store
struct CountingAssets {
    inner: MemoryAssets,
    fetches: AtomicUsize,
}

impl CountingAssets {
    fn new(inner: MemoryAssets) -> Self {
        Self {
            inner,
            fetches: AtomicUsize::new(0),
        }
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl AssetSource for CountingAssets {
    fn fetch(&self, reference: &str, timeout: Duration) -> Result<Vec<u8>, AssetFetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(reference, timeout)
    }
}

fn logo_png() -> Vec<u8> {
    solid_png(40, 20, [200, 30, 30, 255])
}

fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)))
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn with_dejavu(options: RenderOptions) -> RenderOptions {
    let mut fonts = FontLibrary::new();
    fonts.add_family("dejavu", DEJAVU_SANS.to_vec(), None).unwrap();
    fonts.set_fallback("dejavu");
    options.with_fonts(fonts)
}

/// Content stream operations of the first page
fn page_operations(bytes: &[u8]) -> Vec<lopdf::content::Operation> {
    let doc = lopdf::Document::load_mem(bytes).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap().operations
}

fn operands(op: &lopdf::content::Operation) -> Vec<f64> {
    op.operands.iter().map(|o| o.as_float().unwrap() as f64).collect()
}

/// Inclusive pixel columns and rows that are not white
fn ink_bounds(image: &RgbaImage, rows: std::ops::Range<u32>) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for y in rows {
        for x in 0..image.width() {
            if image.get_pixel(x, y).0[..3] != [255, 255, 255] {
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
    }
    bounds
}

fn attendee(uuid: &str) -> AttendeeRecord {
    AttendeeRecord {
        name: "Jane Doe".to_string(),
        company: None,
        category: "exhibitor".to_string(),
        qr_uuid: uuid.to_string(),
        ..Default::default()
    }
}

fn event() -> EventRecord {
    EventRecord {
        name: "Build Expo".to_string(),
        name_ar: None,
        date: NaiveDate::from_ymd_opt(2025, 10, 26).unwrap(),
        location: Some("Riyadh Front".to_string()),
        location_ar: None,
        logo_ref: Some("logos/expo.png".to_string()),
    }
}

const UUID_A: &str = "7f3c2a10-5b7e-4c1a-9d2e-0a1b2c3d4e5f";
const UUID_B: &str = "0c9e8d7f-6a5b-4c3d-8e2f-1a0b9c8d7e6f";

fn template(json: &str) -> BadgeTemplate {
    BadgeTemplate::from_json(json).unwrap()
}

fn logo_template() -> BadgeTemplate {
    template(
        r##"{
            "category": "exhibitor",
            "badgeWidthCm": 8.5,
            "badgeHeightCm": 12.5,
            "elements": [
                { "id": "logo", "type": "logo", "x": 4.25, "y": 1.5, "width": 4, "height": 2 }
            ]
        }"##,
    )
}

fn media_box(bytes: &[u8]) -> Vec<f32> {
    let doc = lopdf::Document::load_mem(bytes).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    doc.get_dictionary(page_id)
        .unwrap()
        .get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o.as_float().unwrap())
        .collect()
}

fn image_count(bytes: &[u8]) -> usize {
    let doc = lopdf::Document::load_mem(bytes).unwrap();
    doc.objects
        .values()
        .filter_map(|o| o.as_stream().ok())
        .filter(|s| matches!(s.dict.get(b"Subtype").and_then(|v| v.as_name()), Ok(name) if name == b"Image"))
        .count()
}

#[test]
fn test_default_layout_pdf_is_deterministic() {
    let template = BadgeTemplate::default();
    let assets = MemoryAssets::new().with("logos/expo.png", logo_png());
    let (attendee, event) = (attendee(UUID_A), event());
    let ctx = RenderContext::new(&attendee, &event, &template, &assets);

    let first = compose(&ctx, &RenderOptions::pdf()).unwrap();
    let second = compose(&ctx, &RenderOptions::pdf()).unwrap();
    assert_eq!(first.bytes, second.bytes);
    assert!(first.skipped.is_empty(), "{:?}", first.skipped);
    assert!(first.bytes.starts_with(b"%PDF-"));
}

#[test]
fn test_png_is_deterministic() {
    let template = logo_template();
    let assets = MemoryAssets::new().with("logos/expo.png", logo_png());
    let (attendee, event) = (attendee(UUID_A), event());
    let ctx = RenderContext::new(&attendee, &event, &template, &assets);

    let first = compose(&ctx, &RenderOptions::png(150)).unwrap();
    let second = compose(&ctx, &RenderOptions::png(150)).unwrap();
    assert_eq!(first.bytes, second.bytes);
}

#[test]
fn test_pdf_media_box_matches_badge_size() {
    let template = template(r#"{ "badgeWidthCm": 9.0, "badgeHeightCm": 13.0, "elements": [] }"#);
    let assets = MemoryAssets::new();
    let (attendee, event) = (attendee(UUID_A), event());
    let ctx = RenderContext::new(&attendee, &event, &template, &assets);

    let document = compose(&ctx, &RenderOptions::pdf()).unwrap();
    let mb = media_box(&document.bytes);
    assert_eq!(mb.len(), 4);
    assert!((mb[2] as f64 / POINTS_PER_CM - 9.0).abs() < 0.01);
    assert!((mb[3] as f64 / POINTS_PER_CM - 13.0).abs() < 0.01);
    assert_eq!(document.page_size.width_cm, 9.0);
}

#[test]
fn test_png_dimensions_and_density() {
    let template = logo_template();
    let assets = MemoryAssets::new().with("logos/expo.png", logo_png());
    let (attendee, event) = (attendee(UUID_A), event());
    let ctx = RenderContext::new(&attendee, &event, &template, &assets);

    let document = compose(&ctx, &RenderOptions::png(300)).unwrap();
    assert_eq!(document.mime_type, "image/png");
    assert_eq!(document.dpi, Some(300));

    let decoded = image::load_from_memory(&document.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1004, 1476));

    let at = document.bytes.windows(4).position(|w| w == b"pHYs").unwrap();
    let ppm = u32::from_be_bytes(document.bytes[at + 4..at + 8].try_into().unwrap());
    assert_eq!(ppm, 11811);
    assert_eq!(document.bytes[at + 12], 1);

    // Logo is contain-fit into 4x2 cm centred at (4.25, 1.5): centre is red
    let pixel = decoded.to_rgba8().get_pixel(502, 177).0;
    assert_eq!(pixel, [200, 30, 30, 255]);
}

#[test]
fn test_qr_anchor_and_center_text_resolution() {
    let template = template(
        r#"{ "elements": [
            { "id": "qr", "type": "qrcode", "x": 4, "y": 9, "width": 2, "height": 2 },
            { "id": "name", "type": "text", "x": 4.25, "y": 5, "align": "center", "maxWidth": 7 }
        ] }"#,
    );
    let page = template.page_size();

    let qr = resolve(&template.elements[0], page.width_cm, page.height_cm);
    assert_eq!(qr, BoundingBox::new(3.0, 8.0, 2.0, 2.0));

    let text = resolve(&template.elements[1], page.width_cm, page.height_cm);
    assert!((text.left - 0.75).abs() < 1e-9);
}

#[test]
fn test_missing_company_binds_freelancer() {
    assert_eq!(bind_field("attendee.company", &attendee(UUID_A), &event()), "Freelancer");
}

#[test]
fn test_missing_logo_is_skipped_without_image() {
    let template = logo_template();
    let assets = CountingAssets::new(MemoryAssets::new());
    let (attendee, event) = (attendee(UUID_A), event());
    let ctx = RenderContext::new(&attendee, &event, &template, &assets);

    let document = compose(&ctx, &RenderOptions::pdf()).unwrap();
    assert_eq!(document.skipped.len(), 1);
    assert_eq!(document.skipped[0].element_id, "logo");
    assert_eq!(assets.fetches(), 1);
    assert_eq!(image_count(&document.bytes), 0);
}

#[test]
fn test_present_logo_is_embedded() {
    let template = logo_template();
    let assets = MemoryAssets::new().with("logos/expo.png", logo_png());
    let (attendee, event) = (attendee(UUID_A), event());
    let ctx = RenderContext::new(&attendee, &event, &template, &assets);

    let document = compose(&ctx, &RenderOptions::pdf()).unwrap();
    assert!(document.skipped.is_empty());
    assert_eq!(image_count(&document.bytes), 1);
}

#[test]
fn test_invisible_element_is_never_fetched() {
    let template = template(
        r#"{ "elements": [
            { "id": "logo", "type": "logo", "x": 4.25, "y": 1.5, "width": 4, "height": 2, "visible": false },
            { "id": "bg", "type": "background", "src": "bg.png", "visible": false }
        ] }"#,
    );
    let assets = CountingAssets::new(MemoryAssets::new().with("logos/expo.png", logo_png()));
    let (attendee, event) = (attendee(UUID_A), event());
    let ctx = RenderContext::new(&attendee, &event, &template, &assets);

    let document = compose(&ctx, &RenderOptions::pdf()).unwrap();
    assert_eq!(assets.fetches(), 0);
    assert!(document.skipped.is_empty());
    assert_eq!(image_count(&document.bytes), 0);
}

#[test]
fn test_qr_bytes_follow_identifier() {
    let template = template(r#"{ "elements": [ { "id": "qr", "type": "qrcode", "x": 4, "y": 9, "width": 2, "height": 2 } ] }"#);
    let assets = MemoryAssets::new();
    let event = event();

    let render = |uuid: &str| {
        let attendee = attendee(uuid);
        let ctx = RenderContext::new(&attendee, &event, &template, &assets);
        compose(&ctx, &RenderOptions::pdf()).unwrap().bytes
    };

    assert_eq!(render(UUID_A), render(UUID_A));
    assert_ne!(render(UUID_A), render(UUID_B));
}

#[test]
fn test_zero_width_fails_before_fetching() {
    let template = BadgeTemplate {
        badge_width_cm: Some(0.0),
        background_image_ref: Some("bg.png".to_string()),
        ..Default::default()
    };
    let assets = CountingAssets::new(MemoryAssets::new());
    let (attendee, event) = (attendee(UUID_A), event());
    let ctx = RenderContext::new(&attendee, &event, &template, &assets);

    let result = compose(&ctx, &RenderOptions::pdf());
    assert!(matches!(result, Err(BadgeError::Configuration(_))));
    assert_eq!(assets.fetches(), 0);
}

#[test]
fn test_raster_text_without_font_is_skipped() {
    let template = template(r#"{ "elements": [ { "id": "name", "type": "text", "x": 1, "y": 5, "field": "attendee.name" } ] }"#);
    let assets = MemoryAssets::new();
    let (attendee, event) = (attendee(UUID_A), event());
    let ctx = RenderContext::new(&attendee, &event, &template, &assets);

    let document = compose(&ctx, &RenderOptions::png(100)).unwrap();
    assert_eq!(document.skipped.len(), 1);
    assert_eq!(document.skipped[0].element_id, "name");
}

/// Logo and a centred line, drawn at 254 dpi (100 px per cm)
fn shared_layout() -> BadgeTemplate {
    template(
        r#"{
            "badgeWidthCm": 8.5,
            "badgeHeightCm": 12.5,
            "elements": [
                { "id": "logo", "type": "logo", "x": 4.25, "y": 1.5, "width": 4, "height": 2 },
                { "id": "title", "type": "text", "x": 4.25, "y": 5, "field": "static:HH",
                  "fontSize": 24, "align": "center", "maxWidth": 7 }
            ]
        }"#,
    )
}

/// Expected line left edge in cm and ink extent in em of "HH"
fn hh_metrics(size_pt: f64) -> (f64, f64, f64) {
    let face = ttf_parser::Face::parse(DEJAVU_SANS, 0).unwrap();
    let upem = face.units_per_em() as f64;
    let h = face.glyph_index('H').unwrap();
    let advance = face.glyph_hor_advance(h).unwrap() as f64 / upem;
    let glyph = face.glyph_bounding_box(h).unwrap();

    let width_cm = 2.0 * advance * size_pt / POINTS_PER_CM;
    let left_cm = 4.25 - width_cm / 2.0;
    (left_cm, glyph.x_min as f64 / upem, advance + glyph.x_max as f64 / upem)
}

#[test]
fn test_raster_text_matches_layout() {
    let template = shared_layout();
    let assets = MemoryAssets::new().with("logos/expo.png", logo_png());
    let (attendee, event) = (attendee(UUID_A), event());
    let ctx = RenderContext::new(&attendee, &event, &template, &assets);

    let document = compose(&ctx, &with_dejavu(RenderOptions::png(254))).unwrap();
    assert!(document.skipped.is_empty(), "{:?}", document.skipped);
    let canvas = image::load_from_memory(&document.bytes).unwrap().to_rgba8();

    let (left_cm, ink_start_em, ink_end_em) = hh_metrics(24.0);
    let px_per_em = 24.0 / 72.0 * 254.0;
    let expected_left = left_cm * 100.0 + ink_start_em * px_per_em;
    let expected_right = left_cm * 100.0 + ink_end_em * px_per_em;

    // Baseline at 5 cm = row 500, capitals sit above it
    let (x0, y0, x1, y1) = ink_bounds(&canvas, 400..510).unwrap();
    assert!((x0 as f64 - expected_left).abs() <= 1.0, "left {x0} vs {expected_left}");
    assert!((x1 as f64 + 1.0 - expected_right).abs() <= 1.0, "right {x1} vs {expected_right}");
    assert!(y1 <= 500, "ink below baseline at row {y1}");
    assert!(y0 > 400);
}

#[test]
fn test_pdf_and_png_agree_on_placement() {
    let template = shared_layout();
    let assets = MemoryAssets::new().with("logos/expo.png", logo_png());
    let (attendee, event) = (attendee(UUID_A), event());
    let ctx = RenderContext::new(&attendee, &event, &template, &assets);

    let pdf = compose(&ctx, &with_dejavu(RenderOptions::pdf())).unwrap();
    let png = compose(&ctx, &with_dejavu(RenderOptions::png(254))).unwrap();
    assert!(pdf.skipped.is_empty() && png.skipped.is_empty());

    let ops = page_operations(&pdf.bytes);
    let page_height_pt = 12.5 * POINTS_PER_CM;

    // Logo: cm operands are w 0 0 h x y in points, origin bottom-left
    let cm = ops.iter().find(|op| op.operator == "cm").unwrap();
    let m = operands(cm);
    let pdf_logo = (
        m[4] / POINTS_PER_CM,
        (page_height_pt - m[5] - m[3]) / POINTS_PER_CM,
        m[0] / POINTS_PER_CM,
        m[3] / POINTS_PER_CM,
    );

    let canvas = image::load_from_memory(&png.bytes).unwrap().to_rgba8();
    let (x0, y0, x1, y1) = ink_bounds(&canvas, 0..300).unwrap();
    let png_logo = (
        x0 as f64 / 100.0,
        y0 as f64 / 100.0,
        (x1 + 1 - x0) as f64 / 100.0,
        (y1 + 1 - y0) as f64 / 100.0,
    );
    for (a, b) in [(pdf_logo.0, png_logo.0), (pdf_logo.1, png_logo.1), (pdf_logo.2, png_logo.2), (pdf_logo.3, png_logo.3)] {
        assert!((a - b).abs() <= 0.01, "pdf {pdf_logo:?} vs png {png_logo:?}");
    }

    // Text: Td places the line origin on the same left edge and baseline
    let td = ops.iter().find(|op| op.operator == "Td").unwrap();
    let t = operands(td);
    let (left_cm, _, _) = hh_metrics(24.0);
    assert!((t[0] / POINTS_PER_CM - left_cm).abs() < 1e-3);
    assert!(((page_height_pt - t[1]) / POINTS_PER_CM - 5.0).abs() < 1e-3);
}

#[test]
fn test_background_is_drawn_below_earlier_elements() {
    let template = template(
        r#"{ "elements": [
            { "id": "logo", "type": "logo", "x": 4.25, "y": 1.5, "width": 4, "height": 2 },
            { "id": "bg", "type": "background", "src": "bg.png" }
        ] }"#,
    );
    let assets = MemoryAssets::new()
        .with("logos/expo.png", logo_png())
        .with("bg.png", solid_png(17, 25, [20, 40, 220, 255]));
    let (attendee, event) = (attendee(UUID_A), event());
    let ctx = RenderContext::new(&attendee, &event, &template, &assets);

    let document = compose(&ctx, &RenderOptions::png(300)).unwrap();
    assert!(document.skipped.is_empty(), "{:?}", document.skipped);
    let canvas = image::load_from_memory(&document.bytes).unwrap().to_rgba8();

    assert_eq!(canvas.get_pixel(502, 177).0, [200, 30, 30, 255]);
    assert_eq!(canvas.get_pixel(10, 1400).0, [20, 40, 220, 255]);
}

#[test]
fn test_missing_background_leaves_white_page() {
    let template = BadgeTemplate {
        background_image_ref: Some("backgrounds/missing.png".to_string()),
        ..logo_template()
    };
    let assets = MemoryAssets::new().with("logos/expo.png", logo_png());
    let (attendee, event) = (attendee(UUID_A), event());
    let ctx = RenderContext::new(&attendee, &event, &template, &assets);

    let document = compose(&ctx, &RenderOptions::png(300)).unwrap();
    assert_eq!(document.skipped.len(), 1);
    assert_eq!(document.skipped[0].element_id, "template_background");

    let canvas = image::load_from_memory(&document.bytes).unwrap().to_rgba8();
    assert_eq!(canvas.get_pixel(0, 0).0, [255, 255, 255, 255]);
    assert_eq!(canvas.get_pixel(1003, 1475).0, [255, 255, 255, 255]);
    assert_eq!(canvas.get_pixel(502, 177).0, [200, 30, 30, 255]);
}
