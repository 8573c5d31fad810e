//! WASM bindings for badgeprint
//!
//! This crate provides JavaScript-friendly API for:
//! - Composing badges as PDF or PNG in the browser
//! - Encoding attendee QR codes with the shared print profile
//! - The date and label formatting used on badges
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { BadgeRenderer, encodeQr } from 'badgeprint-wasm';
//!
//! await init();
//!
//! const renderer = BadgeRenderer.fromJson(templateJson);
//! renderer.loadFont('inter', regularBytes, boldBytes);
//! renderer.loadAsset('logos/expo.png', logoBytes);
//!
//! const pdf = renderer.render(attendee, event, { format: 'pdf' });
//! console.log(renderer.skipped());
//! ```

use badge_render::{
    compose, AttendeeRecord, BadgeTemplate, EventRecord, FontLibrary, MemoryAssets, RenderContext, RenderOptions,
};
use wasm_bindgen::prelude::*;

// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Encode a QR payload as PNG with the print profile
///
/// @param payload - Attendee identifier
/// @returns PNG bytes (Uint8Array)
#[wasm_bindgen(js_name = encodeQr)]
pub fn encode_qr(payload: &str) -> Result<Vec<u8>, JsValue> {
    badge_render::qr::encode_for_print(payload)
        .and_then(|matrix| matrix.to_png())
        .map_err(js_error)
}

/// Badge text formatting utilities
#[wasm_bindgen]
pub struct BadgeFormatter;

#[wasm_bindgen]
impl BadgeFormatter {
    /// Format a date the way badges print it
    ///
    /// @param year - Gregorian year
    /// @param month - Month (1-12)
    /// @param day - Day
    /// @returns Long date (e.g., "October 26, 2025")
    #[wasm_bindgen(js_name = formatDate)]
    pub fn format_date(year: i32, month: u32, day: u32) -> Result<String, JsValue> {
        let date = chrono::NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| JsValue::from_str("invalid date"))?;
        Ok(badge_text::format_long_date(date))
    }

    /// Uppercase the first letter (category labels)
    #[wasm_bindgen(js_name = capitalize)]
    pub fn capitalize(text: &str) -> String {
        badge_text::capitalize_first(text)
    }
}

/// Badge renderer bound to one template
#[wasm_bindgen]
pub struct BadgeRenderer {
    template: BadgeTemplate,
    fonts: FontLibrary,
    assets: MemoryAssets,
    skipped: Vec<String>,
}

#[wasm_bindgen]
impl BadgeRenderer {
    /// Create a renderer with the default template and layout
    #[wasm_bindgen(constructor)]
    pub fn new() -> BadgeRenderer {
        Self::with_template(BadgeTemplate::default())
    }

    /// Create renderer from template JSON
    ///
    /// @param json - Template JSON string
    /// @returns BadgeRenderer instance
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(json: &str) -> Result<BadgeRenderer, JsValue> {
        let template = BadgeTemplate::from_json(json).map_err(js_error)?;
        Ok(Self::with_template(template))
    }

    fn with_template(template: BadgeTemplate) -> BadgeRenderer {
        BadgeRenderer {
            template,
            fonts: FontLibrary::new(),
            assets: MemoryAssets::new(),
            skipped: Vec::new(),
        }
    }

    /// Load a font family
    ///
    /// The first family loaded is also used for templates naming none.
    ///
    /// @param name - Family name referenced by the template
    /// @param regular - Regular TTF bytes (Uint8Array)
    /// @param bold - Optional bold TTF bytes (Uint8Array)
    #[wasm_bindgen(js_name = loadFont)]
    pub fn load_font(&mut self, name: &str, regular: &[u8], bold: Option<Vec<u8>>) -> Result<(), JsValue> {
        let first = self.fonts.is_empty();
        self.fonts
            .add_family(name, regular.to_vec(), bold)
            .map_err(js_error)?;
        if first {
            self.fonts.set_fallback(name);
        }
        Ok(())
    }

    /// Make an asset available to logo and background elements
    ///
    /// @param reference - Reference used by the template or event
    /// @param data - Image bytes (Uint8Array)
    #[wasm_bindgen(js_name = loadAsset)]
    pub fn load_asset(&mut self, reference: &str, data: &[u8]) {
        self.assets.insert(reference, data.to_vec());
    }

    /// Render one badge
    ///
    /// @param attendee - Attendee record
    /// @param event - Event record
    /// @param options - Render options (format, dpi, lineHeightFactor)
    /// @returns PDF or PNG bytes (Uint8Array)
    pub fn render(&mut self, attendee: JsValue, event: JsValue, options: JsValue) -> Result<Vec<u8>, JsValue> {
        let attendee: AttendeeRecord = serde_wasm_bindgen::from_value(attendee)?;
        let event: EventRecord = serde_wasm_bindgen::from_value(event)?;
        let options = if options.is_undefined() || options.is_null() {
            RenderOptions::default()
        } else {
            serde_wasm_bindgen::from_value::<RenderOptions>(options)?
        }
        .with_fonts(self.fonts.clone());

        let ctx = RenderContext::new(&attendee, &event, &self.template, &self.assets);
        let document = compose(&ctx, &options).map_err(js_error)?;

        self.skipped = document
            .skipped
            .iter()
            .map(|f| format!("{}: {}", f.element_id, f.error))
            .collect();
        Ok(document.bytes)
    }

    /// Elements left blank by the last render
    ///
    /// @returns Array of "elementId: reason" strings
    pub fn skipped(&self) -> js_sys::Array {
        self.skipped.iter().map(|s| JsValue::from_str(s)).collect()
    }

    /// Template JSON with the layout the renderer actually uses
    #[wasm_bindgen(js_name = effectiveElements)]
    pub fn effective_elements(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.template.effective_elements()).map_err(js_error)
    }
}

impl Default for BadgeRenderer {
    fn default() -> Self {
        Self::new()
    }
}
