//! Template and record types

use crate::validation::deserialize_elements;
use crate::{BadgeError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default badge width in centimetres
pub const DEFAULT_WIDTH_CM: f64 = 8.5;

/// Default badge height in centimetres
pub const DEFAULT_HEIGHT_CM: f64 = 12.5;

fn default_true() -> bool {
    true
}

fn default_font_size() -> f64 {
    12.0
}

/// Font weight of a text element
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Text alignment relative to the anchor point
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    /// Fraction of the free line space placed before the line
    pub fn factor(&self) -> f64 {
        match self {
            Align::Left => 0.0,
            Align::Center => 0.5,
            Align::Right => 1.0,
        }
    }
}

/// One positioned visual unit on a badge (tagged union on `type`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TemplateElement {
    /// Bound or static text
    Text(TextElement),

    /// Attendee QR code
    #[serde(rename = "qrcode")]
    QrCode(QrCodeElement),

    /// Event logo
    Logo(LogoElement),

    /// Full page background image
    Background(BackgroundElement),
}

impl TemplateElement {
    /// Element identifier
    pub fn id(&self) -> &str {
        match self {
            TemplateElement::Text(e) => &e.id,
            TemplateElement::QrCode(e) => &e.id,
            TemplateElement::Logo(e) => &e.id,
            TemplateElement::Background(e) => &e.id,
        }
    }

    /// Whether the element takes part in composition
    pub fn is_visible(&self) -> bool {
        match self {
            TemplateElement::Text(e) => e.visible,
            TemplateElement::QrCode(e) => e.visible,
            TemplateElement::Logo(e) => e.visible,
            TemplateElement::Background(e) => e.visible,
        }
    }

    /// `type` tag as written in template JSON
    pub fn kind(&self) -> &'static str {
        match self {
            TemplateElement::Text(_) => "text",
            TemplateElement::QrCode(_) => "qrcode",
            TemplateElement::Logo(_) => "logo",
            TemplateElement::Background(_) => "background",
        }
    }
}

/// Text element
///
/// `(x, y)` is the baseline anchor. `width`/`height` in the source JSON
/// are ignored; `maxWidth` drives alignment and wrapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,

    /// Binding key, see [`crate::bind_field`]
    #[serde(default)]
    pub field: Option<String>,

    /// Font size in points
    #[serde(default = "default_font_size")]
    pub font_size: f64,

    #[serde(default)]
    pub font_weight: FontWeight,

    #[serde(default)]
    pub align: Align,

    /// Hex RGB color (`#RRGGBB`, `RRGGBB` or `#RGB`)
    #[serde(default)]
    pub color: Option<String>,

    /// Line width in centimetres
    #[serde(default)]
    pub max_width: Option<f64>,
}

/// QR code element, `(x, y)` is the centre of the box
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeElement {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

/// Logo element, `(x, y)` is the centre of the box
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogoElement {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,

    /// Asset reference overriding the event logo
    #[serde(default)]
    pub src: Option<String>,
}

/// Background element, always covers the full page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundElement {
    pub id: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,

    /// Asset reference overriding the template background
    #[serde(default)]
    pub src: Option<String>,
}

/// Physical page size
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageSize {
    pub width_cm: f64,
    pub height_cm: f64,
}

impl PageSize {
    /// Size in PDF points
    pub fn to_points(&self) -> (f64, f64) {
        (pdf_core::cm_to_points(self.width_cm), pdf_core::cm_to_points(self.height_cm))
    }

    /// Size in whole pixels at `dpi`, `None` when a side does not fit in `u32`
    pub fn to_pixels(&self, dpi: u32) -> Option<(u32, u32)> {
        let px = |cm: f64| {
            let px = (cm / 2.54 * dpi as f64).round().max(1.0);
            (px.is_finite() && px <= u32::MAX as f64).then_some(px as u32)
        };
        Some((px(self.width_cm)?, px(self.height_cm)?))
    }
}

/// Reusable layout for one (event, category) pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BadgeTemplate {
    #[serde(default, alias = "event_id")]
    pub event_id: Option<u64>,

    /// Attendee segment this template applies to
    #[serde(default)]
    pub category: String,

    #[serde(default = "default_true", alias = "is_active")]
    pub is_active: bool,

    #[serde(default, alias = "badge_width_cm")]
    pub badge_width_cm: Option<f64>,

    #[serde(default, alias = "badge_height_cm")]
    pub badge_height_cm: Option<f64>,

    /// Raster asset drawn full-bleed beneath all elements
    #[serde(default, alias = "background_image_ref", alias = "front_template")]
    pub background_image_ref: Option<String>,

    /// Registered font family for text elements
    #[serde(default, alias = "font_family")]
    pub font_family: Option<String>,

    #[serde(default, alias = "primary_color")]
    pub primary_color: Option<String>,

    #[serde(default, alias = "secondary_color")]
    pub secondary_color: Option<String>,

    #[serde(default, deserialize_with = "deserialize_elements")]
    pub elements: Vec<TemplateElement>,
}

impl Default for BadgeTemplate {
    fn default() -> Self {
        Self {
            event_id: None,
            category: String::new(),
            is_active: true,
            badge_width_cm: None,
            badge_height_cm: None,
            background_image_ref: None,
            font_family: None,
            primary_color: None,
            secondary_color: None,
            elements: Vec::new(),
        }
    }
}

impl BadgeTemplate {
    /// Parse a template from JSON
    ///
    /// Elements go through [`crate::parse_elements`]: unknown element types
    /// are skipped, malformed known ones are a configuration error.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut value: serde_json::Value = serde_json::from_str(json)?;
        let elements = match value.as_object_mut().and_then(|o| o.remove("elements")) {
            Some(raw) => crate::parse_elements(&raw)?,
            None => Vec::new(),
        };

        let mut template: BadgeTemplate = serde_json::from_value(value)?;
        template.elements = elements;
        Ok(template)
    }

    /// Page size with the 8.5 x 12.5 cm default applied
    pub fn page_size(&self) -> PageSize {
        PageSize {
            width_cm: self.badge_width_cm.unwrap_or(DEFAULT_WIDTH_CM),
            height_cm: self.badge_height_cm.unwrap_or(DEFAULT_HEIGHT_CM),
        }
    }

    /// Stored elements, or the designer default layout when none are stored
    pub fn effective_elements(&self) -> Vec<TemplateElement> {
        if self.elements.is_empty() {
            Self::default_elements()
        } else {
            self.elements.clone()
        }
    }

    /// Default layout offered by the badge designer
    ///
    /// Logo and QR positions are box centres.
    pub fn default_elements() -> Vec<TemplateElement> {
        let text = |id: &str, label: &str, field: &str, y: f64, size: f64, weight: FontWeight, color: &str| {
            TemplateElement::Text(TextElement {
                id: id.to_string(),
                x: 4.25,
                y,
                visible: true,
                label: Some(label.to_string()),
                locked: Some(false),
                field: Some(field.to_string()),
                font_size: size,
                font_weight: weight,
                align: Align::Center,
                color: Some(color.to_string()),
                max_width: None,
            })
        };

        vec![
            TemplateElement::Logo(LogoElement {
                id: "logo".to_string(),
                x: 4.25,
                y: 1.5,
                width: 4.0,
                height: 2.0,
                visible: true,
                label: Some("Event Logo".to_string()),
                locked: Some(false),
                src: None,
            }),
            text("event_name", "Event Name", "event.name", 3.0, 16.0, FontWeight::Bold, "#1F2937"),
            text("event_date", "Event Date", "event.date", 3.7, 11.0, FontWeight::Normal, "#6B7280"),
            text("event_location", "Event Location", "event.location", 4.2, 11.0, FontWeight::Normal, "#6B7280"),
            text("attendee_name", "Attendee Name", "attendee.name", 5.5, 24.0, FontWeight::Bold, "#000000"),
            text("company", "Company", "attendee.company", 6.5, 16.0, FontWeight::Normal, "#4B5563"),
            text("category", "Category", "attendee.type", 7.2, 12.0, FontWeight::Bold, "#059669"),
            TemplateElement::QrCode(QrCodeElement {
                id: "qr_code".to_string(),
                x: 4.25,
                y: 9.75,
                width: 2.5,
                height: 2.5,
                visible: true,
                label: Some("QR Code".to_string()),
                locked: Some(false),
            }),
            text("qr_uuid", "QR UUID", "attendee.qr_uuid", 11.2, 10.0, FontWeight::Normal, "#000000"),
            text(
                "qr_helper",
                "QR Helper Text",
                "static:Scan QR or enter code manually",
                11.7,
                8.0,
                FontWeight::Normal,
                "#9CA3AF",
            ),
        ]
    }
}

/// Pick the active template for an (event, category) pair
pub fn select_active<'a>(templates: &'a [BadgeTemplate], event_id: u64, category: &str) -> Result<&'a BadgeTemplate> {
    templates
        .iter()
        .find(|t| t.is_active && t.event_id == Some(event_id) && t.category.eq_ignore_ascii_case(category))
        .ok_or_else(|| {
            BadgeError::Configuration(format!(
                "no active badge template for event {event_id}, category '{category}'"
            ))
        })
}

/// Attendee data consumed by the binding table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AttendeeRecord {
    pub name: String,
    pub name_ar: Option<String>,
    pub company: Option<String>,
    pub company_ar: Option<String>,
    /// Attendee segment (exhibitor, guest, ...)
    #[serde(alias = "type")]
    pub category: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    /// Stable identifier encoded in the QR code
    pub qr_uuid: String,
}

/// Event data consumed by the binding table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    pub name: String,
    #[serde(default)]
    pub name_ar: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub location_ar: Option<String>,
    /// Asset reference of the event logo
    #[serde(default, alias = "logo")]
    pub logo_ref: Option<String>,
}

/// An element absorbed by the fail-soft policy
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementFailure {
    pub element_id: String,
    pub error: String,
}

/// Finished badge
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub page_size: PageSize,
    /// Pixel density, raster output only
    pub dpi: Option<u32>,
    /// Elements left blank because they failed
    pub skipped: Vec<ElementFailure>,
}
