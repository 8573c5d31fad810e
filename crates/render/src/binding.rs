//! Field binding table

use crate::{AttendeeRecord, EventRecord};
use badge_text::{capitalize_first, format_long_date};

/// Prefix for literal text that ignores the data context
const STATIC_PREFIX: &str = "static:";

/// Printed when an attendee has no company
const COMPANY_FALLBACK: &str = "Freelancer";

/// Printed when an attendee has no segment
const CATEGORY_FALLBACK: &str = "Attendee";

/// Resolve a text element's `field` key to the string it prints
///
/// Unknown keys resolve to the empty string.
pub fn bind_field(key: &str, attendee: &AttendeeRecord, event: &EventRecord) -> String {
    if let Some(literal) = key.strip_prefix(STATIC_PREFIX) {
        return literal.to_string();
    }

    let opt = |value: &Option<String>| value.clone().unwrap_or_default();

    match key {
        "event.name" => event.name.clone(),
        "event.name_ar" => opt(&event.name_ar),
        "event.date" => format_long_date(event.date),
        "event.location" => opt(&event.location),
        "event.location_ar" => opt(&event.location_ar),
        "attendee.name" => attendee.name.clone(),
        "attendee.name_ar" => opt(&attendee.name_ar),
        "attendee.company" => match attendee.company.as_deref().map(str::trim) {
            Some(company) if !company.is_empty() => company.to_string(),
            _ => COMPANY_FALLBACK.to_string(),
        },
        "attendee.company_ar" => opt(&attendee.company_ar),
        "attendee.category" | "attendee.type" => {
            if attendee.category.trim().is_empty() {
                CATEGORY_FALLBACK.to_string()
            } else {
                capitalize_first(attendee.category.trim())
            }
        }
        "attendee.email" => opt(&attendee.email),
        "attendee.phone" => opt(&attendee.phone),
        "attendee.role" => opt(&attendee.role),
        "attendee.qr_uuid" => attendee.qr_uuid.clone(),
        _ => String::new(),
    }
}
