//! Boundary validation of loosely typed element arrays

use crate::{BadgeError, Result, TemplateElement};
use log::warn;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashSet;

/// Element `type` tags the renderer understands
const KNOWN_TYPES: [&str; 4] = ["text", "qrcode", "logo", "background"];

/// Decode and validate a stored element array
///
/// Accepts a JSON array, a string holding a JSON array (how document
/// stores often keep it) or `null`. Entries with an unknown or missing
/// `type` are skipped with a warning. A malformed entry of a known type, a
/// `qrcode`/`logo` without a positive size or a duplicate `id` is a
/// configuration error.
pub fn parse_elements(raw: &Value) -> Result<Vec<TemplateElement>> {
    let entries = match raw {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items.clone(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => items,
            Ok(_) | Err(_) => {
                return Err(BadgeError::Configuration(
                    "elements string does not hold a JSON array".to_string(),
                ))
            }
        },
        _ => {
            return Err(BadgeError::Configuration(
                "elements must be an array".to_string(),
            ))
        }
    };

    let mut elements = Vec::with_capacity(entries.len());
    let mut seen = HashSet::new();

    for (index, entry) in entries.into_iter().enumerate() {
        let kind = entry
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if !KNOWN_TYPES.contains(&kind.as_str()) {
            warn!("skipping element #{index} with unknown type '{kind}'");
            continue;
        }

        let element: TemplateElement = serde_json::from_value(entry).map_err(|e| {
            BadgeError::Configuration(format!("element #{index} ({kind}) is malformed: {e}"))
        })?;

        validate_element(&element)?;

        if !seen.insert(element.id().to_string()) {
            return Err(BadgeError::Configuration(format!(
                "duplicate element id '{}'",
                element.id()
            )));
        }

        elements.push(element);
    }

    Ok(elements)
}

/// Check invariants serde cannot express
pub fn validate_element(element: &TemplateElement) -> Result<()> {
    let positive = |v: f64| v.is_finite() && v > 0.0;

    let (width, height) = match element {
        TemplateElement::QrCode(e) => (e.width, e.height),
        TemplateElement::Logo(e) => (e.width, e.height),
        TemplateElement::Text(e) => {
            if !e.font_size.is_finite() || e.font_size <= 0.0 {
                return Err(BadgeError::Configuration(format!(
                    "text element '{}' has invalid fontSize {}",
                    e.id, e.font_size
                )));
            }
            return Ok(());
        }
        TemplateElement::Background(_) => return Ok(()),
    };

    if !positive(width) || !positive(height) {
        return Err(BadgeError::Configuration(format!(
            "{} element '{}' needs a positive size, got {width} x {height}",
            element.kind(),
            element.id()
        )));
    }

    Ok(())
}

/// Serde adapter running [`parse_elements`] on a template's `elements`
pub(crate) fn deserialize_elements<'de, D>(deserializer: D) -> std::result::Result<Vec<TemplateElement>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    parse_elements(&raw).map_err(serde::de::Error::custom)
}
