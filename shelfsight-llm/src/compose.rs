//! Turning raw model answers into spoken descriptions

use crate::prompt::requested_fields;
use shelfsight_core::{is_uninformative, DescriptionField, FieldSelection};

/// Answer used when the model could not identify anything
pub const TRY_AGAIN: &str = "Try again";

const APOLOGY_PREFIXES: &[&str] = &["i'm sorry", "i am sorry", "sorry", "i can't", "i cannot", "i can not"];

/// Normalize a raw answer: trim it, and map empty or apologetic answers to "Try again"
pub fn normalize_answer(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('"').trim();
    if trimmed.is_empty() {
        return TRY_AGAIN.to_string();
    }

    let lower = trimmed.to_lowercase();
    let apologetic = APOLOGY_PREFIXES.iter().any(|p| lower.starts_with(p))
        || lower.contains("can't identify")
        || lower.contains("cannot identify");
    if apologetic {
        return TRY_AGAIN.to_string();
    }

    trimmed.to_string()
}

fn render(field: DescriptionField, value: &str) -> String {
    match field {
        DescriptionField::Brand | DescriptionField::Name => value.to_string(),
        DescriptionField::ExpirationRange => format!("expires in {}", value),
        DescriptionField::Mold => format!("mold: {}", value),
        DescriptionField::Recipe => format!("recipe: {}", value),
    }
}

/// Compose the spoken description from a raw answer
///
/// Comma-separated answer parts map onto the requested fields in order.
/// When the part count does not match, the normalized answer is used as is.
pub fn compose_description(raw: &str, fields: &FieldSelection) -> String {
    let answer = normalize_answer(raw);
    if is_uninformative(&answer) {
        return answer;
    }

    let requested = requested_fields(fields);
    let parts: Vec<&str> = answer.split(',').map(str::trim).collect();
    if parts.len() != requested.len() || parts.iter().any(|p| p.is_empty()) {
        return answer;
    }

    requested
        .iter()
        .zip(parts)
        .map(|(field, value)| render(*field, value))
        .collect::<Vec<_>>()
        .join(", ")
}
