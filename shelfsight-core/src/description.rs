//! Classification of description results

/// Answers that carry no usable identification
pub const UNINFORMATIVE_MARKERS: &[&str] = &["unknown", "unclear", "try again", "unidentified"];

/// True when a description is one of the uninformative markers
///
/// Case-insensitive exact match after trimming surrounding whitespace.
pub fn is_uninformative(description: &str) -> bool {
    let normalized = description.trim().to_lowercase();
    UNINFORMATIVE_MARKERS.iter().any(|m| *m == normalized)
}
