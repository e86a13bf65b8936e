//! Prompts asking the vision model for the selected fields

use shelfsight_core::{DescriptionField, FieldSelection};

/// Fields to ask for; an empty selection falls back to the object name
pub fn requested_fields(fields: &FieldSelection) -> Vec<DescriptionField> {
    let enabled = fields.enabled();
    if enabled.is_empty() {
        vec![DescriptionField::Name]
    } else {
        enabled
    }
}

fn join_phrases(fields: &[DescriptionField]) -> String {
    let phrases: Vec<&str> = fields.iter().map(|f| f.prompt_phrase()).collect();
    match phrases.len() {
        0 => String::new(),
        1 => phrases[0].to_string(),
        n => format!("{} and {}", phrases[..n - 1].join(", "), phrases[n - 1]),
    }
}

fn example(fields: &[DescriptionField]) -> String {
    fields.iter().map(|f| f.example()).collect::<Vec<_>>().join(", ")
}

/// System prompt constraining the answer format
pub fn system_prompt(fields: &FieldSelection) -> String {
    let fields = requested_fields(fields);
    format!(
        "You are an AI specialized in identifying the object in the image. \
         Respond ONLY with {}, separated by commas, in that order (e.g., {}). \
         No explanations, no extra words. \
         If no object is detected in the image, respond with nothing.",
        join_phrases(&fields),
        example(&fields)
    )
}

/// User prompt sent alongside the image
pub fn user_prompt(fields: &FieldSelection) -> String {
    let fields = requested_fields(fields);
    format!(
        "What is {} for the object in the image? Respond with only these, separated by commas. \
         Do not respond if there is nothing in the image.",
        join_phrases(&fields)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selection_prompt() {
        let prompt = system_prompt(&FieldSelection::default());
        assert!(prompt.contains("the object name and the expiration date range in months"));
        assert!(prompt.contains("(e.g., Milk, 1-2 months)"));
    }

    #[test]
    fn test_field_order_is_fixed() {
        let fields = FieldSelection {
            brand: true,
            name: true,
            expiration_range: false,
            mold: true,
            recipe: true,
        };
        let prompt = system_prompt(&fields);
        let brand = prompt.find("the brand").unwrap();
        let name = prompt.find("the object name").unwrap();
        let mold = prompt.find("mold").unwrap();
        let recipe = prompt.find("recipe").unwrap();
        assert!(brand < name && name < mold && mold < recipe);
    }

    #[test]
    fn test_empty_selection_asks_for_name() {
        let none = FieldSelection {
            brand: false,
            name: false,
            expiration_range: false,
            mold: false,
            recipe: false,
        };
        assert_eq!(requested_fields(&none), vec![DescriptionField::Name]);
        assert!(user_prompt(&none).contains("the object name"));
    }
}
