//! Prompt templates sent to the model.
//!
//! The templates live in plain `.txt` files next to this module and are
//! embedded at compile time with `include_str!`, so they can be edited
//! without dealing with Rust string syntax.

use serde_json::Value;

pub const SYSTEM_PROMPT: &str = include_str!("system.txt");
pub const EXTRACT_INGREDIENTS_PROMPT: &str = include_str!("extract_ingredients.txt");
pub const UNIFY_NAMES_PROMPT: &str = include_str!("unify_names.txt");
pub const CONVERT_UNIT_PROMPT: &str = include_str!("convert_unit.txt");
pub const PIECE_SIZE_PROMPT: &str = include_str!("piece_size.txt");
pub const PACKAGE_SIZE_PROMPT: &str = include_str!("package_size.txt");
pub const CONSOLIDATE_UNITS_PROMPT: &str = include_str!("consolidate_units.txt");

/// Substitute `{name}` placeholders in a single pass.
///
/// Substituted values are not scanned again, so recipe text containing
/// braces is passed through untouched. Unknown placeholders are kept.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        output.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let replacement = after.find('}').and_then(|end| {
            let key = &after[..end];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, end))
        });

        match replacement {
            Some((value, end)) => {
                output.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                output.push('{');
                rest = after;
            }
        }
    }
    output.push_str(rest);
    output
}

/// Instructions telling the model to answer with JSON matching `schema`
pub fn format_instructions(schema: &Value) -> String {
    let schema = serde_json::to_string(schema).unwrap_or_default();
    format!(
        "The output should be formatted as a JSON instance that conforms to the JSON schema below. \
         Answer with the JSON only.\n\n```\n{}\n```",
        schema
    )
}
