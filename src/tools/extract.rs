use crate::error::GrocerError;
use crate::model::RecipeIngredients;
use crate::prompts::{format_instructions, render, EXTRACT_INGREDIENTS_PROMPT, SYSTEM_PROMPT};
use crate::providers::{complete_json, LlmProvider, ResponseSchema};
use log::info;
use serde_json::json;

pub fn ingredients_schema(language: &str) -> ResponseSchema {
    ResponseSchema {
        name: "recipe_ingredients",
        schema: json!({
            "type": "object",
            "properties": {
                "ingredients": {
                    "type": "array",
                    "description": "List of ingredients in the recipe",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": {
                                "type": "string",
                                "description": format!("Name of the ingredient in {} language", language)
                            },
                            "quantity": {
                                "type": "string",
                                "description": "Quantity of the ingredient. Consider only the number or fraction, text is not needed"
                            },
                            "unit": {
                                "type": "string",
                                "description": "Unit of measurement, if applicable"
                            }
                        },
                        "required": ["name", "quantity", "unit"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["ingredients"],
            "additionalProperties": false
        }),
    }
}

/// Extracts ingredients from the recipe text
pub async fn extract_ingredients(
    provider: &dyn LlmProvider,
    recipe_text: &str,
    language: &str,
) -> Result<RecipeIngredients, GrocerError> {
    let schema = ingredients_schema(language);
    let instructions = format_instructions(&schema.schema);
    let prompt = render(
        EXTRACT_INGREDIENTS_PROMPT,
        &[
            ("language", language),
            ("format_instructions", &instructions),
            ("recipe_text", recipe_text),
        ],
    );

    let mut extracted: RecipeIngredients =
        complete_json(provider, SYSTEM_PROMPT, &prompt, &schema).await?;
    extracted.ingredients.retain(|ingredient| !ingredient.name.trim().is_empty());
    for ingredient in &mut extracted.ingredients {
        ingredient.name = ingredient.name.trim().to_string();
    }

    info!("Extracted {} ingredients", extracted.ingredients.len());
    Ok(extracted)
}
