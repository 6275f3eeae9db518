use crate::error::GrocerError;
use crate::model::{NameMappings, RecipeIngredients};
use crate::prompts::{format_instructions, render, SYSTEM_PROMPT, UNIFY_NAMES_PROMPT};
use crate::providers::{complete_json, LlmProvider, ResponseSchema};
use log::{debug, info};
use serde_json::json;
use std::collections::{HashMap, HashSet};

pub fn name_mappings_schema(language: &str) -> ResponseSchema {
    ResponseSchema {
        name: "ingredient_names",
        schema: json!({
            "type": "object",
            "properties": {
                "ingredient_names": {
                    "type": "array",
                    "description": format!("List of ingredient names in {} language", language),
                    "items": {
                        "type": "object",
                        "properties": {
                            "original_name": {
                                "type": "string",
                                "description": "Original name of the ingredient"
                            },
                            "target_name": {
                                "type": "string",
                                "description": format!(
                                    "Common name of the ingredient in {} language, might be the same as original name",
                                    language
                                )
                            }
                        },
                        "required": ["original_name", "target_name"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["ingredient_names"],
            "additionalProperties": false
        }),
    }
}

/// Distinct names in first-seen order
fn distinct_names(lists: &[RecipeIngredients]) -> Vec<String> {
    let mut seen = HashSet::new();
    lists
        .iter()
        .flat_map(|list| list.ingredients.iter())
        .map(|ingredient| ingredient.name.clone())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Rename ingredients in place; names without a mapping are left alone
pub fn apply_name_mappings(lists: &mut [RecipeIngredients], mappings: &NameMappings) {
    let map: HashMap<&str, &str> = mappings
        .ingredient_names
        .iter()
        .filter(|mapping| !mapping.target_name.trim().is_empty())
        .map(|mapping| (mapping.original_name.trim(), mapping.target_name.trim()))
        .collect();

    for ingredient in lists.iter_mut().flat_map(|list| list.ingredients.iter_mut()) {
        if let Some(target) = map.get(ingredient.name.trim()) {
            if ingredient.name != *target {
                debug!("Renaming '{}' to '{}'", ingredient.name, target);
                ingredient.name = target.to_string();
            }
        }
    }
}

/// Unify ingredient names across the lists extracted from several recipes
pub async fn unify_ingredient_names(
    provider: &dyn LlmProvider,
    mut lists: Vec<RecipeIngredients>,
    language: &str,
) -> Result<Vec<RecipeIngredients>, GrocerError> {
    let names = distinct_names(&lists);
    if names.is_empty() {
        return Ok(lists);
    }

    let schema = name_mappings_schema(language);
    let instructions = format_instructions(&schema.schema);
    let joined = names.join("\n");
    let prompt = render(
        UNIFY_NAMES_PROMPT,
        &[
            ("language", language),
            ("format_instructions", &instructions),
            ("ingredient_names", &joined),
        ],
    );

    let mappings: NameMappings = complete_json(provider, SYSTEM_PROMPT, &prompt, &schema).await?;
    info!(
        "Unified {} ingredient names using {} mappings",
        names.len(),
        mappings.ingredient_names.len()
    );

    apply_name_mappings(&mut lists, &mappings);
    Ok(lists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Ingredient, NameMapping};
    use crate::providers::{CompletionRequest, ProviderError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct MappingProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmProvider for MappingProvider {
        fn provider_name(&self) -> &str {
            "mapping"
        }

        async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // every distinct name is listed exactly once
            let listed = request.prompt.rsplit("Ingredient names:").next().unwrap_or_default();
            assert_eq!(listed.matches("Pierś z kurczaka bez skóry").count(), 1);
            Ok(r#"{"ingredient_names": [
                {"original_name": "Pierś z kurczaka bez skóry", "target_name": "Pierś z kurczaka"},
                {"original_name": "Pierś z kurczaka", "target_name": "Pierś z kurczaka"},
                {"original_name": "cebula", "target_name": "Cebula"}
            ]}"#
            .to_string())
        }
    }

    fn lists() -> Vec<RecipeIngredients> {
        vec![
            RecipeIngredients {
                ingredients: vec![
                    Ingredient::new("Pierś z kurczaka bez skóry", "500", "g"),
                    Ingredient::new("cebula", "1", ""),
                ],
            },
            RecipeIngredients {
                ingredients: vec![
                    Ingredient::new("Pierś z kurczaka bez skóry", "200", "g"),
                    Ingredient::new("Pierś z kurczaka", "1", "kg"),
                    Ingredient::new("Czosnek", "3", "ząbki"),
                ],
            },
        ]
    }

    #[tokio::test]
    async fn test_unify_ingredient_names() {
        let provider = MappingProvider {
            calls: AtomicU32::new(0),
        };

        let unified = unify_ingredient_names(&provider, lists(), "Polish").await.unwrap();

        let names: Vec<&str> = unified
            .iter()
            .flat_map(|list| list.ingredients.iter().map(|i| i.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec!["Pierś z kurczaka", "Cebula", "Pierś z kurczaka", "Pierś z kurczaka", "Czosnek"]
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unify_without_names_skips_model() {
        let provider = MappingProvider {
            calls: AtomicU32::new(0),
        };

        let empty = vec![RecipeIngredients::default(), RecipeIngredients::default()];
        let unified = unify_ingredient_names(&provider, empty.clone(), "Polish")
            .await
            .unwrap();

        assert_eq!(unified, empty);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_apply_ignores_blank_targets() {
        let mut lists = lists();
        let mappings = NameMappings {
            ingredient_names: vec![NameMapping {
                original_name: "Czosnek".to_string(),
                target_name: " ".to_string(),
            }],
        };

        apply_name_mappings(&mut lists, &mappings);
        assert_eq!(lists[1].ingredients[2].name, "Czosnek");
    }

    #[test]
    fn test_distinct_names_keep_order() {
        assert_eq!(
            distinct_names(&lists()),
            vec![
                "Pierś z kurczaka bez skóry".to_string(),
                "cebula".to_string(),
                "Pierś z kurczaka".to_string(),
                "Czosnek".to_string(),
            ]
        );
    }
}
