use crate::model::{IngredientGroup, RecipeIngredients};
use std::collections::HashMap;

/// Group ingredients from every recipe by name.
///
/// Names compare trimmed and case-insensitively; a group keeps the spelling
/// it was first seen with, and groups come out in first-seen order.
pub fn group_by_ingredient_name(lists: &[RecipeIngredients]) -> Vec<IngredientGroup> {
    let mut groups: Vec<IngredientGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for ingredient in lists.iter().flat_map(|list| list.ingredients.iter()) {
        let name = ingredient.name.trim();
        let key = name.to_lowercase();

        match index.get(&key) {
            Some(&position) => groups[position].entries.push(ingredient.clone()),
            None => {
                index.insert(key, groups.len());
                groups.push(IngredientGroup {
                    name: name.to_string(),
                    entries: vec![ingredient.clone()],
                });
            }
        }
    }

    groups
}
