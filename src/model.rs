use crate::units::format_quantity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shopping units a consolidated group ends up in
pub const GRAMS: &str = "g";
pub const MILLILITERS: &str = "ml";
pub const PIECES: &str = "szt.";
pub const PACKAGES: &str = "opak.";

/// One ingredient line as extracted from a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    /// Only the number or fraction, no words
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub unit: String,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>, unit: impl Into<String>) -> Self {
        Ingredient {
            name: name.into(),
            quantity: quantity.into(),
            unit: unit.into(),
        }
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.quantity.trim(), self.unit.trim()) {
            ("", "") => write!(f, "{}", self.name),
            (quantity, "") => write!(f, "{} {}", self.name, quantity),
            ("", unit) => write!(f, "{} ({})", self.name, unit),
            (quantity, unit) => write!(f, "{} {} {}", self.name, quantity, unit),
        }
    }
}

/// The ingredient list of a single recipe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredients {
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

/// Maps an ingredient name variant to its canonical name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameMapping {
    pub original_name: String,
    pub target_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameMappings {
    #[serde(default)]
    pub ingredient_names: Vec<NameMapping>,
}

/// All entries that share one unified name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientGroup {
    pub name: String,
    pub entries: Vec<Ingredient>,
}

/// One line of the final shopping list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedIngredient {
    pub name: String,
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: String,
    /// Set when the entries could not be consolidated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ConsolidatedIngredient {
    pub fn new(name: impl Into<String>, quantity: Option<f64>, unit: impl Into<String>) -> Self {
        ConsolidatedIngredient {
            name: name.into(),
            quantity,
            unit: unit.into(),
            note: None,
        }
    }

    /// Keeps a group's raw entries when consolidation failed
    pub fn unresolved(group: &IngredientGroup) -> Self {
        let raw = group
            .entries
            .iter()
            .map(|entry| format!("{} {}", entry.quantity.trim(), entry.unit.trim()))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" + ");

        ConsolidatedIngredient {
            name: group.name.clone(),
            quantity: None,
            unit: String::new(),
            note: if raw.is_empty() { None } else { Some(raw) },
        }
    }
}

impl fmt::Display for ConsolidatedIngredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        match self.quantity {
            Some(quantity) if self.unit.is_empty() => write!(f, ": {}", format_quantity(quantity))?,
            Some(quantity) => write!(f, ": {} {}", format_quantity(quantity), self.unit)?,
            None if !self.unit.is_empty() => write!(f, " ({})", self.unit)?,
            None => {}
        }
        if let Some(note) = &self.note {
            write!(f, " [{}]", note)?;
        }
        Ok(())
    }
}

/// An input that produced nothing for the list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedInput {
    pub index: usize,
    /// The URL, or the first line of a text item
    pub source: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShoppingList {
    pub items: Vec<ConsolidatedIngredient>,
    pub skipped: Vec<SkippedInput>,
}

impl ShoppingList {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Plain-text rendering, one ingredient per line
    pub fn to_text(&self) -> String {
        self.items
            .iter()
            .map(|item| format!("- {}", item))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
