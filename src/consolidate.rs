//! Collapsing an ingredient group into a single shopping quantity.
//!
//! Arithmetic is done here; the model is only asked for judgement calls:
//! converting units with no fixed size ("3 ząbki"), the weight of one piece,
//! whether a small amount is bought in packages, and how to merge weights
//! with volumes.

use crate::config::ConsolidationConfig;
use crate::error::GrocerError;
use crate::model::{ConsolidatedIngredient, IngredientGroup, GRAMS, MILLILITERS, PACKAGES, PIECES};
use crate::prompts::{
    format_instructions, render, CONSOLIDATE_UNITS_PROMPT, CONVERT_UNIT_PROMPT,
    PACKAGE_SIZE_PROMPT, PIECE_SIZE_PROMPT, SYSTEM_PROMPT,
};
use crate::providers::{complete_json, LlmProvider, ResponseSchema};
use crate::units::{format_quantity, normalize, parse_quantity, sum_quantities, Measure};
use log::{debug, info};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct ConvertedAmount {
    quantity: f64,
    unit: String,
}

#[derive(Debug, Deserialize)]
struct PieceSize {
    grams: f64,
    milliliters: f64,
}

#[derive(Debug, Deserialize)]
struct PackageSize {
    packaged: bool,
    package_size: f64,
}

fn converted_amount_schema() -> ResponseSchema {
    ResponseSchema {
        name: "converted_amount",
        schema: json!({
            "type": "object",
            "properties": {
                "quantity": {"type": "number", "description": "Amount in the target unit"},
                "unit": {"type": "string", "enum": [GRAMS, MILLILITERS]}
            },
            "required": ["quantity", "unit"],
            "additionalProperties": false
        }),
    }
}

fn piece_size_schema() -> ResponseSchema {
    ResponseSchema {
        name: "piece_size",
        schema: json!({
            "type": "object",
            "properties": {
                "grams": {"type": "number", "description": "Weight of one piece in grams"},
                "milliliters": {"type": "number", "description": "Volume of one piece in milliliters"}
            },
            "required": ["grams", "milliliters"],
            "additionalProperties": false
        }),
    }
}

fn package_size_schema() -> ResponseSchema {
    ResponseSchema {
        name: "package_size",
        schema: json!({
            "type": "object",
            "properties": {
                "packaged": {"type": "boolean", "description": "Whether the ingredient is bought in small packages"},
                "package_size": {"type": "number", "description": "Size of one package in the given unit, 0 if not packaged"}
            },
            "required": ["packaged", "package_size"],
            "additionalProperties": false
        }),
    }
}

fn consolidated_schema() -> ResponseSchema {
    ResponseSchema {
        name: "consolidated_ingredient",
        schema: json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "quantity": {"type": ["number", "null"], "description": "Final shopping quantity"},
                "unit": {"type": "string", "enum": [GRAMS, MILLILITERS, PIECES, PACKAGES]}
            },
            "required": ["name", "quantity", "unit"],
            "additionalProperties": false
        }),
    }
}

/// Round up, ignoring float noise just above a whole number
fn round_up(value: f64) -> f64 {
    (value - 1e-9).ceil().max(0.0)
}

fn describe(measure: &Measure) -> String {
    match measure {
        Measure::Grams(v) => format!("{} {}", format_quantity(*v), GRAMS),
        Measure::Milliliters(v) => format!("{} {}", format_quantity(*v), MILLILITERS),
        Measure::Pieces(v) => format!("{} {}", format_quantity(*v), PIECES),
        Measure::Unknown { amount, unit } => format!("{} {}", format_quantity(*amount), unit),
    }
}

#[derive(Clone)]
pub struct Consolidator {
    provider: Arc<dyn LlmProvider>,
    settings: ConsolidationConfig,
}

impl Consolidator {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: ConsolidationConfig) -> Self {
        Self { provider, settings }
    }

    /// Turn one group into its shopping-list line
    pub async fn consolidate(
        &self,
        group: &IngredientGroup,
    ) -> Result<ConsolidatedIngredient, GrocerError> {
        if let [only] = group.entries.as_slice() {
            // free-text amounts ("do smaku") stay on the list as a note
            return Ok(match parse_quantity(&only.quantity) {
                Some(quantity) => {
                    ConsolidatedIngredient::new(group.name.clone(), Some(quantity), only.unit.trim())
                }
                None => ConsolidatedIngredient::unresolved(group),
            });
        }

        let mut measures = Vec::with_capacity(group.entries.len());
        for entry in &group.entries {
            match parse_quantity(&entry.quantity) {
                Some(amount) => measures.push(self.measure(&group.name, amount, &entry.unit).await?),
                None => debug!("Ignoring unquantified entry for {}: {}", group.name, entry),
            }
        }
        if measures.is_empty() {
            return Ok(ConsolidatedIngredient::unresolved(group));
        }

        let mut grams = Vec::new();
        let mut milliliters = Vec::new();
        let mut pieces = Vec::new();
        for measure in &measures {
            match measure {
                Measure::Grams(v) => grams.push(*v),
                Measure::Milliliters(v) => milliliters.push(*v),
                Measure::Pieces(v) => pieces.push(*v),
                Measure::Unknown { .. } => {}
            }
        }

        let result = match (grams.is_empty(), milliliters.is_empty(), pieces.is_empty()) {
            (true, true, false) => ConsolidatedIngredient::new(
                group.name.clone(),
                Some(round_up(sum_quantities(&pieces))),
                PIECES,
            ),
            (false, true, true) => self.finish_amount(&group.name, sum_quantities(&grams), GRAMS).await?,
            (true, false, true) => {
                self.finish_amount(&group.name, sum_quantities(&milliliters), MILLILITERS)
                    .await?
            }
            (_, _, false) => {
                self.count_pieces(&group.name, &pieces, &grams, &milliliters, &measures)
                    .await?
            }
            _ => self.consolidate_with_model(&group.name, &measures).await?,
        };

        info!("Consolidated {}: {}", group.name, result);
        Ok(result)
    }

    /// Normalize an amount, asking the model about units with no fixed size
    async fn measure(&self, name: &str, amount: f64, unit: &str) -> Result<Measure, GrocerError> {
        match normalize(amount, unit, &self.settings.kitchen_measures) {
            Measure::Unknown { amount, unit } => self.convert_unknown_unit(name, amount, &unit).await,
            known => Ok(known),
        }
    }

    async fn convert_unknown_unit(
        &self,
        name: &str,
        amount: f64,
        unit: &str,
    ) -> Result<Measure, GrocerError> {
        let schema = converted_amount_schema();
        let instructions = format_instructions(&schema.schema);
        let quantity = format_quantity(amount);
        let prompt = render(
            CONVERT_UNIT_PROMPT,
            &[
                ("format_instructions", &instructions),
                ("name", name),
                ("quantity", &quantity),
                ("unit", unit),
            ],
        );

        let converted: ConvertedAmount =
            complete_json(self.provider.as_ref(), SYSTEM_PROMPT, &prompt, &schema).await?;
        debug!(
            "{} {} of {} is {} {}",
            quantity, unit, name, converted.quantity, converted.unit
        );

        match normalize(converted.quantity, &converted.unit, &self.settings.kitchen_measures) {
            measure @ (Measure::Grams(_) | Measure::Milliliters(_)) => Ok(measure),
            other => Err(GrocerError::ProviderError(format!(
                "could not convert {} {} of {} to g or ml, got {}",
                quantity,
                unit,
                name,
                describe(&other)
            ))),
        }
    }

    /// Pieces mixed with weights or volumes: estimate how many pieces the
    /// weights and volumes stand for, then round the total up
    async fn count_pieces(
        &self,
        name: &str,
        pieces: &[f64],
        grams: &[f64],
        milliliters: &[f64],
        measures: &[Measure],
    ) -> Result<ConsolidatedIngredient, GrocerError> {
        let schema = piece_size_schema();
        let instructions = format_instructions(&schema.schema);
        let prompt = render(
            PIECE_SIZE_PROMPT,
            &[("format_instructions", &instructions), ("name", name)],
        );
        let size: PieceSize =
            complete_json(self.provider.as_ref(), SYSTEM_PROMPT, &prompt, &schema).await?;

        let total_grams = sum_quantities(grams);
        let total_milliliters = sum_quantities(milliliters);
        if (total_grams > 0.0 && size.grams <= 0.0)
            || (total_milliliters > 0.0 && size.milliliters <= 0.0)
        {
            debug!("No usable piece size for {}, asking for a full consolidation", name);
            return self.consolidate_with_model(name, measures).await;
        }

        let mut total = sum_quantities(pieces);
        if total_grams > 0.0 {
            total += total_grams / size.grams;
        }
        if total_milliliters > 0.0 {
            total += total_milliliters / size.milliliters;
        }

        Ok(ConsolidatedIngredient::new(name, Some(round_up(total)), PIECES))
    }

    /// Small totals of packaged goods become a package count
    async fn finish_amount(
        &self,
        name: &str,
        total: f64,
        unit: &str,
    ) -> Result<ConsolidatedIngredient, GrocerError> {
        if total > 0.0 && total < self.settings.small_amount_threshold {
            if let Some(packages) = self.package_count(name, total, unit).await? {
                return Ok(ConsolidatedIngredient::new(name, Some(packages), PACKAGES));
            }
        }
        Ok(ConsolidatedIngredient::new(name, Some(total), unit))
    }

    async fn package_count(
        &self,
        name: &str,
        total: f64,
        unit: &str,
    ) -> Result<Option<f64>, GrocerError> {
        let schema = package_size_schema();
        let instructions = format_instructions(&schema.schema);
        let total_text = format_quantity(total);
        let prompt = render(
            PACKAGE_SIZE_PROMPT,
            &[
                ("format_instructions", &instructions),
                ("name", name),
                ("total", &total_text),
                ("unit", unit),
            ],
        );

        let package: PackageSize =
            complete_json(self.provider.as_ref(), SYSTEM_PROMPT, &prompt, &schema).await?;
        if package.packaged && package.package_size > 0.0 {
            Ok(Some(round_up(total / package.package_size)))
        } else {
            Ok(None)
        }
    }

    /// Weights mixed with volumes: the model picks the unit and merges them
    async fn consolidate_with_model(
        &self,
        name: &str,
        measures: &[Measure],
    ) -> Result<ConsolidatedIngredient, GrocerError> {
        let schema = consolidated_schema();
        let instructions = format_instructions(&schema.schema);
        let entries = measures
            .iter()
            .map(|measure| format!("- {}", describe(measure)))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = render(
            CONSOLIDATE_UNITS_PROMPT,
            &[
                ("format_instructions", &instructions),
                ("name", name),
                ("entries", &entries),
            ],
        );

        let mut consolidated: ConsolidatedIngredient =
            complete_json(self.provider.as_ref(), SYSTEM_PROMPT, &prompt, &schema).await?;
        consolidated.name = name.to_string();
        consolidated.note = None;
        Ok(consolidated)
    }
}
