//! Quantity parsing and metric normalization.
//!
//! Model output keeps quantities as free text ("1/2", "1,5", "½", "2-3"), so
//! everything here is lenient: anything that cannot be read as a number is
//! `None` and left to the caller.

use std::collections::HashMap;

/// A quantity expressed in one of the base shopping units
#[derive(Debug, Clone, PartialEq)]
pub enum Measure {
    Grams(f64),
    Milliliters(f64),
    Pieces(f64),
    /// A unit with no fixed conversion (pinch, clove, can, ...)
    Unknown { amount: f64, unit: String },
}

const GRAM_UNITS: &[&str] = &[
    "g", "gr", "gram", "gramy", "gramów", "gramow", "grams", "gramm", "grammes",
];
const DECAGRAM_UNITS: &[&str] = &["dag", "dkg", "deka", "dekagram", "dekagramy", "dekagramów"];
const KILOGRAM_UNITS: &[&str] = &[
    "kg", "kilo", "kilogram", "kilogramy", "kilogramów", "kilograms",
];
const MILLIGRAM_UNITS: &[&str] = &["mg", "miligram", "milligram", "milligrams"];
const MILLILITER_UNITS: &[&str] = &[
    "ml", "mililitr", "mililitry", "mililitrów", "milliliter", "milliliters", "millilitre",
    "millilitres",
];
const CENTILITER_UNITS: &[&str] = &["cl"];
const DECILITER_UNITS: &[&str] = &["dl"];
const LITER_UNITS: &[&str] = &[
    "l", "litr", "litry", "litrów", "liter", "liters", "litre", "litres",
];
const PIECE_UNITS: &[&str] = &[
    "", "szt", "sztuka", "sztuki", "sztuk", "pcs", "pc", "piece", "pieces", "x",
];

fn unit_key(unit: &str) -> String {
    unit.trim().trim_end_matches('.').trim().to_lowercase()
}

/// Convert a quantity to grams, millilitres or pieces where the unit allows it.
///
/// Larger metric units become smaller ones (1 kg -> 1000 g, 1 l -> 1000 ml).
/// A missing unit counts as pieces ("2 jajka").
pub fn normalize(amount: f64, unit: &str, kitchen_measures: &HashMap<String, f64>) -> Measure {
    let key = unit_key(unit);
    let key = key.as_str();

    if GRAM_UNITS.contains(&key) {
        Measure::Grams(amount)
    } else if DECAGRAM_UNITS.contains(&key) {
        Measure::Grams(amount * 10.0)
    } else if KILOGRAM_UNITS.contains(&key) {
        Measure::Grams(amount * 1000.0)
    } else if MILLIGRAM_UNITS.contains(&key) {
        Measure::Grams(amount / 1000.0)
    } else if MILLILITER_UNITS.contains(&key) {
        Measure::Milliliters(amount)
    } else if CENTILITER_UNITS.contains(&key) {
        Measure::Milliliters(amount * 10.0)
    } else if DECILITER_UNITS.contains(&key) {
        Measure::Milliliters(amount * 100.0)
    } else if LITER_UNITS.contains(&key) {
        Measure::Milliliters(amount * 1000.0)
    } else if PIECE_UNITS.contains(&key) {
        Measure::Pieces(amount)
    } else if let Some(ml) = kitchen_measures.get(key) {
        Measure::Milliliters(amount * ml)
    } else {
        Measure::Unknown {
            amount,
            unit: unit.trim().to_string(),
        }
    }
}

fn vulgar_fraction(c: char) -> Option<f64> {
    match c {
        '½' => Some(0.5),
        '¼' => Some(0.25),
        '¾' => Some(0.75),
        '⅓' => Some(1.0 / 3.0),
        '⅔' => Some(2.0 / 3.0),
        '⅛' => Some(0.125),
        _ => None,
    }
}

fn word_quantity(word: &str) -> Option<f64> {
    match word {
        "pół" | "pol" | "half" => Some(0.5),
        "ćwierć" | "quarter" => Some(0.25),
        _ => None,
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim_end_matches(['.', ',']);
    if text.is_empty() {
        return None;
    }
    if let Some((numerator, denominator)) = text.split_once('/') {
        let numerator: f64 = numerator.replace(',', ".").parse().ok()?;
        let denominator: f64 = denominator.replace(',', ".").parse().ok()?;
        if denominator == 0.0 {
            return None;
        }
        return Some(numerator / denominator);
    }
    text.replace(',', ".").parse().ok()
}

/// Parses one whitespace-free token; the flag says whether the whole token was numeric
fn parse_token(token: &str) -> Option<(f64, bool)> {
    let end = token
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ',' || c == '/'))
        .unwrap_or(token.len());
    let (number, mut rest) = token.split_at(end);
    let mut value = parse_number(number);

    if let Some(c) = rest.chars().next() {
        if let Some(fraction) = vulgar_fraction(c) {
            value = Some(value.unwrap_or(0.0) + fraction);
            rest = &rest[c.len_utf8()..];
        }
    }

    value.map(|v| (v, rest.is_empty()))
}

fn is_fraction_token(token: &str) -> bool {
    token.contains('/') || token.chars().next().and_then(vulgar_fraction).is_some()
}

/// Reads a free-text quantity as a number.
///
/// Ranges resolve to their upper bound, since the list is for buying.
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    if let Some((lower, upper)) = text.split_once(['-', '–']) {
        if !lower.trim().is_empty() && !upper.trim().is_empty() {
            return parse_quantity(upper).or_else(|| parse_quantity(lower));
        }
    }

    let mut tokens = text.split_whitespace();
    let first = tokens.next()?;
    if let Some(value) = word_quantity(first) {
        return Some(value);
    }

    let (mut total, whole) = parse_token(first)?;
    if whole {
        if let Some(next) = tokens.next().filter(|t| is_fraction_token(t)) {
            if let Some((fraction, _)) = parse_token(next) {
                total += fraction;
            }
        }
    }
    Some(total)
}

pub fn sum_quantities(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Shortest readable rendering: `1500`, `0.5`, `2.25`
pub fn format_quantity(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        let text = format!("{:.2}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsolidationConfig;

    fn measures() -> HashMap<String, f64> {
        ConsolidationConfig::default().kitchen_measures
    }

    #[test]
    fn test_parse_plain_numbers() {
        assert_eq!(parse_quantity("2"), Some(2.0));
        assert_eq!(parse_quantity(" 500 "), Some(500.0));
        assert_eq!(parse_quantity("1.5"), Some(1.5));
        assert_eq!(parse_quantity("1,5"), Some(1.5));
    }

    #[test]
    fn test_parse_fractions() {
        assert_eq!(parse_quantity("1/2"), Some(0.5));
        assert_eq!(parse_quantity("1 1/2"), Some(1.5));
        assert_eq!(parse_quantity("½"), Some(0.5));
        assert_eq!(parse_quantity("1½"), Some(1.5));
        assert_eq!(parse_quantity("1/0"), None);
    }

    #[test]
    fn test_parse_ranges_take_upper_bound() {
        assert_eq!(parse_quantity("2-3"), Some(3.0));
        assert_eq!(parse_quantity("2 – 3"), Some(3.0));
    }

    #[test]
    fn test_parse_words_and_suffixes() {
        assert_eq!(parse_quantity("pół"), Some(0.5));
        assert_eq!(parse_quantity("Pół małej cebuli"), Some(0.5));
        assert_eq!(parse_quantity("500g"), Some(500.0));
        assert_eq!(parse_quantity("100ml."), Some(100.0));
        assert_eq!(parse_quantity("2 large"), Some(2.0));
    }

    #[test]
    fn test_parse_rejects_text() {
        assert_eq!(parse_quantity(""), None);
        assert_eq!(parse_quantity("   "), None);
        assert_eq!(parse_quantity("do smaku"), None);
        assert_eq!(parse_quantity("-"), None);
    }

    #[test]
    fn test_normalize_metric_units() {
        let m = measures();
        assert_eq!(normalize(1.0, "kg", &m), Measure::Grams(1000.0));
        assert_eq!(normalize(2.0, "dag", &m), Measure::Grams(20.0));
        assert_eq!(normalize(250.0, "g", &m), Measure::Grams(250.0));
        assert_eq!(normalize(1.5, "l", &m), Measure::Milliliters(1500.0));
        assert_eq!(normalize(100.0, "ml.", &m), Measure::Milliliters(100.0));
        assert_eq!(normalize(2.0, "dl", &m), Measure::Milliliters(200.0));
    }

    #[test]
    fn test_normalize_pieces() {
        let m = measures();
        assert_eq!(normalize(2.0, "szt.", &m), Measure::Pieces(2.0));
        assert_eq!(normalize(6.0, "SZT", &m), Measure::Pieces(6.0));
        assert_eq!(normalize(1.0, "", &m), Measure::Pieces(1.0));
    }

    #[test]
    fn test_normalize_kitchen_measures() {
        let m = measures();
        assert_eq!(normalize(1.0, "szklanka", &m), Measure::Milliliters(250.0));
        assert_eq!(normalize(2.0, "łyżki", &m), Measure::Milliliters(30.0));
        assert_eq!(normalize(0.5, "tsp", &m), Measure::Milliliters(2.5));
    }

    #[test]
    fn test_normalize_unknown_unit() {
        let m = measures();
        assert_eq!(
            normalize(3.0, "ząbki", &m),
            Measure::Unknown {
                amount: 3.0,
                unit: "ząbki".to_string()
            }
        );
    }

    #[test]
    fn test_sum_and_format() {
        assert_eq!(sum_quantities(&[]), 0.0);
        assert_eq!(sum_quantities(&[500.0, 120.0, 100.0]), 720.0);
        assert_eq!(format_quantity(1500.0), "1500");
        assert_eq!(format_quantity(0.5), "0.5");
        assert_eq!(format_quantity(2.25), "2.25");
        assert_eq!(format_quantity(1.0 / 3.0), "0.33");
    }
}
