//! Unit tables and same-family conversion.
//!
//! Volume is measured in teaspoons and mass in ounces. Metric units carry a
//! fixed factor into those bases.

/// Conversion family of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitFamily {
    Volume,
    Mass,
}

/// How the normalizer treats a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitClass {
    Volume,
    Mass,
    Count,
    Other,
}

/// Result of a conversion
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    pub amount: f64,
    pub unit: String,
}

/// Factor into the family's base unit (teaspoon or ounce)
fn conversion(unit: &str) -> Option<(UnitFamily, f64)> {
    use UnitFamily::*;
    let factor = match unit {
        "teaspoon" | "tsp" => (Volume, 1.0),
        "tablespoon" | "tbsp" => (Volume, 3.0),
        "fluid ounce" | "fl oz" => (Volume, 6.0),
        "cup" => (Volume, 48.0),
        "pint" => (Volume, 96.0),
        "quart" => (Volume, 192.0),
        "gallon" => (Volume, 768.0),
        "milliliter" | "ml" => (Volume, 0.202884),
        "liter" | "l" => (Volume, 202.884),

        "ounce" | "oz" => (Mass, 1.0),
        "pound" | "lb" => (Mass, 16.0),
        "gram" | "g" => (Mass, 0.035274),
        "kilogram" | "kg" => (Mass, 35.274),
        _ => return None,
    };
    Some(factor)
}

/// Case-sensitive abbreviations: a capital T is a tablespoon, a lower t a teaspoon.
fn exact_alias(unit: &str) -> Option<&'static str> {
    match unit {
        "T" | "Tbsp" | "Tbs" => Some("tbsp"),
        "t" => Some("tsp"),
        _ => None,
    }
}

fn alias(unit: &str) -> Option<&'static str> {
    let canonical = match unit {
        "c" => "cup",
        "pt" => "pint",
        "qt" => "quart",
        "gal" => "gallon",
        "fl. oz" | "fluid oz" => "fl oz",
        "fluid ounces" => "fluid ounce",
        "lbs" => "lb",
        "pounds" => "pound",
        "ounces" => "ounce",
        "teaspoons" => "teaspoon",
        "tsps" => "tsp",
        "tablespoons" => "tablespoon",
        "tbs" | "tbsps" => "tbsp",
        "cups" => "cup",
        "pints" => "pint",
        "quarts" => "quart",
        "gallons" => "gallon",
        "grams" | "gr" => "gram",
        "kilograms" | "kgs" => "kilogram",
        "milliliters" | "millilitre" | "millilitres" => "milliliter",
        "liters" | "litre" | "litres" => "liter",
        _ => return None,
    };
    Some(canonical)
}

/// Map a unit token to its table spelling; unknown tokens are lowercased
pub fn normalize_unit(unit: &str) -> String {
    let unit = unit.trim();
    if let Some(canonical) = exact_alias(unit) {
        return canonical.to_string();
    }
    let lower = unit.to_lowercase();
    let lower = lower.trim_end_matches('.');
    alias(lower).unwrap_or(lower).to_string()
}

/// Whether a token is found in the conversion or alias tables
pub fn is_known_unit(unit: &str) -> bool {
    let unit = unit.trim();
    if unit.is_empty() {
        return false;
    }
    exact_alias(unit).is_some() || conversion(&normalize_unit(unit)).is_some()
}

pub fn unit_family(unit: &str) -> Option<UnitFamily> {
    conversion(&normalize_unit(unit)).map(|(family, _)| family)
}

const COUNT_UNITS: &[&str] = &["can", "package", "pkg", "jar", "clove"];
const OTHER_UNITS: &[&str] = &["pinch", "dash"];

fn singular(unit: &str) -> String {
    let lower = unit.to_lowercase();
    if let Some(stem) = lower.strip_suffix("es").filter(|s| s.ends_with("ch") || s.ends_with("sh")) {
        return stem.to_string();
    }
    lower.strip_suffix('s').unwrap_or(&lower).to_string()
}

/// Whether a token is a container, piece or pinch word kept verbatim as a unit
pub fn is_piece_unit(unit: &str) -> bool {
    let singular = singular(unit);
    COUNT_UNITS.contains(&singular.as_str()) || OTHER_UNITS.contains(&singular.as_str())
}

pub fn classify(unit: &str) -> UnitClass {
    match unit_family(unit) {
        Some(UnitFamily::Volume) => UnitClass::Volume,
        Some(UnitFamily::Mass) => UnitClass::Mass,
        None if COUNT_UNITS.contains(&singular(unit).as_str()) => UnitClass::Count,
        None => UnitClass::Other,
    }
}

/// Convert between units of the same family; anything else passes through unchanged
pub fn convert_unit(amount: f64, from: &str, to: &str) -> Converted {
    let from_conv = conversion(&normalize_unit(from));
    let to_conv = conversion(&normalize_unit(to));

    match (from_conv, to_conv) {
        (Some((from_family, from_factor)), Some((to_family, to_factor))) if from_family == to_family => {
            Converted {
                amount: amount * from_factor / to_factor,
                unit: to.to_string(),
            }
        }
        _ => Converted {
            amount,
            unit: from.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_normalize_unit() {
        assert_eq!(normalize_unit("Cups"), "cup");
        assert_eq!(normalize_unit("T"), "tbsp");
        assert_eq!(normalize_unit("t"), "tsp");
        assert_eq!(normalize_unit("tbsp."), "tbsp");
        assert_eq!(normalize_unit("lbs"), "lb");
        assert_eq!(normalize_unit("handful"), "handful");
    }

    #[test]
    fn test_known_units() {
        assert!(is_known_unit("cups"));
        assert!(is_known_unit("fl oz"));
        assert!(is_known_unit("ml"));
        assert!(is_known_unit("Kilograms"));
        assert!(!is_known_unit("large"));
        assert!(!is_known_unit("cloves"));
        assert!(!is_known_unit(""));
    }

    #[test]
    fn test_convert_volume() {
        let c = convert_unit(1.0, "cup", "tsp");
        assert!(close(c.amount, 48.0));
        assert_eq!(c.unit, "tsp");

        let c = convert_unit(6.0, "tbsp", "tsp");
        assert!(close(c.amount, 18.0));

        let c = convert_unit(1.0, "l", "ml");
        assert!(close(c.amount, 1000.0));
    }

    #[test]
    fn test_convert_mass() {
        let c = convert_unit(2.0, "lbs", "oz");
        assert!(close(c.amount, 32.0));
        let c = convert_unit(1.0, "kg", "g");
        assert!(close(c.amount, 1000.0));
    }

    #[test]
    fn test_unknown_or_cross_family_passes_through() {
        let c = convert_unit(3.0, "handful", "cup");
        assert_eq!(c, Converted { amount: 3.0, unit: "handful".to_string() });

        let c = convert_unit(3.0, "cup", "oz");
        assert_eq!(c, Converted { amount: 3.0, unit: "cup".to_string() });
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("tbsp"), UnitClass::Volume);
        assert_eq!(classify("grams"), UnitClass::Mass);
        assert_eq!(classify("cans"), UnitClass::Count);
        assert_eq!(classify("cloves"), UnitClass::Count);
        assert_eq!(classify("pinch"), UnitClass::Other);
        assert_eq!(classify("pinches"), UnitClass::Other);
        assert_eq!(classify(""), UnitClass::Other);
    }
}
