//! Ingredient-line parsing, unit conversion, scaling and normalization.

mod amount;
mod normalize;
mod scaling;
mod units;

pub use amount::{parse_amount, parse_ingredient, ParsedIngredient};
pub use normalize::{
    normalize_ingredient_line, normalize_ingredients, AmountFormat, CanonicalIngredient,
    NormalizationOptions, UnitSystem,
};
pub use scaling::{scale_ingredient, scale_servings, to_fraction};
pub use units::{convert_unit, normalize_unit, Converted, UnitFamily};
