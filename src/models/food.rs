// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Normalized food record.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Name used when a product carries no usable name.
pub const UNKNOWN_NAME: &str = "Produit inconnu";
/// Brand used when a product carries no brand.
pub const UNKNOWN_BRAND: &str = "Marque inconnue";
/// Nutri-Score sentinel for unrated products.
pub const UNRATED: &str = "N/A";

/// One consumable item, as stored inside a meal.
///
/// Nutrition values are per 100 g.
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    /// Product code from the food database
    pub id: String,
    /// Display name
    pub name: String,
    /// Brand name
    #[serde(default = "default_brand")]
    pub brand: String,
    /// Product image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(optional))]
    pub image_url: Option<String>,
    /// Nutri-Score grade (A-E) or `N/A`
    #[serde(default = "default_nutriscore")]
    pub nutriscore: String,
    /// Energy in kcal
    #[serde(default, deserialize_with = "lenient_number")]
    pub calories: f64,
    /// Proteins in g
    #[serde(default, deserialize_with = "lenient_number")]
    pub proteins: f64,
    /// Carbohydrates in g
    #[serde(default, deserialize_with = "lenient_number")]
    pub carbs: f64,
    /// Fats in g
    #[serde(default, deserialize_with = "lenient_number")]
    pub fats: f64,
}

fn default_brand() -> String {
    UNKNOWN_BRAND.to_string()
}

fn default_nutriscore() -> String {
    UNRATED.to_string()
}

/// Numeric value of a loosely-typed field; 0 for anything that is not a finite number.
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Older records may hold `null` (a NaN written as JSON) or numeric strings.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce_number(&Value::deserialize(deserializer)?))
}
