//! Read-side views over saved meals.
//!
//! These are computed on demand from the persisted collection and never
//! stored.

use crate::models::{Meal, MealType, NutritionTotals};
use crate::time_utils::utc_day;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One row of the saved-meals list.
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealListItem {
    pub id: String,
    pub name: MealType,
    pub date: String,
    /// Food names joined with ", "
    pub food_names: String,
    pub total_calories: f64,
    /// Image of the first food, used as the meal thumbnail
    pub thumbnail_url: Option<String>,
}

impl From<&Meal> for MealListItem {
    fn from(meal: &Meal) -> Self {
        Self {
            id: meal.id.clone(),
            name: meal.name,
            date: meal.date.clone(),
            food_names: meal
                .foods
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            total_calories: meal.total_calories(),
            thumbnail_url: meal.foods.first().and_then(|f| f.image_url.clone()),
        }
    }
}

/// Nutrition intake for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub day: NaiveDate,
    pub meal_count: usize,
    pub totals: NutritionTotals,
    /// Meal ids in collection order
    pub meal_ids: Vec<String>,
}

/// Group meals by the UTC day of their timestamp, oldest day first.
///
/// Meals whose date does not parse are left out.
pub fn daily_summaries<'a, I>(meals: I) -> Vec<DailySummary>
where
    I: IntoIterator<Item = &'a Meal>,
{
    let mut by_day: BTreeMap<NaiveDate, DailySummary> = BTreeMap::new();

    for meal in meals {
        let Some(day) = utc_day(&meal.date) else {
            tracing::debug!(meal_id = %meal.id, date = %meal.date, "Skipping meal with unparseable date");
            continue;
        };

        let entry = by_day.entry(day).or_insert_with(|| DailySummary {
            day,
            meal_count: 0,
            totals: NutritionTotals::default(),
            meal_ids: Vec::new(),
        });
        entry.meal_count += 1;
        entry.totals = entry.totals + meal.totals();
        entry.meal_ids.push(meal.id.clone());
    }

    by_day.into_values().collect()
}
