// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Meal model and derived nutrition totals.

use crate::models::Food;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Fixed meal categories.
///
/// Serialized with the labels the app has always stored on disk.
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealType {
    #[serde(rename = "Petit-déjeuner")]
    Breakfast,
    #[serde(rename = "Déjeuner")]
    Lunch,
    #[serde(rename = "Dîner")]
    Dinner,
    #[default]
    #[serde(rename = "Snack")]
    Snack,
}

impl MealType {
    /// All categories, in the order they are offered to the user.
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    /// Stored label.
    pub fn label(self) -> &'static str {
        match self {
            MealType::Breakfast => "Petit-déjeuner",
            MealType::Lunch => "Déjeuner",
            MealType::Dinner => "Dîner",
            MealType::Snack => "Snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MealType {
    type Err = String;

    /// Accepts the stored label or the English name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        MealType::ALL
            .into_iter()
            .find(|t| {
                t.label().to_lowercase() == needle
                    || format!("{:?}", t).to_lowercase() == needle
            })
            .ok_or_else(|| format!("unknown meal type: {}", s))
    }
}

/// A named, dated collection of foods.
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    /// Identifier derived from the creation time (epoch milliseconds)
    pub id: String,
    /// Meal category
    pub name: MealType,
    /// Creation time (ISO 8601, UTC)
    pub date: String,
    /// Foods in insertion order
    #[serde(default)]
    pub foods: Vec<Food>,
}

impl Meal {
    /// Sum of all four nutrition fields over the current food list.
    pub fn totals(&self) -> NutritionTotals {
        self.foods.iter().map(NutritionTotals::from).sum()
    }

    pub fn total_calories(&self) -> f64 {
        self.foods.iter().map(|f| f.calories).sum()
    }

    pub fn total_proteins(&self) -> f64 {
        self.foods.iter().map(|f| f.proteins).sum()
    }

    pub fn total_carbs(&self) -> f64 {
        self.foods.iter().map(|f| f.carbs).sum()
    }

    pub fn total_fats(&self) -> f64 {
        self.foods.iter().map(|f| f.fats).sum()
    }
}

/// Aggregated nutrition values.
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionTotals {
    pub calories: f64,
    pub proteins: f64,
    pub carbs: f64,
    pub fats: f64,
}

impl From<&Food> for NutritionTotals {
    fn from(food: &Food) -> Self {
        Self {
            calories: food.calories,
            proteins: food.proteins,
            carbs: food.carbs,
            fats: food.fats,
        }
    }
}

impl Add for NutritionTotals {
    type Output = NutritionTotals;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            calories: self.calories + rhs.calories,
            proteins: self.proteins + rhs.proteins,
            carbs: self.carbs + rhs.carbs,
            fats: self.fats + rhs.fats,
        }
    }
}

impl Sum for NutritionTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}
