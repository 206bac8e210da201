// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod food;
pub mod meal;
pub mod summary;

pub use food::Food;
pub use meal::{Meal, MealType, NutritionTotals};
pub use summary::{daily_summaries, DailySummary, MealListItem};
