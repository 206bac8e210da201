// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod food_lookup;
pub mod meal_store;
pub mod open_food_facts;

pub use food_lookup::{FoodLookupService, LookupOutcome, LookupSettings};
pub use meal_store::{Durability, MealStore, SharedMealStore};
pub use open_food_facts::{normalize_product, normalize_products, OffProduct, OpenFoodFactsClient};
