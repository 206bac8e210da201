// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal store: saved meals, the in-progress meal, and write-through persistence.
//!
//! Handles:
//! - Rehydrating the saved collection at startup (corrupt data resets to empty)
//! - Assembling one in-progress meal at a time
//! - Promoting the in-progress meal into the saved collection
//! - Mirroring every change of the saved collection to durable storage

use crate::db::{keys, KeyValueStore};
use crate::error::AppError;
use crate::models::{daily_summaries, DailySummary, Food, Meal, MealListItem, MealType};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handle for callers that touch the store from several tasks.
///
/// The mutex keeps mutations, and their writes, in the order they were issued.
pub type SharedMealStore = Arc<Mutex<MealStore>>;

/// Outcome of the most recent write to durable storage.
#[derive(Debug, Clone, PartialEq)]
pub enum Durability {
    /// Durable copy matches memory.
    Synced,
    /// Last write failed. Memory is authoritative until the next successful write.
    Unsynced(String),
}

/// Largest id taken as a timestamp when seeding: the last millisecond of
/// year 9999. Larger numeric ids are opaque and never collide with new ones.
const MAX_TIMESTAMP_ID: i64 = 253_402_300_799_999;

/// Hands out meal ids derived from the creation time.
///
/// Ids are epoch milliseconds, bumped when needed so that they strictly
/// increase within a process and stay above every id loaded from storage.
#[derive(Debug, Default)]
struct MealIdGenerator {
    last: i64,
}

impl MealIdGenerator {
    fn seeded(meals: &[Meal]) -> Self {
        let last = meals
            .iter()
            .filter_map(|m| m.id.parse::<i64>().ok())
            .filter(|id| (0..=MAX_TIMESTAMP_ID).contains(id))
            .max()
            .unwrap_or(0);
        Self { last }
    }

    fn next(&mut self, now: DateTime<Utc>) -> String {
        let id = now.timestamp_millis().max(self.last.saturating_add(1));
        self.last = id;
        id.to_string()
    }
}

/// Single authority for meal state within a running session.
pub struct MealStore {
    storage: Arc<dyn KeyValueStore>,
    meals: Vec<Meal>,
    current: Option<Meal>,
    ids: MealIdGenerator,
    durability: Durability,
}

impl MealStore {
    /// Open the store, reading the durable collection once.
    ///
    /// A missing record starts empty. An unreadable or malformed record is
    /// logged, overwritten with an empty collection, and the store starts
    /// empty. This never fails.
    pub async fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        let loaded = match storage.get(keys::MEALS).await {
            Ok(None) => Ok(Vec::new()),
            Ok(Some(raw)) => decode_collection(&raw),
            Err(e) => Err(e),
        };

        let mut store = Self {
            storage,
            meals: Vec::new(),
            current: None,
            ids: MealIdGenerator::default(),
            durability: Durability::Synced,
        };

        match loaded {
            Ok(meals) => {
                tracing::info!(count = meals.len(), "Meals loaded");
                store.ids = MealIdGenerator::seeded(&meals);
                store.meals = meals;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored meals unreadable, resetting to empty");
                store.reset_durable().await;
            }
        }

        store
    }

    /// Open a store and wrap it for sharing.
    pub async fn open_shared(storage: Arc<dyn KeyValueStore>) -> SharedMealStore {
        Arc::new(Mutex::new(Self::open(storage).await))
    }

    // ─── Reads ───────────────────────────────────────────────────

    /// Saved meals in save order.
    pub fn meals(&self) -> &[Meal] {
        &self.meals
    }

    /// Saved meal by id.
    pub fn meal(&self, meal_id: &str) -> Option<&Meal> {
        self.meals.iter().find(|m| m.id == meal_id)
    }

    /// The meal being assembled, if any.
    pub fn current_meal(&self) -> Option<&Meal> {
        self.current.as_ref()
    }

    /// True when there is an in-progress meal with at least one food.
    pub fn can_save(&self) -> bool {
        self.current.as_ref().is_some_and(|m| !m.foods.is_empty())
    }

    pub fn durability(&self) -> &Durability {
        &self.durability
    }

    pub fn total_calories(&self, meal: &Meal) -> f64 {
        meal.total_calories()
    }

    pub fn total_proteins(&self, meal: &Meal) -> f64 {
        meal.total_proteins()
    }

    pub fn total_carbs(&self, meal: &Meal) -> f64 {
        meal.total_carbs()
    }

    pub fn total_fats(&self, meal: &Meal) -> f64 {
        meal.total_fats()
    }

    /// Rows for the saved-meals list.
    pub fn list_items(&self) -> Vec<MealListItem> {
        self.meals.iter().map(MealListItem::from).collect()
    }

    /// Per-day intake over all saved meals, oldest day first.
    pub fn daily_summaries(&self) -> Vec<DailySummary> {
        daily_summaries(&self.meals)
    }

    /// Intake for a single day, if any meal was saved on it.
    pub fn day_summary(&self, day: NaiveDate) -> Option<DailySummary> {
        self.daily_summaries().into_iter().find(|s| s.day == day)
    }

    // ─── In-progress meal ────────────────────────────────────────

    /// Start a new in-progress meal stamped with the current time.
    ///
    /// Any meal already in progress is discarded.
    pub fn create_current_meal(&mut self, name: MealType) -> &Meal {
        self.create_current_meal_at(name, Utc::now())
    }

    /// Start a new in-progress meal stamped with `now`.
    pub fn create_current_meal_at(&mut self, name: MealType, now: DateTime<Utc>) -> &Meal {
        if let Some(old) = &self.current {
            tracing::debug!(meal_id = %old.id, foods = old.foods.len(), "Discarding unsaved meal");
        }

        let meal = Meal {
            id: self.ids.next(now),
            name,
            date: format_utc_rfc3339(now),
            foods: Vec::new(),
        };
        self.current.insert(meal)
    }

    /// Drop the in-progress meal without saving it.
    pub fn discard_current_meal(&mut self) -> Option<Meal> {
        self.current.take()
    }

    /// Append a food to the in-progress meal.
    ///
    /// Returns false (and does nothing) when no meal is in progress.
    pub fn add_food(&mut self, food: Food) -> bool {
        match self.current.as_mut() {
            Some(meal) => {
                meal.foods.push(food);
                true
            }
            None => false,
        }
    }

    /// Remove every entry with `food_id` from the in-progress meal.
    ///
    /// Returns how many entries were removed.
    pub fn remove_food(&mut self, food_id: &str) -> usize {
        let Some(meal) = self.current.as_mut() else {
            return 0;
        };
        let before = meal.foods.len();
        meal.foods.retain(|f| f.id != food_id);
        before - meal.foods.len()
    }

    // ─── Saved collection ────────────────────────────────────────

    /// Move the in-progress meal to the end of the saved collection.
    ///
    /// Fails with `AppError::NoCurrentMeal` if nothing is in progress. A
    /// storage failure does not fail the save; see [`MealStore::durability`].
    pub async fn save_current_meal(&mut self) -> Result<Meal, AppError> {
        let meal = self.current.take().ok_or(AppError::NoCurrentMeal)?;

        self.meals.push(meal.clone());
        tracing::info!(meal_id = %meal.id, name = %meal.name, foods = meal.foods.len(), "Meal saved");

        self.write_through().await;
        Ok(meal)
    }

    /// Delete a saved meal. Returns false if no meal has that id.
    pub async fn delete_meal(&mut self, meal_id: &str) -> bool {
        let before = self.meals.len();
        self.meals.retain(|m| m.id != meal_id);
        if self.meals.len() == before {
            return false;
        }

        tracing::info!(meal_id, "Meal deleted");
        self.write_through().await;
        true
    }

    /// Overwrite the durable record with the whole saved collection.
    async fn write_through(&mut self) {
        let result = match serde_json::to_string(&self.meals) {
            Ok(json) => self.storage.set(keys::MEALS, &json).await,
            Err(e) => Err(e.into()),
        };

        self.durability = match result {
            Ok(()) => Durability::Synced,
            Err(e) => {
                tracing::error!(error = %e, count = self.meals.len(), "Failed to persist meals");
                Durability::Unsynced(e.to_string())
            }
        };
    }

    /// Replace a corrupt durable record with an empty collection.
    async fn reset_durable(&mut self) {
        if let Err(e) = self.storage.set(keys::MEALS, "[]").await {
            tracing::error!(error = %e, "Failed to reset stored meals, removing record");
            if let Err(e) = self.storage.remove(keys::MEALS).await {
                tracing::error!(error = %e, "Failed to remove stored meals");
                self.durability = Durability::Unsynced(e.to_string());
            }
        }
    }
}

/// Parse the durable representation of the saved collection.
///
/// Anything other than a JSON array is an error. Individual entries that do
/// not decode as a meal are logged and skipped.
fn decode_collection(raw: &str) -> Result<Vec<Meal>, AppError> {
    let entries: Vec<Value> = serde_json::from_str(raw)?;
    let total = entries.len();

    let meals: Vec<Meal> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match Meal::deserialize(entry) {
            Ok(meal) => Some(meal),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping unreadable stored meal");
                None
            }
        })
        .collect();

    if meals.len() < total {
        tracing::warn!(kept = meals.len(), total, "Some stored meals were dropped");
    }
    Ok(meals)
}
