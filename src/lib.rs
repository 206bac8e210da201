// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Meal-Tracker: log meals and track nutritional intake
//!
//! This crate provides the local core of a meal-logging app: a meal store
//! persisted to on-device storage, and an OpenFoodFacts lookup client that
//! turns searches and barcode scans into normalized foods.

pub mod config;
pub mod console;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{FileStore, KeyValueStore};
use error::AppError;
use models::Food;
use services::{FoodLookupService, LookupOutcome, MealStore, SharedMealStore};
use std::sync::Arc;

/// Application state, constructed once at startup and shared by reference.
pub struct App {
    pub config: Config,
    pub meals: SharedMealStore,
    pub lookup: FoodLookupService,
}

impl App {
    /// Open file-backed storage under `config.data_dir` and load saved meals.
    pub async fn init(config: Config) -> Result<Self, AppError> {
        let storage = FileStore::open(&config.data_dir).await?;
        Ok(Self::with_storage(config, Arc::new(storage)).await)
    }

    /// Build the app on top of an arbitrary storage backend.
    pub async fn with_storage(config: Config, storage: Arc<dyn KeyValueStore>) -> Self {
        let meals = MealStore::open_shared(storage).await;
        let lookup = FoodLookupService::from_config(&config);
        Self {
            config,
            meals,
            lookup,
        }
    }

    /// Handle a barcode scan: look the code up and add the first match to the
    /// in-progress meal.
    ///
    /// Returns the added food, `Ok(None)` if nothing was found, a scan was
    /// already running, or the meal in progress changed during the lookup,
    /// and `AppError::NoCurrentMeal` if there is no meal to add to.
    pub async fn scan_into_current_meal(&self, code: &str) -> Result<Option<Food>, AppError> {
        let meal_id = match self.meals.lock().await.current_meal() {
            Some(meal) => meal.id.clone(),
            None => return Err(AppError::NoCurrentMeal),
        };

        let food = match self.lookup.scan(code).await {
            LookupOutcome::Found(foods) => foods.into_iter().next(),
            _ => None,
        };
        let Some(food) = food else {
            return Ok(None);
        };

        let mut store = self.meals.lock().await;
        // The meal may have been saved or replaced while the lookup ran
        if store.current_meal().map(|m| m.id.as_str()) != Some(meal_id.as_str()) {
            tracing::info!(code, meal_id = %meal_id, "Meal changed during scan, dropping result");
            return Ok(None);
        }
        store.add_food(food.clone());
        tracing::info!(code, name = %food.name, "Scanned product added to meal");
        Ok(Some(food))
    }
}
