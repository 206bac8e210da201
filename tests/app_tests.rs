// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end flows through `App` and the console session.

mod common;

use common::{spawn_fake_off, test_app, NUTELLA_CODE};
use meal_tracker::console::{Command, Session};
use meal_tracker::db::keys;
use meal_tracker::error::AppError;
use meal_tracker::models::{Meal, MealType};
use std::time::Duration;

async fn run(session: &mut Session<'_>, line: &str) -> Result<String, AppError> {
    let command: Command = line.parse()?;
    session.execute(command).await
}

#[tokio::test]
async fn test_scan_without_meal_makes_no_request() {
    let off = spawn_fake_off().await;
    let (app, _) = test_app(&off.base_url).await;

    let err = app.scan_into_current_meal(NUTELLA_CODE).await.unwrap_err();
    assert!(matches!(err, AppError::NoCurrentMeal));
    assert_eq!(off.state.hits(), 0);
}

#[tokio::test]
async fn test_scan_adds_first_match_to_current_meal() {
    let off = spawn_fake_off().await;
    let (app, storage) = test_app(&off.base_url).await;
    app.meals.lock().await.create_current_meal(MealType::Breakfast);

    let food = app.scan_into_current_meal(NUTELLA_CODE).await.unwrap().unwrap();
    assert_eq!(food.name, "Nutella");

    let store = app.meals.lock().await;
    assert_eq!(store.current_meal().unwrap().foods, vec![food]);
    // Nothing saved yet
    assert_eq!(storage.write_count(), 0);
}

#[tokio::test]
async fn test_scan_of_unknown_code_leaves_meal_unchanged() {
    let off = spawn_fake_off().await;
    let (app, _) = test_app(&off.base_url).await;
    app.meals.lock().await.create_current_meal(MealType::Lunch);

    assert!(app.scan_into_current_meal("00000").await.unwrap().is_none());
    assert!(app.scan_into_current_meal("gone").await.unwrap().is_none());
    assert!(app.meals.lock().await.current_meal().unwrap().foods.is_empty());
}

#[tokio::test]
async fn test_overlapping_scans_add_once() {
    let off = spawn_fake_off().await;
    let (app, _) = test_app(&off.base_url).await;
    app.meals.lock().await.create_current_meal(MealType::Snack);

    let slow_code = format!("slow{}", NUTELLA_CODE);
    let (first, second) = tokio::join!(app.scan_into_current_meal(&slow_code), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        app.scan_into_current_meal(NUTELLA_CODE).await
    });

    assert!(first.unwrap().is_some());
    assert!(second.unwrap().is_none());
    assert_eq!(app.meals.lock().await.current_meal().unwrap().foods.len(), 1);
}

#[tokio::test]
async fn test_scan_result_dropped_when_meal_changes_mid_lookup() {
    let off = spawn_fake_off().await;
    let (app, _) = test_app(&off.base_url).await;
    let slow_code = format!("slow{}", NUTELLA_CODE);

    // Meal replaced while the lookup runs
    app.meals.lock().await.create_current_meal(MealType::Lunch);
    let (scanned, _) = tokio::join!(app.scan_into_current_meal(&slow_code), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        app.meals.lock().await.create_current_meal(MealType::Dinner);
    });
    assert!(scanned.unwrap().is_none());
    let store = app.meals.lock().await;
    let current = store.current_meal().unwrap();
    assert_eq!(current.name, MealType::Dinner);
    assert!(current.foods.is_empty());
    drop(store);

    // Meal saved while the lookup runs
    let (scanned, saved) = tokio::join!(app.scan_into_current_meal(&slow_code), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        app.meals.lock().await.save_current_meal().await.unwrap()
    });
    assert!(scanned.unwrap().is_none());
    assert!(saved.foods.is_empty());
    let store = app.meals.lock().await;
    assert!(store.current_meal().is_none());
    assert!(store.meals()[0].foods.is_empty());
}

#[tokio::test]
async fn test_console_session_flow() {
    let off = spawn_fake_off().await;
    let (app, storage) = test_app(&off.base_url).await;
    let mut session = Session::new(&app);

    assert!(matches!(
        run(&mut session, "save").await,
        Err(AppError::NoCurrentMeal)
    ));

    let started = run(&mut session, "new snack").await.unwrap();
    assert!(started.starts_with("Started Snack"));

    assert!(matches!(
        run(&mut session, "save").await,
        Err(AppError::BadRequest(_))
    ));

    let short = run(&mut session, "search ab").await.unwrap();
    assert!(short.contains("at least 3"));
    assert_eq!(off.state.hits(), 0);

    let listing = run(&mut session, "search nutella").await.unwrap();
    assert!(listing.starts_with(" 1. Nutella - Ferrero [E] 539 kcal"));
    assert_eq!(session.last_results().len(), 4);

    assert_eq!(run(&mut session, "add 2").await.unwrap(), "Added Pain de mie complet");
    assert!(session.last_results().is_empty());
    assert!(matches!(
        run(&mut session, "add 1").await,
        Err(AppError::NotFound(_))
    ));

    let scanned = run(&mut session, &format!("scan {}", NUTELLA_CODE)).await.unwrap();
    assert!(scanned.starts_with("Added Nutella"));

    let removed = run(&mut session, "remove 3228857000166").await.unwrap();
    assert_eq!(removed, "Removed 1 item(s)");

    let shown = run(&mut session, "show").await.unwrap();
    assert!(shown.contains("Total: 539 kcal"));
    assert!(shown.contains("Foods (1):"));

    let saved = run(&mut session, "save").await.unwrap();
    assert!(saved.starts_with("Saved Snack"));
    assert!(saved.ends_with("539 kcal)"));

    let stored: Vec<Meal> = serde_json::from_str(&storage.peek(keys::MEALS).unwrap()).unwrap();
    assert_eq!(stored.len(), 1);
    let meal_id = stored[0].id.clone();

    let meals = run(&mut session, "meals").await.unwrap();
    assert!(meals.contains(&meal_id));
    assert!(meals.contains("Nutella"));

    let detail = run(&mut session, &format!("meal {}", meal_id)).await.unwrap();
    assert!(detail.contains("Nutella"));

    let days = run(&mut session, "days").await.unwrap();
    assert!(days.contains("1 meal(s)"));

    let deleted = run(&mut session, &format!("delete {}", meal_id)).await.unwrap();
    assert_eq!(deleted, format!("Deleted meal {}", meal_id));
    assert_eq!(run(&mut session, "meals").await.unwrap(), "No meals saved yet.");
    assert_eq!(storage.peek(keys::MEALS).as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_console_reports_lookup_failures_as_no_results() {
    let off = spawn_fake_off().await;
    let (app, _) = test_app(&off.base_url).await;
    let mut session = Session::new(&app);

    assert_eq!(
        run(&mut session, "search broken").await.unwrap(),
        "No products found."
    );
    assert!(session.last_results().is_empty());

    run(&mut session, "new lunch").await.unwrap();
    assert_eq!(
        run(&mut session, "scan 12345").await.unwrap(),
        "No product matches barcode 12345."
    );
}

#[tokio::test]
async fn test_console_discard_and_missing_meal() {
    let off = spawn_fake_off().await;
    let (app, storage) = test_app(&off.base_url).await;
    let mut session = Session::new(&app);

    run(&mut session, "new dinner").await.unwrap();
    assert_eq!(run(&mut session, "discard").await.unwrap(), "Discarded Dîner");
    assert!(matches!(
        run(&mut session, "show").await,
        Err(AppError::NoCurrentMeal)
    ));
    assert!(matches!(
        run(&mut session, "meal 42").await,
        Err(AppError::NotFound(_))
    ));
    assert_eq!(run(&mut session, "delete 42").await.unwrap(), "No meal 42");
    assert_eq!(
        run(&mut session, "day 2025-01-01").await.unwrap(),
        "No meals on 2025-01-01"
    );
    assert_eq!(storage.write_count(), 0);
}
