// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers: an in-process fake OpenFoodFacts server and app builders.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use meal_tracker::config::Config;
use meal_tracker::db::MemoryStore;
use meal_tracker::models::Food;
use meal_tracker::services::{FoodLookupService, LookupSettings, OpenFoodFactsClient};
use meal_tracker::App;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[allow(dead_code)]
pub const SEARCH_RESPONSE: &str = include_str!("../fixtures/off_search_response.json");
#[allow(dead_code)]
pub const PRODUCT_RESPONSE: &str = include_str!("../fixtures/off_product_response.json");

/// Known barcode served by the fake server.
#[allow(dead_code)]
pub const NUTELLA_CODE: &str = "3017620422003";

/// Observations recorded by the fake server.
#[derive(Default)]
#[allow(dead_code)]
pub struct FakeOffState {
    pub hits: AtomicUsize,
    pub user_agents: Mutex<Vec<String>>,
    pub search_params: Mutex<Vec<HashMap<String, String>>>,
    /// Delay applied to queries/codes starting with "slow"
    pub slow_delay: Mutex<Duration>,
}

#[allow(dead_code)]
impl FakeOffState {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn record(&self, headers: &HeaderMap) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.user_agents.lock().unwrap().push(agent);
    }

    fn delay(&self) -> Duration {
        *self.slow_delay.lock().unwrap()
    }
}

/// A running fake OpenFoodFacts server.
#[allow(dead_code)]
pub struct FakeOff {
    pub base_url: String,
    pub state: Arc<FakeOffState>,
}

/// Start the fake server on an ephemeral local port.
///
/// Search terms:
/// - `slow ...` waits `slow_delay` then answers normally
/// - `broken` answers 500
/// - `garbage` answers a non-JSON body
/// - `nothing` answers without a products array
/// - anything else answers the search fixture
///
/// Codes:
/// - `NUTELLA_CODE` (optionally prefixed `slow`) answers the product fixture
/// - `gone` answers 404
/// - anything else answers status 0 without a product
#[allow(dead_code)]
pub async fn spawn_fake_off() -> FakeOff {
    let state = Arc::new(FakeOffState {
        slow_delay: Mutex::new(Duration::from_millis(500)),
        ..FakeOffState::default()
    });

    let app = Router::new()
        .route("/cgi/search.pl", get(search))
        .route("/api/v0/product/{file}", get(product))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake server");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake server");
    });

    FakeOff {
        base_url: format!("http://{}", addr),
        state,
    }
}

fn json_response(body: &'static str) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn search(
    State(state): State<Arc<FakeOffState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.record(&headers);
    state.search_params.lock().unwrap().push(params.clone());

    let terms = params.get("search_terms").cloned().unwrap_or_default();
    if terms.starts_with("slow") {
        tokio::time::sleep(state.delay()).await;
    }

    match terms.as_str() {
        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "upstream down").into_response(),
        "garbage" => ([(header::CONTENT_TYPE, "application/json")], "<html>").into_response(),
        "nothing" => json_response(r#"{"count":0}"#),
        _ => json_response(SEARCH_RESPONSE),
    }
}

async fn product(
    State(state): State<Arc<FakeOffState>>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.record(&headers);

    let code = file.trim_end_matches(".json");
    let code = match code.strip_prefix("slow") {
        Some(rest) => {
            tokio::time::sleep(state.delay()).await;
            rest
        }
        None => code,
    };

    match code {
        NUTELLA_CODE => json_response(PRODUCT_RESPONSE),
        "gone" => StatusCode::NOT_FOUND.into_response(),
        _ => json_response(r#"{"code":"unknown","status":0,"status_verbose":"product not found"}"#),
    }
}

/// Config pointing lookups at `base_url`.
#[allow(dead_code)]
pub fn test_config(base_url: &str) -> Config {
    Config {
        off_base_url: base_url.to_string(),
        ..Config::test_default()
    }
}

/// Lookup service against `base_url` with short timings.
#[allow(dead_code)]
pub fn test_lookup(base_url: &str) -> FoodLookupService {
    let settings = LookupSettings {
        search_timeout: Duration::from_secs(2),
        min_query_len: 3,
        page_size: 10,
        debounce: Duration::from_millis(100),
    };
    FoodLookupService::new(
        OpenFoodFactsClient::new(base_url, "MealTrackerTest/1.0"),
        settings,
    )
}

/// App with in-memory storage, looking up against `base_url`.
#[allow(dead_code)]
pub async fn test_app(base_url: &str) -> (App, Arc<MemoryStore>) {
    let storage = Arc::new(MemoryStore::new());
    let app = App::with_storage(test_config(base_url), storage.clone()).await;
    (app, storage)
}

/// Food with the given id and calories.
#[allow(dead_code)]
pub fn food(id: &str, calories: f64) -> Food {
    Food {
        id: id.to_string(),
        name: format!("Food {}", id),
        brand: "Test".to_string(),
        image_url: Some(format!("https://img.test/{}.jpg", id)),
        nutriscore: "B".to_string(),
        calories,
        proteins: calories / 10.0,
        carbs: calories / 5.0,
        fats: calories / 20.0,
    }
}
