// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OpenFoodFacts API client and product normalization.
//!
//! Handles:
//! - Free-text product search
//! - Exact product lookup by barcode
//! - Turning loosely-typed product records into `Food`

use crate::error::AppError;
use crate::models::food::{coerce_number, Food, UNKNOWN_BRAND, UNKNOWN_NAME, UNRATED};
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Product fields requested from the search endpoint.
const SEARCH_FIELDS: &str = "code,product_name,product_name_fr,product_name_en,brands,nutriments,image_url,nutriscore_grade";

/// OpenFoodFacts API client.
#[derive(Clone)]
pub struct OpenFoodFactsClient {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl OpenFoodFactsClient {
    /// Create a client for `base_url` that identifies itself as `user_agent`.
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search products by free text.
    ///
    /// A body without a `products` array yields no products. Entries that are
    /// not objects are dropped.
    pub async fn search(&self, query: &str, page_size: u32) -> Result<Vec<OffProduct>, AppError> {
        let url = format!("{}/cgi/search.pl", self.base_url);
        let page_size = page_size.to_string();

        let response = self
            .http
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .query(&[
                ("search_terms", query),
                ("search_simple", "1"),
                ("action", "process"),
                ("json", "1"),
                ("fields", SEARCH_FIELDS),
                ("page_size", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let body: Value = self.check_response_json(response).await?;

        let products = body
            .get("products")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| OffProduct::deserialize(item).ok())
                    .collect()
            })
            .unwrap_or_default();

        Ok(products)
    }

    /// Look up a single product by barcode.
    ///
    /// Returns `Ok(None)` when the database has no such product.
    pub async fn product_by_code(&self, code: &str) -> Result<Option<OffProduct>, AppError> {
        let url = format!(
            "{}/api/v0/product/{}.json",
            self.base_url,
            urlencoding::encode(code)
        );

        let response = self
            .http
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body: Value = self.check_response_json(response).await?;

        match body.get("product") {
            Some(product) if product.is_object() => OffProduct::deserialize(product)
                .map(Some)
                .map_err(|e| AppError::Lookup(format!("JSON parse error: {}", e))),
            _ => Ok(None),
        }
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status == StatusCode::TOO_MANY_REQUESTS {
                tracing::warn!("OpenFoodFacts rate limit hit (429)");
            }

            return Err(AppError::Lookup(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Lookup(format!("JSON parse error: {}", e)))
    }
}

fn transport_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Lookup(AppError::LOOKUP_TIMEOUT.to_string())
    } else {
        AppError::Lookup(e.to_string())
    }
}

/// Raw product record as returned by OpenFoodFacts.
///
/// Every field is optional and tolerant of unexpected JSON types.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OffProduct {
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_name_fr: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_name_en: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub brands: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nutriscore_grade: Option<String>,
    /// Kept untyped: values show up as numbers, numeric strings, or junk
    #[serde(default)]
    pub nutriments: Option<Value>,
}

impl OffProduct {
    fn nutriment(&self, field: &str) -> f64 {
        self.nutriments
            .as_ref()
            .and_then(|n| n.get(field))
            .map(coerce_number)
            .unwrap_or(0.0)
    }
}

/// Accept strings and numbers as text; anything else reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Convert a raw product into a `Food`.
///
/// Returns `None` for products without a code; every other field falls back
/// to a placeholder or zero.
pub fn normalize_product(product: &OffProduct) -> Option<Food> {
    let id = non_empty(product.code.as_deref())?;

    let name = [
        &product.product_name,
        &product.product_name_fr,
        &product.product_name_en,
    ]
    .into_iter()
    .find_map(|n| non_empty(n.as_deref()))
    .unwrap_or(UNKNOWN_NAME);

    Some(Food {
        id: id.to_string(),
        name: name.to_string(),
        brand: non_empty(product.brands.as_deref())
            .unwrap_or(UNKNOWN_BRAND)
            .to_string(),
        image_url: non_empty(product.image_url.as_deref()).map(String::from),
        nutriscore: non_empty(product.nutriscore_grade.as_deref())
            .map(str::to_uppercase)
            .unwrap_or_else(|| UNRATED.to_string()),
        calories: product.nutriment("energy-kcal_100g"),
        proteins: product.nutriment("proteins_100g"),
        carbs: product.nutriment("carbohydrates_100g"),
        fats: product.nutriment("fat_100g"),
    })
}

/// Normalize a batch, dropping products without a code.
pub fn normalize_products(products: &[OffProduct]) -> Vec<Food> {
    products.iter().filter_map(normalize_product).collect()
}
