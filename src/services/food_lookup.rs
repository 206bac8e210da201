// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Food lookup service with single-flight text search.
//!
//! Text search keeps at most one request alive: starting a search cancels the
//! previous one, and a result that arrives after being superseded is dropped.
//! Code lookups are independent single-shot requests.
//!
//! Every failure collapses to an empty food list at the public boundary. The
//! `*_outcome` methods expose the reason for callers that care.

use crate::config::Config;
use crate::models::Food;
use crate::services::open_food_facts::{normalize_product, normalize_products, OpenFoodFactsClient};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Why a lookup produced what it did.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// At least one food.
    Found(Vec<Food>),
    /// The database answered with nothing usable.
    Empty,
    /// Query below the minimum length; no request was made.
    TooShort,
    /// Superseded by a newer search.
    Cancelled,
    /// No answer within the time budget.
    TimedOut,
    /// A scan is already in flight.
    Busy,
    /// Transport, status or parse failure.
    Failed(String),
}

impl LookupOutcome {
    fn from_foods(foods: Vec<Food>) -> Self {
        if foods.is_empty() {
            LookupOutcome::Empty
        } else {
            LookupOutcome::Found(foods)
        }
    }

    /// Foods to show; empty for every non-`Found` outcome.
    pub fn into_foods(self) -> Vec<Food> {
        match self {
            LookupOutcome::Found(foods) => foods,
            _ => Vec::new(),
        }
    }
}

/// Tunables for the lookup service.
#[derive(Debug, Clone)]
pub struct LookupSettings {
    pub search_timeout: Duration,
    pub min_query_len: usize,
    pub page_size: u32,
    pub debounce: Duration,
}

impl From<&Config> for LookupSettings {
    fn from(config: &Config) -> Self {
        Self {
            search_timeout: config.search_timeout,
            min_query_len: config.search_min_query_len,
            page_size: config.search_page_size,
            debounce: config.search_debounce,
        }
    }
}

/// The one text search allowed to deliver results.
#[derive(Default)]
struct InFlight {
    generation: u64,
    cancel: Option<CancellationToken>,
}

/// Food lookup service.
///
/// Clones share the in-flight search slot and the scan guard.
#[derive(Clone)]
pub struct FoodLookupService {
    client: OpenFoodFactsClient,
    settings: LookupSettings,
    in_flight: Arc<Mutex<InFlight>>,
    scanning: Arc<AtomicBool>,
}

impl FoodLookupService {
    pub fn new(client: OpenFoodFactsClient, settings: LookupSettings) -> Self {
        Self {
            client,
            settings,
            in_flight: Arc::new(Mutex::new(InFlight::default())),
            scanning: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Build the service from application config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            OpenFoodFactsClient::new(&config.off_base_url, &config.off_user_agent),
            LookupSettings::from(config),
        )
    }

    pub fn settings(&self) -> &LookupSettings {
        &self.settings
    }

    // ─── Text search ─────────────────────────────────────────────

    /// Search by free text. Never fails; see [`Self::search_by_text_outcome`].
    pub async fn search_by_text(&self, query: &str) -> Vec<Food> {
        self.search_by_text_outcome(query).await.into_foods()
    }

    /// Search by free text, reporting why the result looks the way it does.
    ///
    /// Short queries return `TooShort` without touching the in-flight search.
    /// Anything else cancels the previous search before issuing this one.
    pub async fn search_by_text_outcome(&self, query: &str) -> LookupOutcome {
        let query = query.trim();
        if query.chars().count() < self.settings.min_query_len {
            return LookupOutcome::TooShort;
        }

        let (generation, cancel) = self.begin_search();
        self.run_search(query, generation, cancel).await
    }

    /// Keystroke-driven search.
    ///
    /// Supersedes any earlier call immediately, waits for the debounce delay,
    /// and only then searches. A blank query clears results without a
    /// request.
    pub async fn search_as_you_type(&self, query: &str) -> LookupOutcome {
        let query = query.trim();
        let (generation, cancel) = self.begin_search();

        if query.is_empty() {
            self.finish_search(generation);
            return LookupOutcome::Empty;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return LookupOutcome::Cancelled,
            _ = tokio::time::sleep(self.settings.debounce) => {}
        }

        if query.chars().count() < self.settings.min_query_len {
            self.finish_search(generation);
            return LookupOutcome::TooShort;
        }

        self.run_search(query, generation, cancel).await
    }

    /// Take the in-flight slot, cancelling whoever held it.
    fn begin_search(&self) -> (u64, CancellationToken) {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.cancel.take() {
            previous.cancel();
        }
        slot.generation += 1;
        let token = CancellationToken::new();
        slot.cancel = Some(token.clone());
        (slot.generation, token)
    }

    /// Release the slot. Returns false if a newer search took it meanwhile.
    fn finish_search(&self, generation: u64) -> bool {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.generation != generation {
            return false;
        }
        slot.cancel = None;
        true
    }

    async fn run_search(
        &self,
        query: &str,
        generation: u64,
        cancel: CancellationToken,
    ) -> LookupOutcome {
        let request = tokio::time::timeout(
            self.settings.search_timeout,
            self.client.search(query, self.settings.page_size),
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => LookupOutcome::Cancelled,
            result = request => match result {
                Err(_) => {
                    tracing::debug!(query, "Food search timed out");
                    LookupOutcome::TimedOut
                }
                Ok(Err(e)) if e.is_lookup_timeout() => LookupOutcome::TimedOut,
                Ok(Ok(products)) => LookupOutcome::from_foods(normalize_products(&products)),
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, query, "Food search failed");
                    LookupOutcome::Failed(e.to_string())
                }
            },
        };

        if !self.finish_search(generation) {
            tracing::debug!(query, "Dropping superseded search result");
            return LookupOutcome::Cancelled;
        }

        outcome
    }

    // ─── Code lookup ─────────────────────────────────────────────

    /// Look up one product by barcode. Never fails.
    pub async fn search_by_code(&self, code: &str) -> Vec<Food> {
        self.search_by_code_outcome(code).await.into_foods()
    }

    /// Look up one product by barcode.
    ///
    /// Not coordinated with other lookups: overlapping calls each run to
    /// completion.
    pub async fn search_by_code_outcome(&self, code: &str) -> LookupOutcome {
        let code = code.trim();
        if code.is_empty() {
            return LookupOutcome::Empty;
        }

        match self.client.product_by_code(code).await {
            Ok(Some(product)) => match normalize_product(&product) {
                Some(food) => LookupOutcome::Found(vec![food]),
                None => LookupOutcome::Empty,
            },
            Ok(None) => {
                tracing::debug!(code, "No product for code");
                LookupOutcome::Empty
            }
            Err(e) => {
                tracing::warn!(error = %e, code, "Product lookup by code failed");
                LookupOutcome::Failed(e.to_string())
            }
        }
    }

    /// Barcode scan event.
    ///
    /// Like [`Self::search_by_code_outcome`], but a scan that arrives while
    /// another is still outstanding is refused with `Busy`.
    pub async fn scan(&self, code: &str) -> LookupOutcome {
        let Some(_guard) = ScanGuard::acquire(&self.scanning) else {
            tracing::debug!(code, "Scan ignored, previous scan still running");
            return LookupOutcome::Busy;
        };
        self.search_by_code_outcome(code).await
    }
}

/// Holds the scan flag for as long as a scan runs, including if it is dropped.
struct ScanGuard<'a>(&'a AtomicBool);

impl<'a> ScanGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_service() -> FoodLookupService {
        FoodLookupService::from_config(&Config::test_default())
    }

    #[tokio::test]
    async fn test_short_query_skips_network() {
        let service = offline_service();
        assert_eq!(
            service.search_by_text_outcome("  ab ").await,
            LookupOutcome::TooShort
        );
        assert!(service.search_by_text("x").await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_code_skips_network() {
        let service = offline_service();
        assert_eq!(service.search_by_code_outcome("   ").await, LookupOutcome::Empty);
    }

    #[test]
    fn test_begin_search_cancels_previous() {
        let service = offline_service();
        let (first_gen, first) = service.begin_search();
        let (second_gen, second) = service.begin_search();

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!service.finish_search(first_gen));
        assert!(service.finish_search(second_gen));
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_during_debounce_cancels_pending_call() {
        let service = offline_service();

        let pending = tokio::spawn({
            let service = service.clone();
            async move { service.search_as_you_type("nutella").await }
        });
        tokio::task::yield_now().await;

        assert_eq!(service.search_as_you_type("").await, LookupOutcome::Empty);
        assert_eq!(pending.await.unwrap(), LookupOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_checked_after_debounce() {
        let service = offline_service();
        let started = tokio::time::Instant::now();

        assert_eq!(service.search_as_you_type("ab").await, LookupOutcome::TooShort);
        assert!(started.elapsed() >= service.settings().debounce);
    }

    #[test]
    fn test_scan_guard_is_exclusive_and_released() {
        let flag = AtomicBool::new(false);
        let guard = ScanGuard::acquire(&flag);
        assert!(guard.is_some());
        assert!(ScanGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(ScanGuard::acquire(&flag).is_some());
    }

    #[test]
    fn test_into_foods_collapses_failures() {
        assert!(LookupOutcome::Failed("boom".into()).into_foods().is_empty());
        assert!(LookupOutcome::TimedOut.into_foods().is_empty());
        assert!(LookupOutcome::Cancelled.into_foods().is_empty());
        assert!(LookupOutcome::from_foods(vec![]) == LookupOutcome::Empty);
    }
}
