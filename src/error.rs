// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.
//!
//! Most failures in this crate are absorbed where they happen (lookups collapse
//! to an empty result, storage writes are logged). `AppError` is what the
//! internal layers return before that collapse, and what the few
//! user-initiated operations report back.

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No meal in progress")]
    NoCurrentMeal,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Food lookup error: {0}")]
    Lookup(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message used when a lookup exceeds its time budget.
    pub const LOOKUP_TIMEOUT: &'static str = "Request timed out";

    /// Returns true if the durable store rejected an operation.
    pub fn is_storage_error(&self) -> bool {
        matches!(self, AppError::Storage(_))
    }

    /// Returns true if a lookup ran out of time.
    pub fn is_lookup_timeout(&self) -> bool {
        matches!(self, AppError::Lookup(msg) if msg == Self::LOOKUP_TIMEOUT)
    }
}

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, AppError>;
