//! Durable key-value storage.
//!
//! The meal store only needs get/set/remove of one string blob. The trait
//! keeps the backing medium swappable: a directory of files on the device, or
//! an in-memory map for tests.

pub mod file_store;
pub mod memory_store;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

use crate::error::AppError;
use async_trait::async_trait;

/// Storage keys as constants.
pub mod keys {
    /// Serialized collection of saved meals
    pub const MEALS: &str = "meals";
}

/// Minimal durable string store.
///
/// Each call is expected to be crash-safe on its own. No atomicity is
/// offered across calls.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. A missing key is `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Replace the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    /// Delete `key`. Deleting a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}
