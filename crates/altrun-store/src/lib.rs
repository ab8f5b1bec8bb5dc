//! Client-local persistence for detected locations and consent preferences.
//!
//! Everything sits on top of the [`KeyValueStore`] trait so the cache and
//! preference logic can run against an in-memory map in tests and a JSON
//! file on disk in the CLI.

pub mod cache;
pub mod error;
pub mod kv;
pub mod preferences;

pub use cache::{CachedLocationEntry, LocationCache, DEFAULT_CACHE_TTL_HOURS};
pub use error::StoreError;
pub use kv::{JsonFileStore, KeyValueStore, MemoryStore};
pub use preferences::LocationPreferenceStore;
