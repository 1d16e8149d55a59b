pub mod durable_cache;
pub mod error;
pub mod fake;
pub mod sqlite;

pub use durable_cache::{DurableCache, CACHE_KEY};
pub use error::CacheError;
pub use fake::FakeCache;
pub use sqlite::SqliteCache;
