//! Core model for cacheable content snippets ("nuggets").
//!
//! A nugget is a small piece of site content identified by a normalized slug
//! key, fetched through a cache so hot snippets skip the backing store. This
//! crate holds the entity types and the collaborator seams the template tags
//! in `nuggets-templates` plug into:
//!
//! - [`NuggetKey`] and [`NuggetRecord`], the slug-keyed entity
//! - [`CacheStore`], the cache seam, with [`MemoryCache`] as the in-process
//!   implementation
//! - [`NuggetSource`] and [`ModelRegistry`], the persistence seam keyed by
//!   `app.model` references
//! - [`fetch_or_cache`], the cache-aside read path
//! - [`save_nugget`], the write path that evicts the stale cache entry

mod cache;
mod error;
mod model;
mod slug;
mod store;

pub use cache::cache_key;
pub use cache::fetch_or_cache;
pub use cache::CacheStats;
pub use cache::CacheStore;
pub use cache::MemoryCache;
pub use error::KeyError;
pub use error::StoreError;
pub use model::MAX_KEY_LENGTH;
pub use model::NuggetKey;
pub use model::NuggetRecord;
pub use slug::slugify;
pub use store::save_nugget;
pub use store::MemoryNuggets;
pub use store::ModelRef;
pub use store::ModelRegistry;
pub use store::MutableNuggetSource;
pub use store::NuggetSource;
pub use store::SourceFn;
