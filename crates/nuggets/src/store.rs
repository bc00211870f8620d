use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::cache::cache_key;
use crate::cache::CacheStore;
use crate::error::StoreError;
use crate::model::NuggetKey;
use crate::model::NuggetRecord;

/// A validated `app.model` reference naming one registered nugget type,
/// such as `pages.snippet`.
///
/// Both halves are folded to lowercase, so `pages.Snippet` and
/// `pages.snippet` name the same source.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ModelRef {
    app: String,
    model: String,
}

impl ModelRef {
    /// Parse `reference` as `app.model`; returns `None` for anything else.
    #[must_use]
    pub fn parse(reference: &str) -> Option<Self> {
        let (app, model) = reference.split_once('.')?;
        if app.is_empty() || model.is_empty() {
            return None;
        }
        if model.contains('.')
            || app.contains(char::is_whitespace)
            || model.contains(char::is_whitespace)
        {
            return None;
        }
        Some(Self {
            app: app.to_lowercase(),
            model: model.to_lowercase(),
        })
    }

    #[must_use]
    pub fn app(&self) -> &str {
        &self.app
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app, self.model)
    }
}

/// The persistence seam: fetch one record by its normalized key.
pub trait NuggetSource: Send + Sync {
    /// Fetch the record stored under `key`, reporting absence as
    /// [`StoreError::NotFound`].
    fn get(&self, key: &str) -> Result<NuggetRecord, StoreError>;
}

/// A nugget source that also accepts writes.
pub trait MutableNuggetSource: NuggetSource {
    fn put(&self, record: NuggetRecord) -> Result<(), StoreError>;
}

/// Adapter that turns a fetch closure into a [`NuggetSource`].
pub struct SourceFn<F>(F);

impl<F> SourceFn<F>
where
    F: Fn(&str) -> Result<NuggetRecord, StoreError> + Send + Sync,
{
    #[must_use]
    pub fn new(fetch: F) -> Self {
        Self(fetch)
    }
}

impl<F> NuggetSource for SourceFn<F>
where
    F: Fn(&str) -> Result<NuggetRecord, StoreError> + Send + Sync,
{
    fn get(&self, key: &str) -> Result<NuggetRecord, StoreError> {
        (self.0)(key)
    }
}

/// Maps [`ModelRef`]s to their nugget sources.
///
/// Registration doubles as the type gate: only nugget sources can be
/// registered, so resolving a reference here is what guarantees the named
/// model is a nugget model at all.
#[derive(Default)]
pub struct ModelRegistry {
    sources: FxHashMap<ModelRef, Arc<dyn NuggetSource>>,
}

impl ModelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` under `reference`, replacing any previous
    /// registration. Returns the parsed reference, or `None` when
    /// `reference` is not `app.model`-shaped.
    pub fn register(&mut self, reference: &str, source: Arc<dyn NuggetSource>) -> Option<ModelRef> {
        let model_ref = ModelRef::parse(reference)?;
        debug!(model = %model_ref, "registered nugget source");
        self.sources.insert(model_ref.clone(), source);
        Some(model_ref)
    }

    /// Register a plain fetch closure. See [`SourceFn`].
    pub fn register_fn<F>(&mut self, reference: &str, fetch: F) -> Option<ModelRef>
    where
        F: Fn(&str) -> Result<NuggetRecord, StoreError> + Send + Sync + 'static,
    {
        self.register(reference, Arc::new(SourceFn::new(fetch)))
    }

    #[must_use]
    pub fn source(&self, model_ref: &ModelRef) -> Option<&Arc<dyn NuggetSource>> {
        self.sources.get(model_ref)
    }

    #[must_use]
    pub fn contains(&self, model_ref: &ModelRef) -> bool {
        self.sources.contains_key(model_ref)
    }
}

/// In-memory [`MutableNuggetSource`], mainly for tests and demos.
#[derive(Default)]
pub struct MemoryNuggets {
    records: Mutex<FxHashMap<String, NuggetRecord>>,
}

impl MemoryNuggets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<String, NuggetRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NuggetSource for MemoryNuggets {
    fn get(&self, key: &str) -> Result<NuggetRecord, StoreError> {
        self.lock()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(key))
    }
}

impl MutableNuggetSource for MemoryNuggets {
    fn put(&self, record: NuggetRecord) -> Result<(), StoreError> {
        self.lock()
            .insert(record.key().as_str().to_string(), record);
        Ok(())
    }
}

/// Persist `record`, then evict its cache entry so the next lookup sees the
/// fresh version.
///
/// The eviction targets `prefix` + key, the same key [`fetch_or_cache`]
/// populates. Nothing is evicted when the write fails.
///
/// [`fetch_or_cache`]: crate::cache::fetch_or_cache
pub fn save_nugget(
    source: &dyn MutableNuggetSource,
    cache: &dyn CacheStore,
    prefix: &str,
    record: NuggetRecord,
) -> Result<NuggetKey, StoreError> {
    let key = record.key().clone();
    source.put(record)?;
    cache.delete(&cache_key(prefix, key.as_str()));
    debug!(key = key.as_str(), "nugget saved, cache entry evicted");
    Ok(key)
}
