//! Memoizing record loader.
//!
//! Each identifier is fetched and parsed once; later requests for the same
//! identifier return the cached records until `clear_cache` is called. Failed
//! loads are neither cached nor retried.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::data::{self, LoadManifest, Parsed};
use crate::error::LoadError;
use crate::logging::{log_cache, log_load, log_load_error, v_str, ProfileScope};
use crate::records::{FileChangeRecord, RecipeRunRecord, RecordKind};
use crate::source::RecordSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

struct Entry<T> {
    records: Arc<Vec<T>>,
    manifest: LoadManifest,
}

#[derive(Default)]
struct Cache {
    recipe_runs: HashMap<String, Entry<RecipeRunRecord>>,
    file_changes: HashMap<String, Entry<FileChangeRecord>>,
    hits: u64,
    misses: u64,
}

pub struct RecordLoader {
    source: Box<dyn RecordSource + Send + Sync>,
    cache: Mutex<Cache>,
}

impl RecordLoader {
    pub fn new(source: Box<dyn RecordSource + Send + Sync>) -> Self {
        Self {
            source,
            cache: Mutex::new(Cache::default()),
        }
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    pub async fn load_recipe_run_records(&self, id: &str) -> Result<Arc<Vec<RecipeRunRecord>>, LoadError> {
        if let Some(hit) = self.lookup(id, |c| &c.recipe_runs) {
            return Ok(hit);
        }
        let parsed = self
            .fetch_parsed(id, RecordKind::RecipeRun, data::parse_recipe_runs)
            .await?;
        Ok(self.store(id, parsed, |c| &mut c.recipe_runs))
    }

    pub async fn load_file_change_records(&self, id: &str) -> Result<Arc<Vec<FileChangeRecord>>, LoadError> {
        if let Some(hit) = self.lookup(id, |c| &c.file_changes) {
            return Ok(hit);
        }
        let parsed = self
            .fetch_parsed(id, RecordKind::FileChange, data::parse_file_changes)
            .await?;
        Ok(self.store(id, parsed, |c| &mut c.file_changes))
    }

    /// Drop every memoized result; the next load of any identifier re-fetches.
    pub fn clear_cache(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.recipe_runs.clear();
        cache.file_changes.clear();
        log_cache("cleared", "*");
    }

    /// Manifest of the cached parse for `id`, of either record kind.
    pub fn manifest(&self, id: &str) -> Option<LoadManifest> {
        let cache = self.cache.lock().ok()?;
        cache
            .recipe_runs
            .get(id)
            .map(|e| e.manifest.clone())
            .or_else(|| cache.file_changes.get(id).map(|e| e.manifest.clone()))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache
            .lock()
            .map(|c| CacheStats {
                hits: c.hits,
                misses: c.misses,
                entries: c.recipe_runs.len() + c.file_changes.len(),
            })
            .unwrap_or_default()
    }

    fn lookup<T>(&self, id: &str, table: impl Fn(&Cache) -> &HashMap<String, Entry<T>>) -> Option<Arc<Vec<T>>> {
        let mut cache = self.cache.lock().ok()?;
        let hit = table(&*cache).get(id).map(|e| Arc::clone(&e.records));
        if hit.is_some() {
            cache.hits += 1;
            log_cache("hit", id);
        } else {
            cache.misses += 1;
            log_cache("miss", id);
        }
        hit
    }

    async fn fetch_parsed<T>(
        &self,
        id: &str,
        kind: RecordKind,
        parse: fn(&str, &str) -> Result<Parsed<T>, LoadError>,
    ) -> Result<Parsed<T>, LoadError> {
        let _scope = ProfileScope::with_context("load", &[("source_id", v_str(id))]);
        let result = match self.source.fetch(id).await {
            Ok(text) => parse(id, &text),
            Err(err) => Err(err),
        };
        match &result {
            Ok(parsed) => log_load(
                id,
                kind.as_str(),
                parsed.manifest.row_count,
                parsed.manifest.dropped_rows,
                &parsed.manifest.hash_sha256,
            ),
            Err(err) => log_load_error(id, kind.as_str(), &err.to_string()),
        }
        result
    }

    fn store<T>(
        &self,
        id: &str,
        parsed: Parsed<T>,
        table: impl Fn(&mut Cache) -> &mut HashMap<String, Entry<T>>,
    ) -> Arc<Vec<T>> {
        let records = Arc::new(parsed.records);
        if let Ok(mut cache) = self.cache.lock() {
            table(&mut *cache).insert(
                id.to_string(),
                Entry {
                    records: Arc::clone(&records),
                    manifest: parsed.manifest,
                },
            );
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        fetches: Arc<AtomicUsize>,
        body: String,
    }

    #[async_trait]
    impl RecordSource for CountingSource {
        async fn fetch(&self, _id: &str) -> Result<String, LoadError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.clone())
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    fn loader(body: &str) -> (RecordLoader, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let src = CountingSource {
            fetches: Arc::clone(&fetches),
            body: body.to_string(),
        };
        (RecordLoader::new(Box::new(src)), fetches)
    }

    #[tokio::test]
    async fn repeated_loads_hit_cache_until_cleared() {
        let (loader, fetches) = loader("The recipe,Source file count\na.B,3\n");
        let first = loader.load_recipe_run_records("runs").await.unwrap();
        let second = loader.load_recipe_run_records("runs").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(loader.cache_stats().hits, 1);

        loader.clear_cache();
        assert!(loader.manifest("runs").is_none());
        loader.load_recipe_run_records("runs").await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn clear_recovers_from_poisoned_lock() {
        let (loader, fetches) = loader("The recipe,Source file count\na.B,3\n");
        loader.load_recipe_run_records("runs").await.unwrap();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = loader.cache.lock().unwrap();
            panic!("poison the cache lock");
        }));
        assert!(loader.cache.is_poisoned());

        loader.clear_cache();
        let cache = loader.cache.lock().unwrap_or_else(|p| p.into_inner());
        assert!(cache.recipe_runs.is_empty());
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_parse_is_not_cached() {
        let (loader, fetches) = loader("no recipe column\n1\n");
        assert!(loader.load_file_change_records("changes").await.is_err());
        assert!(loader.load_file_change_records("changes").await.is_err());
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert_eq!(loader.cache_stats().entries, 0);
    }

    #[tokio::test]
    async fn kinds_are_cached_separately() {
        let body = "The recipe,Recipe that made changes\na.B,a.B\n";
        let (loader, fetches) = loader(body);
        loader.load_recipe_run_records("both").await.unwrap();
        loader.load_file_change_records("both").await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert_eq!(loader.cache_stats().entries, 2);
        assert_eq!(loader.manifest("both").unwrap().kind, RecordKind::RecipeRun);
    }
}
