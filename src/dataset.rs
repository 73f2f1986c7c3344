//! Icon dataset acquisition and the process-wide dataset cache

use crate::error::{EmbedError, Result};
use crate::types::{DatasetKey, IconPack};

use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tokio::sync::OnceCell;

/// Source of icon datasets
pub trait DatasetLoader: Send + Sync {
    fn load(&self, key: &DatasetKey) -> impl Future<Output = Result<IconPack>> + Send;
}

/// Loads `<root>/<package>.json`, a JSON object of exported bindings where
/// each binding maps icon identifiers to icon definitions
#[derive(Debug, Clone)]
pub struct FsDatasetLoader {
    root: PathBuf,
}

impl FsDatasetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the given package's exports
    pub fn package_path(&self, package: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in package.split('/').filter(|s| !s.is_empty() && *s != "..") {
            path.push(segment);
        }
        path.set_extension(match path.extension() {
            Some(ext) => format!("{}.json", ext.to_string_lossy()),
            None => "json".to_string(),
        });
        path
    }
}

impl DatasetLoader for FsDatasetLoader {
    async fn load(&self, key: &DatasetKey) -> Result<IconPack> {
        let path = self.package_path(&key.package);
        log::debug!("Loading dataset {} from {}", key, path.display());

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            EmbedError::FileNotFound {
                path: format!("{}: {}", path.display(), e),
            }
        })?;

        parse_dataset(&content, key)
    }
}

/// Extract the binding named by `key` from dataset JSON
pub fn parse_dataset(content: &str, key: &DatasetKey) -> Result<IconPack> {
    let mut exports: HashMap<String, Value> = serde_json::from_str(content)
        .map_err(|e| EmbedError::dataset(&key.package, format!("Invalid JSON: {}", e)))?;

    let binding = exports.remove(&key.binding).ok_or_else(|| {
        EmbedError::dataset(
            &key.package,
            format!("export '{}' not found", key.binding),
        )
    })?;

    let pack: IconPack = serde_json::from_value(binding).map_err(|e| {
        EmbedError::dataset(
            &key.package,
            format!("export '{}' is not an icon pack: {}", key.binding, e),
        )
    })?;

    log::debug!("Dataset {} holds {} icons", key, pack.len());
    Ok(pack)
}

/// Memoized datasets keyed by package and binding.
///
/// Each key owns a single-flight cell: concurrent first requests wait on the
/// one in-flight load instead of starting their own. A failed load leaves
/// the cell empty so a later request tries again.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<DatasetKey, Arc<OnceCell<Arc<IconPack>>>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache shared by every embedder in the process
    pub fn shared() -> Arc<DatasetCache> {
        static SHARED: OnceLock<Arc<DatasetCache>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(DatasetCache::new())).clone()
    }

    fn cell(&self, key: &DatasetKey) -> Arc<OnceCell<Arc<IconPack>>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.entry(key.clone()).or_default().clone()
    }

    pub async fn get_or_load<L: DatasetLoader>(
        &self,
        key: &DatasetKey,
        loader: &L,
    ) -> Result<Arc<IconPack>> {
        let cell = self.cell(key);
        let pack = cell
            .get_or_try_init(|| async {
                log::info!("Loading icon dataset {}", key);
                loader.load(key).await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(pack))
    }

    /// Already loaded dataset, without triggering a load
    pub fn get(&self, key: &DatasetKey) -> Option<Arc<IconPack>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).and_then(|cell| cell.get().cloned())
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IconDefinition;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    const DATASET: &str = r#"{
        "prefix": "fas",
        "fas": {
            "faAt": { "prefix": "fas", "iconName": "at", "icon": [512, 512, [], "f1fa", "M1 1H2V2H1Z"] },
            "faHouse": { "icon": [576, 512, ["home"], "f015", "M0 0L9 9"] }
        }
    }"#;

    /// Counts loads and sleeps so concurrent callers overlap
    struct CountingLoader {
        loads: AtomicUsize,
        fail: bool,
    }

    impl DatasetLoader for CountingLoader {
        async fn load(&self, key: &DatasetKey) -> Result<IconPack> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail {
                return Err(EmbedError::dataset(&key.package, "unavailable"));
            }
            let mut pack = IconPack::new();
            pack.insert("faAt".to_string(), IconDefinition::new(1, 1, "M0 0"));
            Ok(pack)
        }
    }

    #[test]
    fn test_parse_dataset_binding() {
        let key = DatasetKey::new("@fortawesome/free-solid-svg-icons", "fas");
        let pack = parse_dataset(DATASET, &key).unwrap();
        assert_eq!(pack.len(), 2);
        assert_eq!(pack["faHouse"].width(), 576);
    }

    #[test]
    fn test_parse_dataset_missing_binding() {
        let key = DatasetKey::new("pkg", "far");
        let err = parse_dataset(DATASET, &key).unwrap_err();
        assert!(err.to_string().contains("export 'far' not found"));

        let key = DatasetKey::new("pkg", "prefix");
        assert!(matches!(
            parse_dataset(DATASET, &key),
            Err(EmbedError::Dataset { .. })
        ));
    }

    #[test]
    fn test_package_path() {
        let loader = FsDatasetLoader::new("/data");
        assert_eq!(
            loader.package_path("@fortawesome/free-solid-svg-icons"),
            PathBuf::from("/data/@fortawesome/free-solid-svg-icons.json")
        );
        assert_eq!(loader.package_path("lucide.v2"), PathBuf::from("/data/lucide.v2.json"));
        assert_eq!(loader.package_path("../etc/x"), PathBuf::from("/data/etc/x.json"));
    }

    #[tokio::test]
    async fn test_fs_loader_reads_package_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("@fortawesome")).unwrap();
        fs::write(
            temp_dir.path().join("@fortawesome/free-solid-svg-icons.json"),
            DATASET,
        )
        .unwrap();

        let loader = FsDatasetLoader::new(temp_dir.path());
        let pack = loader.load(&DatasetKey::default()).await.unwrap();
        assert!(pack.contains_key("faAt"));

        let missing = loader.load(&DatasetKey::new("nope", "fas")).await;
        assert!(matches!(missing, Err(EmbedError::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_load() {
        let cache = Arc::new(DatasetCache::new());
        let loader = Arc::new(CountingLoader {
            loads: AtomicUsize::new(0),
            fail: false,
        });
        let key = DatasetKey::default();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let loader = Arc::clone(&loader);
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                cache.get_or_load(&key, loader.as_ref()).await.unwrap()
            }));
        }

        let mut packs = Vec::new();
        for handle in handles {
            packs.push(handle.await.unwrap());
        }

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert!(packs.iter().all(|pack| Arc::ptr_eq(pack, &packs[0])));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key).is_some());
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let cache = DatasetCache::new();
        let loader = CountingLoader {
            loads: AtomicUsize::new(0),
            fail: true,
        };
        let key = DatasetKey::default();

        assert!(cache.get_or_load(&key, &loader).await.is_err());
        assert!(cache.get_or_load(&key, &loader).await.is_err());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
        assert!(cache.get(&key).is_none());
    }
}
