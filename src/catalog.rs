use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::error::ApiError;

/// A named entity eligible to be matched by search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: u32,
    pub name: String,
}

/// On-disk catalog format: the entries live under a `data` wrapper.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    data: Vec<Candidate>,
}

/// Loads the candidate catalog from a JSON file and caches it for the
/// lifetime of the process.
///
/// The first successful `load` pins the parsed catalog; later calls return
/// the same `Arc` without touching the filesystem. A failed load is returned
/// to the caller and not cached, so the next request retries the read.
pub struct CatalogLoader {
    path: PathBuf,
    cache: OnceCell<Arc<Vec<Candidate>>>,
}

impl CatalogLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: OnceCell::new(),
        }
    }

    pub async fn load(&self) -> Result<Arc<Vec<Candidate>>, ApiError> {
        self.cache
            .get_or_try_init(|| async {
                let raw = tokio::fs::read_to_string(&self.path).await.map_err(|source| {
                    ApiError::CatalogRead {
                        path: self.path.clone(),
                        source,
                    }
                })?;

                let file: CatalogFile =
                    serde_json::from_str(&raw).map_err(|source| ApiError::CatalogParse {
                        path: self.path.clone(),
                        source,
                    })?;

                tracing::info!(
                    path = %self.path.display(),
                    entries = file.data.len(),
                    "catalog loaded"
                );

                Ok(Arc::new(file.data))
            })
            .await
            .cloned()
    }

    /// Whether the catalog has been loaded and cached.
    pub fn is_loaded(&self) -> bool {
        self.cache.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled_catalog_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/pokemons.json")
    }

    #[tokio::test]
    async fn load_parses_bundled_catalog() {
        let loader = CatalogLoader::new(bundled_catalog_path());
        let catalog = loader.load().await.unwrap();

        assert_eq!(catalog.len(), 151);
        assert_eq!(
            catalog[0],
            Candidate {
                id: 1,
                name: "bulbasaur".to_string()
            }
        );
        assert!(catalog.iter().any(|c| c.id == 25 && c.name == "pikachu"));
    }

    #[tokio::test]
    async fn load_is_memoized() {
        let loader = CatalogLoader::new(bundled_catalog_path());

        let first = loader.load().await.unwrap();
        let second = loader.load().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
        assert!(loader.is_loaded());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let loader = CatalogLoader::new("/nonexistent/pokemons.json");

        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, ApiError::CatalogRead { .. }));
        assert!(!loader.is_loaded());
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let path = std::env::temp_dir().join("pokesearch-malformed-catalog.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loader = CatalogLoader::new(&path);
        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, ApiError::CatalogParse { .. }));
    }

    #[tokio::test]
    async fn failed_load_retries_on_next_call() {
        let path = std::env::temp_dir().join("pokesearch-retry-catalog.json");
        let _ = std::fs::remove_file(&path);

        let loader = CatalogLoader::new(&path);
        assert!(loader.load().await.is_err());

        std::fs::write(&path, r#"{"data":[{"id":25,"name":"pikachu"}]}"#).unwrap();
        let catalog = loader.load().await.unwrap();
        assert_eq!(catalog.len(), 1);
    }
}
